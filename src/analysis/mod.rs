//! Analysis modules.
//!
//! The aggregation engine lives here: pure, stateless queries turning a
//! filtered record collection into the report's summary tables.

pub mod aggregator;

pub use aggregator::*;
