//! Data-source collaborator.
//!
//! Fetches the sales payload from the remote endpoint or loads it from a
//! local file. The aggregation engine does not care how records arrived.

pub mod client;

pub use client::{fetch_records, load_records, FetchOptions, SourceError};
