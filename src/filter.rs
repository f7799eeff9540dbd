//! Filter stage narrowing the record set before aggregation.
//!
//! Mirrors the sidebar filters of the reference dashboard: region, year,
//! and a seller multi-select. Conditions compose as logical AND.

use crate::models::{Region, SaleRecord};
use std::collections::HashSet;

/// Filter criteria for one report run.
///
/// Empty or absent fields mean "no restriction". Built once per run from
/// user-selected inputs and consumed by [`filter_records`].
#[derive(Debug, Clone)]
pub struct SaleFilter {
    /// Region restriction; `Region::Brasil` keeps everything.
    pub region: Region,
    /// Restrict to purchases made in this year.
    pub year: Option<i32>,
    /// Keep only these sellers; empty set keeps everyone.
    pub sellers: HashSet<String>,
}

impl Default for SaleFilter {
    fn default() -> Self {
        Self {
            region: Region::Brasil,
            year: None,
            sellers: HashSet::new(),
        }
    }
}

impl SaleFilter {
    /// Build a filter from plain user inputs.
    pub fn new(region: Region, year: Option<i32>, sellers: impl IntoIterator<Item = String>) -> Self {
        Self {
            region,
            year,
            sellers: sellers.into_iter().collect(),
        }
    }

    /// Whether this filter keeps every record.
    pub fn is_unrestricted(&self) -> bool {
        self.region.is_unrestricted() && self.year.is_none() && self.sellers.is_empty()
    }

    /// Whether a single record passes all active conditions.
    pub fn matches(&self, record: &SaleRecord) -> bool {
        if !self.region.contains_state(&record.state) {
            return false;
        }
        if let Some(year) = self.year {
            if record.year() != year {
                return false;
            }
        }
        if !self.sellers.is_empty() && !self.sellers.contains(&record.seller) {
            return false;
        }
        true
    }
}

/// Apply a filter, returning the surviving records as a new collection.
///
/// Never mutates the input. An empty result is valid and flows through to
/// the aggregation engine as empty summary tables.
pub fn filter_records(records: &[SaleRecord], filter: &SaleFilter) -> Vec<SaleRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}
