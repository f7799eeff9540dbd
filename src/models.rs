//! Data models for the sales reporter.
//!
//! This module contains all the core data structures used throughout
//! the application for representing sale records, filters, summary
//! tables, and reports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Date format used by the upstream payload (`Data da Compra`).
pub const PURCHASE_DATE_FORMAT: &str = "%d/%m/%Y";

/// A Brazilian macro-region, as exposed by the sidebar of the reference
/// dashboard. `Brasil` is the sentinel for "no regional restriction".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Brasil,
    CentroOeste,
    Nordeste,
    Norte,
    Sudeste,
    Sul,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Brasil => write!(f, "Brasil"),
            Region::CentroOeste => write!(f, "Centro-Oeste"),
            Region::Nordeste => write!(f, "Nordeste"),
            Region::Norte => write!(f, "Norte"),
            Region::Sudeste => write!(f, "Sudeste"),
            Region::Sul => write!(f, "Sul"),
        }
    }
}

impl Region {
    /// Value sent as the `regiao` query parameter. The upstream endpoint
    /// treats an empty string as "whole country".
    pub fn query_value(&self) -> &'static str {
        match self {
            Region::Brasil => "",
            Region::CentroOeste => "centro-oeste",
            Region::Nordeste => "nordeste",
            Region::Norte => "norte",
            Region::Sudeste => "sudeste",
            Region::Sul => "sul",
        }
    }

    /// Whether this region imposes no restriction at all.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Region::Brasil)
    }

    /// Two-letter federative-unit codes belonging to this region.
    pub fn state_codes(&self) -> &'static [&'static str] {
        match self {
            Region::Brasil => &[
                "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG",
                "PA", "PB", "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE",
                "TO",
            ],
            Region::CentroOeste => &["DF", "GO", "MT", "MS"],
            Region::Nordeste => &["AL", "BA", "CE", "MA", "PB", "PE", "PI", "RN", "SE"],
            Region::Norte => &["AC", "AP", "AM", "PA", "RO", "RR", "TO"],
            Region::Sudeste => &["ES", "MG", "RJ", "SP"],
            Region::Sul => &["PR", "RS", "SC"],
        }
    }

    /// Region a state code belongs to. Case-insensitive.
    #[allow(dead_code)] // Utility for region lookups
    pub fn of_state(code: &str) -> Option<Region> {
        let code = code.trim().to_uppercase();
        for region in [
            Region::CentroOeste,
            Region::Nordeste,
            Region::Norte,
            Region::Sudeste,
            Region::Sul,
        ] {
            if region.state_codes().contains(&code.as_str()) {
                return Some(region);
            }
        }
        None
    }

    /// Whether a record from the given state passes this region filter.
    /// `Brasil` accepts every state, including codes outside the known set.
    pub fn contains_state(&self, code: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        let code = code.trim().to_uppercase();
        self.state_codes().contains(&code.as_str())
    }
}

/// A record in the payload could not be converted into a [`SaleRecord`].
///
/// Carries the position of the offending record within the payload and the
/// upstream field name, so the caller can point at the exact problem. The
/// parser never substitutes defaults for missing or mistyped fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index}: field `{field}`: {reason}")]
pub struct MalformedRecord {
    /// Zero-based position of the record in the payload array.
    pub index: usize,
    /// Upstream (Portuguese) field name.
    pub field: String,
    /// What went wrong with the field.
    pub reason: String,
}

impl MalformedRecord {
    fn new(index: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// One sales transaction, as fetched from the remote endpoint.
///
/// Field names in the JSON payload are Portuguese; see [`SaleRecord::from_value`]
/// for the mapping. Records are immutable once parsed and the aggregation
/// engine never mutates a record collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    /// Product name (`Produto`).
    pub product: String,
    /// Product category (`Categoria do Produto`).
    pub category: String,
    /// Sale price (`Preço`).
    pub price: Decimal,
    /// Freight cost (`Frete`).
    pub freight: f64,
    /// Purchase date (`Data da Compra`, `%d/%m/%Y` upstream).
    pub purchase_date: NaiveDate,
    /// Salesperson name (`Vendedor`).
    pub seller: String,
    /// Two-letter state code of the purchase (`Local da compra`).
    pub state: String,
    /// Buyer rating, 1-5 (`Avaliação da compra`).
    pub rating: u8,
    /// Payment type (`Tipo de pagamento`).
    pub payment_type: String,
    /// Number of installments (`Quantidade de parcelas`).
    pub installments: u32,
    /// Purchase latitude.
    pub lat: f64,
    /// Purchase longitude.
    pub lon: f64,
}

impl SaleRecord {
    /// Parse a single record from a JSON object.
    ///
    /// `index` is the record's position in the payload and is reported in
    /// every error.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, MalformedRecord> {
        if !value.is_object() {
            return Err(MalformedRecord::new(index, "<record>", "not a JSON object"));
        }

        Ok(Self {
            product: str_field(index, value, "Produto")?,
            category: str_field(index, value, "Categoria do Produto")?,
            price: decimal_field(index, value, "Preço")?,
            freight: f64_field(index, value, "Frete")?,
            purchase_date: date_field(index, value, "Data da Compra")?,
            seller: str_field(index, value, "Vendedor")?,
            state: str_field(index, value, "Local da compra")?,
            rating: u64_field(index, value, "Avaliação da compra")? as u8,
            payment_type: str_field(index, value, "Tipo de pagamento")?,
            installments: u64_field(index, value, "Quantidade de parcelas")? as u32,
            lat: f64_field(index, value, "lat")?,
            lon: f64_field(index, value, "lon")?,
        })
    }

    /// Year of the purchase date.
    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.purchase_date.year()
    }
}

/// Parse a whole payload array into typed records.
///
/// Fails on the first malformed record, identifying its index and field.
pub fn parse_records(values: &[Value]) -> Result<Vec<SaleRecord>, MalformedRecord> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| SaleRecord::from_value(index, value))
        .collect()
}

fn require<'a>(index: usize, value: &'a Value, field: &str) -> Result<&'a Value, MalformedRecord> {
    value
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| MalformedRecord::new(index, field, "missing"))
}

fn str_field(index: usize, value: &Value, field: &str) -> Result<String, MalformedRecord> {
    require(index, value, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MalformedRecord::new(index, field, "expected a string"))
}

fn f64_field(index: usize, value: &Value, field: &str) -> Result<f64, MalformedRecord> {
    require(index, value, field)?
        .as_f64()
        .ok_or_else(|| MalformedRecord::new(index, field, "expected a number"))
}

fn u64_field(index: usize, value: &Value, field: &str) -> Result<u64, MalformedRecord> {
    require(index, value, field)?
        .as_u64()
        .ok_or_else(|| MalformedRecord::new(index, field, "expected a non-negative integer"))
}

fn decimal_field(index: usize, value: &Value, field: &str) -> Result<Decimal, MalformedRecord> {
    let raw = f64_field(index, value, field)?;
    Decimal::from_f64(raw)
        .ok_or_else(|| MalformedRecord::new(index, field, format!("`{raw}` is not a valid amount")))
}

fn date_field(index: usize, value: &Value, field: &str) -> Result<NaiveDate, MalformedRecord> {
    let raw = require(index, value, field)?
        .as_str()
        .ok_or_else(|| MalformedRecord::new(index, field, "expected a date string"))?;
    NaiveDate::parse_from_str(raw, PURCHASE_DATE_FORMAT)
        .map_err(|_| MalformedRecord::new(index, field, format!("invalid date `{raw}`")))
}

/// Revenue summed per state, with one representative coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRevenueRow {
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub total_revenue: Decimal,
}

/// Sale count per state, with one representative coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateCountRow {
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub quantity: u64,
}

/// Revenue summed per calendar-month bucket.
///
/// `month_end` is the bucket key and disambiguates month names that repeat
/// across years; rows are ordered chronologically by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenueRow {
    pub month_end: NaiveDate,
    pub year: i32,
    pub month_name: String,
    pub total_revenue: Decimal,
}

/// Sale count per calendar-month bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCountRow {
    pub month_end: NaiveDate,
    pub year: i32,
    pub month_name: String,
    pub quantity: u64,
}

/// Revenue summed per product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRevenueRow {
    pub category: String,
    pub total_revenue: Decimal,
}

/// Sale count per product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCountRow {
    pub category: String,
    pub quantity: u64,
}

/// Per-seller totals, both metrics computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerStats {
    pub seller: String,
    pub total_revenue: Decimal,
    pub sale_count: u64,
}

/// Headline metrics over the filtered record set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    /// Total revenue across all records.
    pub total_revenue: Decimal,
    /// Number of sales.
    pub sale_count: u64,
    /// Distinct states present.
    pub state_count: usize,
    /// Distinct product categories present.
    pub category_count: usize,
    /// Distinct sellers present.
    pub seller_count: usize,
    /// Mean price per sale; zero for an empty record set.
    pub average_ticket: Decimal,
}

impl SalesSummary {
    /// Compute the headline metrics from a record set.
    pub fn from_records(records: &[SaleRecord]) -> Self {
        use std::collections::HashSet;

        let total_revenue: Decimal = records.iter().map(|r| r.price).sum();
        let sale_count = records.len() as u64;
        let states: HashSet<&str> = records.iter().map(|r| r.state.as_str()).collect();
        let categories: HashSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let sellers: HashSet<&str> = records.iter().map(|r| r.seller.as_str()).collect();

        let average_ticket = if sale_count == 0 {
            Decimal::ZERO
        } else {
            total_revenue / Decimal::from(sale_count)
        };

        Self {
            total_revenue,
            sale_count,
            state_count: states.len(),
            category_count: categories.len(),
            seller_count: sellers.len(),
            average_ticket,
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Endpoint URL or local file the records came from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Region filter that was applied.
    pub region: String,
    /// Year filter that was applied, if any.
    pub year: Option<i32>,
    /// Seller filter that was applied, empty for no restriction.
    pub sellers: Vec<String>,
    /// Number of records fetched before filtering.
    pub records_fetched: usize,
    /// Number of records that survived the filter stage.
    pub records_kept: usize,
    /// Wall-clock duration of fetch + aggregation in seconds.
    pub duration_seconds: f64,
}

/// The complete sales report: headline metrics plus every summary table.
///
/// Plain structured data; any presentation layer (Markdown, JSON export,
/// a charting frontend) can consume it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Headline metrics.
    pub summary: SalesSummary,
    /// Revenue per state, descending.
    pub revenue_by_state: Vec<StateRevenueRow>,
    /// Revenue per month, chronological.
    pub revenue_by_month: Vec<MonthlyRevenueRow>,
    /// Revenue per category, descending.
    pub revenue_by_category: Vec<CategoryRevenueRow>,
    /// Sale count per state, descending.
    pub count_by_state: Vec<StateCountRow>,
    /// Sale count per month, chronological.
    pub count_by_month: Vec<MonthlyCountRow>,
    /// Sale count per category, descending.
    pub count_by_category: Vec<CategoryCountRow>,
    /// Per-seller totals in first-seen order.
    pub sellers: Vec<SellerStats>,
    /// How many sellers the ranked tables are truncated to.
    pub top_sellers: usize,
}
