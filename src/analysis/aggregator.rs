//! Record aggregation and statistics.
//!
//! This module provides the pure query operations that turn a (filtered)
//! record collection into the summary tables consumed by the report layer.
//! All groupings share one parameterized group-and-reduce routine so the
//! revenue and count variants cannot drift apart.

use crate::models::{
    CategoryCountRow, CategoryRevenueRow, MonthlyCountRow, MonthlyRevenueRow, SaleRecord,
    SellerStats, StateCountRow, StateRevenueRow,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::hash::Hash;

/// Per-group accumulator: Decimal price sum and record count, both kept so
/// one pass serves every query.
#[derive(Debug, Clone, Copy, Default)]
struct Metrics {
    sum: Decimal,
    count: u64,
}

/// Groups in first-seen order with their accumulated metrics.
///
/// First-seen order is the deterministic tie-break base: the row builders
/// sort with a stable sort, so groups with equal metrics keep this order.
struct GroupTotals<K> {
    order: Vec<K>,
    entries: HashMap<K, Metrics>,
}

impl<K: Eq + Hash + Clone> GroupTotals<K> {
    fn into_rows<R>(self, mut build: impl FnMut(K, Metrics) -> R) -> Vec<R> {
        let GroupTotals { order, mut entries } = self;
        order
            .into_iter()
            .map(|key| {
                let metrics = entries.remove(&key).unwrap_or_default();
                build(key, metrics)
            })
            .collect()
    }
}

/// Single-pass group-and-reduce over a record slice.
fn group_by<K, F>(records: &[SaleRecord], key_of: F) -> GroupTotals<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&SaleRecord) -> K,
{
    let mut order = Vec::new();
    let mut entries: HashMap<K, Metrics> = HashMap::new();

    for record in records {
        let key = key_of(record);
        if !entries.contains_key(&key) {
            order.push(key.clone());
        }
        let metrics = entries.entry(key).or_default();
        metrics.sum += record.price;
        metrics.count += 1;
    }

    GroupTotals { order, entries }
}

/// First-occurrence coordinates per state, attached to the state tables.
fn state_coordinates(records: &[SaleRecord]) -> HashMap<String, (f64, f64)> {
    let mut coords = HashMap::new();
    for record in records {
        coords
            .entry(record.state.clone())
            .or_insert((record.lat, record.lon));
    }
    coords
}

/// Calendar month-end bucket of a date.
fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .expect("first day of a month always has a predecessor")
}

fn month_name(bucket: NaiveDate) -> String {
    bucket.format("%B").to_string()
}

/// Total revenue across all records.
#[allow(dead_code)] // Utility for metric consumers
pub fn total_revenue(records: &[SaleRecord]) -> Decimal {
    records.iter().map(|record| record.price).sum()
}

/// Revenue per state, descending, with one representative coordinate pair
/// per state (first occurrence).
pub fn revenue_by_state(records: &[SaleRecord]) -> Vec<StateRevenueRow> {
    let coords = state_coordinates(records);
    let mut rows = group_by(records, |r| r.state.clone()).into_rows(|state, metrics| {
        let (lat, lon) = coords.get(&state).copied().unwrap_or_default();
        StateRevenueRow {
            state,
            lat,
            lon,
            total_revenue: metrics.sum,
        }
    });
    rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    rows
}

/// Sale count per state, descending, with representative coordinates.
pub fn count_by_state(records: &[SaleRecord]) -> Vec<StateCountRow> {
    let coords = state_coordinates(records);
    let mut rows = group_by(records, |r| r.state.clone()).into_rows(|state, metrics| {
        let (lat, lon) = coords.get(&state).copied().unwrap_or_default();
        StateCountRow {
            state,
            lat,
            lon,
            quantity: metrics.count,
        }
    });
    rows.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    rows
}

/// Revenue per calendar-month bucket, ordered chronologically.
///
/// Rows carry the year alongside the month name, since month names repeat
/// across years and must be disambiguated when charted.
pub fn revenue_by_month(records: &[SaleRecord]) -> Vec<MonthlyRevenueRow> {
    let mut rows =
        group_by(records, |r| month_end(r.purchase_date)).into_rows(|bucket, metrics| {
            MonthlyRevenueRow {
                month_end: bucket,
                year: bucket.year(),
                month_name: month_name(bucket),
                total_revenue: metrics.sum,
            }
        });
    rows.sort_by_key(|row| row.month_end);
    rows
}

/// Sale count per calendar-month bucket, ordered chronologically.
pub fn count_by_month(records: &[SaleRecord]) -> Vec<MonthlyCountRow> {
    let mut rows =
        group_by(records, |r| month_end(r.purchase_date)).into_rows(|bucket, metrics| {
            MonthlyCountRow {
                month_end: bucket,
                year: bucket.year(),
                month_name: month_name(bucket),
                quantity: metrics.count,
            }
        });
    rows.sort_by_key(|row| row.month_end);
    rows
}

/// Revenue per product category, descending.
pub fn revenue_by_category(records: &[SaleRecord]) -> Vec<CategoryRevenueRow> {
    let mut rows = group_by(records, |r| r.category.clone()).into_rows(|category, metrics| {
        CategoryRevenueRow {
            category,
            total_revenue: metrics.sum,
        }
    });
    rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    rows
}

/// Sale count per product category, descending.
pub fn count_by_category(records: &[SaleRecord]) -> Vec<CategoryCountRow> {
    let mut rows = group_by(records, |r| r.category.clone()).into_rows(|category, metrics| {
        CategoryCountRow {
            category,
            quantity: metrics.count,
        }
    });
    rows.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    rows
}

/// Per-seller totals, both metrics in one pass, in first-seen order.
///
/// Consumers rank this by either metric via [`top_sellers_by_revenue`] and
/// [`top_sellers_by_count`].
pub fn seller_stats(records: &[SaleRecord]) -> Vec<SellerStats> {
    group_by(records, |r| r.seller.clone()).into_rows(|seller, metrics| SellerStats {
        seller,
        total_revenue: metrics.sum,
        sale_count: metrics.count,
    })
}

/// Top `n` sellers by revenue, descending. Any `n` is accepted: zero yields
/// an empty list, an oversized `n` yields every seller with no padding.
pub fn top_sellers_by_revenue(stats: &[SellerStats], n: usize) -> Vec<SellerStats> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    ranked.truncate(n);
    ranked
}

/// Top `n` sellers by sale count, descending.
pub fn top_sellers_by_count(stats: &[SellerStats], n: usize) -> Vec<SellerStats> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| b.sale_count.cmp(&a.sale_count));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(state: &str, seller: &str, category: &str, price: i64, date: &str) -> SaleRecord {
        SaleRecord {
            product: "Produto X".to_string(),
            category: category.to_string(),
            price: Decimal::from(price),
            freight: 12.5,
            purchase_date: NaiveDate::parse_from_str(date, "%d/%m/%Y").unwrap(),
            seller: seller.to_string(),
            state: state.to_string(),
            rating: 5,
            payment_type: "cartao_credito".to_string(),
            installments: 2,
            lat: match state {
                "SP" => -23.55,
                "RJ" => -22.91,
                _ => -12.97,
            },
            lon: -46.63,
        }
    }

    fn sample() -> Vec<SaleRecord> {
        vec![
            sale("SP", "Ana", "eletronicos", 100, "10/01/2021"),
            sale("SP", "Beto", "livros", 200, "20/02/2021"),
            sale("RJ", "Ana", "eletronicos", 50, "05/01/2021"),
        ]
    }

    #[test]
    fn test_revenue_by_state_sorted_descending() {
        let rows = revenue_by_state(&sample());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state, "SP");
        assert_eq!(rows[0].total_revenue, Decimal::from(300));
        assert_eq!(rows[1].state, "RJ");
        assert_eq!(rows[1].total_revenue, Decimal::from(50));
    }

    #[test]
    fn test_count_by_state() {
        let rows = count_by_state(&sample());

        assert_eq!(rows[0].state, "SP");
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[1].state, "RJ");
        assert_eq!(rows[1].quantity, 1);
    }

    #[test]
    fn test_state_rows_carry_first_occurrence_coordinates() {
        let mut records = sample();
        records.push({
            let mut r = sale("SP", "Caio", "livros", 10, "01/03/2021");
            r.lat = 0.0;
            r.lon = 0.0;
            r
        });

        let rows = revenue_by_state(&records);
        let sp = rows.iter().find(|r| r.state == "SP").unwrap();
        assert_eq!(sp.lat, -23.55);
    }

    #[test]
    fn test_revenue_partitions_are_consistent() {
        let records = sample();
        let total = total_revenue(&records);

        let by_state: Decimal = revenue_by_state(&records)
            .iter()
            .map(|r| r.total_revenue)
            .sum();
        let by_category: Decimal = revenue_by_category(&records)
            .iter()
            .map(|r| r.total_revenue)
            .sum();
        let by_month: Decimal = revenue_by_month(&records)
            .iter()
            .map(|r| r.total_revenue)
            .sum();

        assert_eq!(by_state, total);
        assert_eq!(by_category, total);
        assert_eq!(by_month, total);
    }

    #[test]
    fn test_counts_sum_to_input_length() {
        let records = sample();
        let by_state: u64 = count_by_state(&records).iter().map(|r| r.quantity).sum();
        let by_category: u64 = count_by_category(&records).iter().map(|r| r.quantity).sum();

        assert_eq!(by_state, records.len() as u64);
        assert_eq!(by_category, records.len() as u64);
    }

    #[test]
    fn test_monthly_buckets_are_chronological_across_years() {
        let records = vec![
            sale("SP", "Ana", "livros", 10, "15/01/2022"),
            sale("SP", "Ana", "livros", 20, "15/12/2021"),
            sale("SP", "Ana", "livros", 30, "15/01/2021"),
        ];

        let rows = revenue_by_month(&records);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].month_end, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        assert_eq!(rows[1].month_end, NaiveDate::from_ymd_opt(2021, 12, 31).unwrap());
        assert_eq!(rows[2].month_end, NaiveDate::from_ymd_opt(2022, 1, 31).unwrap());

        // Same month name in different years stays distinguishable.
        assert_eq!(rows[0].month_name, "January");
        assert_eq!(rows[2].month_name, "January");
        assert_eq!(rows[0].year, 2021);
        assert_eq!(rows[2].year, 2022);
    }

    #[test]
    fn test_month_end_bucketing() {
        let records = vec![
            sale("SP", "Ana", "livros", 10, "01/02/2021"),
            sale("SP", "Ana", "livros", 20, "28/02/2021"),
        ];

        let rows = count_by_month(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].month_end, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
        assert_eq!(rows[0].quantity, 2);
    }

    #[test]
    fn test_month_end_handles_leap_year_and_december() {
        assert_eq!(
            month_end(NaiveDate::from_ymd_opt(2020, 2, 10).unwrap()),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()
        );
        assert_eq!(
            month_end(NaiveDate::from_ymd_opt(2021, 12, 3).unwrap()),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_revenue_by_category_sorted_descending() {
        let rows = revenue_by_category(&sample());
        assert_eq!(rows[0].category, "livros");
        assert_eq!(rows[0].total_revenue, Decimal::from(200));
        assert_eq!(rows[1].category, "eletronicos");
        assert_eq!(rows[1].total_revenue, Decimal::from(150));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            sale("BA", "Ana", "moveis", 100, "01/01/2021"),
            sale("SP", "Ana", "livros", 100, "02/01/2021"),
            sale("RJ", "Ana", "brinquedos", 100, "03/01/2021"),
        ];

        let rows = revenue_by_state(&records);
        let order: Vec<&str> = rows.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["BA", "SP", "RJ"]);
    }

    #[test]
    fn test_seller_stats_single_pass_totals() {
        let stats = seller_stats(&sample());

        assert_eq!(stats.len(), 2);
        let ana = stats.iter().find(|s| s.seller == "Ana").unwrap();
        assert_eq!(ana.total_revenue, Decimal::from(150));
        assert_eq!(ana.sale_count, 2);
        let beto = stats.iter().find(|s| s.seller == "Beto").unwrap();
        assert_eq!(beto.total_revenue, Decimal::from(200));
        assert_eq!(beto.sale_count, 1);
    }

    #[test]
    fn test_top_sellers_by_each_metric() {
        let stats = seller_stats(&sample());

        let by_revenue = top_sellers_by_revenue(&stats, 1);
        assert_eq!(by_revenue.len(), 1);
        assert_eq!(by_revenue[0].seller, "Beto");

        let by_count = top_sellers_by_count(&stats, 1);
        assert_eq!(by_count[0].seller, "Ana");
    }

    #[test]
    fn test_top_sellers_bounds() {
        let stats = seller_stats(&sample());

        assert!(top_sellers_by_revenue(&stats, 0).is_empty());
        // Oversized N returns all sellers, no padding.
        assert_eq!(top_sellers_by_revenue(&stats, 10).len(), 2);
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        let records: Vec<SaleRecord> = Vec::new();

        assert!(revenue_by_state(&records).is_empty());
        assert!(revenue_by_month(&records).is_empty());
        assert!(revenue_by_category(&records).is_empty());
        assert!(count_by_state(&records).is_empty());
        assert!(seller_stats(&records).is_empty());
        assert_eq!(total_revenue(&records), Decimal::ZERO);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = sample();
        assert_eq!(revenue_by_state(&records), revenue_by_state(&records));
        assert_eq!(count_by_month(&records), count_by_month(&records));
        assert_eq!(seller_stats(&records), seller_stats(&records));
    }

    #[test]
    fn test_input_is_not_mutated_by_aggregation() {
        let records = sample();
        let before = records.clone();
        let _ = revenue_by_state(&records);
        let _ = seller_stats(&records);
        assert_eq!(records, before);
    }

    #[test]
    fn test_decimal_sums_do_not_drift() {
        // 0.1 + 0.2 repeated: exact under Decimal, drifts under f64.
        let mut records = Vec::new();
        for i in 0..1000 {
            let mut r = sale("SP", "Ana", "livros", 0, "01/01/2021");
            r.price = if i % 2 == 0 {
                Decimal::new(1, 1) // 0.1
            } else {
                Decimal::new(2, 1) // 0.2
            };
            records.push(r);
        }

        assert_eq!(total_revenue(&records), Decimal::from(150));
    }
}
