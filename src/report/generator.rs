//! Markdown report generation.
//!
//! This module generates the sales report from the aggregated summary
//! tables. All helpers build plain strings; nothing here touches the
//! network or the aggregation engine.

use crate::models::{ReportMetadata, SalesReport, SalesSummary};
use anyhow::Result;
use rust_decimal::Decimal;

const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Scale a value by thousands and render it with two decimal places and an
/// optional currency prefix.
///
/// Values under 1000 carry no unit word (and keep the trailing separator),
/// values in `[1000, 1_000_000)` are rendered in thousands, everything
/// above in millions.
pub fn format_magnitude(value: Decimal, prefix: &str) -> String {
    if value < THOUSAND {
        format!("{} {:.2} ", prefix, value)
    } else if value < MILLION {
        format!("{} {:.2} thousand", prefix, value / THOUSAND)
    } else {
        format!("{} {:.2} million", prefix, value / MILLION)
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SalesReport, currency: &str) -> String {
    let mut output = String::new();

    output.push_str("# Vendascope Sales Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_metrics_section(&report.summary, currency));

    if report.metadata.records_kept == 0 {
        output.push_str("No records matched the active filters.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    output.push_str(&generate_revenue_section(report));
    output.push_str(&generate_count_section(report));
    output.push_str(&generate_sellers_section(report, currency));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Region:** {}\n", metadata.region));
    match metadata.year {
        Some(year) => section.push_str(&format!("- **Year:** {}\n", year)),
        None => section.push_str("- **Year:** all years\n"),
    }
    if metadata.sellers.is_empty() {
        section.push_str("- **Sellers:** all\n");
    } else {
        section.push_str(&format!("- **Sellers:** {}\n", metadata.sellers.join(", ")));
    }
    section.push_str(&format!(
        "- **Records:** {} kept of {} fetched\n",
        metadata.records_kept, metadata.records_fetched
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the headline metrics section.
fn generate_metrics_section(summary: &SalesSummary, currency: &str) -> String {
    let mut section = String::new();

    section.push_str("## Headline Metrics\n\n");
    section.push_str(&format!(
        "- **Revenue:** {}\n",
        format_magnitude(summary.total_revenue, currency)
    ));
    section.push_str(&format!(
        "- **Sales:** {}\n",
        format_magnitude(Decimal::from(summary.sale_count), "")
    ));
    section.push_str(&format!(
        "- **Average ticket:** {}\n",
        format_magnitude(summary.average_ticket, currency)
    ));
    section.push_str(&format!(
        "- **Coverage:** {} states, {} categories, {} sellers\n",
        summary.state_count, summary.category_count, summary.seller_count
    ));
    section.push('\n');

    section
}

/// Generate the revenue tables.
fn generate_revenue_section(report: &SalesReport) -> String {
    let mut section = String::new();

    section.push_str("## Revenue\n\n");

    section.push_str("### By State\n\n");
    section.push_str("| State | Lat | Lon | Revenue |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for row in &report.revenue_by_state {
        section.push_str(&format!(
            "| {} | {:.2} | {:.2} | {:.2} |\n",
            row.state, row.lat, row.lon, row.total_revenue
        ));
    }
    section.push('\n');

    // The reference dashboard charts only the five best states.
    section.push_str("### Top 5 States\n\n");
    section.push_str("| State | Revenue |\n");
    section.push_str("|:---|---:|\n");
    for row in report.revenue_by_state.iter().take(5) {
        section.push_str(&format!("| {} | {:.2} |\n", row.state, row.total_revenue));
    }
    section.push('\n');

    section.push_str("### Monthly\n\n");
    section.push_str("| Year | Month | Revenue |\n");
    section.push_str("|:---|:---|---:|\n");
    for row in &report.revenue_by_month {
        section.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            row.year, row.month_name, row.total_revenue
        ));
    }
    section.push('\n');

    section.push_str("### By Category\n\n");
    section.push_str("| Category | Revenue |\n");
    section.push_str("|:---|---:|\n");
    for row in &report.revenue_by_category {
        section.push_str(&format!("| {} | {:.2} |\n", row.category, row.total_revenue));
    }
    section.push('\n');

    section
}

/// Generate the sale-count tables.
fn generate_count_section(report: &SalesReport) -> String {
    let mut section = String::new();

    section.push_str("## Sale Counts\n\n");

    section.push_str("### By State\n\n");
    section.push_str("| State | Lat | Lon | Quantity |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for row in &report.count_by_state {
        section.push_str(&format!(
            "| {} | {:.2} | {:.2} | {} |\n",
            row.state, row.lat, row.lon, row.quantity
        ));
    }
    section.push('\n');

    section.push_str("### Monthly\n\n");
    section.push_str("| Year | Month | Quantity |\n");
    section.push_str("|:---|:---|---:|\n");
    for row in &report.count_by_month {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            row.year, row.month_name, row.quantity
        ));
    }
    section.push('\n');

    section.push_str("### By Category\n\n");
    section.push_str("| Category | Quantity |\n");
    section.push_str("|:---|---:|\n");
    for row in &report.count_by_category {
        section.push_str(&format!("| {} | {} |\n", row.category, row.quantity));
    }
    section.push('\n');

    section
}

/// Generate the top-seller tables.
fn generate_sellers_section(report: &SalesReport, currency: &str) -> String {
    use crate::analysis::{top_sellers_by_count, top_sellers_by_revenue};

    let mut section = String::new();
    let n = report.top_sellers;

    section.push_str("## Sellers\n\n");

    section.push_str(&format!("### Top {} by Revenue\n\n", n));
    section.push_str("| Seller | Revenue |\n");
    section.push_str("|:---|---:|\n");
    for stats in top_sellers_by_revenue(&report.sellers, n) {
        section.push_str(&format!(
            "| {} | {} |\n",
            stats.seller,
            format_magnitude(stats.total_revenue, currency)
        ));
    }
    section.push('\n');

    section.push_str(&format!("### Top {} by Sales\n\n", n));
    section.push_str("| Seller | Sales |\n");
    section.push_str("|:---|---:|\n");
    for stats in top_sellers_by_count(&report.sellers, n) {
        section.push_str(&format!("| {} | {} |\n", stats.seller, stats.sale_count));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by vendascope*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SalesReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
