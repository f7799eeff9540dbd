//! Vendascope - Sales Report Generator
//!
//! A CLI tool that fetches the labdados sales payload, filters it by
//! region, year, and sellers, and renders the aggregated summary tables
//! as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (fetch failure, malformed payload, config, I/O)

mod analysis;
mod cli;
mod config;
mod filter;
mod models;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat, RegionArg};
use config::Config;
use filter::SaleFilter;
use models::{Region, ReportMetadata, SaleRecord, SalesReport, SalesSummary};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Vendascope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the report
    match run_report(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .vendascope.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".vendascope.toml");

    if path.exists() {
        eprintln!("⚠️  .vendascope.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .vendascope.toml")?;

    println!("✅ Created .vendascope.toml with default settings.");
    println!("   Edit it to customize the endpoint, timeout, and report defaults.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete report workflow.
async fn run_report(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let region = region_from_arg(args.region);
    let year = args.year;
    let sellers: Vec<String> = args.sellers.clone().unwrap_or_default();

    // Step 1: Obtain the records
    let (records, source_label) = obtain_records(&args, &config, region, year).await?;
    info!("Obtained {} records from {}", records.len(), source_label);

    // Step 2: Filter
    let sale_filter = SaleFilter::new(region, year, sellers.clone());
    if sale_filter.is_unrestricted() {
        debug!("No filters active; reporting on the whole dataset");
    }
    let kept = filter::filter_records(&records, &sale_filter);
    info!(
        "{} of {} records match the active filters",
        kept.len(),
        records.len()
    );

    // Handle --dry-run: show what would be reported and exit
    if args.dry_run {
        return handle_dry_run(&records, &kept);
    }

    // Step 3: Aggregate
    println!("📊 Aggregating {} records...", kept.len());
    let summary = SalesSummary::from_records(&kept);

    let metadata = ReportMetadata {
        source: source_label,
        generated_at: Utc::now(),
        region: region.to_string(),
        year,
        sellers,
        records_fetched: records.len(),
        records_kept: kept.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let sales_report = SalesReport {
        metadata,
        summary,
        revenue_by_state: analysis::revenue_by_state(&kept),
        revenue_by_month: analysis::revenue_by_month(&kept),
        revenue_by_category: analysis::revenue_by_category(&kept),
        count_by_state: analysis::count_by_state(&kept),
        count_by_month: analysis::count_by_month(&kept),
        count_by_category: analysis::count_by_category(&kept),
        sellers: analysis::seller_stats(&kept),
        top_sellers: config.report.top_sellers,
    };

    // Step 4: Render and save the report
    println!("📝 Generating report...");
    let output = match args.format {
        OutputFormat::Markdown => {
            report::generate_markdown_report(&sales_report, &config.report.currency)
        }
        OutputFormat::Json => report::generate_json_report(&sales_report)?,
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    let currency = &config.report.currency;
    println!("\n📊 Sales Summary:");
    println!(
        "   Revenue: {}",
        report::format_magnitude(sales_report.summary.total_revenue, currency)
    );
    println!(
        "   Sales: {}",
        report::format_magnitude(Decimal::from(sales_report.summary.sale_count), "")
    );
    println!(
        "   States: {} | Categories: {} | Sellers: {}",
        sales_report.summary.state_count,
        sales_report.summary.category_count,
        sales_report.summary.seller_count
    );
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Report complete! Saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Handle --dry-run: print filter results, no report written.
fn handle_dry_run(fetched: &[SaleRecord], kept: &[SaleRecord]) -> Result<()> {
    use std::collections::BTreeSet;

    println!("\n🔍 Dry run: no report will be written.\n");
    println!("   Records obtained: {}", fetched.len());
    println!("   Records after filters: {}", kept.len());

    let sellers: BTreeSet<&str> = kept.iter().map(|r| r.seller.as_str()).collect();
    if sellers.is_empty() {
        println!("   No sellers in the filtered result.");
    } else {
        println!("   Sellers in the filtered result ({}):\n", sellers.len());
        for seller in sellers {
            println!("     👤 {}", seller);
        }
    }

    println!("\n✅ Dry run complete.");
    Ok(())
}

/// Convert the CLI region choice to the domain type.
fn region_from_arg(region: RegionArg) -> Region {
    match region {
        RegionArg::Brasil => Region::Brasil,
        RegionArg::CentroOeste => Region::CentroOeste,
        RegionArg::Nordeste => Region::Nordeste,
        RegionArg::Norte => Region::Norte,
        RegionArg::Sudeste => Region::Sudeste,
        RegionArg::Sul => Region::Sul,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .vendascope.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Get the records from the local file or the remote endpoint.
async fn obtain_records(
    args: &Args,
    config: &Config,
    region: Region,
    year: Option<i32>,
) -> Result<(Vec<SaleRecord>, String)> {
    // Use local payload if specified
    if let Some(ref input) = args.input {
        println!("📥 Loading records from: {}", input.display());
        let records = source::load_records(input)
            .with_context(|| format!("Failed to load records from {}", input.display()))?;
        return Ok((records, input.display().to_string()));
    }

    // Fetch from the endpoint
    let endpoint = config.source.endpoint.clone();
    println!("📥 Fetching records from: {}", endpoint);

    let options = source::FetchOptions {
        region,
        year,
        timeout: Duration::from_secs(config.source.timeout_seconds),
        retries: config.source.retries,
        show_progress: !args.quiet,
    };

    let records = source::fetch_records(&endpoint, &options)
        .await
        .context("Failed to fetch sales records")?;

    Ok((records, endpoint))
}
