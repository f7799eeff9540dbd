//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Vendascope - sales reporting CLI for the labdados sales dataset
///
/// Fetch the sales payload, narrow it by region, year, and sellers, and
/// render the aggregated summary tables as a Markdown or JSON report.
///
/// Examples:
///   vendascope
///   vendascope --region sudeste --year 2022
///   vendascope --sellers "Ana Souza,Beto Lima" --top-sellers 3
///   vendascope --input fixtures/vendas_sample.json --format json
///   vendascope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Region to restrict the report to
    ///
    /// `brasil` means no regional restriction.
    #[arg(short, long, value_enum, default_value_t = RegionArg::Brasil)]
    pub region: RegionArg,

    /// Restrict the report to a single year
    ///
    /// The dataset covers 2020 through 2023. Omit for all years.
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Sellers to keep (comma-separated)
    ///
    /// Example: --sellers "Ana Souza,Beto Lima"
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub sellers: Option<Vec<String>>,

    /// How many sellers the ranked tables show (2-10)
    #[arg(long, value_name = "COUNT")]
    pub top_sellers: Option<usize>,

    /// Sales endpoint URL
    ///
    /// Can also be set via VENDASCOPE_ENDPOINT or .vendascope.toml.
    #[arg(long, value_name = "URL", env = "VENDASCOPE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Extra attempts after a retryable fetch failure
    #[arg(long, value_name = "NUM")]
    pub retries: Option<usize>,

    /// Local JSON payload to report on instead of fetching
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Currency prefix for formatted amounts
    #[arg(long, value_name = "PREFIX")]
    pub currency: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vendascope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .vendascope.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Dry run: fetch and filter, print what would be reported, exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Region choice on the CLI surface; converted to the domain type in main.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RegionArg {
    /// Whole country (no restriction)
    #[default]
    Brasil,
    CentroOeste,
    Nordeste,
    Norte,
    Sudeste,
    Sul,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate endpoint URL format
        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate year range (dataset coverage)
        if let Some(year) = self.year {
            if !(2020..=2023).contains(&year) {
                return Err("Year must be between 2020 and 2023".to_string());
            }
        }

        // Validate top-sellers range (reference surface bounds)
        if let Some(top_sellers) = self.top_sellers {
            if !(2..=10).contains(&top_sellers) {
                return Err("Top sellers must be between 2 and 10".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate input file if provided
        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            region: RegionArg::Brasil,
            year: None,
            sellers: None,
            top_sellers: None,
            endpoint: None,
            timeout: None,
            retries: None,
            input: None,
            output: None,
            format: OutputFormat::Markdown,
            currency: None,
            config: None,
            init_config: false,
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_endpoint() {
        let mut args = make_args();
        args.endpoint = Some("ftp://example.test".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_year_bounds() {
        let mut args = make_args();
        args.year = Some(2019);
        assert!(args.validate().is_err());

        args.year = Some(2020);
        assert!(args.validate().is_ok());

        args.year = Some(2024);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_top_sellers_bounds() {
        let mut args = make_args();
        args.top_sellers = Some(1);
        assert!(args.validate().is_err());

        args.top_sellers = Some(2);
        assert!(args.validate().is_ok());

        args.top_sellers = Some(10);
        assert!(args.validate().is_ok());

        args.top_sellers = Some(11);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.init_config = true;
        args.year = Some(1999);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
