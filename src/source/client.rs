//! Sales payload fetching.
//!
//! This module performs the HTTP GET against the sales endpoint (with
//! `regiao`/`ano` query parameters) and converts the JSON array into typed
//! records, or does the same for a local payload file.

use crate::models::{parse_records, MalformedRecord, Region, SaleRecord};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Data-layer failures, reported to the caller without recovery or default
/// substitution. The rendering layer decides how to present them.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be built, sent, or completed in time.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The response body is not a JSON array of records.
    #[error("{url} did not return a JSON array of records: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A record in the payload is missing a field or holds a bad value.
    #[error(transparent)]
    Malformed(#[from] MalformedRecord),

    /// A local payload file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A local payload file is not a JSON array of records.
    #[error("{path} is not a JSON array of records: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Options for fetching the sales payload.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Region sent as the `regiao` query parameter.
    pub region: Region,
    /// Year sent as the `ano` query parameter (empty when None).
    pub year: Option<i32>,
    /// Bound on the whole request; a hung endpoint fails instead of
    /// blocking the run.
    pub timeout: Duration,
    /// Extra attempts after a retryable failure.
    pub retries: usize,
    /// Whether to show a spinner while the request is in flight.
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            region: Region::Brasil,
            year: None,
            timeout: Duration::from_secs(30),
            retries: 2,
            show_progress: true,
        }
    }
}

/// Fetch and parse the sales payload from the remote endpoint.
pub async fn fetch_records(
    endpoint: &str,
    options: &FetchOptions,
) -> Result<Vec<SaleRecord>, SourceError> {
    info!("Fetching sales records from: {}", endpoint);
    debug!(
        "Query: regiao={:?} ano={:?}, timeout {}s, {} retries",
        options.region.query_value(),
        options.year,
        options.timeout.as_secs(),
        options.retries
    );

    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|source| SourceError::Request {
            url: endpoint.to_string(),
            source,
        })?;

    let year_param = options.year.map(|y| y.to_string()).unwrap_or_default();
    let query = [
        ("regiao", options.region.query_value().to_string()),
        ("ano", year_param),
    ];

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap(),
        );
        pb.set_message("Downloading sales records...");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let mut attempt = 0;
    let result = loop {
        attempt += 1;
        match request_once(&client, endpoint, &query).await {
            Ok(values) => break Ok(values),
            Err(err) if attempt <= options.retries && is_retryable(&err) => {
                warn!("Fetch attempt {} failed: {}; retrying", attempt, err);
            }
            Err(err) => break Err(err),
        }
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let values = result?;
    debug!("Fetched {} raw records", values.len());

    let records = parse_records(&values)?;
    info!("Parsed {} sales records", records.len());
    Ok(records)
}

async fn request_once(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String); 2],
) -> Result<Vec<Value>, SourceError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| SourceError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }

    response
        .json::<Vec<Value>>()
        .await
        .map_err(|source| SourceError::Decode {
            url: url.to_string(),
            source,
        })
}

/// Timeouts, connection failures, and 5xx answers are worth another try;
/// malformed payloads are not.
fn is_retryable(err: &SourceError) -> bool {
    match err {
        SourceError::Request { source, .. } => source.is_timeout() || source.is_connect(),
        SourceError::Status { status, .. } => status.is_server_error(),
        _ => false,
    }
}

/// Load and parse a sales payload from a local JSON file.
///
/// Same contract as [`fetch_records`]; the `--input` escape hatch for
/// offline runs and tests.
pub fn load_records(path: &Path) -> Result<Vec<SaleRecord>, SourceError> {
    info!("Loading sales records from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let values: Vec<Value> =
        serde_json::from_str(&content).map_err(|source| SourceError::InvalidJson {
            path: path.display().to_string(),
            source,
        })?;

    let records = parse_records(&values)?;
    info!("Parsed {} sales records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_payload(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_records_from_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/vendas_sample.json");
        let records = load_records(&path).unwrap();

        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| !r.seller.is_empty()));
    }

    #[test]
    fn test_load_records_rejects_non_array() {
        let file = write_payload(r#"{"not": "an array"}"#);
        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidJson { .. }));
    }

    #[test]
    fn test_load_records_reports_malformed_record() {
        let file = write_payload(
            r#"[{"Produto": "X", "Categoria do Produto": "livros", "Preço": 10.0,
                 "Frete": 1.0, "Data da Compra": "01/01/2021", "Vendedor": "Ana",
                 "Local da compra": "SP", "Avaliação da compra": 4,
                 "Tipo de pagamento": "boleto", "Quantidade de parcelas": 1,
                 "lat": -23.5, "lon": -46.6},
                {"Produto": "Y"}]"#,
        );

        let err = load_records(file.path()).unwrap_err();
        match err {
            SourceError::Malformed(inner) => assert_eq!(inner.index, 1),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_retryable_classification() {
        let status_500 = SourceError::Status {
            url: "http://example.test".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        let status_404 = SourceError::Status {
            url: "http://example.test".to_string(),
            status: StatusCode::NOT_FOUND,
        };

        assert!(is_retryable(&status_500));
        assert!(!is_retryable(&status_404));
        assert!(!is_retryable(&SourceError::Malformed(
            crate::models::parse_records(&[serde_json::json!({})]).unwrap_err()
        )));
    }

    #[test]
    fn test_fetch_options_default() {
        let opts = FetchOptions::default();
        assert!(opts.region.is_unrestricted());
        assert!(opts.year.is_none());
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(opts.show_progress);
    }
}
