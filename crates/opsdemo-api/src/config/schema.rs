use std::net::SocketAddr;

use axum::http::HeaderName;
use serde::Deserialize;
use opsdemo_core::error::{OpsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(OpsError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Header carrying the correlation id in both directions.
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_id_header: default_request_id_header(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.request_id_header_name()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            OpsError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }

    pub fn request_id_header_name(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.request_id_header.as_bytes()).map_err(|e| {
            OpsError::BadRequest(format!(
                "server.request_id_header is not a valid header name: {e}"
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_request_id_header() -> String {
    "x-request-id".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Histogram upper bounds in seconds, strictly increasing.
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets: Vec<f64>,

    /// Upper bound on distinct (method, path, status) label sets.
    #[serde(default = "default_max_series")]
    pub max_series: usize,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            latency_buckets: default_latency_buckets(),
            max_series: default_max_series(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        validate_buckets(&self.latency_buckets)?;
        if self.max_series == 0 {
            return Err(OpsError::BadRequest(
                "metrics.max_series must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Bucket bounds must be non-empty, finite, positive, strictly increasing.
pub fn validate_buckets(buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(OpsError::BadRequest(
            "metrics.latency_buckets must not be empty".into(),
        ));
    }
    if buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
        return Err(OpsError::BadRequest(
            "metrics.latency_buckets must be finite and positive".into(),
        ));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(OpsError::BadRequest(
            "metrics.latency_buckets must be strictly increasing".into(),
        ));
    }
    Ok(())
}

fn default_latency_buckets() -> Vec<f64> {
    vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
}
fn default_max_series() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_filter() -> String {
    "info".into()
}

/// Formatter for operational (stderr) diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
