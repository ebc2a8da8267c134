//! Service config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use opsdemo_core::error::{OpsError, Result};

pub use schema::{AppConfig, LogFormat, LoggingSection, MetricsSection, ServerSection};

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| OpsError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like `load_from_file`, but a missing file yields the validated defaults.
pub fn load_or_default(path: &str) -> Result<AppConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let cfg = AppConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(OpsError::Internal(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)
        .map_err(|e| OpsError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
