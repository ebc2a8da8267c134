//! Shared application state.
//!
//! Built once at startup and cloned into every handler and the request
//! pipeline. The metrics registry lives here and nowhere else; there is no
//! global recorder.

use std::sync::Arc;

use axum::http::HeaderName;
use opsdemo_core::error::Result;

use crate::config::AppConfig;
use crate::obs::{AccessLogger, LogSink, MetricsRegistry, StdoutSink};
use crate::services::ItemStore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<MetricsRegistry>,
    items: Arc<ItemStore>,
}

struct AppStateInner {
    cfg: AppConfig,
    request_id_header: HeaderName,
    access_log: AccessLogger,
}

impl AppState {
    /// Build application state logging to stdout.
    pub fn new(cfg: AppConfig) -> Result<Self> {
        Self::with_log_sink(cfg, Arc::new(StdoutSink))
    }

    /// Build application state with a custom access-log sink.
    pub fn with_log_sink(cfg: AppConfig, sink: Arc<dyn LogSink>) -> Result<Self> {
        cfg.validate()?;

        let request_id_header = cfg.server.request_id_header_name()?;
        let metrics = MetricsRegistry::from_config(&cfg.metrics)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                request_id_header,
                access_log: AccessLogger::new(sink),
            }),
            metrics: Arc::new(metrics),
            items: Arc::new(ItemStore::new()),
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn request_id_header(&self) -> &HeaderName {
        &self.inner.request_id_header
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn access_log(&self) -> &AccessLogger {
        &self.inner.access_log
    }

    pub fn items(&self) -> &ItemStore {
        &self.items
    }
}
