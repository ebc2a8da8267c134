//! Observability: request metrics, the JSON access log, and operational
//! diagnostics.
//!
//! Metrics and access records are produced by the request pipeline and live
//! in `AppState`. Diagnostics (startup, failures inside the instrumentation
//! itself) use `tracing` and go to stderr, leaving stdout to the access log.

pub mod access_log;
pub mod metrics;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingSection};

pub use access_log::{AccessLogger, LogRecord, LogSink, MemorySink, StdoutSink};
pub use metrics::{MetricKey, MetricsRegistry, Series, OTHER_METHOD};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the config.
pub fn init_tracing(cfg: &LoggingSection) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    match cfg.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
