//! Per-request JSON access log.
//!
//! Every completed request produces one `LogRecord`, serialized as a single
//! JSON line and handed to a `LogSink` in one write. The production sink is
//! process stdout; diagnostics go through `tracing` on stderr so the two
//! streams never mix.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Immutable record of one completed request.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    request_id: String,
    method: String,
    path: String,
    status: u16,
    latency_ms: f64,
    timestamp: String,
}

impl LogRecord {
    pub fn new(
        request_id: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        latency: Duration,
    ) -> Self {
        Self::at(request_id, method, path, status, latency, Utc::now())
    }

    pub fn at(
        request_id: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        latency: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let latency_ms = (latency.as_secs_f64() * 1_000_000.0).round() / 1000.0;
        Self {
            request_id: request_id.into(),
            method: method.into(),
            path: path.into(),
            status,
            latency_ms,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
    pub fn status(&self) -> u16 {
        self.status
    }
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }
}

/// Destination for serialized records. One call per complete line.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

/// Writes to process stdout, holding the stdout lock for the whole line.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line)?;
        out.flush()
    }
}

/// Keeps lines in memory. Used when embedding the service and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Lines parsed back into JSON values; unparsable lines are skipped.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(line).trim_end_matches('\n').to_owned();
        self.lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink poisoned"))?
            .push(text);
        Ok(())
    }
}

/// Structured logger in front of a sink. Best effort: failures never reach
/// the caller.
pub struct AccessLogger {
    sink: Arc<dyn LogSink>,
}

impl AccessLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, record: LogRecord) {
        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    request_id = %record.request_id,
                    "access log serialize failed"
                );
                return;
            }
        };
        line.push(b'\n');

        if let Err(e) = self.sink.write_line(&line) {
            tracing::warn!(error = %e, request_id = %record.request_id, "access log write failed");
        }
    }
}
