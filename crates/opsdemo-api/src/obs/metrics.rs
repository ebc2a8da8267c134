//! Request metrics registry.
//!
//! One series per (method, route template, status). Each series holds the
//! request counter and the latency histogram side by side, and both are
//! updated while the owning `DashMap` shard is write-locked, so a concurrent
//! `render` copies a series either before or after a request, never halfway.
//! Histogram buckets are cumulative with configurable bounds in seconds.

use std::cmp::Ordering as CmpOrdering;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::Method;
use dashmap::DashMap;
use opsdemo_core::error::{OpsError, Result};

use crate::config::schema::{validate_buckets, MetricsSection};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_LATENCY: &str = "http_request_latency_seconds";
pub const DROPPED_TOTAL: &str = "opsdemo_metrics_dropped_total";

/// Method label for any verb outside the standard nine.
pub const OTHER_METHOD: &str = "OTHER";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Bounded method label; extension tokens collapse into `OTHER_METHOD`.
fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => OTHER_METHOD,
    }
}

/// Label set of one series. `route` is always a template, never a raw path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub method: &'static str,
    pub route: String,
    pub status: u16,
}

impl MetricKey {
    pub fn new(method: Method, route: impl Into<String>, status: u16) -> Self {
        Self {
            method: method_label(&method),
            route: route.into(),
            status,
        }
    }

    fn cmp_render(&self, other: &Self) -> CmpOrdering {
        (self.method, self.route.as_str(), self.status).cmp(&(
            other.method,
            other.route.as_str(),
            other.status,
        ))
    }

    fn label_str(&self) -> String {
        format!(
            "method=\"{}\",path=\"{}\",status=\"{}\"",
            self.method,
            escape_label(&self.route),
            self.status
        )
    }
}

/// Counter and histogram state for one label set.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    requests: u64,
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Series {
    fn new(bucket_len: usize) -> Self {
        Self {
            requests: 0,
            buckets: vec![0; bucket_len],
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, bounds: &[f64], secs: f64) {
        self.requests += 1;
        self.count += 1;
        self.sum += secs;

        // Cumulative: every bucket whose bound is >= the observation.
        for (slot, &le) in self.buckets.iter_mut().zip(bounds) {
            if secs <= le {
                *slot += 1;
            }
        }
    }

    /// Counter value (`http_requests_total`).
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Cumulative bucket counts, one per configured bound.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Running sum of observed seconds.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Histogram observation count (the `+Inf` bucket).
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Process-wide request metrics.
#[derive(Debug)]
pub struct MetricsRegistry {
    bounds: Box<[f64]>,
    max_series: usize,
    series: DashMap<MetricKey, Series>,
    dropped: AtomicU64,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        let section = MetricsSection::default();
        Self {
            bounds: section.latency_buckets.into_boxed_slice(),
            max_series: section.max_series,
            series: DashMap::new(),
            dropped: AtomicU64::new(0),
        }
    }
}

impl MetricsRegistry {
    pub fn new(bounds: Vec<f64>, max_series: usize) -> Result<Self> {
        validate_buckets(&bounds)?;
        if max_series == 0 {
            return Err(OpsError::BadRequest("max_series must be at least 1".into()));
        }
        Ok(Self {
            bounds: bounds.into_boxed_slice(),
            max_series,
            series: DashMap::new(),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn from_config(cfg: &MetricsSection) -> Result<Self> {
        Self::new(cfg.latency_buckets.clone(), cfg.max_series)
    }

    /// Count one request and observe its latency as a single step.
    ///
    /// Fails only when `key` would be a new series beyond `max_series`; the
    /// update is then dropped and counted in `opsdemo_metrics_dropped_total`.
    pub fn record_request(&self, key: MetricKey, duration_secs: f64) -> Result<()> {
        let secs = if duration_secs.is_finite() && duration_secs > 0.0 {
            duration_secs
        } else {
            0.0
        };

        if let Some(mut series) = self.series.get_mut(&key) {
            series.observe(&self.bounds, secs);
            return Ok(());
        }

        // Soft bound: racing inserts of distinct new keys may overshoot slightly.
        if self.series.len() >= self.max_series {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(OpsError::SeriesLimit(self.max_series));
        }

        let mut series = self
            .series
            .entry(key)
            .or_insert_with(|| Series::new(self.bounds.len()));
        series.observe(&self.bounds, secs);
        Ok(())
    }

    /// Copy of one series, if it has been recorded.
    pub fn series(&self, key: &MetricKey) -> Option<Series> {
        self.series.get(key).map(|s| s.value().clone())
    }

    /// Cumulative count of the bucket with bound `le`.
    pub fn bucket_count(&self, key: &MetricKey, le: f64) -> Option<u64> {
        let idx = self.bounds.iter().position(|b| *b == le)?;
        self.series.get(key).map(|s| s.buckets[idx])
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Number of distinct label sets.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Updates dropped by the series bound.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Render in Prometheus text exposition format.
    ///
    /// Series are copied one at a time under their shard lock and then sorted,
    /// so the output is deterministic and each series is self-consistent.
    pub fn render(&self) -> String {
        let mut snapshot: Vec<(MetricKey, Series)> = self
            .series
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp_render(&b.0));

        let mut out = String::new();
        self.render_counter(&snapshot, &mut out);
        self.render_histogram(&snapshot, &mut out);

        let _ = writeln!(
            out,
            "# HELP {} Metric updates dropped by the series limit",
            DROPPED_TOTAL
        );
        let _ = writeln!(out, "# TYPE {} counter", DROPPED_TOTAL);
        let _ = writeln!(out, "{} {}", DROPPED_TOTAL, self.dropped());
        out
    }

    fn render_counter(&self, snapshot: &[(MetricKey, Series)], out: &mut String) {
        let _ = writeln!(out, "# HELP {} Total HTTP requests", REQUESTS_TOTAL);
        let _ = writeln!(out, "# TYPE {} counter", REQUESTS_TOTAL);
        for (key, series) in snapshot {
            let _ = writeln!(
                out,
                "{}{{{}}} {}",
                REQUESTS_TOTAL,
                key.label_str(),
                series.requests
            );
        }
    }

    fn render_histogram(&self, snapshot: &[(MetricKey, Series)], out: &mut String) {
        let _ = writeln!(out, "# HELP {} Latency per HTTP request", REQUEST_LATENCY);
        let _ = writeln!(out, "# TYPE {} histogram", REQUEST_LATENCY);
        for (key, series) in snapshot {
            let labels = key.label_str();
            for (le, count) in self.bounds.iter().zip(&series.buckets) {
                let _ = writeln!(
                    out,
                    "{}_bucket{{{},le=\"{:?}\"}} {}",
                    REQUEST_LATENCY, labels, le, count
                );
            }
            let _ = writeln!(
                out,
                "{}_bucket{{{},le=\"+Inf\"}} {}",
                REQUEST_LATENCY, labels, series.count
            );
            let _ = writeln!(out, "{}_sum{{{}}} {:?}", REQUEST_LATENCY, labels, series.sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", REQUEST_LATENCY, labels, series.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(route: &str, status: u16) -> MetricKey {
        MetricKey::new(Method::GET, route, status)
    }

    fn small() -> MetricsRegistry {
        MetricsRegistry::new(vec![0.01, 0.1, 1.0], 100).unwrap()
    }

    #[test]
    fn observation_fills_every_bucket_at_or_above() {
        let reg = small();
        let k = key("/items", 200);

        reg.record_request(k.clone(), 0.05).unwrap();
        assert_eq!(reg.series(&k).unwrap().buckets(), &[0, 1, 1]);

        // Bounds are inclusive.
        reg.record_request(k.clone(), 0.1).unwrap();
        assert_eq!(reg.series(&k).unwrap().buckets(), &[0, 2, 2]);

        reg.record_request(k.clone(), 0.001).unwrap();
        let s = reg.series(&k).unwrap();
        assert_eq!(s.buckets(), &[1, 3, 3]);
        assert_eq!(s.requests(), 3);
        assert_eq!(s.count(), 3);
        assert!((s.sum() - 0.151).abs() < 1e-9);
    }

    #[test]
    fn observation_above_all_bounds_only_counts() {
        let reg = small();
        let k = key("/items", 200);
        reg.record_request(k.clone(), 7.5).unwrap();

        let s = reg.series(&k).unwrap();
        assert_eq!(s.buckets(), &[0, 0, 0]);
        assert_eq!(s.count(), 1);
        assert_eq!(reg.bucket_count(&k, 1.0), Some(0));
    }

    #[test]
    fn bad_durations_clamp_to_zero() {
        let reg = small();
        let k = key("/", 200);
        reg.record_request(k.clone(), -1.0).unwrap();
        reg.record_request(k.clone(), f64::NAN).unwrap();

        let s = reg.series(&k).unwrap();
        assert_eq!(s.sum(), 0.0);
        assert_eq!(s.buckets(), &[2, 2, 2]);
    }

    #[test]
    fn render_exact_output() {
        let reg = small();
        reg.record_request(MetricKey::new(Method::POST, "/items", 201), 0.02).unwrap();
        reg.record_request(key("/health", 200), 0.5).unwrap();

        let expected = "\
# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total{method=\"GET\",path=\"/health\",status=\"200\"} 1
http_requests_total{method=\"POST\",path=\"/items\",status=\"201\"} 1
# HELP http_request_latency_seconds Latency per HTTP request
# TYPE http_request_latency_seconds histogram
http_request_latency_seconds_bucket{method=\"GET\",path=\"/health\",status=\"200\",le=\"0.01\"} 0
http_request_latency_seconds_bucket{method=\"GET\",path=\"/health\",status=\"200\",le=\"0.1\"} 0
http_request_latency_seconds_bucket{method=\"GET\",path=\"/health\",status=\"200\",le=\"1.0\"} 1
http_request_latency_seconds_bucket{method=\"GET\",path=\"/health\",status=\"200\",le=\"+Inf\"} 1
http_request_latency_seconds_sum{method=\"GET\",path=\"/health\",status=\"200\"} 0.5
http_request_latency_seconds_count{method=\"GET\",path=\"/health\",status=\"200\"} 1
http_request_latency_seconds_bucket{method=\"POST\",path=\"/items\",status=\"201\",le=\"0.01\"} 0
http_request_latency_seconds_bucket{method=\"POST\",path=\"/items\",status=\"201\",le=\"0.1\"} 1
http_request_latency_seconds_bucket{method=\"POST\",path=\"/items\",status=\"201\",le=\"1.0\"} 1
http_request_latency_seconds_bucket{method=\"POST\",path=\"/items\",status=\"201\",le=\"+Inf\"} 1
http_request_latency_seconds_sum{method=\"POST\",path=\"/items\",status=\"201\"} 0.02
http_request_latency_seconds_count{method=\"POST\",path=\"/items\",status=\"201\"} 1
# HELP opsdemo_metrics_dropped_total Metric updates dropped by the series limit
# TYPE opsdemo_metrics_dropped_total counter
opsdemo_metrics_dropped_total 0
";
        assert_eq!(reg.render(), expected);
    }

    #[test]
    fn render_is_idempotent_between_updates() {
        let reg = small();
        for status in [200, 404, 500, 201] {
            reg.record_request(key("/items", status), 0.03).unwrap();
        }
        let first = reg.render();
        assert_eq!(first, reg.render());

        reg.record_request(key("/items", 200), 0.03).unwrap();
        assert_ne!(first, reg.render());
    }

    #[test]
    fn empty_registry_still_describes_families() {
        let out = MetricsRegistry::default().render();
        assert!(out.contains("# TYPE http_requests_total counter"));
        assert!(out.contains("# TYPE http_request_latency_seconds histogram"));
    }

    #[test]
    fn label_values_are_escaped() {
        let reg = small();
        reg.record_request(key("/we\"ird\\path", 200), 0.0).unwrap();
        assert!(reg.render().contains(r#"path="/we\"ird\\path""#));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let reg = Arc::new(small());
        let k = key("/items", 200);
        let threads = 8;
        let per_thread = 500;

        std::thread::scope(|scope| {
            for _ in 0..threads {
                let reg = Arc::clone(&reg);
                let k = k.clone();
                scope.spawn(move || {
                    for _ in 0..per_thread {
                        reg.record_request(k.clone(), 0.05).unwrap();
                    }
                });
            }
        });

        let s = reg.series(&k).unwrap();
        let total = (threads * per_thread) as u64;
        assert_eq!(s.requests(), total);
        assert_eq!(s.count(), total);
        assert_eq!(s.buckets(), &[0, total, total]);
        assert!((s.sum() - 0.05 * total as f64).abs() < 1e-6);
    }

    #[test]
    fn readers_never_see_half_applied_updates() {
        let reg = Arc::new(small());
        let k = key("/items", 200);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let reg = Arc::clone(&reg);
                let k = k.clone();
                scope.spawn(move || {
                    for _ in 0..1000 {
                        reg.record_request(k.clone(), 0.5).unwrap();
                    }
                });
            }
            let reg = Arc::clone(&reg);
            let k = k.clone();
            scope.spawn(move || {
                for _ in 0..1000 {
                    if let Some(s) = reg.series(&k) {
                        assert_eq!(s.requests(), s.count());
                        assert_eq!(s.buckets()[2], s.count());
                    }
                    let _ = reg.render();
                }
            });
        });

        assert_eq!(reg.series(&k).unwrap().requests(), 4000);
    }

    #[test]
    fn series_limit_drops_new_label_sets_only() {
        let reg = MetricsRegistry::new(vec![0.1], 2).unwrap();
        reg.record_request(key("/a", 200), 0.01).unwrap();
        reg.record_request(key("/b", 200), 0.01).unwrap();

        let err = reg.record_request(key("/c", 200), 0.01).unwrap_err();
        assert!(matches!(err, OpsError::SeriesLimit(2)));

        // Existing series keep counting.
        reg.record_request(key("/a", 200), 0.01).unwrap();
        assert_eq!(reg.series(&key("/a", 200)).unwrap().requests(), 2);
        assert!(reg.series(&key("/c", 200)).is_none());
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.dropped(), 1);
        assert!(reg.render().contains("opsdemo_metrics_dropped_total 1"));
    }

    #[test]
    fn extension_methods_share_one_label() {
        let reg = small();
        for token in ["JUNK0", "JUNK1", "get"] {
            let method = Method::from_bytes(token.as_bytes()).unwrap();
            reg.record_request(MetricKey::new(method, "/health", 405), 0.01).unwrap();
        }
        reg.record_request(MetricKey::new(Method::PATCH, "/health", 405), 0.01).unwrap();

        let other = MetricKey::new(Method::from_bytes(b"JUNK9").unwrap(), "/health", 405);
        assert_eq!(other.method, OTHER_METHOD);
        assert_eq!(reg.series(&other).unwrap().requests(), 3);
        assert_eq!(reg.len(), 2);

        let text = reg.render();
        assert!(text.contains(
            r#"http_requests_total{method="OTHER",path="/health",status="405"} 3"#
        ));
        assert!(text.contains(
            r#"http_requests_total{method="PATCH",path="/health",status="405"} 1"#
        ));
        assert!(!text.contains("JUNK"));
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert!(MetricsRegistry::new(vec![], 10).is_err());
        assert!(MetricsRegistry::new(vec![0.1, 0.1], 10).is_err());
        assert!(MetricsRegistry::new(vec![0.5, 0.1], 10).is_err());
        assert!(MetricsRegistry::new(vec![-1.0], 10).is_err());
        assert!(MetricsRegistry::new(vec![f64::INFINITY], 10).is_err());
        assert!(MetricsRegistry::new(vec![0.1], 0).is_err());
    }
}
