//! Request context middleware.
//!
//! Wraps every route (and the fallback):
//! - Obtain the correlation id (inbound header or fresh) and stash it in
//!   request extensions for handlers
//! - Time the inner handler on a monotonic clock
//! - Turn handler panics into 500 so instrumentation always runs
//! - Record metrics, then emit the access record, exactly once
//! - Echo the correlation id on the response

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;

use opsdemo_core::CorrelationId;

use crate::app_state::AppState;
use crate::obs::{LogRecord, MetricKey};

/// Metric label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

pub async fn track(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = app.request_id_header().clone();

    // Non-ASCII header values cannot be echoed back; treat as absent.
    let inbound = req.headers().get(&header).and_then(|v| v.to_str().ok());
    let request_id = CorrelationId::obtain(inbound);
    req.extensions_mut().insert(request_id.clone());

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let started = Instant::now();
    let mut response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(request_id = %request_id, %method, %path, "handler panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };
    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    let key = MetricKey::new(method.clone(), route, status);
    if let Err(e) = app.metrics().record_request(key, elapsed.as_secs_f64()) {
        tracing::debug!(error = %e, request_id = %request_id, "metrics update dropped");
    }
    app.access_log().emit(LogRecord::new(
        request_id.as_str(),
        method.as_str(),
        path,
        status,
        elapsed,
    ));

    match HeaderValue::from_str(request_id.as_str()) {
        Ok(v) => {
            response.headers_mut().insert(header, v);
        }
        Err(e) => tracing::warn!(error = %e, "request id not representable as header"),
    }
    response
}
