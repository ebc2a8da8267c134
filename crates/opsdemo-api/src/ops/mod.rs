//! Operational HTTP endpoints.
//!
//! - `/`        : service banner
//! - `/health`  : liveness
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};

use opsdemo_core::CorrelationId;

use crate::app_state::AppState;

pub async fn root(Extension(request_id): Extension<CorrelationId>) -> Json<Value> {
    Json(json!({ "message": "DevOps demo API", "request_id": request_id.as_str() }))
}

pub async fn health(Extension(request_id): Extension<CorrelationId>) -> Json<Value> {
    Json(json!({ "status": "ok", "request_id": request_id.as_str() }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": { "code": "NOT_FOUND", "msg": "no such route" } })),
    )
}
