//! Axum router wiring.
//!
//! `instrument` is the single place the request pipeline is attached; it
//! applies to every route registered before it and to the fallback.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, ops, pipeline, services::items};

pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/:id", get(items::get_item))
        .fallback(ops::not_found);

    instrument(routes, state)
}

/// Wrap `routes` in the request pipeline and bind state.
pub fn instrument(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(middleware::from_fn_with_state(state.clone(), pipeline::track))
        .with_state(state)
}
