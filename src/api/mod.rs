//! API 模块
//!
//! 提供 REST API 支持。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use crate::observability::{create_observability_router, metrics_middleware};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Command surface under `/api/v1` merged with the observability routes
pub fn create_router(app_state: AppState) -> Router {
    let observability = app_state.observability.clone();

    let api = Router::new()
        .merge(routes::pen_routes::create_pen_router())
        .merge(routes::monitoring_routes::create_monitoring_router())
        .merge(routes::search_routes::create_search_router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(app_state)
        .merge(create_observability_router(observability.clone()))
        .layer(axum::middleware::from_fn_with_state(
            observability,
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
