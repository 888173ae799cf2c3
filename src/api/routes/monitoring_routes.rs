//! Monitoring Routes

use crate::api::handlers::monitoring_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建监控列表路由器
pub fn create_monitoring_router() -> Router<AppState> {
    Router::new()
        .route("/monitoring", get(show_monitoring).post(add_monitoring))
        .route("/monitoring/remove", post(remove_monitoring))
        .route("/monitoring/reload", post(reload_monitoring))
}
