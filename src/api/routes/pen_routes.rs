//! Pen Routes
//!
//! 定义笔款与别名相关的 API 路由。

use crate::api::handlers::pen_handler::*;
use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::app_state::AppState;

/// 创建笔款路由器
pub fn create_pen_router() -> Router<AppState> {
    Router::new()
        .route("/pens", get(list_pens).post(create_pen))
        .route("/pens/search", get(search_pens))
        .route("/pens/reload", post(reload_pens))
        .route("/pens/:query", delete(delete_pen))
        .route("/pens/:query/aliases", post(add_aliases))
        .route("/pens/:query/aliases/remove", post(remove_aliases))
}
