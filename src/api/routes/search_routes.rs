//! Search Routes
//!
//! 强制搜索、手动轮询与已读帖子管理。

use crate::api::handlers::search_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建搜索路由器
pub fn create_search_router() -> Router<AppState> {
    Router::new()
        .route("/search/force", post(force_search))
        .route("/poll", post(poll_now))
        .route("/seen", get(seen_count).delete(reset_seen))
}
