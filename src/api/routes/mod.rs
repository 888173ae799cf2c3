//! Routes 模块
//!
//! 定义 API 路由。

pub mod monitoring_routes;
pub mod pen_routes;
pub mod search_routes;
