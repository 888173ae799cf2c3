//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod monitoring_handler;
pub mod pen_handler;
pub mod search_handler;

pub use monitoring_handler::*;
pub use pen_handler::*;
pub use search_handler::*;
