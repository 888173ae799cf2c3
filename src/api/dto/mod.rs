//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod monitoring_dto;
pub mod pen_dto;
pub mod search_dto;

pub use monitoring_dto::*;
pub use pen_dto::*;
pub use search_dto::*;
