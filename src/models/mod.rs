//! 数据模型模块

pub mod pen;
pub mod post;

pub use pen::{PenEntry, alias_key, name_key, normalize_alias};
pub use post::Post;
