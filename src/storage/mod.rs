//! 存储模块
//!
//! 平面文件（别名、监控列表）与嵌入式已读帖子存储。

pub mod flat_file;
pub mod seen_posts;

pub use seen_posts::{SeenLog, SeenPost, SeenPostStore};
