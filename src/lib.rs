//! Penwatch - 钢笔交易帖监控服务
//!
//! 轮询 Reddit 上指定 flair 的新帖，按监控中的笔款及其别名匹配，
//! 去重后推送到 Discord；并提供维护笔款词典与监控列表的 HTTP 接口。

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
