//! 监控列表 DTO

use serde::{Deserialize, Serialize};

/// 监控增删请求；`["ALL"]` 清空列表
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringRequest {
    pub pens: Vec<String>,
}

/// 当前监控状态
#[derive(Debug, Serialize, Deserialize)]
pub struct MonitoringResponse {
    /// 按加入顺序排列的正式名称
    pub monitored: Vec<String>,
    /// 由监控笔款派生的搜索词（排序）
    pub search_terms: Vec<String>,
}
