//! 搜索 DTO
//!
//! 强制搜索、手动轮询与已读帖子存储的响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::ForcedMatch;

/// 强制搜索结果项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcedMatchResponse {
    pub id: String,
    pub title: String,
    pub url: String,
    pub matched_terms: Vec<String>,
    pub created_utc: Option<DateTime<Utc>>,
}

impl From<ForcedMatch> for ForcedMatchResponse {
    fn from(found: ForcedMatch) -> Self {
        Self {
            url: found.post.link(),
            id: found.post.id,
            title: found.post.title,
            matched_terms: found.matched_terms,
            created_utc: found.post.created_utc,
        }
    }
}

/// 强制搜索响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ForceSearchResponse {
    pub total: usize,
    pub matches: Vec<ForcedMatchResponse>,
}

/// 已读帖子统计
#[derive(Debug, Serialize, Deserialize)]
pub struct SeenCountResponse {
    pub count: u64,
}

/// 已读帖子重置结果
#[derive(Debug, Serialize, Deserialize)]
pub struct SeenResetResponse {
    pub forgotten: u64,
}
