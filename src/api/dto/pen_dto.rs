//! 笔款 DTO
//!
//! 定义笔款与别名相关的请求和响应数据结构。

use serde::{Deserialize, Serialize};

use crate::models::PenEntry;
use crate::services::ScoredMatch;

/// 笔款列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListPensParams {
    /// 页码（从 1 开始）
    pub page: Option<usize>,
    /// 每页数量
    pub page_size: Option<usize>,
}

/// 创建笔款请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePenRequest {
    /// 正式名称
    pub formal_name: String,
    /// 别名（可选，缺省为小写的正式名称）
    pub aliases: Vec<String>,
}

/// 别名增删请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AliasesRequest {
    pub aliases: Vec<String>,
}

/// 笔款响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenResponse {
    pub formal_name: String,
    pub aliases: Vec<String>,
}

impl From<PenEntry> for PenResponse {
    fn from(entry: PenEntry) -> Self {
        Self {
            formal_name: entry.formal_name,
            aliases: entry.aliases,
        }
    }
}

/// 创建笔款响应
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePenResponse {
    pub pen: PenResponse,
    /// 当前笔款总数
    pub total: usize,
}

/// 笔款列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct PenListResponse {
    pub pens: Vec<PenResponse>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// 模糊搜索查询参数
#[derive(Debug, Deserialize)]
pub struct SearchPensParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// 模糊搜索响应
#[derive(Debug, Serialize)]
pub struct SearchPensResponse {
    pub query: String,
    pub matches: Vec<ScoredMatch>,
}
