//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// 名称重复
    #[error("a pen named '{0}' already exists")]
    DuplicateName(String),

    /// 模糊匹配未命中
    #[error("no pen matches '{0}'")]
    NotFound(String),

    /// 删除后别名为空
    #[error("'{0}' must keep at least one alias")]
    EmptyAliasSet(String),

    /// 持久化文件行无法解析
    #[error("corrupt line {line}: {reason}")]
    CorruptStore { line: usize, reason: String },

    /// 持久化写入失败
    #[error("failed to persist {target}: {reason}")]
    PersistenceWriteFailed { target: String, reason: String },

    /// 参数验证错误
    #[error("invalid input: {0}")]
    Validation(String),

    /// 数据库错误
    #[error("database error: {0}")]
    Database(String),

    /// 上游平台错误
    #[error("upstream error: {0}")]
    Upstream(String),

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(String),

    /// 内部错误
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 构造持久化写入错误
    pub fn write_failed(target: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        AppError::PersistenceWriteFailed {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::DuplicateName(_) => (409, "DUPLICATE_NAME".to_string()),
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::EmptyAliasSet(_) => (422, "EMPTY_ALIAS_SET".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::CorruptStore { .. } => (500, "CORRUPT_STORE".to_string()),
            AppError::PersistenceWriteFailed { .. } => (500, "PERSISTENCE_WRITE_FAILED".to_string()),
            AppError::Upstream(_) => (502, "UPSTREAM_ERROR".to_string()),
            AppError::Database(_) => (500, "DATABASE_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
