//! 统一错误处理
//!
//! - `RegistryError`：编排层内部错误（基础设施 / 执行 / 解析）
//! - `ApiError`：HTTP 层错误，实现 `IntoResponse`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::infra::command::CommandError;

/// 编排过程中的错误类型
///
/// 三类错误在编排边界统一转换为失败信封（code 50000），不向调用方区分
#[derive(Debug, Error)]
pub enum RegistryError {
    /// 目录或文件系统失败
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// 外部任务非零退出或启动失败
    #[error("execution error: {0}")]
    Execution(String),

    /// 产物文件格式错误
    #[error("parse error: {0}")]
    Parse(String),
}

impl RegistryError {
    /// 错误类别（用于日志字段）
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Infrastructure(_) => "infrastructure",
            RegistryError::Execution(_) => "execution",
            RegistryError::Parse(_) => "parse",
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        RegistryError::Infrastructure(e.to_string())
    }
}

impl From<toml::de::Error> for RegistryError {
    fn from(e: toml::de::Error) -> Self {
        RegistryError::Parse(e.message().to_string())
    }
}

impl From<CommandError> for RegistryError {
    fn from(e: CommandError) -> Self {
        RegistryError::Execution(e.to_string())
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// API 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// 统一 API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 401 - 未授权（API Key 无效或缺失）
    Unauthorized,
    /// 400 - 请求无效
    BadRequest(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or missing API key".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::BadRequest(m) => write!(f, "Bad request: {}", m),
        }
    }
}

impl std::error::Error for ApiError {}

/// 便捷类型别名
pub type ApiResult<T> = Result<T, ApiError>;
