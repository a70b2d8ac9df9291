//! sentinel-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范。存储层的后端错误必须在边界处
//! 转换为这里的类型，再交给业务层。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 完整性约束类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// 唯一约束
    Unique,
    /// 外键约束
    ForeignKey,
    /// 非空约束
    NotNull,
    /// 检查约束
    Check,
    /// 其他完整性约束
    Other,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique_violation",
            Self::ForeignKey => "foreign_key_violation",
            Self::NotNull => "not_null_violation",
            Self::Check => "check_violation",
            Self::Other => "integrity_violation",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 完整性冲突的结构化信息，调用方据此映射成领域错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityViolation {
    pub kind: ConstraintKind,
    /// 后端原生错误码（PostgreSQL 为 SQLSTATE）
    pub code: String,
    /// 约束名称（后端提供时）
    pub constraint: Option<String>,
    pub message: String,
}

impl IntegrityViolation {
    pub fn new(kind: ConstraintKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            constraint: None,
            message: message.into(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn is_unique(&self) -> bool {
        self.kind == ConstraintKind::Unique
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(constraint) => write!(f, "{} on {}: {}", self.kind, constraint, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(IntegrityViolation),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// 表中不存在指定主键
    pub fn entity_not_found(table: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{} with id {} does not exist", table, id))
    }

    /// 业务层自行构造的冲突（例如邮箱已注册）
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(IntegrityViolation::new(ConstraintKind::Other, "", msg))
    }

    pub fn integrity(violation: IntegrityViolation) -> Self {
        Self::Conflict(violation)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// 是否为唯一约束冲突
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Conflict(v) if v.is_unique())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Unauthorized(_) => 401,
            Self::BadRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// 允许返回给调用方的描述。内部错误不暴露细节。
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Conflict(violation) => violation.message.clone(),
            Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail: self.public_message(),
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::NotFound(_) => "not-found",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad-request",
            Self::Internal(_) => "internal",
        };
        format!("https://sentinel.invalid/problems/{}", slug)
    }

    fn problem_title(&self) -> String {
        match self {
            Self::NotFound(_) => "Resource Not Found".to_string(),
            Self::Conflict(_) => "Conflict".to_string(),
            Self::Unauthorized(_) => "Unauthorized".to_string(),
            Self::BadRequest(_) => "Bad Request".to_string(),
            Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("Serialization error: {}", err))
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
