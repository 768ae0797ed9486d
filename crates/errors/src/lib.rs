//! grc-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// 输入格式或取值范围错误，任何写操作之前被拒绝
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 唯一性冲突（如重复的风险-控制映射）
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 已登录但缺少角色，附带回退目标
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        fallback: Option<String>,
    },

    /// 存储暂时不可用（连接池耗尽、超时、断连），调用方可重试
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// 审计写入失败，仅在 fail-closed 模式下返回给调用方
    #[error("Audit write failure: {0}")]
    AuditWrite(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden {
            message: msg.into(),
            fallback: None,
        }
    }

    pub fn forbidden_with_fallback(msg: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self::Forbidden {
            message: msg.into(),
            fallback: Some(fallback.into()),
        }
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn audit_write(msg: impl Into<String>) -> Self {
        Self::AuditWrite(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 是否为可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    /// 拒绝访问时的回退目标
    pub fn fallback(&self) -> Option<&str> {
        match self {
            Self::Forbidden { fallback, .. } => fallback.as_deref(),
            _ => None,
        }
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Duplicate(_) => 409,
            Self::Unauthenticated(_) => 401,
            Self::Forbidden { .. } => 403,
            Self::StoreUnavailable(_) => 503,
            Self::AuditWrite(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: format!("https://grc.local/problems/{}", self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.public_detail(),
            instance: None,
            fallback: self.fallback().map(str::to_string),
        }
    }

    /// 基础设施错误不把内部细节暴露给调用方
    fn public_detail(&self) -> String {
        match self {
            Self::StoreUnavailable(_) | Self::AuditWrite(_) => {
                "The service is temporarily unavailable, please retry".to_string()
            }
            Self::Internal(_) => "An internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not-found",
            Self::Duplicate(_) => "duplicate",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::StoreUnavailable(_) => "store-unavailable",
            Self::AuditWrite(_) => "audit-write",
            Self::Internal(_) => "internal",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::NotFound(_) => "Resource Not Found",
            Self::Duplicate(_) => "Already Exists",
            Self::Unauthenticated(_) => "Unauthenticated",
            Self::Forbidden { .. } => "Access Denied",
            Self::StoreUnavailable(_) => "Service Unavailable",
            Self::AuditWrite(_) => "Audit Unavailable",
            Self::Internal(_) => "Internal Server Error",
        }
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
    /// 拒绝访问后建议跳转的位置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
