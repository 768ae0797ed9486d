//! 审计事件

use std::fmt;

use chrono::{DateTime, Utc};
use grc_common::{AuditLogId, UserId};
use serde::Serialize;

/// 审计动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserLogin,
    UserLogout,
    RiskCreated,
    RiskStatusUpdated,
    RiskDeleted,
    RiskControlMapped,
    RiskControlUnmapped,
    ComplianceControlsViewed,
    AuditTrailViewed,
    AuditLogExported,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserLogin => "USER_LOGIN",
            Self::UserLogout => "USER_LOGOUT",
            Self::RiskCreated => "RISK_CREATED",
            Self::RiskStatusUpdated => "RISK_STATUS_UPDATED",
            Self::RiskDeleted => "RISK_DELETED",
            Self::RiskControlMapped => "RISK_CONTROL_MAPPED",
            Self::RiskControlUnmapped => "RISK_CONTROL_UNMAPPED",
            Self::ComplianceControlsViewed => "COMPLIANCE_CONTROLS_VIEWED",
            Self::AuditTrailViewed => "AUDIT_TRAIL_VIEWED",
            Self::AuditLogExported => "AUDIT_LOG_EXPORTED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 实体类型（对应表名）
pub mod entity {
    pub const RISKS: &str = "risks";
    pub const MAPPINGS: &str = "risk_compliance_mapping";
    pub const CONTROLS: &str = "compliance_controls";
    pub const AUDIT_LOGS: &str = "audit_logs";
}

/// 待写入的审计事件
///
/// 只追加：写入后不再修改或删除
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEvent {
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    /// JSON 文本
    pub details: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 已持久化的审计事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub log_id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn from_new(log_id: AuditLogId, event: NewAuditEvent) -> Self {
        Self {
            log_id,
            user_id: event.user_id,
            action: event.action,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            details: event.details,
            ip_address: event.ip_address,
            created_at: event.created_at,
        }
    }
}

/// 操作者信息（审计记录关联用户表得到）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorProfile {
    pub full_name: String,
    pub username: String,
    pub job_title: Option<String>,
}

/// 用户过滤下拉项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterUser {
    pub user_id: UserId,
    pub full_name: String,
}

/// 审计轨迹查询结果的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub event: AuditEvent,
    /// 操作者已被删除或事件无操作者时为空
    pub actor: Option<ActorProfile>,
}
