//! 审计存储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_common::AuditLogId;
use grc_errors::AppResult;

use super::event::{AuditRecord, FilterUser, NewAuditEvent};
use super::filter::{AuditStats, AuditTrailFilter};

/// 审计存储接口（只追加）
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: NewAuditEvent) -> AppResult<AuditLogId>;

    /// 按时间倒序，最多 `limit` 条
    async fn query(&self, filter: &AuditTrailFilter, limit: u32) -> AppResult<Vec<AuditRecord>>;

    async fn stats(&self, filter: &AuditTrailFilter) -> AppResult<AuditStats>;

    /// 出现过的全部动作代码，按字母排序
    async fn distinct_actions(&self) -> AppResult<Vec<String>>;

    /// 在用账号，按姓名排序
    async fn active_users(&self) -> AppResult<Vec<FilterUser>>;

    /// `since` 之后的全部记录，按时间倒序，不限条数
    async fn export(&self, since: DateTime<Utc>) -> AppResult<Vec<AuditRecord>>;
}
