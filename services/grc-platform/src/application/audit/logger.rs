//! 审计记录器
//!
//! 默认 fire-and-forget：写入失败只进入诊断通道（`tracing::error!` 与
//! `audit_write_failures_total` 计数），业务操作的结果不受影响。
//! `fail_closed` 模式下写入失败以 `AuditWrite` 返回给调用方。

use std::sync::Arc;
use std::time::Duration;

use grc_common::{Clock, UserId};
use grc_config::AuditMode;
use grc_errors::{AppError, AppResult};
use metrics::counter;
use serde_json::Value;

use crate::application::context::Caller;
use crate::application::support::bounded;
use crate::domain::audit::{AuditAction, AuditStore, NewAuditEvent};

/// 一条待记录的审计条目
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub actor: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<i64>,
    pub detail: Value,
    pub origin: Option<String>,
}

impl AuditEntry {
    pub fn new(action: AuditAction) -> Self {
        Self {
            actor: None,
            action,
            entity_type: None,
            entity_id: None,
            detail: Value::Null,
            origin: None,
        }
    }

    /// 以调用者身份记录
    pub fn by(mut self, caller: &Caller) -> Self {
        self.actor = Some(caller.user_id());
        self.origin = caller.origin.clone();
        self
    }

    pub fn actor(mut self, actor: UserId, origin: Option<String>) -> Self {
        self.actor = Some(actor);
        self.origin = origin;
        self
    }

    pub fn entity(mut self, entity_type: &'static str, entity_id: Option<i64>) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = entity_id;
        self
    }

    pub fn detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// 审计记录器
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    mode: AuditMode,
    timeout: Duration,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            mode: AuditMode::default(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_mode(mut self, mode: AuditMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> AuditMode {
        self.mode
    }

    /// 记录一条审计事件
    ///
    /// fire-and-forget 模式下总是返回 `Ok(())`
    pub async fn record(&self, entry: AuditEntry) -> AppResult<()> {
        let action = entry.action;
        match self.write(entry).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Audit write failed");
                counter!("audit_write_failures_total", "action" => action.as_str()).increment(1);
                match self.mode {
                    AuditMode::FireAndForget => Ok(()),
                    AuditMode::FailClosed => Err(AppError::audit_write(format!(
                        "Failed to record {}",
                        action
                    ))),
                }
            }
        }
    }

    async fn write(&self, entry: AuditEntry) -> AppResult<()> {
        let details = serde_json::to_string(&entry.detail)
            .map_err(|e| AppError::internal(format!("Failed to serialize audit detail: {}", e)))?;

        let event = NewAuditEvent {
            user_id: entry.actor,
            action: entry.action.as_str().to_string(),
            entity_type: entry.entity_type.map(str::to_string),
            entity_id: entry.entity_id,
            details,
            ip_address: entry.origin,
            created_at: self.clock.now(),
        };

        let log_id = bounded(self.timeout, "audit append", self.store.append(event)).await?;
        tracing::debug!(log_id = %log_id, action = %entry.action, "Audit event recorded");
        Ok(())
    }
}
