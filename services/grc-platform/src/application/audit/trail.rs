//! 审计轨迹查询与导出

use std::sync::Arc;
use std::time::Duration;

use grc_common::Clock;
use grc_errors::AppResult;
use serde::Serialize;
use serde_json::json;

use super::export::{export_filename, write_csv};
use super::logger::{AuditEntry, AuditLogger};
use crate::application::context::Caller;
use crate::application::support::bounded;
use crate::domain::audit::{
    AuditAction, AuditRecord, AuditStats, AuditStore, AuditTrailFilter, FilterUser, TrailParams,
    entity, parse_days,
};

/// 审计轨迹查询结果
#[derive(Debug, Clone, Serialize)]
pub struct AuditTrail {
    pub events: Vec<AuditRecord>,
    pub stats: AuditStats,
    /// 供筛选使用的动作列表
    pub actions: Vec<String>,
    /// 供筛选使用的在用账号
    pub users: Vec<FilterUser>,
    pub filter: AuditTrailFilter,
}

/// CSV 导出结果
#[derive(Debug, Clone)]
pub struct AuditExport {
    pub filename: String,
    pub content: String,
    pub record_count: usize,
}

/// 审计轨迹服务
#[derive(Clone)]
pub struct AuditTrailService {
    store: Arc<dyn AuditStore>,
    logger: AuditLogger,
    clock: Arc<dyn Clock>,
    limit: u32,
    default_trail_days: u32,
    default_export_days: u32,
    timeout: Duration,
}

impl AuditTrailService {
    pub fn new(store: Arc<dyn AuditStore>, logger: AuditLogger, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            logger,
            clock,
            limit: 500,
            default_trail_days: 7,
            default_export_days: 30,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_limits(mut self, limit: u32, default_trail_days: u32, default_export_days: u32) -> Self {
        self.limit = limit;
        self.default_trail_days = default_trail_days;
        self.default_export_days = default_export_days;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 查询审计轨迹
    ///
    /// 结果与统计使用同一过滤条件；查询本身记为 `AUDIT_TRAIL_VIEWED`
    pub async fn query_trail(&self, caller: &Caller, params: &TrailParams) -> AppResult<AuditTrail> {
        let filter = AuditTrailFilter::from_params(params, self.clock.now(), self.default_trail_days)?;

        let events = bounded(self.timeout, "audit trail query", self.store.query(&filter, self.limit)).await?;
        let stats = bounded(self.timeout, "audit trail stats", self.store.stats(&filter)).await?;
        let actions = bounded(self.timeout, "audit action list", self.store.distinct_actions()).await?;
        let users = bounded(self.timeout, "audit user list", self.store.active_users()).await?;

        tracing::info!(
            user_id = %caller.user_id(),
            days = filter.days,
            returned = events.len(),
            total = stats.total_events,
            "Audit trail viewed"
        );

        self.logger
            .record(
                AuditEntry::new(AuditAction::AuditTrailViewed)
                    .by(caller)
                    .entity(entity::AUDIT_LOGS, None)
                    .detail(json!({
                        "viewed_by": caller.username(),
                        "filter_days": filter.days,
                        "filter_user": filter.user_label(),
                        "filter_action": filter.action_label(),
                    })),
            )
            .await?;

        Ok(AuditTrail {
            events,
            stats,
            actions,
            users,
            filter,
        })
    }

    /// 导出最近 `days` 天的全部审计记录
    pub async fn export(&self, caller: &Caller, days: Option<&str>) -> AppResult<AuditExport> {
        let days = parse_days(days, self.default_export_days);
        let filter = AuditTrailFilter::last_days(days, self.clock.now())?;

        let records = bounded(self.timeout, "audit export", self.store.export(filter.since)).await?;
        let content = write_csv(&records)?;

        tracing::info!(
            user_id = %caller.user_id(),
            days,
            record_count = records.len(),
            "Audit log exported"
        );

        self.logger
            .record(
                AuditEntry::new(AuditAction::AuditLogExported)
                    .by(caller)
                    .entity(entity::AUDIT_LOGS, None)
                    .detail(json!({
                        "exported_by": caller.username(),
                        "record_count": records.len(),
                        "last_n_days": days,
                    })),
            )
            .await?;

        Ok(AuditExport {
            filename: export_filename(days),
            content,
            record_count: records.len(),
        })
    }
}
