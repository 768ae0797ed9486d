//! PostgreSQL 审计存储实现
//!
//! 只有 INSERT 与 SELECT；表上的触发器拒绝 UPDATE / DELETE

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_adapter_postgres::map_sqlx_error;
use grc_common::{AuditLogId, UserId};
use grc_errors::AppResult;
use sqlx::PgPool;

use crate::domain::audit::{
    ActorProfile, AuditEvent, AuditRecord, AuditStats, AuditStore, AuditTrailFilter, FilterUser,
    NewAuditEvent,
};

pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 审计记录关联操作者；操作者已删除时 `u.*` 为空
const RECORD_SELECT: &str = r#"
    SELECT a.log_id, a.user_id, a.action, a.entity_type, a.entity_id, a.details, a.ip_address,
           a.created_at, u.full_name, u.username, u.job_title
    FROM audit_logs a
    LEFT JOIN users u ON a.user_id = u.user_id
"#;

/// 与 `AuditTrailFilter` 对应的条件：$1 起始时间，$2 用户，$3 动作
const FILTER_WHERE: &str = r#"
    WHERE a.created_at >= $1
      AND ($2::BIGINT IS NULL OR a.user_id = $2)
      AND ($3::TEXT IS NULL OR a.action = $3)
"#;

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn append(&self, event: NewAuditEvent) -> AppResult<AuditLogId> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, details, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING log_id
            "#,
        )
        .bind(event.user_id.map(|u| u.0))
        .bind(&event.action)
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(&event.details)
        .bind(&event.ip_address)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(AuditLogId(id))
    }

    async fn query(&self, filter: &AuditTrailFilter, limit: u32) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "{} {} ORDER BY a.created_at DESC, a.log_id DESC LIMIT $4",
            RECORD_SELECT, FILTER_WHERE
        ))
        .bind(filter.since)
        .bind(filter.user_id.map(|u| u.0))
        .bind(filter.action.as_deref())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn stats(&self, filter: &AuditTrailFilter) -> AppResult<AuditStats> {
        let row = sqlx::query_as::<_, StatsRow>(&format!(
            r#"
            SELECT COUNT(*) AS total_events,
                   COUNT(DISTINCT a.user_id) AS distinct_users,
                   COUNT(DISTINCT a.action) AS distinct_actions,
                   MAX(a.created_at) AS last_activity
            FROM audit_logs a
            {}
            "#,
            FILTER_WHERE
        ))
        .bind(filter.since)
        .bind(filter.user_id.map(|u| u.0))
        .bind(filter.action.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(AuditStats {
            total_events: row.total_events,
            distinct_users: row.distinct_users,
            distinct_actions: row.distinct_actions,
            last_activity: row.last_activity,
        })
    }

    async fn distinct_actions(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT action FROM audit_logs ORDER BY action")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|(action,)| action).collect())
    }

    async fn active_users(&self) -> AppResult<Vec<FilterUser>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT user_id, full_name FROM users WHERE is_active = TRUE ORDER BY full_name, user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(user_id, full_name)| FilterUser {
                user_id: UserId(user_id),
                full_name,
            })
            .collect())
    }

    async fn export(&self, since: DateTime<Utc>) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "{} WHERE a.created_at >= $1 ORDER BY a.created_at DESC, a.log_id DESC",
            RECORD_SELECT
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ============ 数据行映射 ============

#[derive(sqlx::FromRow)]
struct AuditRow {
    log_id: i64,
    user_id: Option<i64>,
    action: String,
    entity_type: Option<String>,
    entity_id: Option<i64>,
    details: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
    full_name: Option<String>,
    username: Option<String>,
    job_title: Option<String>,
}

impl From<AuditRow> for AuditRecord {
    fn from(row: AuditRow) -> Self {
        let actor = match (row.full_name, row.username) {
            (Some(full_name), Some(username)) => Some(ActorProfile {
                full_name,
                username,
                job_title: row.job_title,
            }),
            _ => None,
        };

        AuditRecord {
            event: AuditEvent {
                log_id: AuditLogId(row.log_id),
                user_id: row.user_id.map(UserId),
                action: row.action,
                entity_type: row.entity_type,
                entity_id: row.entity_id,
                details: row.details.unwrap_or_default(),
                ip_address: row.ip_address,
                created_at: row.created_at,
            },
            actor,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total_events: i64,
    distinct_users: i64,
    distinct_actions: i64,
    last_activity: Option<DateTime<Utc>>,
}
