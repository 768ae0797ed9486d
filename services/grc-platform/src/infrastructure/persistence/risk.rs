//! PostgreSQL 风险仓储实现
//!
//! 分值与等级不落库，排序时按 `probability * impact` 现算

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use grc_adapter_postgres::map_sqlx_error;
use grc_common::{AuditInfo, CategoryId, RiskId, UserId};
use grc_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::risk::{
    NewRisk, Rating, Risk, RiskCode, RiskRegisterEntry, RiskRepository, RiskStatus, TreatmentType,
};

pub struct PostgresRiskRepository {
    pool: PgPool,
}

impl PostgresRiskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RiskRepository for PostgresRiskRepository {
    async fn max_code_sequence(&self, year: i32) -> AppResult<Option<u32>> {
        let pattern = format!("{}%", RiskCode::year_prefix(year));
        let max: (Option<i32>,) = sqlx::query_as(
            r#"
            SELECT MAX(CAST(SUBSTRING(risk_code FROM '[0-9]+$') AS INTEGER))
            FROM risks
            WHERE risk_code LIKE $1
            "#,
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(max.0.and_then(|n| u32::try_from(n).ok()))
    }

    async fn insert(
        &self,
        code: &RiskCode,
        risk: &NewRisk,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AppResult<RiskId> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO risks (risk_code, risk_title, risk_description, category_id, risk_owner_id,
                               probability, impact, status, treatment_type, mitigation_plan,
                               business_impact, review_date, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING risk_id
            "#,
        )
        .bind(code.as_str())
        .bind(&risk.title)
        .bind(&risk.description)
        .bind(risk.category_id.0)
        .bind(risk.owner_id.0)
        .bind(i16::from(risk.probability.value()))
        .bind(i16::from(risk.impact.value()))
        .bind(RiskStatus::Identified.as_str())
        .bind(risk.treatment_type.as_str())
        .bind(&risk.mitigation_plan)
        .bind(&risk.business_impact)
        .bind(risk.review_date)
        .bind(created_by.map(|u| u.0))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(RiskId(id))
    }

    async fn find_by_id(&self, id: RiskId) -> AppResult<Option<Risk>> {
        let row = sqlx::query_as::<_, RiskRow>(&format!(
            "SELECT {} FROM risks r WHERE r.risk_id = $1",
            RISK_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(RiskRow::into_risk).transpose()
    }

    async fn update_status(&self, id: RiskId, status: RiskStatus, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE risks SET status = $2, updated_at = $3 WHERE risk_id = $1")
            .bind(id.0)
            .bind(status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_with_mappings(&self, id: RiskId) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM risk_compliance_mapping WHERE risk_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let deleted = sqlx::query("DELETE FROM risks WHERE risk_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(false);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(true)
    }

    async fn list_register(&self) -> AppResult<Vec<RiskRegisterEntry>> {
        let rows = sqlx::query_as::<_, RegisterRow>(&format!(
            r#"
            SELECT {},
                   c.category_name, c.nist_csf_domain,
                   u.full_name AS owner_name, u.job_title AS owner_title, u.department AS owner_department
            FROM risks r
            INNER JOIN risk_categories c ON r.category_id = c.category_id
            INNER JOIN users u ON r.risk_owner_id = u.user_id
            ORDER BY (r.probability * r.impact) DESC, r.created_at DESC, r.risk_id DESC
            "#,
            RISK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RegisterRow::into_entry).collect()
    }
}

// ============ 数据行映射 ============

const RISK_COLUMNS: &str = r#"
    r.risk_id, r.risk_code, r.risk_title, r.risk_description, r.category_id, r.risk_owner_id,
    r.probability, r.impact, r.status, r.treatment_type, r.mitigation_plan, r.business_impact,
    r.review_date, r.created_by, r.created_at, r.updated_at
"#;

#[derive(sqlx::FromRow)]
struct RiskRow {
    risk_id: i64,
    risk_code: String,
    risk_title: String,
    risk_description: Option<String>,
    category_id: i64,
    risk_owner_id: i64,
    probability: i16,
    impact: i16,
    status: String,
    treatment_type: String,
    mitigation_plan: Option<String>,
    business_impact: Option<String>,
    review_date: Option<NaiveDate>,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RiskRow {
    fn into_risk(self) -> AppResult<Risk> {
        let corrupt = |field: &str, e: AppError| {
            AppError::internal(format!("Risk {} has invalid {}: {}", self.risk_id, field, e))
        };

        Ok(Risk {
            id: RiskId(self.risk_id),
            code: RiskCode::from(self.risk_code.clone()),
            title: self.risk_title.clone(),
            description: self.risk_description.clone(),
            category_id: CategoryId(self.category_id),
            owner_id: UserId(self.risk_owner_id),
            probability: Rating::new(self.probability.into()).map_err(|e| corrupt("probability", e))?,
            impact: Rating::new(self.impact.into()).map_err(|e| corrupt("impact", e))?,
            status: self.status.parse::<RiskStatus>().map_err(|e| corrupt("status", e))?,
            treatment_type: self
                .treatment_type
                .parse::<TreatmentType>()
                .map_err(|e| corrupt("treatment type", e))?,
            mitigation_plan: self.mitigation_plan.clone(),
            business_impact: self.business_impact.clone(),
            review_date: self.review_date,
            audit_info: AuditInfo {
                created_at: self.created_at,
                created_by: self.created_by.map(UserId),
                updated_at: self.updated_at,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct RegisterRow {
    #[sqlx(flatten)]
    risk: RiskRow,
    category_name: String,
    nist_csf_domain: Option<String>,
    owner_name: String,
    owner_title: Option<String>,
    owner_department: Option<String>,
}

impl RegisterRow {
    fn into_entry(self) -> AppResult<RiskRegisterEntry> {
        Ok(RiskRegisterEntry {
            risk: self.risk.into_risk()?,
            category_name: self.category_name,
            nist_csf_domain: self.nist_csf_domain,
            owner_name: self.owner_name,
            owner_title: self.owner_title,
            owner_department: self.owner_department,
        })
    }
}
