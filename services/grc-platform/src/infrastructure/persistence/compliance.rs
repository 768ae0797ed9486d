//! PostgreSQL 合规仓储实现

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_adapter_postgres::map_sqlx_error;
use grc_common::{ControlId, MappingId, RiskId, UserId};
use grc_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::compliance::{
    ComplianceControl, ComplianceRepository, MappingType, MappingView, NewMapping, RiskControlMapping,
};

pub struct PostgresComplianceRepository {
    pool: PgPool,
}

impl PostgresComplianceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CONTROL_COLUMNS: &str = r#"
    control_id, control_code, control_name, control_description, regulation,
    control_category, implementation_status, is_mandatory, is_active
"#;

#[async_trait]
impl ComplianceRepository for PostgresComplianceRepository {
    async fn list_active_controls(&self) -> AppResult<Vec<ComplianceControl>> {
        let rows = sqlx::query_as::<_, ControlRow>(&format!(
            "SELECT {} FROM compliance_controls WHERE is_active = TRUE ORDER BY regulation, control_code",
            CONTROL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_control(&self, id: ControlId) -> AppResult<Option<ComplianceControl>> {
        let row = sqlx::query_as::<_, ControlRow>(&format!(
            "SELECT {} FROM compliance_controls WHERE control_id = $1",
            CONTROL_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn mapping_counts(&self) -> AppResult<HashMap<ControlId, u32>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT control_id, COUNT(*) FROM risk_compliance_mapping GROUP BY control_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(control_id, count)| (ControlId(control_id), count.try_into().unwrap_or(u32::MAX)))
            .collect())
    }

    async fn find_mapping(
        &self,
        risk_id: RiskId,
        control_id: ControlId,
    ) -> AppResult<Option<RiskControlMapping>> {
        let row = sqlx::query_as::<_, MappingRow>(
            r#"
            SELECT mapping_id, risk_id, control_id, mapping_type, mapped_by, mapped_at
            FROM risk_compliance_mapping
            WHERE risk_id = $1 AND control_id = $2
            "#,
        )
        .bind(risk_id.0)
        .bind(control_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(MappingRow::into_mapping).transpose()
    }

    async fn insert_mapping(&self, mapping: &NewMapping) -> AppResult<MappingId> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO risk_compliance_mapping (risk_id, control_id, mapping_type, mapped_by, mapped_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING mapping_id
            "#,
        )
        .bind(mapping.risk_id.0)
        .bind(mapping.control_id.0)
        .bind(mapping.mapping_type.as_str())
        .bind(mapping.mapped_by.map(|u| u.0))
        .bind(mapping.mapped_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(MappingId(id))
    }

    async fn delete_mapping(&self, mapping_id: MappingId, risk_id: RiskId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM risk_compliance_mapping WHERE mapping_id = $1 AND risk_id = $2")
            .bind(mapping_id.0)
            .bind(risk_id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_mappings(&self, risk_id: RiskId) -> AppResult<Vec<MappingView>> {
        let rows = sqlx::query_as::<_, MappingViewRow>(
            r#"
            SELECT m.mapping_id, m.mapping_type, m.mapped_at,
                   c.control_id, c.control_code, c.control_name, c.regulation
            FROM risk_compliance_mapping m
            INNER JOIN compliance_controls c ON m.control_id = c.control_id
            WHERE m.risk_id = $1
            ORDER BY c.regulation, c.control_code
            "#,
        )
        .bind(risk_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(MappingViewRow::into_view).collect()
    }
}

// ============ 数据行映射 ============

fn parse_mapping_type(raw: &str) -> AppResult<MappingType> {
    raw.parse::<MappingType>()
        .map_err(|e| AppError::internal(format!("Stored mapping type '{}' is invalid: {}", raw, e)))
}

#[derive(sqlx::FromRow)]
struct ControlRow {
    control_id: i64,
    control_code: String,
    control_name: String,
    control_description: Option<String>,
    regulation: String,
    control_category: Option<String>,
    implementation_status: String,
    is_mandatory: bool,
    is_active: bool,
}

impl From<ControlRow> for ComplianceControl {
    fn from(row: ControlRow) -> Self {
        ComplianceControl {
            control_id: ControlId(row.control_id),
            control_code: row.control_code,
            control_name: row.control_name,
            control_description: row.control_description,
            regulation: row.regulation,
            control_category: row.control_category,
            implementation_status: row.implementation_status,
            is_mandatory: row.is_mandatory,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MappingRow {
    mapping_id: i64,
    risk_id: i64,
    control_id: i64,
    mapping_type: String,
    mapped_by: Option<i64>,
    mapped_at: DateTime<Utc>,
}

impl MappingRow {
    fn into_mapping(self) -> AppResult<RiskControlMapping> {
        Ok(RiskControlMapping {
            mapping_id: MappingId(self.mapping_id),
            risk_id: RiskId(self.risk_id),
            control_id: ControlId(self.control_id),
            mapping_type: parse_mapping_type(&self.mapping_type)?,
            mapped_by: self.mapped_by.map(UserId),
            mapped_at: self.mapped_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MappingViewRow {
    mapping_id: i64,
    mapping_type: String,
    mapped_at: DateTime<Utc>,
    control_id: i64,
    control_code: String,
    control_name: String,
    regulation: String,
}

impl MappingViewRow {
    fn into_view(self) -> AppResult<MappingView> {
        Ok(MappingView {
            mapping_id: MappingId(self.mapping_id),
            mapping_type: parse_mapping_type(&self.mapping_type)?,
            mapped_at: self.mapped_at,
            control_id: ControlId(self.control_id),
            control_code: self.control_code,
            control_name: self.control_name,
            regulation: self.regulation,
        })
    }
}
