//! 数据库结构

use grc_errors::AppResult;
use sqlx::PgPool;

use crate::error::map_sqlx_error;

/// 建表脚本，可重复执行
pub const SCHEMA_SQL: &str = include_str!("../migrations/0001_grc_schema.sql");

/// 应用建表脚本
pub async fn apply_schema(pool: &PgPool) -> AppResult<()> {
    tracing::info!("Applying database schema");
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_does_not_store_derived_score() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS risks"));
        assert!(!SCHEMA_SQL.contains("risk_score"));
        assert!(!SCHEMA_SQL.contains("risk_level"));
    }

    #[test]
    fn test_mapping_pair_is_unique() {
        assert!(SCHEMA_SQL.contains("UNIQUE (risk_id, control_id)"));
    }
}
