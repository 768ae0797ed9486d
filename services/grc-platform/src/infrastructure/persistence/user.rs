//! PostgreSQL 用户仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_adapter_postgres::map_sqlx_error;
use grc_auth_core::Role;
use grc_common::UserId;
use grc_errors::AppResult;
use sqlx::PgPool;

use crate::domain::user::{User, UserRepository};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    user_id, username, password_hash, full_name, email, job_title, department, is_active, last_login
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_roles(&self, id: UserId) -> AppResult<Vec<Role>> {
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.role_name
            FROM roles r
            INNER JOIN user_roles ur ON r.role_id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.role_id
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(names.into_iter().map(|(name,)| Role::from(name)).collect())
    }

    async fn update_last_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE user_id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

// ============ 数据行映射 ============

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    username: String,
    password_hash: String,
    full_name: String,
    email: Option<String>,
    job_title: Option<String>,
    department: Option<String>,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.user_id),
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            email: row.email,
            job_title: row.job_title,
            department: row.department,
            is_active: row.is_active,
            last_login: row.last_login,
        }
    }
}
