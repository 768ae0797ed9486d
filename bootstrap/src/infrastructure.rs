//! 基础设施资源管理

use std::sync::Arc;
use std::time::Duration;

pub use grc_adapter_postgres::PoolStatus;
use grc_adapter_postgres::{PostgresConfig, apply_schema, create_pool, pool_status};
use grc_auth_core::{PasswordHasher, SessionTokenService};
use grc_common::{RetryConfig, with_retry};
use grc_config::AppConfig;
use grc_errors::AppResult;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

/// 基础设施资源容器
///
/// 进程内只创建一次，由 main 持有并注入各服务
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: PgPool,
    token_service: Arc<SessionTokenService>,
    password_hasher: Arc<PasswordHasher>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let retry_config = RetryConfig::default();

        // 1. 创建 PostgreSQL 连接池（固定上限，带重试）
        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections)
            .with_acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs));
        let postgres_pool = with_retry(&retry_config, "PostgreSQL connection", || {
            let cfg = pg_config.clone();
            async move { create_pool(&cfg).await }
        })
        .await?;
        info!(
            "PostgreSQL connection pool created (max_connections: {})",
            config.database.max_connections
        );

        // 2. 建表
        apply_schema(&postgres_pool).await?;

        // 3. 会话令牌服务
        let token_service = Arc::new(SessionTokenService::new(
            config.session.secret.expose_secret(),
            config.session.issuer.clone(),
        ));

        // 4. 口令校验器
        let password_hasher = Arc::new(PasswordHasher::new()?);

        Ok(Self {
            config,
            postgres_pool,
            token_service,
            password_hasher,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }

    pub fn token_service(&self) -> Arc<SessionTokenService> {
        self.token_service.clone()
    }

    pub fn password_hasher(&self) -> Arc<PasswordHasher> {
        self.password_hasher.clone()
    }

    /// 会话空闲超时
    pub fn session_idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.config.session.idle_timeout_minutes)
    }

    pub fn postgres_pool_status(&self) -> PoolStatus {
        pool_status(&self.postgres_pool)
    }

    /// 关闭连接池，等待借出的连接归还
    pub async fn close(&self) {
        self.postgres_pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
}
