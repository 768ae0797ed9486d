//! PostgreSQL 连接管理
//!
//! 连接池是唯一的共享可变资源：每个请求借出一个连接，执行一条语句或一个事务后归还

use std::time::Duration;

use grc_errors::AppResult;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::map_sqlx_error;

/// PostgreSQL 连接池配置
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 借出连接的等待上限，超时按存储不可用处理
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self.min_connections = self.min_connections.min(max);
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// 创建 PostgreSQL 连接池
pub async fn create_pool(config: &PostgresConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await
        .map_err(map_sqlx_error)
}

/// 检查数据库连接
pub async fn check_connection(pool: &PgPool) -> AppResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

/// 连接池状态
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: u32,
    pub active: u32,
}

pub fn pool_status(pool: &PgPool) -> PoolStatus {
    let size = pool.size();
    let idle = pool.num_idle() as u32;
    PoolStatus {
        size,
        idle,
        active: size.saturating_sub(idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PostgresConfig::new("postgres://localhost/grc")
            .with_max_connections(5)
            .with_acquire_timeout(Duration::from_secs(3));

        assert_eq!(config.url, "postgres://localhost/grc");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_min_connections_never_exceeds_max() {
        let config = PostgresConfig {
            min_connections: 4,
            ..PostgresConfig::default()
        }
        .with_max_connections(2);
        assert_eq!(config.min_connections, 2);
    }
}
