//! 存储调用的超时约束

use std::future::Future;
use std::time::Duration;

use grc_errors::{AppError, AppResult};

/// 在 `limit` 内完成存储调用，超时按 `StoreUnavailable` 返回，由调用方决定是否重试
pub async fn bounded<T, F>(limit: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Store operation timed out"
            );
            Err(AppError::store_unavailable(format!("{} timed out", operation)))
        }
    }
}
