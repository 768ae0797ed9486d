//! sqlx 错误映射

use grc_common::is_retryable_error;
use grc_errors::AppError;

/// PostgreSQL 唯一约束冲突
pub const UNIQUE_VIOLATION: &str = "23505";
/// 外键约束冲突
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// CHECK 约束冲突
pub const CHECK_VIOLATION: &str = "23514";

/// 将 sqlx 错误转换为 AppError
///
/// - 唯一约束 → `Duplicate`（风险编号冲突时调用方据此重试）
/// - 外键 / CHECK 约束 → `Validation`
/// - 连接类、池超时 → `StoreUnavailable`
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                return AppError::duplicate(format!("Violates {}", constraint));
            }
            Some(FOREIGN_KEY_VIOLATION) | Some(CHECK_VIOLATION) => {
                return AppError::validation(db_err.message().to_string());
            }
            _ => {}
        }
    }

    if is_sqlx_transient(&e) {
        tracing::warn!(error = %e, "Transient database failure");
        AppError::store_unavailable(e.to_string())
    } else {
        tracing::error!(error = %e, "Database failure");
        AppError::internal(format!("Database error: {}", e))
    }
}

/// 判断 sqlx 错误是否为瞬时错误
pub fn is_sqlx_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => true,
        sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::PoolClosed => false,
        sqlx::Error::Database(db_err) => {
            // 40001 serialization_failure, 40P01 deadlock_detected,
            // 57P0x 服务端关闭, 08xxx 连接异常
            match db_err.code() {
                Some(code) => matches!(
                    code.as_ref(),
                    "40001" | "40P01" | "57P01" | "57P02" | "57P03" | "08000" | "08003" | "08006"
                ),
                None => is_retryable_error(db_err.message()),
            }
        }
        other => is_retryable_error(&other.to_string()),
    }
}
