//! 基础设施层：仓储与会话存储实现

pub mod memory;
pub mod persistence;

#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryGrcStore;
pub use memory::InMemorySessionStore;
pub use persistence::{PostgresAuditStore, PostgresComplianceRepository, PostgresRiskRepository, PostgresUserRepository};
