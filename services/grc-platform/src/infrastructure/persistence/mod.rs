//! PostgreSQL 仓储实现

mod audit;
mod compliance;
mod risk;
mod user;

pub use audit::PostgresAuditStore;
pub use compliance::PostgresComplianceRepository;
pub use risk::PostgresRiskRepository;
pub use user::PostgresUserRepository;
