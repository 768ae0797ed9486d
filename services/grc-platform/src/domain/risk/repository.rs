//! 风险仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_common::{RiskId, UserId};
use grc_errors::AppResult;

use super::code::RiskCode;
use super::risk::{NewRisk, Risk, RiskRegisterEntry};
use super::status::RiskStatus;

/// 风险仓储接口
#[async_trait]
pub trait RiskRepository: Send + Sync {
    /// 指定年份已使用的最大编号序号
    async fn max_code_sequence(&self, year: i32) -> AppResult<Option<u32>>;

    /// 以初始状态 `Identified` 插入风险；编号冲突返回 `Duplicate`
    async fn insert(
        &self,
        code: &RiskCode,
        risk: &NewRisk,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AppResult<RiskId>;

    async fn find_by_id(&self, id: RiskId) -> AppResult<Option<Risk>>;

    /// 更新状态，风险不存在时返回 false
    async fn update_status(
        &self,
        id: RiskId,
        status: RiskStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// 在一个事务内先删除映射再删除风险，风险不存在时返回 false
    async fn delete_with_mappings(&self, id: RiskId) -> AppResult<bool>;

    /// 风险登记册，按分值降序、创建时间降序
    async fn list_register(&self) -> AppResult<Vec<RiskRegisterEntry>>;
}
