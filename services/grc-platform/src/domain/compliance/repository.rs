//! 合规仓储接口

use std::collections::HashMap;

use async_trait::async_trait;
use grc_common::{ControlId, MappingId, RiskId};
use grc_errors::AppResult;

use super::control::ComplianceControl;
use super::mapping::{MappingView, NewMapping, RiskControlMapping};

/// 合规控制项与映射仓储接口
#[async_trait]
pub trait ComplianceRepository: Send + Sync {
    /// 启用的控制项，按法规、编号排序
    async fn list_active_controls(&self) -> AppResult<Vec<ComplianceControl>>;

    async fn find_control(&self, id: ControlId) -> AppResult<Option<ComplianceControl>>;

    /// 每个控制项关联的风险数
    async fn mapping_counts(&self) -> AppResult<HashMap<ControlId, u32>>;

    async fn find_mapping(
        &self,
        risk_id: RiskId,
        control_id: ControlId,
    ) -> AppResult<Option<RiskControlMapping>>;

    /// 插入映射；同一 (risk_id, control_id) 已存在时返回 `Duplicate`
    async fn insert_mapping(&self, mapping: &NewMapping) -> AppResult<MappingId>;

    /// 按 (mapping_id, risk_id) 删除，未删除任何记录时返回 false
    async fn delete_mapping(&self, mapping_id: MappingId, risk_id: RiskId) -> AppResult<bool>;

    /// 某个风险的全部映射，按法规、控制项编号排序
    async fn list_mappings(&self, risk_id: RiskId) -> AppResult<Vec<MappingView>>;
}
