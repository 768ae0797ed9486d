//! 合规映射服务

use std::sync::Arc;
use std::time::Duration;

use grc_common::{Clock, ControlId, MappingId, RiskId};
use grc_errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::json;

use crate::application::audit::{AuditEntry, AuditLogger};
use crate::application::context::Caller;
use crate::application::support::bounded;
use crate::domain::audit::{AuditAction, entity};
use crate::domain::compliance::{
    ComplianceControl, ComplianceRepository, MappingType, MappingView, NewMapping,
    RegulationStats, regulation_stats,
};
use crate::domain::risk::{Risk, RiskCode, RiskLevel, RiskRepository};

/// 控制项及其关联风险数
#[derive(Debug, Clone, Serialize)]
pub struct ControlOverview {
    #[serde(flatten)]
    pub control: ComplianceControl,
    pub mapped_risks: u32,
}

/// 合规控制项总览
#[derive(Debug, Clone, Serialize)]
pub struct ControlsOverview {
    pub controls: Vec<ControlOverview>,
    pub stats: Vec<RegulationStats>,
}

/// 被映射的风险摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedRisk {
    pub risk_id: RiskId,
    pub risk_code: RiskCode,
    pub risk_title: String,
    pub risk_level: RiskLevel,
}

impl From<&Risk> for MappedRisk {
    fn from(risk: &Risk) -> Self {
        Self {
            risk_id: risk.id,
            risk_code: risk.code.clone(),
            risk_title: risk.title.clone(),
            risk_level: risk.level(),
        }
    }
}

/// 某个风险的映射列表
#[derive(Debug, Clone, Serialize)]
pub struct RiskMappings {
    pub risk: MappedRisk,
    pub mappings: Vec<MappingView>,
}

/// 合规映射服务
#[derive(Clone)]
pub struct ComplianceService {
    repo: Arc<dyn ComplianceRepository>,
    risks: Arc<dyn RiskRepository>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ComplianceService {
    pub fn new(
        repo: Arc<dyn ComplianceRepository>,
        risks: Arc<dyn RiskRepository>,
        audit: AuditLogger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            risks,
            audit,
            clock,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 合规控制项总览，记为 `COMPLIANCE_CONTROLS_VIEWED`
    pub async fn controls_overview(&self, caller: &Caller) -> AppResult<ControlsOverview> {
        let controls = bounded(self.timeout, "control list", self.repo.list_active_controls()).await?;
        let counts = bounded(self.timeout, "mapping counts", self.repo.mapping_counts()).await?;

        let stats = regulation_stats(&controls);
        let controls: Vec<ControlOverview> = controls
            .into_iter()
            .map(|control| ControlOverview {
                mapped_risks: counts.get(&control.control_id).copied().unwrap_or(0),
                control,
            })
            .collect();

        self.audit
            .record(
                AuditEntry::new(AuditAction::ComplianceControlsViewed)
                    .by(caller)
                    .entity(entity::CONTROLS, None)
                    .detail(json!({
                        "viewed_by": caller.username(),
                        "control_count": controls.len(),
                    })),
            )
            .await?;

        Ok(ControlsOverview { controls, stats })
    }

    /// 某个风险的映射
    pub async fn list_mappings(&self, risk_id: RiskId) -> AppResult<RiskMappings> {
        let risk = self.require_risk(risk_id).await?;
        let mappings = bounded(self.timeout, "mapping list", self.repo.list_mappings(risk_id)).await?;
        Ok(RiskMappings {
            risk: MappedRisk::from(&risk),
            mappings,
        })
    }

    /// 建立映射
    ///
    /// 先查重，同一对风险与控制项已存在时返回 `Duplicate` 且不写审计
    pub async fn add_mapping(
        &self,
        caller: &Caller,
        risk_id: RiskId,
        control_id: ControlId,
        mapping_type: Option<&str>,
    ) -> AppResult<MappingId> {
        let mapping_type = MappingType::parse_or_default(mapping_type)?;
        let risk = self.require_risk(risk_id).await?;

        let existing = bounded(
            self.timeout,
            "mapping lookup",
            self.repo.find_mapping(risk_id, control_id),
        )
        .await?;
        if existing.is_some() {
            return Err(AppError::duplicate("This risk-control mapping already exists."));
        }

        let control = bounded(self.timeout, "control lookup", self.repo.find_control(control_id))
            .await?
            .ok_or_else(|| AppError::not_found("Control not found."))?;

        let mapping = NewMapping {
            risk_id,
            control_id,
            mapping_type,
            mapped_by: Some(caller.user_id()),
            mapped_at: self.clock.now(),
        };
        // 并发插入同一对时由唯一约束兜底，同样返回 Duplicate
        let mapping_id = bounded(self.timeout, "mapping insert", self.repo.insert_mapping(&mapping)).await?;

        tracing::info!(
            mapping_id = %mapping_id,
            risk_code = %risk.code,
            control = %control.control_code,
            mapping_type = %mapping_type,
            "Risk mapped to control"
        );

        self.audit
            .record(
                AuditEntry::new(AuditAction::RiskControlMapped)
                    .by(caller)
                    .entity(entity::MAPPINGS, Some(risk_id.value()))
                    .detail(json!({
                        "risk_code": risk.code.as_str(),
                        "control": control.control_code,
                        "mapping_type": mapping_type.as_str(),
                        "mapped_by": caller.username(),
                    })),
            )
            .await?;

        Ok(mapping_id)
    }

    /// 删除映射，限定在给定风险之下
    pub async fn remove_mapping(&self, caller: &Caller, mapping_id: MappingId, risk_id: RiskId) -> AppResult<()> {
        let risk = self.require_risk(risk_id).await?;

        let removed = bounded(
            self.timeout,
            "mapping delete",
            self.repo.delete_mapping(mapping_id, risk_id),
        )
        .await?;
        if !removed {
            return Err(AppError::not_found("Mapping not found."));
        }

        tracing::info!(mapping_id = %mapping_id, risk_code = %risk.code, "Mapping removed");

        self.audit
            .record(
                AuditEntry::new(AuditAction::RiskControlUnmapped)
                    .by(caller)
                    .entity(entity::MAPPINGS, Some(risk_id.value()))
                    .detail(json!({
                        "risk_code": risk.code.as_str(),
                        "mapping_id": mapping_id.value(),
                        "removed_by": caller.username(),
                    })),
            )
            .await
    }

    async fn require_risk(&self, risk_id: RiskId) -> AppResult<Risk> {
        bounded(self.timeout, "risk lookup", self.risks.find_by_id(risk_id))
            .await?
            .ok_or_else(|| AppError::not_found("Risk not found."))
    }
}
