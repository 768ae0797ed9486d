//! 风险服务

use std::sync::Arc;
use std::time::Duration;

use grc_common::{Clock, RetryConfig, RiskId, with_conditional_retry};
use grc_errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::json;

use crate::application::audit::{AuditEntry, AuditLogger};
use crate::application::context::Caller;
use crate::application::support::bounded;
use crate::domain::audit::{AuditAction, entity};
use crate::domain::risk::{
    LevelCounts, RiskCode, RiskDraft, RiskLevel, RiskRepository, RiskScore, RiskStatus, RiskView,
};

/// 创建结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRisk {
    pub risk_id: RiskId,
    pub risk_code: RiskCode,
    pub risk_score: RiskScore,
    pub risk_level: RiskLevel,
}

/// 状态变更结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub risk_id: RiskId,
    pub risk_code: RiskCode,
    pub previous_status: RiskStatus,
    pub new_status: RiskStatus,
}

/// 删除结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedRisk {
    pub risk_id: RiskId,
    pub risk_code: RiskCode,
}

/// 风险登记册
#[derive(Debug, Clone, Serialize)]
pub struct RiskRegister {
    pub risks: Vec<RiskView>,
    pub counts: LevelCounts,
    /// 状态词汇，按生命周期顺序
    pub lifecycle: Vec<&'static str>,
}

/// 热力图单元格中的风险
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatMapEntry {
    pub id: RiskId,
    pub code: RiskCode,
    pub title: String,
    pub level: RiskLevel,
}

/// 5×5 热力图，`matrix[impact-1][probability-1]`
#[derive(Debug, Clone, Serialize)]
pub struct HeatMap {
    pub matrix: Vec<Vec<Vec<HeatMapEntry>>>,
    pub level_counts: LevelCounts,
    pub total_risks: usize,
}

/// 仪表盘风险汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummary {
    pub total_risks: u32,
    pub high_risks: u32,
    pub medium_risks: u32,
    pub low_risks: u32,
    /// 未接受也未关闭
    pub open_risks: u32,
    pub avg_risk_score: f64,
}

/// 风险服务
#[derive(Clone)]
pub struct RiskService {
    repo: Arc<dyn RiskRepository>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
    code_retry_attempts: u32,
    timeout: Duration,
}

impl RiskService {
    pub fn new(repo: Arc<dyn RiskRepository>, audit: AuditLogger, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            audit,
            clock,
            code_retry_attempts: 5,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_code_retry_attempts(mut self, attempts: u32) -> Self {
        self.code_retry_attempts = attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 创建风险
    ///
    /// 编号取当年最大序号 + 1；插入时编号冲突则重新计算并重试
    pub async fn create_risk(&self, caller: &Caller, draft: RiskDraft) -> AppResult<CreatedRisk> {
        let risk = draft.validate()?;
        let score = risk.score();
        let level = score.level();

        let retry = RetryConfig::immediate(self.code_retry_attempts);
        let (repo, clock, new_risk, timeout) = (&self.repo, &self.clock, &risk, self.timeout);
        let created_by = Some(caller.user_id());
        let (risk_id, code) = with_conditional_retry(
            &retry,
            "risk code allocation",
            || async move {
                let now = clock.now();
                let year = clock.current_year();
                let max = bounded(timeout, "risk code lookup", repo.max_code_sequence(year)).await?;
                let code = RiskCode::next_after(year, max);
                let id = bounded(
                    timeout,
                    "risk insert",
                    repo.insert(&code, new_risk, created_by, now),
                )
                .await?;
                Ok::<_, AppError>((id, code))
            },
            AppError::is_duplicate,
        )
        .await?;

        tracing::info!(
            risk_id = %risk_id,
            risk_code = %code,
            score = score.value(),
            level = %level,
            "Risk created"
        );

        self.audit
            .record(
                AuditEntry::new(AuditAction::RiskCreated)
                    .by(caller)
                    .entity(entity::RISKS, Some(risk_id.value()))
                    .detail(json!({
                        "risk_code": code.as_str(),
                        "risk_title": risk.title,
                        "risk_level": level.as_str(),
                        "probability": risk.probability.value(),
                        "impact": risk.impact.value(),
                        "score": score.value(),
                        "created_by": caller.username(),
                    })),
            )
            .await?;

        Ok(CreatedRisk {
            risk_id,
            risk_code: code,
            risk_score: score,
            risk_level: level,
        })
    }

    /// 修改状态
    ///
    /// 词汇表内的任意状态都可以直接设置，不检查当前状态
    pub async fn update_status(&self, caller: &Caller, risk_id: RiskId, new_status: &str) -> AppResult<StatusChange> {
        let new_status: RiskStatus = new_status.trim().parse()?;

        let risk = bounded(self.timeout, "risk lookup", self.repo.find_by_id(risk_id))
            .await?
            .ok_or_else(|| AppError::not_found("Risk not found."))?;

        let updated = bounded(
            self.timeout,
            "risk status update",
            self.repo.update_status(risk_id, new_status, self.clock.now()),
        )
        .await?;
        if !updated {
            return Err(AppError::not_found("Risk not found."));
        }

        tracing::info!(
            risk_id = %risk_id,
            risk_code = %risk.code,
            from = %risk.status,
            to = %new_status,
            "Risk status updated"
        );

        self.audit
            .record(
                AuditEntry::new(AuditAction::RiskStatusUpdated)
                    .by(caller)
                    .entity(entity::RISKS, Some(risk_id.value()))
                    .detail(json!({
                        "risk_code": risk.code.as_str(),
                        "risk_title": risk.title,
                        "previous_status": risk.status.as_str(),
                        "new_status": new_status.as_str(),
                        "updated_by": caller.username(),
                    })),
            )
            .await?;

        Ok(StatusChange {
            risk_id,
            risk_code: risk.code,
            previous_status: risk.status,
            new_status,
        })
    }

    /// 删除风险及其映射
    pub async fn delete_risk(&self, caller: &Caller, risk_id: RiskId) -> AppResult<DeletedRisk> {
        let risk = bounded(self.timeout, "risk lookup", self.repo.find_by_id(risk_id))
            .await?
            .ok_or_else(|| AppError::not_found("Risk not found."))?;

        let deleted = bounded(self.timeout, "risk delete", self.repo.delete_with_mappings(risk_id)).await?;
        if !deleted {
            return Err(AppError::not_found("Risk not found."));
        }

        tracing::info!(risk_id = %risk_id, risk_code = %risk.code, "Risk deleted");

        self.audit
            .record(
                AuditEntry::new(AuditAction::RiskDeleted)
                    .by(caller)
                    .entity(entity::RISKS, Some(risk_id.value()))
                    .detail(json!({
                        "risk_code": risk.code.as_str(),
                        "risk_title": risk.title,
                        "deleted_by": caller.username(),
                    })),
            )
            .await?;

        Ok(DeletedRisk {
            risk_id,
            risk_code: risk.code,
        })
    }

    /// 风险登记册
    pub async fn register(&self) -> AppResult<RiskRegister> {
        let entries = bounded(self.timeout, "risk register", self.repo.list_register()).await?;
        let risks: Vec<RiskView> = entries.iter().map(RiskView::from).collect();
        let counts = risks.iter().map(|r| r.risk_level).collect();

        Ok(RiskRegister {
            risks,
            counts,
            lifecycle: RiskStatus::ALL.iter().map(RiskStatus::as_str).collect(),
        })
    }

    /// 热力图数据
    pub async fn heat_map(&self) -> AppResult<HeatMap> {
        let entries = bounded(self.timeout, "risk heat map", self.repo.list_register()).await?;

        let mut matrix: Vec<Vec<Vec<HeatMapEntry>>> = vec![vec![Vec::new(); 5]; 5];
        let mut level_counts = LevelCounts::default();
        for entry in &entries {
            let risk = &entry.risk;
            let level = risk.level();
            matrix[risk.impact.index()][risk.probability.index()].push(HeatMapEntry {
                id: risk.id,
                code: risk.code.clone(),
                title: risk.title.clone(),
                level,
            });
            level_counts.record(level);
        }

        Ok(HeatMap {
            matrix,
            level_counts,
            total_risks: entries.len(),
        })
    }

    /// 仪表盘汇总
    pub async fn summary(&self) -> AppResult<RiskSummary> {
        let entries = bounded(self.timeout, "risk summary", self.repo.list_register()).await?;

        let counts: LevelCounts = entries.iter().map(|e| e.risk.level()).collect();
        let open_risks = entries.iter().filter(|e| e.risk.status.is_open()).count() as u32;
        let avg_risk_score = if entries.is_empty() {
            0.0
        } else {
            let total: u32 = entries.iter().map(|e| e.risk.score().value() as u32).sum();
            (total as f64 / entries.len() as f64 * 10.0).round() / 10.0
        };

        Ok(RiskSummary {
            total_risks: counts.total(),
            high_risks: counts.high,
            medium_risks: counts.medium,
            low_risks: counts.low,
            open_risks,
            avg_risk_score,
        })
    }
}
