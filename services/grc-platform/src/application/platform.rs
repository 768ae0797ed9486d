//! 对外操作入口
//!
//! 每个操作都是"访问策略 + 服务调用"的组合，路由层只与这里交互

use std::sync::Arc;
use std::time::Duration;

use grc_auth_core::{PasswordHasher, SessionTokenService};
use grc_common::{Clock, ControlId, MappingId, RiskId};
use grc_config::{AppConfig, AuditMode};
use grc_errors::AppResult;

use super::audit::{AuditExport, AuditLogger, AuditTrail, AuditTrailService};
use super::auth::{AuthError, Authenticator, LoginOutcome, LoginRequest};
use super::compliance::{ComplianceService, ControlsOverview, RiskMappings};
use super::context::RequestContext;
use super::guard::{AuthorizationGuard, policies};
use super::risk::{CreatedRisk, DeletedRisk, HeatMap, RiskRegister, RiskService, RiskSummary, StatusChange};
use crate::domain::audit::{AuditStore, TrailParams};
use crate::domain::compliance::ComplianceRepository;
use crate::domain::risk::{RiskDraft, RiskRepository};
use crate::domain::session::SessionStore;
use crate::domain::user::{UserProfile, UserRepository};

/// 运行参数
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub audit_mode: AuditMode,
    pub trail_limit: u32,
    pub default_trail_days: u32,
    pub default_export_days: u32,
    pub code_retry_attempts: u32,
    pub store_timeout: Duration,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            audit_mode: AuditMode::FireAndForget,
            trail_limit: 500,
            default_trail_days: 7,
            default_export_days: 30,
            code_retry_attempts: 5,
            store_timeout: Duration::from_secs(5),
        }
    }
}

impl PlatformSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            audit_mode: config.audit.mode,
            trail_limit: config.audit.trail_limit,
            default_trail_days: config.audit.default_trail_days,
            default_export_days: config.audit.default_export_days,
            code_retry_attempts: config.risk.code_retry_attempts,
            store_timeout: Duration::from_secs(config.risk.store_timeout_secs),
        }
    }
}

/// 构造依赖，全部显式注入
pub struct PlatformDeps {
    pub users: Arc<dyn UserRepository>,
    pub risks: Arc<dyn RiskRepository>,
    pub compliance: Arc<dyn ComplianceRepository>,
    pub audit_store: Arc<dyn AuditStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<SessionTokenService>,
    pub clock: Arc<dyn Clock>,
    pub settings: PlatformSettings,
}

/// GRC 平台
#[derive(Clone)]
pub struct GrcPlatform {
    guard: AuthorizationGuard,
    authenticator: Authenticator,
    risks: RiskService,
    compliance: ComplianceService,
    audit_trail: AuditTrailService,
    tokens: Arc<SessionTokenService>,
}

impl GrcPlatform {
    pub fn new(deps: PlatformDeps) -> Self {
        let settings = deps.settings;
        let timeout = settings.store_timeout;

        let logger = AuditLogger::new(deps.audit_store.clone(), deps.clock.clone())
            .with_mode(settings.audit_mode)
            .with_timeout(timeout);

        let authenticator = Authenticator::new(
            deps.users,
            deps.sessions.clone(),
            deps.hasher,
            deps.tokens.clone(),
            logger.clone(),
            deps.clock.clone(),
        )
        .with_timeout(timeout);

        let risks = RiskService::new(deps.risks.clone(), logger.clone(), deps.clock.clone())
            .with_code_retry_attempts(settings.code_retry_attempts)
            .with_timeout(timeout);

        let compliance = ComplianceService::new(
            deps.compliance,
            deps.risks,
            logger.clone(),
            deps.clock.clone(),
        )
        .with_timeout(timeout);

        let audit_trail = AuditTrailService::new(deps.audit_store, logger, deps.clock)
            .with_limits(
                settings.trail_limit,
                settings.default_trail_days,
                settings.default_export_days,
            )
            .with_timeout(timeout);

        Self {
            guard: AuthorizationGuard::new(deps.sessions),
            authenticator,
            risks,
            compliance,
            audit_trail,
            tokens: deps.tokens,
        }
    }

    pub fn guard(&self) -> &AuthorizationGuard {
        &self.guard
    }

    pub fn token_service(&self) -> &SessionTokenService {
        &self.tokens
    }

    // ---- 认证 ----

    pub async fn login(&self, ctx: &RequestContext, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        self.authenticator.login(ctx, request).await
    }

    pub async fn logout(&self, ctx: &RequestContext) -> AppResult<()> {
        self.authenticator.logout(ctx).await
    }

    /// 当前用户；会话无效或用户已停用时返回 `None`
    pub async fn current_user(&self, ctx: &RequestContext) -> AppResult<Option<UserProfile>> {
        match &ctx.session {
            Some(sid) => self.authenticator.refresh_identity(sid).await,
            None => Ok(None),
        }
    }

    // ---- 风险 ----

    pub async fn risk_register(&self, ctx: &RequestContext) -> AppResult<RiskRegister> {
        self.guard
            .guard(ctx, policies::view(), |_| self.risks.register())
            .await
    }

    pub async fn heat_map(&self, ctx: &RequestContext) -> AppResult<HeatMap> {
        self.guard
            .guard(ctx, policies::view(), |_| self.risks.heat_map())
            .await
    }

    pub async fn dashboard(&self, ctx: &RequestContext) -> AppResult<RiskSummary> {
        self.guard
            .guard(ctx, policies::view(), |_| self.risks.summary())
            .await
    }

    pub async fn create_risk(&self, ctx: &RequestContext, draft: RiskDraft) -> AppResult<CreatedRisk> {
        self.guard
            .guard(ctx, policies::manage_risks(), |caller| async move {
                self.risks.create_risk(&caller, draft).await
            })
            .await
    }

    pub async fn update_risk_status(
        &self,
        ctx: &RequestContext,
        risk_id: RiskId,
        new_status: &str,
    ) -> AppResult<StatusChange> {
        self.guard
            .guard(ctx, policies::manage_risks(), |caller| async move {
                self.risks.update_status(&caller, risk_id, new_status).await
            })
            .await
    }

    pub async fn delete_risk(&self, ctx: &RequestContext, risk_id: RiskId) -> AppResult<DeletedRisk> {
        self.guard
            .guard(ctx, policies::delete_risk(), |caller| async move {
                self.risks.delete_risk(&caller, risk_id).await
            })
            .await
    }

    // ---- 合规 ----

    pub async fn compliance_controls(&self, ctx: &RequestContext) -> AppResult<ControlsOverview> {
        self.guard
            .guard(ctx, policies::view(), |caller| async move {
                self.compliance.controls_overview(&caller).await
            })
            .await
    }

    pub async fn risk_mappings(&self, ctx: &RequestContext, risk_id: RiskId) -> AppResult<RiskMappings> {
        self.guard
            .guard(ctx, policies::map_controls(), |_| self.compliance.list_mappings(risk_id))
            .await
    }

    pub async fn add_mapping(
        &self,
        ctx: &RequestContext,
        risk_id: RiskId,
        control_id: ControlId,
        mapping_type: Option<&str>,
    ) -> AppResult<MappingId> {
        self.guard
            .guard(ctx, policies::map_controls(), |caller| async move {
                self.compliance
                    .add_mapping(&caller, risk_id, control_id, mapping_type)
                    .await
            })
            .await
    }

    pub async fn remove_mapping(
        &self,
        ctx: &RequestContext,
        mapping_id: MappingId,
        risk_id: RiskId,
    ) -> AppResult<()> {
        self.guard
            .guard(ctx, policies::map_controls(), |caller| async move {
                self.compliance.remove_mapping(&caller, mapping_id, risk_id).await
            })
            .await
    }

    // ---- 审计 ----

    pub async fn audit_trail(&self, ctx: &RequestContext, params: &TrailParams) -> AppResult<AuditTrail> {
        self.guard
            .guard(ctx, policies::view_audit_trail(), |caller| async move {
                self.audit_trail.query_trail(&caller, params).await
            })
            .await
    }

    pub async fn export_audit_log(&self, ctx: &RequestContext, days: Option<&str>) -> AppResult<AuditExport> {
        self.guard
            .guard(ctx, policies::export_audit_log(), |caller| async move {
                self.audit_trail.export(&caller, days).await
            })
            .await
    }
}
