//! 集成测试公共设施：内存仓储 + 手动时钟组装的平台
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use grc_auth_core::{PasswordHasher, Role, SessionTokenService};
use grc_common::{CategoryId, Clock, ControlId, ManualClock, UserId};
use grc_platform::application::auth::LoginRequest;
use grc_platform::application::risk::CreatedRisk;
use grc_platform::application::{GrcPlatform, PlatformDeps, PlatformSettings, RequestContext};
use grc_platform::domain::audit::AuditEvent;
use grc_platform::domain::risk::RiskDraft;
use grc_platform::infrastructure::{InMemoryGrcStore, InMemorySessionStore};

pub const PASSWORD: &str = "Str0ng-Passphrase";
pub const ORIGIN: &str = "198.51.100.23";

pub struct Users {
    pub admin: UserId,
    pub manager: UserId,
    pub officer: UserId,
    pub auditor: UserId,
}

pub struct Controls {
    pub iso_policy: ControlId,
    pub iso_access: ControlId,
    pub soc2_change: ControlId,
}

pub struct Harness {
    pub platform: GrcPlatform,
    pub store: Arc<InMemoryGrcStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub clock: ManualClock,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<SessionTokenService>,
    pub users: Users,
    pub category: CategoryId,
    pub controls: Controls,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_settings(PlatformSettings::default()).await
    }

    pub async fn with_settings(settings: PlatformSettings) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(InMemoryGrcStore::new());
        let sessions = Arc::new(InMemorySessionStore::new(shared_clock.clone()));
        let hasher = Arc::new(PasswordHasher::new().unwrap());
        let tokens = Arc::new(SessionTokenService::new("integration-secret", "grc-platform"));

        let digest = hasher.hash(PASSWORD).unwrap();
        let users = Users {
            admin: store.add_user("admin", &digest, "Ada Admin", &[Role::Admin]).await,
            manager: store
                .add_user("rmanager", &digest, "Rita Manager", &[Role::RiskManager])
                .await,
            officer: store
                .add_user("officer", &digest, "Omar Officer", &[Role::ComplianceOfficer])
                .await,
            auditor: store.add_user("auditor", &digest, "Aud Itor", &[Role::Auditor]).await,
        };
        let category = store.add_category("Cybersecurity", Some("Protect")).await;
        let controls = Controls {
            iso_policy: store
                .add_control("A.5.1", "Information security policies", "ISO 27001", "Implemented")
                .await,
            iso_access: store
                .add_control("A.9.1", "Access control policy", "ISO 27001", "Partially Implemented")
                .await,
            soc2_change: store
                .add_control("CC8.1", "Change management", "SOC 2", "Implemented")
                .await,
        };

        let platform = GrcPlatform::new(PlatformDeps {
            users: store.clone(),
            risks: store.clone(),
            compliance: store.clone(),
            audit_store: store.clone(),
            sessions: sessions.clone(),
            hasher: hasher.clone(),
            tokens: tokens.clone(),
            clock: shared_clock,
            settings,
        });

        Self {
            platform,
            store,
            sessions,
            clock,
            hasher,
            tokens,
            users,
            category,
            controls,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn anonymous(&self) -> RequestContext {
        RequestContext::anonymous(Some(ORIGIN.to_string()))
    }

    /// 以指定用户登录，返回携带会话的请求上下文
    pub async fn login_as(&self, username: &str) -> RequestContext {
        let outcome = self
            .platform
            .login(
                &self.anonymous(),
                LoginRequest {
                    username: username.to_string(),
                    password: PASSWORD.to_string(),
                },
            )
            .await
            .unwrap();
        RequestContext::with_session(outcome.claims.sid, Some(ORIGIN.to_string()))
    }

    pub fn draft(&self, title: &str, probability: i64, impact: i64) -> RiskDraft {
        RiskDraft {
            title: title.to_string(),
            category_id: Some(self.category),
            owner_id: Some(self.users.manager),
            probability: Some(probability),
            impact: Some(impact),
            ..Default::default()
        }
    }

    pub async fn create_risk(&self, ctx: &RequestContext, title: &str, probability: i64, impact: i64) -> CreatedRisk {
        self.platform
            .create_risk(ctx, self.draft(title, probability, impact))
            .await
            .unwrap()
    }

    pub async fn events_with_action(&self, action: &str) -> Vec<AuditEvent> {
        self.store
            .audit_events()
            .await
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }
}
