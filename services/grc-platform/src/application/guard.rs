//! 访问控制
//!
//! 每个受保护操作都由 `AuthorizationGuard::guard` 包裹：先读会话存储确认身份，
//! 再按策略检查角色，通过后才执行操作。拒绝不写审计日志，只计数并记 debug 日志。

use std::future::Future;
use std::sync::Arc;

use grc_auth_core::{LandingTarget, Role, SessionClaims, role_denial_fallback};
use grc_errors::{AppError, AppResult};
use metrics::counter;

use super::context::{Caller, RequestContext};
use crate::domain::session::SessionStore;

/// 访问策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    /// 只要求已登录
    Authenticated,
    /// 要求持有指定角色
    Role(Role),
    /// 要求持有任一角色
    AnyRole(Vec<Role>),
}

impl AccessPolicy {
    pub fn any_of(roles: &[Role]) -> Self {
        AccessPolicy::AnyRole(roles.to_vec())
    }
}

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    Unauthenticated,
    Forbidden,
}

/// 拒绝结果，带提示信息与回退目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    pub message: String,
    pub fallback: LandingTarget,
}

impl Denial {
    fn unauthenticated() -> Self {
        Self {
            kind: DenialKind::Unauthenticated,
            message: "Please log in to access this page.".to_string(),
            fallback: LandingTarget::Login,
        }
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial.kind {
            DenialKind::Unauthenticated => AppError::unauthenticated(denial.message),
            DenialKind::Forbidden => {
                AppError::forbidden_with_fallback(denial.message, denial.fallback.path())
            }
        }
    }
}

/// 访问决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(SessionClaims),
    Denied(Denial),
}

impl Decision {
    fn label(&self) -> &'static str {
        match self {
            Decision::Allowed(_) => "allowed",
            Decision::Denied(Denial {
                kind: DenialKind::Unauthenticated,
                ..
            }) => "unauthenticated",
            Decision::Denied(_) => "forbidden",
        }
    }
}

/// 按策略判定给定身份
pub fn evaluate(identity: Option<SessionClaims>, policy: &AccessPolicy) -> Decision {
    let Some(claims) = identity else {
        return Decision::Denied(Denial::unauthenticated());
    };

    match policy {
        AccessPolicy::Authenticated => Decision::Allowed(claims),
        AccessPolicy::Role(role) => {
            if claims.has_role(role) {
                Decision::Allowed(claims)
            } else {
                Decision::Denied(Denial {
                    kind: DenialKind::Forbidden,
                    message: format!("Access denied. Requires {} role.", role),
                    fallback: role_denial_fallback(&claims.roles),
                })
            }
        }
        AccessPolicy::AnyRole(roles) => {
            if claims.has_any_role(roles) {
                Decision::Allowed(claims)
            } else {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                Decision::Denied(Denial {
                    kind: DenialKind::Forbidden,
                    message: format!("Access denied. Requires one of: {}", names.join(", ")),
                    fallback: LandingTarget::Dashboard,
                })
            }
        }
    }
}

/// 访问控制守卫
#[derive(Clone)]
pub struct AuthorizationGuard {
    sessions: Arc<dyn SessionStore>,
}

impl AuthorizationGuard {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// 读取会话并判定
    pub async fn check(&self, ctx: &RequestContext, policy: &AccessPolicy) -> AppResult<Decision> {
        let identity = match &ctx.session {
            Some(sid) => self.sessions.current_identity(sid).await?,
            None => None,
        };

        let decision = evaluate(identity, policy);
        counter!("authorization_checks_total", "decision" => decision.label()).increment(1);

        if let Decision::Denied(denial) = &decision {
            tracing::debug!(
                policy = ?policy,
                kind = ?denial.kind,
                fallback = denial.fallback.path(),
                "Access denied"
            );
        }
        Ok(decision)
    }

    /// 通过检查后以调用者身份执行 `operation`，否则返回拒绝且不执行
    pub async fn guard<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        policy: AccessPolicy,
        operation: F,
    ) -> AppResult<T>
    where
        F: FnOnce(Caller) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match self.check(ctx, &policy).await? {
            Decision::Allowed(claims) => operation(Caller::new(claims, ctx.origin.clone())).await,
            Decision::Denied(denial) => Err(denial.into()),
        }
    }
}

/// 各操作的访问策略
pub mod policies {
    use grc_auth_core::Role;

    use super::AccessPolicy;

    pub fn view() -> AccessPolicy {
        AccessPolicy::Authenticated
    }

    pub fn manage_risks() -> AccessPolicy {
        AccessPolicy::any_of(&[Role::Admin, Role::RiskManager])
    }

    pub fn delete_risk() -> AccessPolicy {
        AccessPolicy::Role(Role::Admin)
    }

    pub fn map_controls() -> AccessPolicy {
        AccessPolicy::any_of(&[Role::Admin, Role::RiskManager, Role::ComplianceOfficer])
    }

    pub fn view_audit_trail() -> AccessPolicy {
        AccessPolicy::any_of(&[Role::Admin, Role::Auditor])
    }

    pub fn export_audit_log() -> AccessPolicy {
        AccessPolicy::any_of(&[Role::Admin])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use grc_common::UserId;

    fn claims(roles: Vec<Role>) -> SessionClaims {
        SessionClaims::new(
            UserId(1),
            "tester",
            roles,
            Utc::now(),
            Duration::hours(1),
            "grc-platform",
        )
    }

    fn denial(decision: Decision) -> Denial {
        match decision {
            Decision::Denied(d) => d,
            Decision::Allowed(_) => panic!("expected denial"),
        }
    }

    #[test]
    fn test_no_session_is_unauthenticated() {
        for policy in [
            AccessPolicy::Authenticated,
            AccessPolicy::Role(Role::Admin),
            AccessPolicy::any_of(&[Role::Auditor]),
        ] {
            let d = denial(evaluate(None, &policy));
            assert_eq!(d.kind, DenialKind::Unauthenticated);
            assert_eq!(d.message, "Please log in to access this page.");
            assert_eq!(d.fallback, LandingTarget::Login);
        }
    }

    #[test]
    fn test_role_denial_routes_risk_manager_to_register() {
        let d = denial(evaluate(
            Some(claims(vec![Role::RiskManager])),
            &AccessPolicy::Role(Role::Auditor),
        ));
        assert_eq!(d.kind, DenialKind::Forbidden);
        assert_eq!(d.message, "Access denied. Requires auditor role.");
        assert_eq!(d.fallback, LandingTarget::RiskRegister);
    }

    #[test]
    fn test_role_denial_routes_auditor_to_audit_view() {
        let d = denial(evaluate(
            Some(claims(vec![Role::Auditor, Role::RiskManager])),
            &AccessPolicy::Role(Role::Admin),
        ));
        assert_eq!(d.fallback, LandingTarget::AuditTrail);
    }

    #[test]
    fn test_any_role_denial_routes_to_dashboard() {
        let d = denial(evaluate(
            Some(claims(vec![Role::Auditor])),
            &policies::manage_risks(),
        ));
        assert_eq!(d.message, "Access denied. Requires one of: admin, risk_manager");
        assert_eq!(d.fallback, LandingTarget::Dashboard);
    }

    #[test]
    fn test_allowed() {
        assert!(matches!(
            evaluate(Some(claims(vec![Role::ComplianceOfficer])), &policies::map_controls()),
            Decision::Allowed(_)
        ));
        assert!(matches!(
            evaluate(Some(claims(vec![Role::Other("viewer".into())])), &policies::view()),
            Decision::Allowed(_)
        ));
    }

    #[test]
    fn test_forbidden_converts_with_fallback_path() {
        let err: AppError = denial(evaluate(
            Some(claims(vec![Role::Auditor])),
            &policies::delete_risk(),
        ))
        .into();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.fallback(), Some("/audit"));
    }
}
