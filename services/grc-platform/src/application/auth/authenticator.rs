//! 认证器
//!
//! 校验口令、读取角色、建立会话并写审计日志

use std::sync::Arc;
use std::time::Duration;

use grc_auth_core::{
    LandingTarget, PasswordHasher, Role, SessionClaims, SessionId, SessionTokenService,
    landing_for, primary_role,
};
use grc_common::Clock;
use grc_errors::{AppError, AppResult};
use metrics::counter;
use serde_json::json;

use super::error::AuthError;
use crate::application::audit::{AuditEntry, AuditLogger};
use crate::application::context::RequestContext;
use crate::application::support::bounded;
use crate::domain::audit::AuditAction;
use crate::domain::session::SessionStore;
use crate::domain::user::{UserProfile, UserRepository};

/// 登录请求
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub claims: SessionClaims,
    /// 交给客户端的签名令牌
    pub token: String,
    pub primary_role: Option<Role>,
    pub landing: LandingTarget,
    /// 客户端已持有有效会话，直接沿用
    pub resumed: bool,
}

/// 认证器
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<SessionTokenService>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<SessionTokenService>,
        audit: AuditLogger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            tokens,
            audit,
            clock,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 登录
    pub async fn login(&self, ctx: &RequestContext, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let result = self.login_inner(ctx, request).await;
        let outcome = match &result {
            Ok(o) if o.resumed => "resumed",
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        counter!("login_attempts_total", "outcome" => outcome).increment(1);
        result
    }

    async fn login_inner(&self, ctx: &RequestContext, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        // 已登录的客户端直接回到落地页
        if let Some(sid) = &ctx.session {
            if let Some(claims) = self.sessions.current_identity(sid).await? {
                tracing::debug!(user_id = %claims.sub, "Login with live session, resuming");
                return self.outcome(claims, true);
            }
        }

        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(AppError::validation("Username and password are required.").into());
        }

        let user = bounded(self.timeout, "user lookup", self.users.find_by_username(username)).await?;

        let Some(user) = user else {
            // 用户不存在时同样做一次哈希校验，使耗时与口令错误一致
            self.verify_password(request.password, None).await?;
            tracing::info!(username, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login failed: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        if !self
            .verify_password(request.password, Some(user.password_hash.clone()))
            .await?
        {
            tracing::info!(user_id = %user.id, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let roles = bounded(self.timeout, "role lookup", self.users.find_roles(user.id)).await?;
        if roles.is_empty() {
            tracing::warn!(user_id = %user.id, "Login failed: no roles assigned");
            return Err(AuthError::NoRolesAssigned);
        }

        let now = self.clock.now();
        let claims = SessionClaims::new(
            user.id,
            user.username.clone(),
            roles,
            now,
            self.tokens.max_lifetime(),
            self.tokens.issuer(),
        );
        self.sessions
            .establish(ctx.session.as_ref(), claims.clone())
            .await?;

        // 更新失败不影响登录
        if let Err(e) = bounded(
            self.timeout,
            "last login update",
            self.users.update_last_login(user.id, now),
        )
        .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to update last_login");
        }

        self.audit
            .record(
                AuditEntry::new(AuditAction::UserLogin)
                    .actor(user.id, ctx.origin.clone())
                    .detail(json!({ "event": "successful_login" })),
            )
            .await?;

        tracing::info!(
            user_id = %user.id,
            roles = ?claims.role_names(),
            "User logged in"
        );
        self.outcome(claims, false)
    }

    fn outcome(&self, claims: SessionClaims, resumed: bool) -> Result<LoginOutcome, AuthError> {
        let token = self.tokens.issue(&claims)?;
        Ok(LoginOutcome {
            primary_role: primary_role(&claims.roles),
            landing: landing_for(&claims.roles),
            token,
            claims,
            resumed,
        })
    }

    /// argon2 校验放到阻塞线程池
    async fn verify_password(&self, password: String, digest: Option<String>) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&password, &digest),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))
    }

    /// 登出
    ///
    /// 会话仍有效时先写 `USER_LOGOUT`（此时还能拿到用户 ID），再销毁会话
    pub async fn logout(&self, ctx: &RequestContext) -> AppResult<()> {
        let Some(sid) = &ctx.session else {
            return Ok(());
        };

        if let Some(claims) = self.sessions.current_identity(sid).await? {
            self.audit
                .record(
                    AuditEntry::new(AuditAction::UserLogout)
                        .actor(claims.user_id(), ctx.origin.clone())
                        .detail(json!({ "event": "user_logout" })),
                )
                .await?;
            tracing::info!(user_id = %claims.sub, "User logged out");
        }

        self.sessions.destroy(sid).await
    }

    /// 重新读取会话对应的用户
    ///
    /// 用户已删除或停用时销毁会话并返回 `None`；会话中的角色不会被刷新
    pub async fn refresh_identity(&self, sid: &SessionId) -> AppResult<Option<UserProfile>> {
        let Some(claims) = self.sessions.current_identity(sid).await? else {
            return Ok(None);
        };

        let user = bounded(self.timeout, "user lookup", self.users.find_by_id(claims.user_id())).await?;
        match user {
            Some(user) if user.is_active => Ok(Some(user.profile())),
            _ => {
                tracing::info!(user_id = %claims.sub, "Session user is gone or inactive, ending session");
                self.sessions.destroy(sid).await?;
                Ok(None)
            }
        }
    }
}
