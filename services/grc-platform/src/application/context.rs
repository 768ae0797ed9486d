//! 请求上下文

use grc_auth_core::{SessionClaims, SessionId};
use grc_common::UserId;

/// 进入核心之前的请求上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// 客户端携带的会话（尚未确认有效）
    pub session: Option<SessionId>,
    /// 来源地址
    pub origin: Option<String>,
}

impl RequestContext {
    pub fn anonymous(origin: Option<String>) -> Self {
        Self {
            session: None,
            origin,
        }
    }

    pub fn with_session(session: SessionId, origin: Option<String>) -> Self {
        Self {
            session: Some(session),
            origin,
        }
    }
}

/// 通过访问控制的调用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub claims: SessionClaims,
    pub origin: Option<String>,
}

impl Caller {
    pub fn new(claims: SessionClaims, origin: Option<String>) -> Self {
        Self { claims, origin }
    }

    pub fn user_id(&self) -> UserId {
        self.claims.user_id()
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }
}
