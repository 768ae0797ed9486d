//! 会话声明集

use chrono::{DateTime, Duration, Utc};
use grc_common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

/// 会话 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// 会话 ID 需要不可预测，使用随机 v4
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 登录时签发的不可变声明集
///
/// 角色在登录时一次性快照，`roles_as_of` 记录快照时间；会话期间撤销的角色
/// 直到重新登录才会生效
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session ID
    pub sid: SessionId,
    /// Subject (user ID)
    pub sub: UserId,
    pub username: String,
    /// 有序、去重的角色列表
    pub roles: Vec<Role>,
    pub roles_as_of: DateTime<Utc>,
    /// Issued at
    pub iat: i64,
    /// 绝对过期时间；空闲过期由会话存储另行判断
    pub exp: i64,
    /// Issuer
    #[serde(default)]
    pub iss: String,
}

impl SessionClaims {
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        roles: Vec<Role>,
        issued_at: DateTime<Utc>,
        max_lifetime: Duration,
        issuer: &str,
    ) -> Self {
        let mut ordered: Vec<Role> = Vec::with_capacity(roles.len());
        for role in roles {
            if !ordered.contains(&role) {
                ordered.push(role);
            }
        }

        Self {
            sid: SessionId::generate(),
            sub: user_id,
            username: username.into(),
            roles: ordered,
            roles_as_of: issued_at,
            iat: issued_at.timestamp(),
            exp: (issued_at + max_lifetime).timestamp(),
            iss: issuer.to_string(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_deduplicated_in_order() {
        let claims = SessionClaims::new(
            UserId(3),
            "priya",
            vec![Role::RiskManager, Role::Auditor, Role::RiskManager],
            Utc::now(),
            Duration::hours(12),
            "grc-platform",
        );

        assert_eq!(claims.roles, vec![Role::RiskManager, Role::Auditor]);
        assert!(claims.has_role(&Role::Auditor));
        assert!(!claims.has_role(&Role::Admin));
        assert!(claims.has_any_role(&[Role::Admin, Role::Auditor]));
        assert_eq!(claims.role_names(), vec!["risk_manager", "auditor"]);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
