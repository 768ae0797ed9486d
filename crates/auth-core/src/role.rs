//! 角色词表与落地页规则

use std::fmt;

use serde::{Deserialize, Serialize};

/// 角色
///
/// 核心逻辑只认识四个内置角色，其他名称原样保留，不参与任何判定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    RiskManager,
    ComplianceOfficer,
    Auditor,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::RiskManager => "risk_manager",
            Role::ComplianceOfficer => "compliance_officer",
            Role::Auditor => "auditor",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        match name {
            "admin" => Role::Admin,
            "risk_manager" => Role::RiskManager,
            "compliance_officer" => Role::ComplianceOfficer,
            "auditor" => Role::Auditor,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Role::from(name.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 页面目标，用于登录后的落地页和拒绝访问后的回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingTarget {
    Login,
    Dashboard,
    RiskRegister,
    ComplianceControls,
    AuditTrail,
}

impl LandingTarget {
    pub fn path(&self) -> &'static str {
        match self {
            LandingTarget::Login => "/login",
            LandingTarget::Dashboard => "/dashboard",
            LandingTarget::RiskRegister => "/risks",
            LandingTarget::ComplianceControls => "/compliance/controls",
            LandingTarget::AuditTrail => "/audit",
        }
    }
}

/// 登录后的主角色：admin > risk_manager > compliance_officer > auditor
pub fn primary_role(roles: &[Role]) -> Option<Role> {
    [
        Role::Admin,
        Role::RiskManager,
        Role::ComplianceOfficer,
        Role::Auditor,
    ]
    .into_iter()
    .find(|candidate| roles.contains(candidate))
}

/// 登录后的落地页
pub fn landing_for(roles: &[Role]) -> LandingTarget {
    match primary_role(roles) {
        Some(Role::Admin) => LandingTarget::Dashboard,
        Some(Role::RiskManager) => LandingTarget::RiskRegister,
        Some(Role::ComplianceOfficer) => LandingTarget::ComplianceControls,
        Some(Role::Auditor) => LandingTarget::AuditTrail,
        _ => LandingTarget::Dashboard,
    }
}

/// 缺少指定角色时的回退页面
///
/// 注意顺序与落地页不同：auditor 优先
pub fn role_denial_fallback(roles: &[Role]) -> LandingTarget {
    if roles.contains(&Role::Auditor) {
        LandingTarget::AuditTrail
    } else if roles.contains(&Role::RiskManager) {
        LandingTarget::RiskRegister
    } else if roles.contains(&Role::ComplianceOfficer) {
        LandingTarget::ComplianceControls
    } else {
        LandingTarget::Dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        assert_eq!(Role::from("risk_manager"), Role::RiskManager);
        assert_eq!(Role::from("viewer"), Role::Other("viewer".to_string()));
        assert_eq!(Role::ComplianceOfficer.to_string(), "compliance_officer");
    }

    #[test]
    fn test_landing_priority() {
        assert_eq!(
            landing_for(&[Role::Auditor, Role::Admin]),
            LandingTarget::Dashboard
        );
        assert_eq!(
            landing_for(&[Role::Auditor, Role::ComplianceOfficer]),
            LandingTarget::ComplianceControls
        );
        assert_eq!(landing_for(&[Role::Auditor]), LandingTarget::AuditTrail);
        assert_eq!(
            landing_for(&[Role::Other("viewer".into())]),
            LandingTarget::Dashboard
        );
    }

    #[test]
    fn test_denial_fallback_prefers_auditor() {
        assert_eq!(
            role_denial_fallback(&[Role::RiskManager, Role::Auditor]),
            LandingTarget::AuditTrail
        );
        assert_eq!(
            role_denial_fallback(&[Role::RiskManager]),
            LandingTarget::RiskRegister
        );
        assert_eq!(
            role_denial_fallback(&[Role::ComplianceOfficer]),
            LandingTarget::ComplianceControls
        );
        assert_eq!(role_denial_fallback(&[Role::Admin]), LandingTarget::Dashboard);
    }
}
