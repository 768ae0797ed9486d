//! 通用类型定义

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 数值主键包装类型
///
/// 所有持久化实体都使用数据库自增主键，这里为每种实体生成独立的 newtype，
/// 避免把 risk id 当作 control id 传错。
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

numeric_id!(
    /// 用户 ID
    UserId
);
numeric_id!(
    /// 风险 ID
    RiskId
);
numeric_id!(
    /// 风险分类 ID
    CategoryId
);
numeric_id!(
    /// 合规控制项 ID
    ControlId
);
numeric_id!(
    /// 风险-控制映射 ID
    MappingId
);
numeric_id!(
    /// 审计日志 ID
    AuditLogId
);

/// 审计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}

impl AuditInfo {
    pub fn new(user_id: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            created_by: user_id,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parse_and_display() {
        let id: RiskId = " 42 ".parse().unwrap();
        assert_eq!(id, RiskId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<ControlId>().is_err());
    }

    #[test]
    fn test_audit_info_touch() {
        let created = Utc::now();
        let mut info = AuditInfo::new(Some(UserId(1)), created);
        let later = created + chrono::Duration::minutes(5);
        info.touch(later);

        assert_eq!(info.created_at, created);
        assert_eq!(info.updated_at, later);
        assert_eq!(info.created_by, Some(UserId(1)));
    }
}
