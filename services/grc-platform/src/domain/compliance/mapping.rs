//! 风险-控制映射

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use grc_common::{ControlId, MappingId, RiskId, UserId};
use grc_errors::AppError;
use serde::{Deserialize, Serialize};

/// 映射类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingType {
    /// 控制项缓解风险
    #[default]
    Mitigating,
    Transferring,
    Avoiding,
    /// 控制项作为接受风险的证据
    Accepting,
}

impl MappingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingType::Mitigating => "Mitigating",
            MappingType::Transferring => "Transferring",
            MappingType::Avoiding => "Avoiding",
            MappingType::Accepting => "Accepting",
        }
    }

    /// 未提供或为空时取默认值
    pub fn parse_or_default(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for MappingType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mitigating" => Ok(MappingType::Mitigating),
            "Transferring" => Ok(MappingType::Transferring),
            "Avoiding" => Ok(MappingType::Avoiding),
            "Accepting" => Ok(MappingType::Accepting),
            _ => Err(AppError::validation("Invalid mapping type.")),
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 风险-控制映射，(risk_id, control_id) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskControlMapping {
    pub mapping_id: MappingId,
    pub risk_id: RiskId,
    pub control_id: ControlId,
    pub mapping_type: MappingType,
    pub mapped_by: Option<UserId>,
    pub mapped_at: DateTime<Utc>,
}

/// 待插入的映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMapping {
    pub risk_id: RiskId,
    pub control_id: ControlId,
    pub mapping_type: MappingType,
    pub mapped_by: Option<UserId>,
    pub mapped_at: DateTime<Utc>,
}

/// 某个风险下的映射（带控制项信息）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingView {
    pub mapping_id: MappingId,
    pub mapping_type: MappingType,
    pub mapped_at: DateTime<Utc>,
    pub control_id: ControlId,
    pub control_code: String,
    pub control_name: String,
    pub regulation: String,
}
