//! 风险状态与处置方式

use std::fmt;
use std::str::FromStr;

use grc_errors::AppError;
use serde::{Deserialize, Serialize};

/// 风险状态
///
/// 只是一组词汇，不约束迁移顺序：任意状态都可以改到词汇表内的任意状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    Identified,
    Assessed,
    #[serde(rename = "Treatment Planned")]
    TreatmentPlanned,
    Mitigating,
    Accepted,
    Closed,
}

impl RiskStatus {
    /// 生命周期顺序
    pub const ALL: [RiskStatus; 6] = [
        RiskStatus::Identified,
        RiskStatus::Assessed,
        RiskStatus::TreatmentPlanned,
        RiskStatus::Mitigating,
        RiskStatus::Accepted,
        RiskStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Identified => "Identified",
            RiskStatus::Assessed => "Assessed",
            RiskStatus::TreatmentPlanned => "Treatment Planned",
            RiskStatus::Mitigating => "Mitigating",
            RiskStatus::Accepted => "Accepted",
            RiskStatus::Closed => "Closed",
        }
    }

    /// 未接受也未关闭
    pub fn is_open(&self) -> bool {
        !matches!(self, RiskStatus::Accepted | RiskStatus::Closed)
    }
}

impl FromStr for RiskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation("Invalid status value."))
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 处置方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatmentType {
    #[default]
    Mitigate,
    Transfer,
    Avoid,
    Accept,
}

impl TreatmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentType::Mitigate => "Mitigate",
            TreatmentType::Transfer => "Transfer",
            TreatmentType::Avoid => "Avoid",
            TreatmentType::Accept => "Accept",
        }
    }
}

impl FromStr for TreatmentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mitigate" => Ok(TreatmentType::Mitigate),
            "Transfer" => Ok(TreatmentType::Transfer),
            "Avoid" => Ok(TreatmentType::Avoid),
            "Accept" => Ok(TreatmentType::Accept),
            _ => Err(AppError::validation("Invalid treatment type.")),
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
