//! 风险评分
//!
//! 分值与等级只由可能性和影响推导，任何地方都不单独保存

use std::fmt;

use grc_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 1..=5 的评级（可能性或影响）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> AppResult<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AppError::validation(
                "Probability and Impact must be integers between 1 and 5.",
            ))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// 热力图下标（0 起）
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<i64> for Rating {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.0 as i64
    }
}

/// 风险分值 = 可能性 × 影响
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    pub fn of(probability: Rating, impact: Rating) -> Self {
        Self(probability.value() * impact.value())
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(*self)
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const HIGH_THRESHOLD: u8 = 16;
    pub const MEDIUM_THRESHOLD: u8 = 6;

    pub fn from_score(score: RiskScore) -> Self {
        match score.value() {
            s if s >= Self::HIGH_THRESHOLD => RiskLevel::High,
            s if s >= Self::MEDIUM_THRESHOLD => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 各等级的风险数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    #[serde(rename = "High")]
    pub high: u32,
    #[serde(rename = "Medium")]
    pub medium: u32,
    #[serde(rename = "Low")]
    pub low: u32,
}

impl LevelCounts {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low
    }
}

impl FromIterator<RiskLevel> for LevelCounts {
    fn from_iter<I: IntoIterator<Item = RiskLevel>>(iter: I) -> Self {
        let mut counts = Self::default();
        for level in iter {
            counts.record(level);
        }
        counts
    }
}
