//! 风险实体

use chrono::{DateTime, NaiveDate, Utc};
use grc_common::{AuditInfo, CategoryId, RiskId, UserId};
use grc_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::code::RiskCode;
use super::scoring::{Rating, RiskLevel, RiskScore};
use super::status::{RiskStatus, TreatmentType};

/// 风险标题最短长度（字符）
pub const MIN_TITLE_LEN: usize = 5;

/// 风险
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Risk {
    pub id: RiskId,
    pub code: RiskCode,
    pub title: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub owner_id: UserId,
    pub probability: Rating,
    pub impact: Rating,
    pub status: RiskStatus,
    pub treatment_type: TreatmentType,
    pub mitigation_plan: Option<String>,
    pub business_impact: Option<String>,
    pub review_date: Option<NaiveDate>,
    pub audit_info: AuditInfo,
}

impl Risk {
    pub fn score(&self) -> RiskScore {
        RiskScore::of(self.probability, self.impact)
    }

    pub fn level(&self) -> RiskLevel {
        self.score().level()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.audit_info.created_at
    }
}

/// 创建风险的原始输入
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskDraft {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub owner_id: Option<UserId>,
    pub probability: Option<i64>,
    pub impact: Option<i64>,
    pub treatment_type: Option<String>,
    pub mitigation_plan: Option<String>,
    pub business_impact: Option<String>,
    pub review_date: Option<NaiveDate>,
}

/// 校验通过的新风险
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRisk {
    pub title: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub owner_id: UserId,
    pub probability: Rating,
    pub impact: Rating,
    pub treatment_type: TreatmentType,
    pub mitigation_plan: Option<String>,
    pub business_impact: Option<String>,
    pub review_date: Option<NaiveDate>,
}

impl NewRisk {
    pub fn score(&self) -> RiskScore {
        RiskScore::of(self.probability, self.impact)
    }
}

impl RiskDraft {
    /// 校验输入，任何写操作之前执行
    pub fn validate(self) -> AppResult<NewRisk> {
        let title = self.title.trim().to_string();
        if title.chars().count() < MIN_TITLE_LEN {
            return Err(AppError::validation(format!(
                "Risk title must be at least {} characters.",
                MIN_TITLE_LEN
            )));
        }

        let (Some(category_id), Some(owner_id)) = (self.category_id, self.owner_id) else {
            return Err(AppError::validation("Category and Risk Owner are required."));
        };

        let rating = |value: Option<i64>| {
            value.ok_or_else(|| {
                AppError::validation("Probability and Impact must be integers between 1 and 5.")
            })
            .and_then(Rating::new)
        };
        let probability = rating(self.probability)?;
        let impact = rating(self.impact)?;

        let treatment_type = match self.treatment_type.as_deref().map(str::trim) {
            None | Some("") => TreatmentType::default(),
            Some(value) => value.parse()?,
        };

        Ok(NewRisk {
            title,
            description: non_blank(self.description),
            category_id,
            owner_id,
            probability,
            impact,
            treatment_type,
            mitigation_plan: non_blank(self.mitigation_plan),
            business_impact: non_blank(self.business_impact),
            review_date: self.review_date,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 风险登记册条目（带类别与负责人信息）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskRegisterEntry {
    pub risk: Risk,
    pub category_name: String,
    pub nist_csf_domain: Option<String>,
    pub owner_name: String,
    pub owner_title: Option<String>,
    pub owner_department: Option<String>,
}

/// 风险摘要视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskView {
    pub risk_id: RiskId,
    pub risk_code: RiskCode,
    pub risk_title: String,
    pub risk_description: Option<String>,
    pub probability: Rating,
    pub impact: Rating,
    pub risk_score: RiskScore,
    pub risk_level: RiskLevel,
    pub status: RiskStatus,
    pub treatment_type: TreatmentType,
    pub business_impact: Option<String>,
    pub review_date: Option<NaiveDate>,
    pub category_name: String,
    pub nist_csf_domain: Option<String>,
    pub owner_name: String,
    pub owner_title: Option<String>,
    pub owner_department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&RiskRegisterEntry> for RiskView {
    fn from(entry: &RiskRegisterEntry) -> Self {
        let risk = &entry.risk;
        Self {
            risk_id: risk.id,
            risk_code: risk.code.clone(),
            risk_title: risk.title.clone(),
            risk_description: risk.description.clone(),
            probability: risk.probability,
            impact: risk.impact,
            risk_score: risk.score(),
            risk_level: risk.level(),
            status: risk.status,
            treatment_type: risk.treatment_type,
            business_impact: risk.business_impact.clone(),
            review_date: risk.review_date,
            category_name: entry.category_name.clone(),
            nist_csf_domain: entry.nist_csf_domain.clone(),
            owner_name: entry.owner_name.clone(),
            owner_title: entry.owner_title.clone(),
            owner_department: entry.owner_department.clone(),
            created_at: risk.audit_info.created_at,
            updated_at: risk.audit_info.updated_at,
        }
    }
}
