//! 审计轨迹过滤条件

use chrono::{DateTime, TimeDelta, Utc};
use grc_common::UserId;
use grc_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 表示"不过滤"的取值
pub const ALL: &str = "all";

/// 查询参数原始值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrailParams {
    /// 回溯天数
    #[serde(alias = "date")]
    pub days: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<String>,
}

/// 解析回溯天数，无法解析或为负时使用默认值
pub fn parse_days(raw: Option<&str>, default_days: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default_days)
}

/// 审计轨迹过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditTrailFilter {
    pub days: u32,
    pub since: DateTime<Utc>,
    /// `None` 表示所有用户
    pub user_id: Option<UserId>,
    /// `None` 表示所有动作
    pub action: Option<String>,
}

impl AuditTrailFilter {
    /// 最近 `days` 天；窗口起点超出可表示的时间范围时拒绝
    pub fn last_days(days: u32, now: DateTime<Utc>) -> AppResult<Self> {
        let since = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| AppError::validation("Invalid lookback window."))?;
        Ok(Self {
            days,
            since,
            user_id: None,
            action: None,
        })
    }

    pub fn from_params(params: &TrailParams, now: DateTime<Utc>, default_days: u32) -> AppResult<Self> {
        let days = parse_days(params.days.as_deref(), default_days);

        let user_id = match params.user_id.as_deref().map(str::trim) {
            None | Some("") | Some(ALL) => None,
            Some(raw) => Some(
                raw.parse::<UserId>()
                    .map_err(|_| AppError::validation("Invalid user filter."))?,
            ),
        };

        let action = match params.action.as_deref().map(str::trim) {
            None | Some("") | Some(ALL) => None,
            Some(raw) => Some(raw.to_string()),
        };

        Ok(Self {
            user_id,
            action,
            ..Self::last_days(days, now)?
        })
    }

    /// 审计详情中记录的用户过滤值
    pub fn user_label(&self) -> String {
        self.user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| ALL.to_string())
    }

    pub fn action_label(&self) -> &str {
        self.action.as_deref().unwrap_or(ALL)
    }

    pub fn matches(&self, user_id: Option<UserId>, action: &str, created_at: DateTime<Utc>) -> bool {
        created_at >= self.since
            && self.user_id.is_none_or(|wanted| user_id == Some(wanted))
            && self.action.as_deref().is_none_or(|wanted| wanted == action)
    }
}

/// 与查询条件相同范围内的聚合统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub total_events: i64,
    pub distinct_users: i64,
    pub distinct_actions: i64,
    pub last_activity: Option<DateTime<Utc>>,
}
