//! 风险编号 `RISK-<year>-<NNN>`

use std::fmt;

use serde::Serialize;

/// 风险编号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RiskCode(String);

impl RiskCode {
    pub const PREFIX: &'static str = "RISK";

    /// 按年份与序号生成编号，序号至少补齐三位
    pub fn new(year: i32, sequence: u32) -> Self {
        Self(format!("{}-{}-{:03}", Self::PREFIX, year, sequence))
    }

    /// 某年份编号的公共前缀，例如 `RISK-2026-`
    pub fn year_prefix(year: i32) -> String {
        format!("{}-{}-", Self::PREFIX, year)
    }

    /// 在 `max_in_use` 之后分配下一个编号
    pub fn next_after(year: i32, max_in_use: Option<u32>) -> Self {
        Self::new(year, max_in_use.unwrap_or(0) + 1)
    }

    /// 解析指定年份编号的数字后缀
    pub fn sequence_for_year(code: &str, year: i32) -> Option<u32> {
        let suffix = code.strip_prefix(&Self::year_prefix(year))?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RiskCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for RiskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded_format() {
        assert_eq!(RiskCode::new(2026, 7).as_str(), "RISK-2026-007");
        assert_eq!(RiskCode::new(2026, 123).as_str(), "RISK-2026-123");
        assert_eq!(RiskCode::new(2026, 1042).as_str(), "RISK-2026-1042");
    }

    #[test]
    fn test_next_after_max() {
        assert_eq!(RiskCode::next_after(2026, None).as_str(), "RISK-2026-001");
        assert_eq!(RiskCode::next_after(2026, Some(41)).as_str(), "RISK-2026-042");
    }

    #[test]
    fn test_sequence_only_for_matching_year() {
        assert_eq!(RiskCode::sequence_for_year("RISK-2026-015", 2026), Some(15));
        assert_eq!(RiskCode::sequence_for_year("RISK-2025-015", 2026), None);
        assert_eq!(RiskCode::sequence_for_year("RISK-2026-", 2026), None);
        assert_eq!(RiskCode::sequence_for_year("RISK-2026-01a", 2026), None);
    }
}
