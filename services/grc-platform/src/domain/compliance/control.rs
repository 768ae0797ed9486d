//! 合规控制项（参考数据）

use grc_common::ControlId;
use serde::Serialize;

/// 合规控制项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceControl {
    pub control_id: ControlId,
    pub control_code: String,
    pub control_name: String,
    pub control_description: Option<String>,
    pub regulation: String,
    pub control_category: Option<String>,
    pub implementation_status: String,
    pub is_mandatory: bool,
    pub is_active: bool,
}

impl ComplianceControl {
    pub const IMPLEMENTED: &'static str = "Implemented";

    pub fn is_implemented(&self) -> bool {
        self.implementation_status == Self::IMPLEMENTED
    }
}

/// 按法规汇总的控制项统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegulationStats {
    pub regulation: String,
    pub total_controls: u32,
    pub implemented: u32,
}

impl RegulationStats {
    /// 实施比例（百分比，保留一位小数）
    pub fn compliance_pct(&self) -> f64 {
        if self.total_controls == 0 {
            return 0.0;
        }
        let pct = self.implemented as f64 * 100.0 / self.total_controls as f64;
        (pct * 10.0).round() / 10.0
    }
}

/// 按法规聚合，结果按法规名称排序
pub fn regulation_stats(controls: &[ComplianceControl]) -> Vec<RegulationStats> {
    let mut grouped: std::collections::BTreeMap<&str, RegulationStats> = Default::default();
    for control in controls {
        let entry = grouped
            .entry(control.regulation.as_str())
            .or_insert_with(|| RegulationStats {
                regulation: control.regulation.clone(),
                total_controls: 0,
                implemented: 0,
            });
        entry.total_controls += 1;
        if control.is_implemented() {
            entry.implemented += 1;
        }
    }
    grouped.into_values().collect()
}
