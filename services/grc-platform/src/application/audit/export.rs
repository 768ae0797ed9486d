//! 审计日志 CSV 导出
//!
//! 列顺序固定，下游工具依赖该顺序：
//! Log ID, Action, Entity Type, Entity ID, Details, IP Address, Timestamp,
//! User Name, Username, Job Title

use chrono::SecondsFormat;
use grc_errors::{AppError, AppResult};
use serde::Serialize;

use crate::domain::audit::AuditRecord;

/// CSV 中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvAuditRecord {
    #[serde(rename = "Log ID")]
    pub log_id: i64,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Entity Type")]
    pub entity_type: Option<String>,
    #[serde(rename = "Entity ID")]
    pub entity_id: Option<i64>,
    #[serde(rename = "Details")]
    pub details: String,
    #[serde(rename = "IP Address")]
    pub ip_address: Option<String>,
    /// ISO-8601
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "User Name")]
    pub full_name: Option<String>,
    #[serde(rename = "Username")]
    pub username: Option<String>,
    #[serde(rename = "Job Title")]
    pub job_title: Option<String>,
}

impl From<&AuditRecord> for CsvAuditRecord {
    fn from(record: &AuditRecord) -> Self {
        let event = &record.event;
        let actor = record.actor.as_ref();
        Self {
            log_id: event.log_id.value(),
            action: event.action.clone(),
            entity_type: event.entity_type.clone(),
            entity_id: event.entity_id,
            details: event.details.clone(),
            ip_address: event.ip_address.clone(),
            timestamp: event.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            full_name: actor.map(|a| a.full_name.clone()),
            username: actor.map(|a| a.username.clone()),
            job_title: actor.and_then(|a| a.job_title.clone()),
        }
    }
}

/// 导出文件名
pub fn export_filename(days: u32) -> String {
    format!("grc_audit_log_{}d.csv", days)
}

/// 序列化为 CSV 文本（含表头）
pub fn write_csv(records: &[AuditRecord]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    if records.is_empty() {
        // serialize 只在写第一行时输出表头
        wtr.write_record(CSV_HEADERS)
            .map_err(|e| AppError::internal(format!("Failed to write CSV header: {}", e)))?;
    }
    for record in records {
        wtr.serialize(CsvAuditRecord::from(record))
            .map_err(|e| AppError::internal(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::internal(format!("CSV is not UTF-8: {}", e)))
}

/// 表头
pub const CSV_HEADERS: [&str; 10] = [
    "Log ID",
    "Action",
    "Entity Type",
    "Entity ID",
    "Details",
    "IP Address",
    "Timestamp",
    "User Name",
    "Username",
    "Job Title",
];
