//! 风险创建、评分、状态变更与删除

mod common;

use common::Harness;
use grc_config::AuditMode;
use grc_errors::AppError;
use grc_platform::application::PlatformSettings;
use grc_platform::domain::risk::{RiskLevel, RiskStatus};
use serde_json::Value;

fn details(event: &grc_platform::domain::audit::AuditEvent) -> Value {
    serde_json::from_str(&event.details).unwrap()
}

#[tokio::test]
async fn test_create_assigns_sequential_codes_and_audits() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;

    let first = h.create_risk(&ctx, "Ransomware on file servers", 4, 5).await;
    let second = h.create_risk(&ctx, "Phishing of finance staff", 3, 3).await;

    assert_eq!(first.risk_code.as_str(), "RISK-2026-001");
    assert_eq!(second.risk_code.as_str(), "RISK-2026-002");
    assert_eq!(first.risk_score.value(), 20);
    assert_eq!(first.risk_level, RiskLevel::High);
    assert_eq!(second.risk_level, RiskLevel::Medium);

    let created = h.events_with_action("RISK_CREATED").await;
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].entity_type.as_deref(), Some("risks"));
    assert_eq!(created[0].entity_id, Some(first.risk_id.value()));
    let detail = details(&created[0]);
    assert_eq!(detail["risk_code"], "RISK-2026-001");
    assert_eq!(detail["risk_level"], "High");
    assert_eq!(detail["score"], 20);
    assert_eq!(detail["created_by"], "rmanager");
}

#[tokio::test]
async fn test_level_thresholds() {
    let h = Harness::new().await;
    let ctx = h.login_as("admin").await;

    let cases = [
        (4, 4, RiskLevel::High),
        (3, 5, RiskLevel::Medium),
        (2, 3, RiskLevel::Medium),
        (1, 5, RiskLevel::Low),
        (1, 1, RiskLevel::Low),
    ];
    for (probability, impact, expected) in cases {
        let created = h.create_risk(&ctx, "Threshold probe", probability, impact).await;
        assert_eq!(created.risk_level, expected, "p={probability} i={impact}");
    }
}

#[tokio::test]
async fn test_invalid_input_writes_nothing() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    let audit_before = h.store.audit_events().await.len();

    let short_title = h.platform.create_risk(&ctx, h.draft("Bug", 3, 3)).await;
    let out_of_range = h.platform.create_risk(&ctx, h.draft("Data centre flood", 6, 3)).await;
    let mut no_owner = h.draft("Unowned vendor risk", 2, 2);
    no_owner.owner_id = None;
    let missing_owner = h.platform.create_risk(&ctx, no_owner).await;

    assert_eq!(
        short_title.unwrap_err(),
        AppError::validation("Risk title must be at least 5 characters.")
    );
    assert_eq!(
        out_of_range.unwrap_err(),
        AppError::validation("Probability and Impact must be integers between 1 and 5.")
    );
    assert_eq!(
        missing_owner.unwrap_err(),
        AppError::validation("Category and Risk Owner are required.")
    );
    assert_eq!(h.store.risk_count().await, 0);
    assert_eq!(h.store.audit_events().await.len(), audit_before);
}

#[tokio::test]
async fn test_code_collision_is_retried() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    h.create_risk(&ctx, "Existing risk one", 2, 2).await;
    h.create_risk(&ctx, "Existing risk two", 2, 2).await;

    // 第一次读取少报一个序号，插入 RISK-2026-002 冲突后重新计算
    h.store.simulate_code_race(1);
    let created = h.create_risk(&ctx, "Concurrent creation", 3, 2).await;

    assert_eq!(created.risk_code.as_str(), "RISK-2026-003");
    assert_eq!(h.store.risk_count().await, 3);
    assert_eq!(h.events_with_action("RISK_CREATED").await.len(), 3);
}

#[tokio::test]
async fn test_status_changes_are_unconstrained() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    let risk = h.create_risk(&ctx, "Legacy system end of life", 3, 4).await;

    let closed = h
        .platform
        .update_risk_status(&ctx, risk.risk_id, "Closed")
        .await
        .unwrap();
    assert_eq!(closed.previous_status, RiskStatus::Identified);
    assert_eq!(closed.new_status, RiskStatus::Closed);

    let reopened = h
        .platform
        .update_risk_status(&ctx, risk.risk_id, "Treatment Planned")
        .await
        .unwrap();
    assert_eq!(reopened.previous_status, RiskStatus::Closed);
    assert_eq!(reopened.new_status, RiskStatus::TreatmentPlanned);

    let updates = h.events_with_action("RISK_STATUS_UPDATED").await;
    assert_eq!(updates.len(), 2);
    let detail = details(&updates[1]);
    assert_eq!(detail["previous_status"], "Closed");
    assert_eq!(detail["new_status"], "Treatment Planned");
    assert_eq!(detail["updated_by"], "rmanager");
}

#[tokio::test]
async fn test_status_update_rejects_bad_status_and_unknown_risk() {
    let h = Harness::new().await;
    let ctx = h.login_as("admin").await;
    let risk = h.create_risk(&ctx, "Insider threat", 2, 4).await;

    assert_eq!(
        h.platform
            .update_risk_status(&ctx, risk.risk_id, "Forgotten")
            .await
            .unwrap_err(),
        AppError::validation("Invalid status value.")
    );
    assert!(matches!(
        h.platform
            .update_risk_status(&ctx, grc_common::RiskId(9_999), "Assessed")
            .await,
        Err(AppError::NotFound(_))
    ));
    assert!(h.events_with_action("RISK_STATUS_UPDATED").await.is_empty());
}

#[tokio::test]
async fn test_status_update_survives_audit_outage() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    let risk = h.create_risk(&ctx, "Cloud misconfiguration", 4, 3).await;

    h.store.set_audit_available(false);
    let change = h
        .platform
        .update_risk_status(&ctx, risk.risk_id, "Mitigating")
        .await
        .unwrap();
    h.store.set_audit_available(true);

    assert_eq!(change.new_status, RiskStatus::Mitigating);
    let register = h.platform.risk_register(&ctx).await.unwrap();
    assert_eq!(register.risks[0].status, RiskStatus::Mitigating);
    assert!(h.events_with_action("RISK_STATUS_UPDATED").await.is_empty());
}

#[tokio::test]
async fn test_fail_closed_mode_reports_audit_failure_after_commit() {
    let h = Harness::with_settings(PlatformSettings {
        audit_mode: AuditMode::FailClosed,
        ..PlatformSettings::default()
    })
    .await;
    let ctx = h.login_as("rmanager").await;
    let risk = h.create_risk(&ctx, "Payment fraud", 3, 5).await;

    h.store.set_audit_available(false);
    let err = h
        .platform
        .update_risk_status(&ctx, risk.risk_id, "Accepted")
        .await
        .unwrap_err();
    h.store.set_audit_available(true);

    assert!(matches!(err, AppError::AuditWrite(_)));
    let register = h.platform.risk_register(&ctx).await.unwrap();
    assert_eq!(register.risks[0].status, RiskStatus::Accepted);
}

#[tokio::test]
async fn test_admin_delete_cascades_mappings() {
    let h = Harness::new().await;
    let admin = h.login_as("admin").await;
    let risk = h.create_risk(&admin, "Unpatched web servers", 5, 4).await;
    h.platform
        .add_mapping(&admin, risk.risk_id, h.controls.iso_access, Some("Mitigating"))
        .await
        .unwrap();
    h.platform
        .add_mapping(&admin, risk.risk_id, h.controls.soc2_change, None)
        .await
        .unwrap();

    let deleted = h.platform.delete_risk(&admin, risk.risk_id).await.unwrap();

    assert_eq!(deleted.risk_code, risk.risk_code);
    assert_eq!(h.store.risk_count().await, 0);
    assert_eq!(h.store.mapping_count().await, 0);
    let events = h.events_with_action("RISK_DELETED").await;
    assert_eq!(events.len(), 1);
    assert_eq!(details(&events[0])["deleted_by"], "admin");

    assert!(matches!(
        h.platform.delete_risk(&admin, risk.risk_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_register_heat_map_and_dashboard() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    let low = h.create_risk(&ctx, "Office key loss", 1, 2).await;
    let high = h.create_risk(&ctx, "Core banking outage", 4, 5).await;
    let medium = h.create_risk(&ctx, "Supplier insolvency", 2, 4).await;
    h.platform
        .update_risk_status(&ctx, low.risk_id, "Closed")
        .await
        .unwrap();

    let register = h.platform.risk_register(&ctx).await.unwrap();
    let codes: Vec<&str> = register.risks.iter().map(|r| r.risk_code.as_str()).collect();
    assert_eq!(
        codes,
        vec![high.risk_code.as_str(), medium.risk_code.as_str(), low.risk_code.as_str()]
    );
    assert_eq!(register.risks[0].owner_name, "Rita Manager");
    assert_eq!(register.risks[0].category_name, "Cybersecurity");
    assert_eq!((register.counts.high, register.counts.medium, register.counts.low), (1, 1, 1));

    let heat_map = h.platform.heat_map(&ctx).await.unwrap();
    assert_eq!(heat_map.total_risks, 3);
    assert_eq!(heat_map.matrix[4][3].len(), 1);
    assert_eq!(heat_map.matrix[4][3][0].code, high.risk_code);
    assert_eq!(heat_map.matrix[1][0][0].code, low.risk_code);

    let summary = h.platform.dashboard(&ctx).await.unwrap();
    assert_eq!(summary.total_risks, 3);
    assert_eq!(summary.high_risks, 1);
    assert_eq!(summary.open_risks, 2);
    // (2 + 20 + 8) / 3
    assert_eq!(summary.avg_risk_score, 10.0);
}
