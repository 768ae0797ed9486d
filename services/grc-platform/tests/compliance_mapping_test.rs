//! 风险-控制项映射

mod common;

use common::Harness;
use grc_common::{ControlId, RiskId};
use grc_errors::AppError;
use grc_platform::domain::compliance::MappingType;
use serde_json::Value;

#[tokio::test]
async fn test_add_mapping_records_audit_event() {
    let h = Harness::new().await;
    let ctx = h.login_as("officer").await;
    let manager = h.login_as("rmanager").await;
    let risk = h.create_risk(&manager, "Weak password policy", 3, 4).await;

    let mapping_id = h
        .platform
        .add_mapping(&ctx, risk.risk_id, h.controls.iso_access, Some("Transferring"))
        .await
        .unwrap();

    let listed = h.platform.risk_mappings(&ctx, risk.risk_id).await.unwrap();
    assert_eq!(listed.risk.risk_code, risk.risk_code);
    assert_eq!(listed.mappings.len(), 1);
    assert_eq!(listed.mappings[0].mapping_id, mapping_id);
    assert_eq!(listed.mappings[0].mapping_type, MappingType::Transferring);
    assert_eq!(listed.mappings[0].control_code, "A.9.1");

    let events = h.events_with_action("RISK_CONTROL_MAPPED").await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].entity_type.as_deref(), Some("risk_compliance_mapping"));
    let detail: Value = serde_json::from_str(&events[0].details).unwrap();
    assert_eq!(detail["control"], "A.9.1");
    assert_eq!(detail["mapping_type"], "Transferring");
    assert_eq!(detail["mapped_by"], "officer");
}

#[tokio::test]
async fn test_duplicate_mapping_is_rejected_without_audit() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    let risk = h.create_risk(&ctx, "Excessive admin rights", 4, 4).await;

    h.platform
        .add_mapping(&ctx, risk.risk_id, h.controls.iso_policy, None)
        .await
        .unwrap();
    let audit_before = h.store.audit_events().await.len();

    let err = h
        .platform
        .add_mapping(&ctx, risk.risk_id, h.controls.iso_policy, Some("Avoiding"))
        .await
        .unwrap_err();

    assert_eq!(err, AppError::duplicate("This risk-control mapping already exists."));
    assert_eq!(h.store.mapping_count().await, 1);
    assert_eq!(h.store.audit_events().await.len(), audit_before);
}

#[tokio::test]
async fn test_add_mapping_validates_references() {
    let h = Harness::new().await;
    let ctx = h.login_as("admin").await;
    let risk = h.create_risk(&ctx, "DNS hijacking", 2, 5).await;

    assert_eq!(
        h.platform
            .add_mapping(&ctx, risk.risk_id, h.controls.iso_policy, Some("Ignoring"))
            .await
            .unwrap_err(),
        AppError::validation("Invalid mapping type.")
    );
    assert_eq!(
        h.platform
            .add_mapping(&ctx, RiskId(4_040), h.controls.iso_policy, None)
            .await
            .unwrap_err(),
        AppError::not_found("Risk not found.")
    );
    assert_eq!(
        h.platform
            .add_mapping(&ctx, risk.risk_id, ControlId(4_040), None)
            .await
            .unwrap_err(),
        AppError::not_found("Control not found.")
    );
    assert_eq!(h.store.mapping_count().await, 0);
}

#[tokio::test]
async fn test_remove_is_scoped_to_risk() {
    let h = Harness::new().await;
    let ctx = h.login_as("rmanager").await;
    let first = h.create_risk(&ctx, "Lost laptops", 3, 3).await;
    let second = h.create_risk(&ctx, "Unencrypted backups", 2, 4).await;
    let mapping_id = h
        .platform
        .add_mapping(&ctx, first.risk_id, h.controls.soc2_change, None)
        .await
        .unwrap();

    let err = h
        .platform
        .remove_mapping(&ctx, mapping_id, second.risk_id)
        .await
        .unwrap_err();
    assert_eq!(err, AppError::not_found("Mapping not found."));
    assert_eq!(h.store.mapping_count().await, 1);
    assert!(h.events_with_action("RISK_CONTROL_UNMAPPED").await.is_empty());

    h.platform
        .remove_mapping(&ctx, mapping_id, first.risk_id)
        .await
        .unwrap();
    assert_eq!(h.store.mapping_count().await, 0);
    assert_eq!(h.events_with_action("RISK_CONTROL_UNMAPPED").await.len(), 1);
}

#[tokio::test]
async fn test_controls_overview_counts_and_audits() {
    let h = Harness::new().await;
    let ctx = h.login_as("officer").await;
    let manager = h.login_as("rmanager").await;
    let a = h.create_risk(&manager, "Insecure APIs", 4, 3).await;
    let b = h.create_risk(&manager, "Misrouted email", 2, 2).await;
    for risk in [&a, &b] {
        h.platform
            .add_mapping(&manager, risk.risk_id, h.controls.iso_policy, None)
            .await
            .unwrap();
    }

    let overview = h.platform.compliance_controls(&ctx).await.unwrap();

    let codes: Vec<&str> = overview
        .controls
        .iter()
        .map(|c| c.control.control_code.as_str())
        .collect();
    assert_eq!(codes, vec!["A.5.1", "A.9.1", "CC8.1"]);
    assert_eq!(overview.controls[0].mapped_risks, 2);
    assert_eq!(overview.controls[1].mapped_risks, 0);

    let iso = &overview.stats[0];
    assert_eq!(iso.regulation, "ISO 27001");
    assert_eq!((iso.total_controls, iso.implemented), (2, 1));
    assert_eq!(iso.compliance_pct(), 50.0);
    assert_eq!(overview.stats[1].regulation, "SOC 2");

    assert_eq!(h.events_with_action("COMPLIANCE_CONTROLS_VIEWED").await.len(), 1);
}
