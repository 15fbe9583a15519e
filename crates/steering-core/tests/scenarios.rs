// crates/steering-core/tests/scenarios.rs
// ============================================================================
// Module: Steering Target Scenario Tests
// Description: End-to-end create, list, update, and delete scenarios.
// Purpose: Validate the steering target lifecycle through the service.
// Dependencies: steering-core
// ============================================================================
//! ## Overview
//! Walks the lifecycle a Traffic Ops client performs: create targets by name,
//! read them back, bump the first target's value, and delete everything.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use steering_core::SteeringError;
use steering_core::SteeringValue;
use steering_core::TypeName;
use steering_core::UpdateSteeringTarget;
use steering_core::XmlId;

use crate::common::STEERING_DS1;
use crate::common::STEERING_DS2;
use crate::common::STEERING_ORDER;
use crate::common::TARGET_A;
use crate::common::TARGET_B;
use crate::common::TARGET_C;
use crate::common::admin_ctx;
use crate::common::create_request;
use crate::common::fixture_catalog;
use crate::common::service;

/// Verifies create then list yields exactly the created edge with names.
#[test]
fn create_then_list_round_trips_names_and_ids() {
    let service = service(&fixture_catalog());
    let ctx = admin_ctx();
    let created = service
        .create(&ctx, create_request("STEERING_ORDER", "steering-ds1", "ds-target-a", 7))
        .unwrap();
    let listed = service.list(&ctx, STEERING_DS1).unwrap();
    assert_eq!(listed, vec![created]);
    let view = &listed[0];
    assert_eq!(view.delivery_service_id, STEERING_DS1);
    assert_eq!(view.delivery_service, Some(XmlId::new("steering-ds1")));
    assert_eq!(view.target_id, TARGET_A);
    assert_eq!(view.target, Some(XmlId::new("ds-target-a")));
    assert_eq!(view.type_id, STEERING_ORDER);
    assert_eq!(view.type_name, Some(TypeName::new("STEERING_ORDER")));
    assert_eq!(view.value, SteeringValue::new(7));
    assert!(view.is_consistent());
}

/// Verifies a duplicate create conflicts and keeps exactly one edge.
#[test]
fn duplicate_create_keeps_one_edge() {
    let service = service(&fixture_catalog());
    let ctx = admin_ctx();
    service
        .create(&ctx, create_request("STEERING_ORDER", "steering-ds1", "ds-target-a", 1))
        .unwrap();
    let err = service
        .create(&ctx, create_request("STEERING_WEIGHT", "steering-ds1", "ds-target-a", 2))
        .unwrap_err();
    assert!(matches!(
        err,
        SteeringError::Conflict {
            delivery_service_id: STEERING_DS1,
            target_id: TARGET_A,
            ..
        }
    ));
    let listed = service.list(&ctx, STEERING_DS1).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].value, SteeringValue::new(1));
}

/// Verifies list length equals successful, non-deleted creates per service.
#[test]
fn list_length_tracks_live_creates() {
    let service = service(&fixture_catalog());
    let ctx = admin_ctx();
    for target in ["ds-target-a", "ds-target-b", "ds-target-c"] {
        service
            .create(&ctx, create_request("STEERING_WEIGHT", "steering-ds1", target, 10))
            .unwrap();
    }
    service
        .create(&ctx, create_request("STEERING_WEIGHT", "steering-ds2", "ds-target-a", 10))
        .unwrap();
    let duplicate =
        service.create(&ctx, create_request("STEERING_WEIGHT", "steering-ds1", "ds-target-a", 10));
    assert!(matches!(
        duplicate,
        Err(SteeringError::Conflict {
            delivery_service_id: STEERING_DS1,
            target_id: TARGET_A,
            ..
        })
    ));
    service.delete(&ctx, STEERING_DS1, TARGET_B).unwrap();

    let listed = service.list(&ctx, STEERING_DS1).unwrap();
    let targets: Vec<_> = listed.iter().map(|view| view.target_id).collect();
    assert_eq!(targets, vec![TARGET_A, TARGET_C]);
    assert_eq!(service.list(&ctx, STEERING_DS2).unwrap().len(), 1);
}

/// Verifies the value bump scenario changes only the value.
#[test]
fn update_first_target_value_scenario() {
    let service = service(&fixture_catalog());
    let ctx = admin_ctx();
    service
        .create(&ctx, create_request("STEERING_ORDER", "steering-ds1", "ds-target-a", -12_345))
        .unwrap();
    service
        .create(&ctx, create_request("STEERING_ORDER", "steering-ds1", "ds-target-b", 0))
        .unwrap();

    let before = service.list(&ctx, STEERING_DS1).unwrap();
    let first = before[0].clone();
    let new_value = if first.value == SteeringValue::new(-12_345) { -12_344 } else { -12_345 };
    let updated = service
        .update(
            &ctx,
            UpdateSteeringTarget {
                delivery_service_id: first.delivery_service_id,
                target_id: first.target_id,
                type_name: first.type_name.as_ref().map(|name| name.as_str().to_string()),
                value: Some(SteeringValue::new(new_value)),
            },
        )
        .unwrap();
    assert_eq!(updated.key(), first.key());
    assert_eq!(updated.value, SteeringValue::new(-12_344));

    let after = service.list(&ctx, STEERING_DS1).unwrap();
    assert_eq!(after.len(), 2);
    let reread = after.iter().find(|view| view.key() == first.key()).unwrap();
    assert_eq!(reread.value, SteeringValue::new(new_value));
    assert_eq!(reread.delivery_service, first.delivery_service);
    assert_eq!(reread.target, first.target);
    assert_eq!(reread.type_id, first.type_id);
    assert_eq!(reread.type_name, first.type_name);
}

/// Verifies update may switch the steering type while keeping the key pair.
#[test]
fn update_can_change_type() {
    let service = service(&fixture_catalog());
    let ctx = admin_ctx();
    service
        .create(&ctx, create_request("STEERING_ORDER", "steering-ds1", "ds-target-c", 1))
        .unwrap();
    let updated = service
        .update(
            &ctx,
            UpdateSteeringTarget {
                delivery_service_id: STEERING_DS1,
                target_id: TARGET_C,
                type_name: Some("STEERING_GEO_ORDER".to_string()),
                value: Some(SteeringValue::new(1)),
            },
        )
        .unwrap();
    assert_eq!(updated.type_name, Some(TypeName::new("STEERING_GEO_ORDER")));
    assert_eq!(updated.delivery_service_id, STEERING_DS1);
    assert_eq!(updated.target_id, TARGET_C);
}

/// Verifies deleting every target leaves each listing empty.
#[test]
fn delete_all_targets_scenario() {
    let service = service(&fixture_catalog());
    let ctx = admin_ctx();
    for (ds, target) in [
        ("steering-ds1", "ds-target-a"),
        ("steering-ds1", "ds-target-b"),
        ("steering-ds2", "ds-target-b"),
        ("steering-ds2", "ds-target-c"),
    ] {
        service.create(&ctx, create_request("STEERING_WEIGHT", ds, target, 5)).unwrap();
    }
    for ds in [STEERING_DS1, STEERING_DS2] {
        for view in service.list(&ctx, ds).unwrap() {
            service.delete(&ctx, view.delivery_service_id, view.target_id).unwrap();
        }
    }
    for ds in [STEERING_DS1, STEERING_DS2] {
        assert!(service.list(&ctx, ds).unwrap().is_empty());
    }
    let err = service.delete(&ctx, STEERING_DS1, TARGET_A).unwrap_err();
    assert!(matches!(err, SteeringError::NotFound { .. }));
}

/// Verifies update of a missing pair reports not found.
#[test]
fn update_missing_pair_is_not_found() {
    let service = service(&fixture_catalog());
    let err = service
        .update(
            &admin_ctx(),
            UpdateSteeringTarget {
                delivery_service_id: STEERING_DS1,
                target_id: TARGET_A,
                type_name: Some("STEERING_ORDER".to_string()),
                value: Some(SteeringValue::new(1)),
            },
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "updating steering target: steering target deliveryServiceId 1 targetId 10: not found"
    );
}
