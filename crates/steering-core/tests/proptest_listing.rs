// crates/steering-core/tests/proptest_listing.rs
// ============================================================================
// Module: Listing Property-Based Tests
// Description: Property tests for listing order and value decoding.
// Purpose: Detect ordering drift and codec gaps across wide input ranges.
// ============================================================================

//! Property-based tests for listing invariants.

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use proptest::prelude::*;
use steering_core::DeliveryServiceId;
use steering_core::SteeringTarget;
use steering_core::SteeringTargetStore;
use steering_core::SteeringValue;

use crate::common::STEERING_DS1;
use crate::common::STEERING_ORDER;
use crate::common::delivery_service;
use crate::common::fixture_catalog;
use crate::common::memory_store;

proptest! {
    #[test]
    fn listing_is_sorted_and_complete(
        values in prop::collection::btree_map(100_u64 .. 140, any::<i64>(), 0 .. 24),
    ) {
        let catalog = fixture_catalog();
        for id in values.keys() {
            let record = delivery_service(DeliveryServiceId::new(*id), &format!("ds-{id}"), "HTTP");
            catalog.upsert_delivery_service(record).unwrap();
        }
        let store = memory_store(&catalog);
        for (id, value) in &values {
            store
                .create(&SteeringTarget {
                    delivery_service_id: STEERING_DS1,
                    target_id: DeliveryServiceId::new(*id),
                    type_id: STEERING_ORDER,
                    value: SteeringValue::new(*value),
                })
                .unwrap();
        }
        let listed = store.list(STEERING_DS1).unwrap();
        prop_assert_eq!(listed.len(), values.len());
        for pair in listed.windows(2) {
            let ordered = (pair[0].value, pair[0].target_id) < (pair[1].value, pair[1].target_id);
            prop_assert!(ordered, "out of order: {:?}", pair);
        }
        prop_assert_eq!(store.list(STEERING_DS1).unwrap(), listed);
    }

    #[test]
    fn steering_value_string_and_integer_forms_agree(value in any::<i64>()) {
        let from_int: SteeringValue = serde_json::from_str(&value.to_string()).unwrap();
        let from_str: SteeringValue = serde_json::from_str(&format!("\"{value}\"")).unwrap();
        prop_assert_eq!(from_int, from_str);
        prop_assert_eq!(from_int.get(), value);
    }
}
