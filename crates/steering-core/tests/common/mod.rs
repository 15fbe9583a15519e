// crates/steering-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared catalog, context, and sink fixtures for core tests.
// Purpose: Provide a deterministic delivery service and type catalog.
// Dependencies: steering-core
// ============================================================================

//! ## Overview
//! The fixture catalog holds two steering delivery services, three ordinary
//! target delivery services, three steering types, and one non-steering type.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use steering_core::ChangeSink;
use steering_core::CreateSteeringTarget;
use steering_core::DeliveryServiceId;
use steering_core::DeliveryServiceRecord;
use steering_core::InMemoryCatalog;
use steering_core::InMemorySteeringTargetStore;
use steering_core::Principal;
use steering_core::RequestContext;
use steering_core::SharedSteeringTargetStore;
use steering_core::SteeringChangeEvent;
use steering_core::SteeringTargetService;
use steering_core::SteeringValue;
use steering_core::TypeId;
use steering_core::TypeName;
use steering_core::TypeRecord;
use steering_core::XmlId;

// ============================================================================
// SECTION: Catalog Fixtures
// ============================================================================

pub const STEERING_DS1: DeliveryServiceId = DeliveryServiceId::new(1);
pub const STEERING_DS2: DeliveryServiceId = DeliveryServiceId::new(2);
pub const TARGET_A: DeliveryServiceId = DeliveryServiceId::new(10);
pub const TARGET_B: DeliveryServiceId = DeliveryServiceId::new(11);
pub const TARGET_C: DeliveryServiceId = DeliveryServiceId::new(12);
pub const STEERING_ORDER: TypeId = TypeId::new(40);
pub const STEERING_WEIGHT: TypeId = TypeId::new(41);
pub const STEERING_GEO_ORDER: TypeId = TypeId::new(42);
pub const HTTP_TYPE: TypeId = TypeId::new(50);

pub fn delivery_service(id: DeliveryServiceId, xml_id: &str, kind: &str) -> DeliveryServiceRecord {
    DeliveryServiceRecord {
        id,
        xml_id: XmlId::new(xml_id),
        kind: kind.to_string(),
    }
}

pub fn type_record(id: TypeId, name: &str, use_in_table: &str) -> TypeRecord {
    TypeRecord {
        id,
        name: TypeName::new(name),
        use_in_table: use_in_table.to_string(),
    }
}

pub fn fixture_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_records(
        [
            delivery_service(STEERING_DS1, "steering-ds1", "STEERING"),
            delivery_service(STEERING_DS2, "steering-ds2", "CLIENT_STEERING"),
            delivery_service(TARGET_A, "ds-target-a", "HTTP"),
            delivery_service(TARGET_B, "ds-target-b", "HTTP"),
            delivery_service(TARGET_C, "ds-target-c", "DNS"),
        ],
        [
            type_record(STEERING_ORDER, "STEERING_ORDER", "steering_target"),
            type_record(STEERING_WEIGHT, "STEERING_WEIGHT", "steering_target"),
            type_record(STEERING_GEO_ORDER, "STEERING_GEO_ORDER", "steering_target"),
            type_record(HTTP_TYPE, "HTTP", "deliveryservice"),
        ],
    )
    .expect("fixture catalog")
}

pub fn memory_store(catalog: &InMemoryCatalog) -> InMemorySteeringTargetStore {
    InMemorySteeringTargetStore::new(Arc::new(catalog.clone()))
}

pub fn service(catalog: &InMemoryCatalog) -> SteeringTargetService {
    SteeringTargetService::from_catalog(
        Arc::new(catalog.clone()),
        SharedSteeringTargetStore::from_store(memory_store(catalog)),
    )
}

// ============================================================================
// SECTION: Request Fixtures
// ============================================================================

pub fn admin_ctx() -> RequestContext {
    RequestContext::new(Principal::admin("admin")).with_request_id("req-1")
}

pub fn create_request(
    type_name: &str,
    delivery_service: &str,
    target: &str,
    value: i64,
) -> CreateSteeringTarget {
    CreateSteeringTarget {
        type_name: Some(type_name.to_string()),
        delivery_service: Some(delivery_service.to_string()),
        target: Some(target.to_string()),
        value: Some(SteeringValue::new(value)),
    }
}

// ============================================================================
// SECTION: Change Sink
// ============================================================================

/// Change sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingChangeSink {
    events: Mutex<Vec<SteeringChangeEvent>>,
}

impl RecordingChangeSink {
    pub fn events(&self) -> Vec<SteeringChangeEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl ChangeSink for RecordingChangeSink {
    fn record_change(&self, event: &SteeringChangeEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}
