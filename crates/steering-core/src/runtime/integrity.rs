// crates/steering-core/src/runtime/integrity.rs
// ============================================================================
// Module: Referential Integrity
// Description: Catalog checks applied by every store before a write.
// Purpose: Keep edges pointing at steering services, eligible targets, and
//          steering types.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Stores call these checks inside their per-key critical section (or
//! transaction) so an edge is never written against a reference that fails
//! them at that moment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ReferenceField;
use crate::core::SteeringTarget;
use crate::core::TypeId;
use crate::interfaces::Catalog;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Checks every reference of a new edge.
///
/// # Errors
///
/// Returns [`StoreError::InvalidReference`] naming the first failing field.
pub fn check_edge_references(
    catalog: &dyn Catalog,
    edge: &SteeringTarget,
) -> Result<(), StoreError> {
    let delivery_service = catalog.delivery_service(edge.delivery_service_id)?;
    match delivery_service {
        None => {
            return Err(invalid(
                ReferenceField::DeliveryService,
                edge.delivery_service_id.get(),
                "delivery service does not exist",
            ));
        }
        Some(record) if !record.is_steering() => {
            return Err(invalid(
                ReferenceField::DeliveryService,
                edge.delivery_service_id.get(),
                "delivery service is not a steering delivery service",
            ));
        }
        Some(_) => {}
    }
    if edge.target_id == edge.delivery_service_id {
        return Err(invalid(
            ReferenceField::Target,
            edge.target_id.get(),
            "a delivery service cannot steer to itself",
        ));
    }
    if catalog.delivery_service(edge.target_id)?.is_none() {
        return Err(invalid(
            ReferenceField::Target,
            edge.target_id.get(),
            "target delivery service does not exist",
        ));
    }
    check_type_reference(catalog, edge.type_id)
}

/// Checks that a type id names a steering type.
///
/// # Errors
///
/// Returns [`StoreError::InvalidReference`] for the `type` field.
pub fn check_type_reference(catalog: &dyn Catalog, type_id: TypeId) -> Result<(), StoreError> {
    match catalog.type_record(type_id)? {
        None => Err(invalid(ReferenceField::Type, type_id.get(), "type does not exist")),
        Some(record) if !record.is_steering_type() => {
            Err(invalid(ReferenceField::Type, type_id.get(), "type is not a steering target type"))
        }
        Some(_) => Ok(()),
    }
}

/// Builds an invalid reference error.
fn invalid(field: ReferenceField, id: u64, reason: &str) -> StoreError {
    StoreError::InvalidReference {
        field,
        id,
        reason: reason.to_string(),
    }
}
