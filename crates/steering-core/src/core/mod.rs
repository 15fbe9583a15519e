// crates/steering-core/src/core/mod.rs
// ============================================================================
// Module: Steering Core Types
// Description: Identifiers, catalog records, edges, and request context.
// Purpose: Group the data model shared by every steering crate.
// Dependencies: crate::core::*
// ============================================================================

//! ## Overview
//! Core types are plain data with serde support and no behavior beyond
//! ordering and classification helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod context;
pub mod identifiers;
pub mod model;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::DeliveryServiceRecord;
pub use catalog::STEERING_DELIVERY_SERVICE_KINDS;
pub use catalog::STEERING_TARGET_TABLE;
pub use catalog::TypeRecord;
pub use context::Principal;
pub use context::PrincipalRole;
pub use context::RequestContext;
pub use identifiers::DeliveryServiceId;
pub use identifiers::TypeId;
pub use identifiers::TypeName;
pub use identifiers::XmlId;
pub use model::InconsistentReference;
pub use model::ReferenceField;
pub use model::SteeringTarget;
pub use model::SteeringTargetKey;
pub use model::SteeringTargetView;
pub use model::SteeringValue;
pub use model::listing_order;
pub use model::sort_for_listing;
