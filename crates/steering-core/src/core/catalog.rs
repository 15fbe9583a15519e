// crates/steering-core/src/core/catalog.rs
// ============================================================================
// Module: Catalog Records
// Description: Delivery service and type reference records.
// Purpose: Describe the read-only reference data steering targets point at.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Delivery services and types are owned by external catalogs. This crate
//! only reads them to resolve names and to check that an edge points at a
//! steering delivery service, an eligible target, and a steering type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DeliveryServiceId;
use crate::core::identifiers::TypeId;
use crate::core::identifiers::TypeName;
use crate::core::identifiers::XmlId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `use_in_table` marker of types that may tag a steering target.
pub const STEERING_TARGET_TABLE: &str = "steering_target";

/// Delivery service kinds that make a delivery service a steering one.
pub const STEERING_DELIVERY_SERVICE_KINDS: &[&str] = &["STEERING", "CLIENT_STEERING"];

// ============================================================================
// SECTION: Records
// ============================================================================

/// Delivery service reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryServiceRecord {
    /// Catalog identifier.
    pub id: DeliveryServiceId,
    /// External name.
    pub xml_id: XmlId,
    /// Delivery service type name (`HTTP`, `DNS`, `STEERING`, ...).
    pub kind: String,
}

impl DeliveryServiceRecord {
    /// Returns true when this delivery service routes traffic by steering.
    #[must_use]
    pub fn is_steering(&self) -> bool {
        STEERING_DELIVERY_SERVICE_KINDS.iter().any(|kind| self.kind.eq_ignore_ascii_case(kind))
    }
}

/// Type reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRecord {
    /// Catalog identifier.
    pub id: TypeId,
    /// Type name.
    pub name: TypeName,
    /// Table the type applies to.
    pub use_in_table: String,
}

impl TypeRecord {
    /// Returns true when the type may tag a steering target.
    #[must_use]
    pub fn is_steering_type(&self) -> bool {
        self.use_in_table == STEERING_TARGET_TABLE
    }
}
