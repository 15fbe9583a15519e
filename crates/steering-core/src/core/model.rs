// crates/steering-core/src/core/model.rs
// ============================================================================
// Module: Steering Target Model
// Description: Steering target edges, their compound key, and the read model.
// Purpose: Define the canonical shapes shared by stores, service, and API.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A steering target is an edge from a steering delivery service to a target
//! delivery service, tagged with a steering type and a signed value. Edges are
//! keyed by the `(delivery service, target)` pair. The stored edge carries ids
//! only; [`SteeringTargetView`] adds the names resolved from the catalog at
//! read time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::Visitor;
use thiserror::Error;

use crate::core::identifiers::DeliveryServiceId;
use crate::core::identifiers::TypeId;
use crate::core::identifiers::TypeName;
use crate::core::identifiers::XmlId;

// ============================================================================
// SECTION: Steering Value
// ============================================================================

/// Weight or rank of a steering target.
///
/// Deserializes from a JSON integer or from a string holding a base-10 signed
/// integer; always serializes as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SteeringValue(i64);

impl SteeringValue {
    /// Creates a steering value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw signed value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SteeringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for SteeringValue {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for SteeringValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SteeringValueVisitor)
    }
}

/// Visitor accepting integers and integer strings.
struct SteeringValueVisitor;

impl Visitor<'_> for SteeringValueVisitor {
    type Value = SteeringValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a signed integer or a string containing one")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(SteeringValue(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        i64::try_from(value)
            .map(SteeringValue)
            .map_err(|_| E::custom(format!("steering value {value} out of range")))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        value
            .trim()
            .parse::<i64>()
            .map(SteeringValue)
            .map_err(|_| E::custom(format!("steering value '{value}' is not an integer")))
    }
}

// ============================================================================
// SECTION: Edge Key
// ============================================================================

/// Compound key of a steering target edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteeringTargetKey {
    /// Steering delivery service.
    pub delivery_service_id: DeliveryServiceId,
    /// Target delivery service.
    pub target_id: DeliveryServiceId,
}

impl SteeringTargetKey {
    /// Creates a key from its two components.
    #[must_use]
    pub const fn new(delivery_service_id: DeliveryServiceId, target_id: DeliveryServiceId) -> Self {
        Self {
            delivery_service_id,
            target_id,
        }
    }
}

impl fmt::Display for SteeringTargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deliveryServiceId {} targetId {}", self.delivery_service_id, self.target_id)
    }
}

// ============================================================================
// SECTION: Steering Target
// ============================================================================

/// Stored steering target edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteeringTarget {
    /// Steering delivery service.
    pub delivery_service_id: DeliveryServiceId,
    /// Target delivery service.
    pub target_id: DeliveryServiceId,
    /// Steering type.
    pub type_id: TypeId,
    /// Weight or rank.
    pub value: SteeringValue,
}

impl SteeringTarget {
    /// Returns the compound key of this edge.
    #[must_use]
    pub const fn key(&self) -> SteeringTargetKey {
        SteeringTargetKey::new(self.delivery_service_id, self.target_id)
    }
}

/// Listing order: `value` ascending, then `target_id` ascending.
#[must_use]
pub fn listing_order(left: &SteeringTarget, right: &SteeringTarget) -> Ordering {
    left.value
        .cmp(&right.value)
        .then_with(|| left.target_id.cmp(&right.target_id))
        .then_with(|| left.delivery_service_id.cmp(&right.delivery_service_id))
}

/// Sorts edges into listing order.
pub fn sort_for_listing(edges: &mut [SteeringTarget]) {
    edges.sort_by(listing_order);
}

// ============================================================================
// SECTION: Read Model
// ============================================================================

/// Which reference of an edge a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceField {
    /// The steering delivery service.
    DeliveryService,
    /// The target delivery service.
    Target,
    /// The steering type.
    Type,
}

impl ReferenceField {
    /// Returns the wire field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeliveryService => "deliveryService",
            Self::Target => "target",
            Self::Type => "type",
        }
    }

    /// Returns the lookup label used in error reports (`getting <label>`).
    #[must_use]
    pub const fn lookup_label(self) -> &'static str {
        match self {
            Self::DeliveryService => "ds",
            Self::Target => "target ds",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored edge whose catalog reference no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("inconsistent reference: {field} {id} no longer resolves")]
pub struct InconsistentReference {
    /// Offending reference field.
    pub field: ReferenceField,
    /// Raw identifier that failed to resolve.
    pub id: u64,
}

/// Steering target enriched with catalog names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteeringTargetView {
    /// Steering delivery service id.
    pub delivery_service_id: DeliveryServiceId,
    /// Steering delivery service XML ID.
    pub delivery_service: Option<XmlId>,
    /// Target delivery service id.
    pub target_id: DeliveryServiceId,
    /// Target delivery service XML ID.
    pub target: Option<XmlId>,
    /// Steering type id.
    pub type_id: TypeId,
    /// Steering type name.
    #[serde(rename = "type")]
    pub type_name: Option<TypeName>,
    /// Weight or rank.
    pub value: SteeringValue,
    /// References that failed to resolve at read time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inconsistencies: Vec<InconsistentReference>,
}

impl SteeringTargetView {
    /// Builds a view carrying only the ids of `edge`, with no names.
    #[must_use]
    pub const fn from_edge(edge: &SteeringTarget) -> Self {
        Self {
            delivery_service_id: edge.delivery_service_id,
            delivery_service: None,
            target_id: edge.target_id,
            target: None,
            type_id: edge.type_id,
            type_name: None,
            value: edge.value,
            inconsistencies: Vec::new(),
        }
    }

    /// Returns true when every reference resolved.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    /// Returns the id-only edge behind this view.
    #[must_use]
    pub const fn edge(&self) -> SteeringTarget {
        SteeringTarget {
            delivery_service_id: self.delivery_service_id,
            target_id: self.target_id,
            type_id: self.type_id,
            value: self.value,
        }
    }

    /// Returns the compound key of this view.
    #[must_use]
    pub const fn key(&self) -> SteeringTargetKey {
        SteeringTargetKey::new(self.delivery_service_id, self.target_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions use unwrap for clarity."
    )]

    use super::*;

    fn edge(target: u64, value: i64) -> SteeringTarget {
        SteeringTarget {
            delivery_service_id: DeliveryServiceId::new(1),
            target_id: DeliveryServiceId::new(target),
            type_id: TypeId::new(40),
            value: SteeringValue::new(value),
        }
    }

    #[test]
    fn steering_value_accepts_integer_and_string() {
        let from_int: SteeringValue = serde_json::from_str("-12345").unwrap();
        let from_str: SteeringValue = serde_json::from_str("\"-12345\"").unwrap();
        assert_eq!(from_int, SteeringValue::new(-12_345));
        assert_eq!(from_str, from_int);
        assert_eq!(serde_json::to_string(&from_str).unwrap(), "-12345");
    }

    #[test]
    fn steering_value_rejects_non_integers() {
        assert!(serde_json::from_str::<SteeringValue>("\"ten\"").is_err());
        assert!(serde_json::from_str::<SteeringValue>("1.5").is_err());
        assert!(serde_json::from_str::<SteeringValue>("18446744073709551615").is_err());
    }

    #[test]
    fn listing_order_sorts_by_value_then_target() {
        let mut edges = vec![edge(9, 5), edge(3, 5), edge(7, -1)];
        sort_for_listing(&mut edges);
        let targets: Vec<u64> = edges.iter().map(|edge| edge.target_id.get()).collect();
        assert_eq!(targets, vec![7, 3, 9]);
    }

    #[test]
    fn view_serializes_type_field_and_omits_empty_inconsistencies() {
        let view = SteeringTargetView {
            delivery_service_id: DeliveryServiceId::new(1),
            delivery_service: Some(XmlId::new("steering-ds1")),
            target_id: DeliveryServiceId::new(2),
            target: Some(XmlId::new("ds2")),
            type_id: TypeId::new(40),
            type_name: Some(TypeName::new("STEERING_ORDER")),
            value: SteeringValue::new(3),
            inconsistencies: Vec::new(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["type"], "STEERING_ORDER");
        assert_eq!(json["deliveryServiceId"], 1);
        assert!(json.get("inconsistencies").is_none());
    }
}
