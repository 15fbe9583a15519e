// crates/steering-core/src/interfaces/mod.rs
// ============================================================================
// Module: Steering Interfaces
// Description: Backend-agnostic interfaces for catalogs, stores, and policy.
// Purpose: Define the seams the steering target service is assembled from.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The service never talks to a concrete catalog, store, authorizer, or log
//! directly. Each is an injected trait object so tests can substitute
//! deterministic fakes and deployments can pick the SQLite store. All
//! implementations must fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::DeliveryServiceId;
use crate::core::DeliveryServiceRecord;
use crate::core::ReferenceField;
use crate::core::RequestContext;
use crate::core::SteeringTarget;
use crate::core::SteeringTargetKey;
use crate::core::SteeringTargetView;
use crate::core::SteeringValue;
use crate::core::TypeId;
use crate::core::TypeName;
use crate::core::TypeRecord;
use crate::core::XmlId;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Catalog access errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog could not be read.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the delivery service and type catalogs.
///
/// Implementations must reflect the latest committed catalog state on every
/// call.
pub trait Catalog: Send + Sync {
    /// Looks up a delivery service by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog cannot be read.
    fn delivery_service(
        &self,
        id: DeliveryServiceId,
    ) -> Result<Option<DeliveryServiceRecord>, CatalogError>;

    /// Returns every delivery service with the given XML ID.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog cannot be read.
    fn delivery_services_by_xml_id(
        &self,
        xml_id: &str,
    ) -> Result<Vec<DeliveryServiceRecord>, CatalogError>;

    /// Looks up a type by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog cannot be read.
    fn type_record(&self, id: TypeId) -> Result<Option<TypeRecord>, CatalogError>;

    /// Returns every type with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog cannot be read.
    fn types_by_name(&self, name: &str) -> Result<Vec<TypeRecord>, CatalogError>;
}

// ============================================================================
// SECTION: Reference Resolver
// ============================================================================

/// Kind of name being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Delivery service XML ID.
    DeliveryService,
    /// Type name.
    Type,
}

impl ReferenceKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeliveryService => "delivery service",
            Self::Type => "type",
        }
    }
}

/// Name resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No catalog entry has the name.
    #[error("{} '{name}' not found", .kind.as_str())]
    NotFound {
        /// Kind of name.
        kind: ReferenceKind,
        /// Name that failed to resolve.
        name: String,
    },
    /// More than one catalog entry has the name.
    #[error("{} '{name}' is ambiguous ({matches} matches)", .kind.as_str())]
    Ambiguous {
        /// Kind of name.
        kind: ReferenceKind,
        /// Name that matched several entries.
        name: String,
        /// Number of matches.
        matches: usize,
    },
    /// The catalog could not be read.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Resolves human-readable names to catalog identifiers.
pub trait ReferenceResolver: Send + Sync {
    /// Resolves a type name to its unique identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] for zero matches and
    /// [`ResolveError::Ambiguous`] for more than one.
    fn resolve_type(&self, name: &str) -> Result<TypeId, ResolveError>;

    /// Resolves a delivery service XML ID to its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when no delivery service has the XML
    /// ID.
    fn resolve_delivery_service(&self, xml_id: &str) -> Result<DeliveryServiceId, ResolveError>;
}

// ============================================================================
// SECTION: Steering Target Store
// ============================================================================

/// Store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An edge with the same key already exists.
    #[error("steering target already exists: {0}")]
    Conflict(SteeringTargetKey),
    /// No edge has the key.
    #[error("steering target not found: {0}")]
    NotFound(SteeringTargetKey),
    /// An id does not reference an eligible catalog entry.
    #[error("invalid {field} reference {id}: {reason}")]
    InvalidReference {
        /// Offending field.
        field: ReferenceField,
        /// Raw identifier.
        id: u64,
        /// Why the reference is not acceptable.
        reason: String,
    },
    /// Catalog read failed during a store operation.
    #[error("store catalog error: {0}")]
    Catalog(String),
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Store backend error.
    #[error("store error: {0}")]
    Store(String),
    /// Stored data is corrupt.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<CatalogError> for StoreError {
    fn from(error: CatalogError) -> Self {
        Self::Catalog(error.to_string())
    }
}

/// Authoritative collection of steering target edges.
///
/// Mutations on the same key pair must be serialized; reads must return a
/// self-consistent snapshot.
pub trait SteeringTargetStore {
    /// Inserts a new edge.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the key exists and
    /// [`StoreError::InvalidReference`] when an id is not eligible.
    fn create(&self, edge: &SteeringTarget) -> Result<SteeringTarget, StoreError>;

    /// Lists every edge of a steering delivery service in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list(&self, delivery_service_id: DeliveryServiceId)
    -> Result<Vec<SteeringTarget>, StoreError>;

    /// Loads a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn get(&self, key: SteeringTargetKey) -> Result<Option<SteeringTarget>, StoreError>;

    /// Replaces the type and value of an existing edge.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the key does not exist and
    /// [`StoreError::InvalidReference`] when the type is not a steering type.
    fn update(
        &self,
        key: SteeringTargetKey,
        type_id: TypeId,
        value: SteeringValue,
    ) -> Result<SteeringTarget, StoreError>;

    /// Removes an edge and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the key does not exist.
    fn delete(&self, key: SteeringTargetKey) -> Result<SteeringTarget, StoreError>;
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Action being authorized against a steering delivery service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringAction {
    /// Listing or reading targets.
    Read,
    /// Creating, updating, or deleting targets.
    Mutate,
}

/// Authorization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The principal may not perform the action.
    #[error("{0}")]
    Denied(String),
    /// An assignment could not be checked.
    #[error("authorization check failed: {0}")]
    Unavailable(String),
}

/// Decides whether a principal may act on a steering delivery service.
pub trait SteeringAuthorizer: Send + Sync {
    /// Authorizes an action.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] when the action is not permitted.
    fn authorize(
        &self,
        ctx: &RequestContext,
        action: SteeringAction,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<(), AuthzError>;
}

// ============================================================================
// SECTION: Change Log
// ============================================================================

/// Kind of committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Edge created.
    Created,
    /// Edge updated.
    Updated,
    /// Edge deleted.
    Deleted,
}

/// Committed steering target change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SteeringChangeEvent {
    /// Change kind.
    pub action: ChangeAction,
    /// Steering delivery service id.
    pub delivery_service_id: DeliveryServiceId,
    /// Steering delivery service XML ID, when it resolves.
    pub delivery_service: Option<XmlId>,
    /// Target delivery service id.
    pub target_id: DeliveryServiceId,
    /// Target delivery service XML ID, when it resolves.
    pub target: Option<XmlId>,
    /// Steering type id.
    pub type_id: TypeId,
    /// Steering type name, when it resolves.
    pub type_name: Option<TypeName>,
    /// Weight or rank.
    pub value: SteeringValue,
    /// Subject of the principal that made the change.
    pub subject: String,
    /// Request identifier, when provided.
    pub request_id: Option<String>,
}

impl SteeringChangeEvent {
    /// Builds an event from a view and the request that produced it.
    #[must_use]
    pub fn from_view(
        action: ChangeAction,
        view: &SteeringTargetView,
        ctx: &RequestContext,
    ) -> Self {
        Self {
            action,
            delivery_service_id: view.delivery_service_id,
            delivery_service: view.delivery_service.clone(),
            target_id: view.target_id,
            target: view.target.clone(),
            type_id: view.type_id,
            type_name: view.type_name.clone(),
            value: view.value,
            subject: ctx.principal.subject.clone(),
            request_id: ctx.request_id.clone(),
        }
    }
}

/// Sink for committed changes.
pub trait ChangeSink: Send + Sync {
    /// Records a committed change.
    fn record_change(&self, event: &SteeringChangeEvent);
}

/// Change sink that discards events.
pub struct NoopChangeSink;

impl ChangeSink for NoopChangeSink {
    fn record_change(&self, _event: &SteeringChangeEvent) {}
}
