// crates/steering-core/src/runtime/service.rs
// ============================================================================
// Module: Steering Target Service
// Description: Create, read, update, and delete operations on steering targets.
// Purpose: Turn name-based requests into id-based store calls and back.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! Each operation runs the same pipeline: validate required fields, resolve
//! names through the [`ReferenceResolver`], authorize against the steering
//! delivery service, call the store, enrich the result from the catalog, and
//! record the committed change. The first failing step aborts the operation;
//! the store is only reached once every name has resolved. Once the store has
//! committed, the operation succeeds even if enrichment cannot read the
//! catalog; the response then carries ids without names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::DeliveryServiceId;
use crate::core::ReferenceField;
use crate::core::RequestContext;
use crate::core::SteeringTarget;
use crate::core::SteeringTargetKey;
use crate::core::SteeringTargetView;
use crate::core::SteeringValue;
use crate::interfaces::Catalog;
use crate::interfaces::ChangeAction;
use crate::interfaces::ChangeSink;
use crate::interfaces::NoopChangeSink;
use crate::interfaces::ReferenceResolver;
use crate::interfaces::SteeringAction;
use crate::interfaces::SteeringAuthorizer;
use crate::interfaces::SteeringChangeEvent;
use crate::interfaces::SteeringTargetStore;
use crate::runtime::authz::RoleAuthorizer;
use crate::runtime::error::Operation;
use crate::runtime::error::SteeringError;
use crate::runtime::listing::SteeringTargetListing;
use crate::runtime::resolver::CatalogResolver;
use crate::runtime::store::SharedSteeringTargetStore;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Name-based create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSteeringTarget {
    /// Steering type name.
    pub type_name: Option<String>,
    /// Steering delivery service XML ID.
    pub delivery_service: Option<String>,
    /// Target delivery service XML ID.
    pub target: Option<String>,
    /// Weight or rank.
    pub value: Option<SteeringValue>,
}

/// Update request addressed by key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSteeringTarget {
    /// Steering delivery service.
    pub delivery_service_id: DeliveryServiceId,
    /// Target delivery service.
    pub target_id: DeliveryServiceId,
    /// New steering type name.
    pub type_name: Option<String>,
    /// New weight or rank.
    pub value: Option<SteeringValue>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Steering target service.
#[derive(Clone)]
pub struct SteeringTargetService {
    /// Name resolver.
    resolver: Arc<dyn ReferenceResolver>,
    /// Edge store.
    store: SharedSteeringTargetStore,
    /// Read-side enrichment.
    listing: SteeringTargetListing,
    /// Authorization policy.
    authorizer: Arc<dyn SteeringAuthorizer>,
    /// Committed change sink.
    changes: Arc<dyn ChangeSink>,
}

impl SteeringTargetService {
    /// Assembles a service from its collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        resolver: Arc<dyn ReferenceResolver>,
        store: SharedSteeringTargetStore,
        authorizer: Arc<dyn SteeringAuthorizer>,
    ) -> Self {
        Self {
            resolver,
            listing: SteeringTargetListing::new(store.clone(), catalog),
            store,
            authorizer,
            changes: Arc::new(NoopChangeSink),
        }
    }

    /// Assembles a service resolving names and roles through `catalog`.
    #[must_use]
    pub fn from_catalog(catalog: Arc<dyn Catalog>, store: SharedSteeringTargetStore) -> Self {
        let resolver: Arc<dyn ReferenceResolver> =
            Arc::new(CatalogResolver::new(Arc::clone(&catalog)));
        let authorizer = Arc::new(RoleAuthorizer::new(Arc::clone(&resolver)));
        Self::new(catalog, resolver, store, authorizer)
    }

    /// Returns a copy recording committed changes to `changes`.
    #[must_use]
    pub fn with_change_sink(mut self, changes: Arc<dyn ChangeSink>) -> Self {
        self.changes = changes;
        self
    }

    /// Returns the listing used for enrichment.
    #[must_use]
    pub const fn listing(&self) -> &SteeringTargetListing {
        &self.listing
    }

    /// Creates a steering target from names.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError`] when a field is missing, a name does not
    /// resolve, the caller is not authorized, or the store rejects the edge.
    pub fn create(
        &self,
        ctx: &RequestContext,
        request: CreateSteeringTarget,
    ) -> Result<SteeringTargetView, SteeringError> {
        let op = Operation::Create;
        let type_name = required(op, "type", request.type_name.as_deref())?;
        let delivery_service =
            required(op, "deliveryService", request.delivery_service.as_deref())?;
        let target = required(op, "target", request.target.as_deref())?;
        let value =
            request.value.ok_or_else(|| SteeringError::validation(op, "value", "required"))?;

        let delivery_service_id = self
            .resolver
            .resolve_delivery_service(delivery_service)
            .map_err(|err| SteeringError::from_resolve(op, ReferenceField::DeliveryService, err))?;
        self.insert(ctx, delivery_service_id, type_name, target, value)
    }

    /// Creates a steering target under a delivery service addressed by id.
    ///
    /// When the request also names a delivery service it must resolve to
    /// `delivery_service_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError`] under the same conditions as
    /// [`Self::create`], plus a validation error on a mismatched delivery
    /// service.
    pub fn create_under(
        &self,
        ctx: &RequestContext,
        delivery_service_id: DeliveryServiceId,
        request: CreateSteeringTarget,
    ) -> Result<SteeringTargetView, SteeringError> {
        let op = Operation::Create;
        let type_name = required(op, "type", request.type_name.as_deref())?;
        let target = required(op, "target", request.target.as_deref())?;
        let value =
            request.value.ok_or_else(|| SteeringError::validation(op, "value", "required"))?;

        if let Some(named) = request.delivery_service.as_deref()
            && !named.trim().is_empty()
        {
            let named_id = self
                .resolver
                .resolve_delivery_service(named)
                .map_err(|err| {
                    SteeringError::from_resolve(op, ReferenceField::DeliveryService, err)
                })?;
            if named_id != delivery_service_id {
                return Err(SteeringError::validation(
                    op,
                    "deliveryService",
                    format!("'{named}' does not match delivery service {delivery_service_id}"),
                ));
            }
        }
        self.insert(ctx, delivery_service_id, type_name, target, value)
    }

    /// Lists every steering target of a delivery service.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError`] when the caller may not read or the store
    /// fails.
    pub fn list(
        &self,
        ctx: &RequestContext,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<Vec<SteeringTargetView>, SteeringError> {
        let op = Operation::List;
        self.authorize(ctx, op, SteeringAction::Read, delivery_service_id)?;
        self.listing
            .list_by_delivery_service(delivery_service_id)
            .map_err(|err| SteeringError::from_store(op, err))
    }

    /// Reads a single steering target.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError::NotFound`] when the key pair does not exist.
    pub fn get(
        &self,
        ctx: &RequestContext,
        delivery_service_id: DeliveryServiceId,
        target_id: DeliveryServiceId,
    ) -> Result<SteeringTargetView, SteeringError> {
        let op = Operation::Get;
        self.authorize(ctx, op, SteeringAction::Read, delivery_service_id)?;
        let key = SteeringTargetKey::new(delivery_service_id, target_id);
        let edge = self
            .store
            .get(key)
            .map_err(|err| SteeringError::from_store(op, err))?
            .ok_or_else(|| SteeringError::NotFound {
                operation: op,
                subject: format!("steering target {key}"),
            })?;
        self.enrich(op, &edge)
    }

    /// Replaces the type and value of a steering target.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError`] when a field is missing, the type does not
    /// resolve, the caller is not authorized, or the key pair does not exist.
    pub fn update(
        &self,
        ctx: &RequestContext,
        request: UpdateSteeringTarget,
    ) -> Result<SteeringTargetView, SteeringError> {
        let op = Operation::Update;
        let type_name = required(op, "type", request.type_name.as_deref())?;
        let value =
            request.value.ok_or_else(|| SteeringError::validation(op, "value", "required"))?;
        self.authorize(ctx, op, SteeringAction::Mutate, request.delivery_service_id)?;
        let type_id = self
            .resolver
            .resolve_type(type_name)
            .map_err(|err| SteeringError::from_resolve(op, ReferenceField::Type, err))?;
        let key = SteeringTargetKey::new(request.delivery_service_id, request.target_id);
        let updated = self
            .store
            .update(key, type_id, value)
            .map_err(|err| SteeringError::from_store(op, err))?;
        let view = self.committed_view(&updated);
        self.changes
            .record_change(&SteeringChangeEvent::from_view(ChangeAction::Updated, &view, ctx));
        Ok(view)
    }

    /// Deletes a steering target.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringError::NotFound`] when the key pair does not exist,
    /// including on a repeated delete.
    pub fn delete(
        &self,
        ctx: &RequestContext,
        delivery_service_id: DeliveryServiceId,
        target_id: DeliveryServiceId,
    ) -> Result<(), SteeringError> {
        let op = Operation::Delete;
        self.authorize(ctx, op, SteeringAction::Mutate, delivery_service_id)?;
        let key = SteeringTargetKey::new(delivery_service_id, target_id);
        let removed = self.store.delete(key).map_err(|err| SteeringError::from_store(op, err))?;
        let view = self.committed_view(&removed);
        self.changes
            .record_change(&SteeringChangeEvent::from_view(ChangeAction::Deleted, &view, ctx));
        Ok(())
    }

    /// Resolves the remaining names and inserts the edge.
    fn insert(
        &self,
        ctx: &RequestContext,
        delivery_service_id: DeliveryServiceId,
        type_name: &str,
        target: &str,
        value: SteeringValue,
    ) -> Result<SteeringTargetView, SteeringError> {
        let op = Operation::Create;
        self.authorize(ctx, op, SteeringAction::Mutate, delivery_service_id)?;
        let target_id = self
            .resolver
            .resolve_delivery_service(target)
            .map_err(|err| SteeringError::from_resolve(op, ReferenceField::Target, err))?;
        let type_id = self
            .resolver
            .resolve_type(type_name)
            .map_err(|err| SteeringError::from_resolve(op, ReferenceField::Type, err))?;
        let edge = SteeringTarget {
            delivery_service_id,
            target_id,
            type_id,
            value,
        };
        let created = self.store.create(&edge).map_err(|err| SteeringError::from_store(op, err))?;
        let view = self.committed_view(&created);
        self.changes
            .record_change(&SteeringChangeEvent::from_view(ChangeAction::Created, &view, ctx));
        Ok(view)
    }

    /// Applies the authorization policy.
    fn authorize(
        &self,
        ctx: &RequestContext,
        op: Operation,
        action: SteeringAction,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<(), SteeringError> {
        self.authorizer
            .authorize(ctx, action, delivery_service_id)
            .map_err(|err| SteeringError::from_authz(op, err))
    }

    /// Enriches an edge for a response.
    fn enrich(
        &self,
        op: Operation,
        edge: &SteeringTarget,
    ) -> Result<SteeringTargetView, SteeringError> {
        self.listing.enrich(edge).map_err(|err| SteeringError::from_store(op, err))
    }

    /// Builds the view of an edge the store has already committed.
    ///
    /// A catalog failure at this point yields an id-only view so the caller
    /// still learns the write succeeded and the change is still recorded.
    fn committed_view(&self, edge: &SteeringTarget) -> SteeringTargetView {
        self.listing.enrich(edge).unwrap_or_else(|_| SteeringTargetView::from_edge(edge))
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Returns the field value, treating absent and blank strings as missing.
fn required<'a>(
    op: Operation,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, SteeringError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(SteeringError::validation(op, field, "required")),
    }
}
