// crates/steering-core/src/runtime/listing.rs
// ============================================================================
// Module: Steering Target Listing
// Description: Ordered, name-enriched reads of steering target edges.
// Purpose: Join stored edges with the live catalog at read time.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The listing returns exactly the edges the store returned, in store order.
//! Names come from the catalog at read time; a reference that no longer
//! resolves leaves its name empty and adds an [`InconsistentReference`] to the
//! view instead of failing the read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::DeliveryServiceId;
use crate::core::InconsistentReference;
use crate::core::ReferenceField;
use crate::core::SteeringTarget;
use crate::core::SteeringTargetView;
use crate::interfaces::Catalog;
use crate::interfaces::SteeringTargetStore;
use crate::interfaces::StoreError;
use crate::runtime::store::SharedSteeringTargetStore;

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Read-side join of the store and the catalog.
#[derive(Clone)]
pub struct SteeringTargetListing {
    /// Edge store.
    store: SharedSteeringTargetStore,
    /// Catalog used for name enrichment.
    catalog: Arc<dyn Catalog>,
}

impl SteeringTargetListing {
    /// Creates a listing over the given store and catalog.
    #[must_use]
    pub fn new(store: SharedSteeringTargetStore, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            store,
            catalog,
        }
    }

    /// Lists every edge of a steering delivery service with resolved names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store or catalog cannot be read.
    pub fn list_by_delivery_service(
        &self,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<Vec<SteeringTargetView>, StoreError> {
        self.store.list(delivery_service_id)?.iter().map(|edge| self.enrich(edge)).collect()
    }

    /// Builds the view of a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Catalog`] when the catalog cannot be read.
    pub fn enrich(&self, edge: &SteeringTarget) -> Result<SteeringTargetView, StoreError> {
        let mut inconsistencies = Vec::new();
        let delivery_service =
            self.catalog.delivery_service(edge.delivery_service_id)?.map(|record| record.xml_id);
        if delivery_service.is_none() {
            inconsistencies.push(InconsistentReference {
                field: ReferenceField::DeliveryService,
                id: edge.delivery_service_id.get(),
            });
        }
        let target = self.catalog.delivery_service(edge.target_id)?.map(|record| record.xml_id);
        if target.is_none() {
            inconsistencies.push(InconsistentReference {
                field: ReferenceField::Target,
                id: edge.target_id.get(),
            });
        }
        let type_name = self.catalog.type_record(edge.type_id)?.map(|record| record.name);
        if type_name.is_none() {
            inconsistencies.push(InconsistentReference {
                field: ReferenceField::Type,
                id: edge.type_id.get(),
            });
        }
        Ok(SteeringTargetView {
            delivery_service_id: edge.delivery_service_id,
            delivery_service,
            target_id: edge.target_id,
            target,
            type_id: edge.type_id,
            type_name,
            value: edge.value,
            inconsistencies,
        })
    }
}
