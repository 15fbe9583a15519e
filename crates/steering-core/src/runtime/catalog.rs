// crates/steering-core/src/runtime/catalog.rs
// ============================================================================
// Module: In-Memory Catalog
// Description: Delivery service and type catalog held in memory.
// Purpose: Serve reference data loaded from configuration or test fixtures.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryCatalog`] implements [`Catalog`] over two maps guarded by an
//! `RwLock`. The mutators exist for the catalog's owner (configuration
//! loading and tests); the steering service only reads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use crate::core::DeliveryServiceId;
use crate::core::DeliveryServiceRecord;
use crate::core::TypeId;
use crate::core::TypeRecord;
use crate::interfaces::Catalog;
use crate::interfaces::CatalogError;

// ============================================================================
// SECTION: In-Memory Catalog
// ============================================================================

/// Catalog contents.
#[derive(Debug, Default)]
struct CatalogTables {
    /// Delivery services by id.
    delivery_services: BTreeMap<DeliveryServiceId, DeliveryServiceRecord>,
    /// Types by id.
    types: BTreeMap<TypeId, TypeRecord>,
}

/// In-memory catalog of delivery services and types.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    /// Catalog tables protected by a read/write lock.
    tables: Arc<RwLock<CatalogTables>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with the given records.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn with_records(
        delivery_services: impl IntoIterator<Item = DeliveryServiceRecord>,
        types: impl IntoIterator<Item = TypeRecord>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for record in delivery_services {
            catalog.upsert_delivery_service(record)?;
        }
        for record in types {
            catalog.upsert_type(record)?;
        }
        Ok(catalog)
    }

    /// Inserts or replaces a delivery service.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn upsert_delivery_service(
        &self,
        record: DeliveryServiceRecord,
    ) -> Result<(), CatalogError> {
        self.tables.write().map_err(|_| poisoned())?.delivery_services.insert(record.id, record);
        Ok(())
    }

    /// Removes a delivery service, returning it when present.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn remove_delivery_service(
        &self,
        id: DeliveryServiceId,
    ) -> Result<Option<DeliveryServiceRecord>, CatalogError> {
        Ok(self.tables.write().map_err(|_| poisoned())?.delivery_services.remove(&id))
    }

    /// Inserts or replaces a type.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn upsert_type(&self, record: TypeRecord) -> Result<(), CatalogError> {
        self.tables.write().map_err(|_| poisoned())?.types.insert(record.id, record);
        Ok(())
    }

    /// Removes a type, returning it when present.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog lock is poisoned.
    pub fn remove_type(&self, id: TypeId) -> Result<Option<TypeRecord>, CatalogError> {
        Ok(self.tables.write().map_err(|_| poisoned())?.types.remove(&id))
    }
}

impl Catalog for InMemoryCatalog {
    fn delivery_service(
        &self,
        id: DeliveryServiceId,
    ) -> Result<Option<DeliveryServiceRecord>, CatalogError> {
        let guard = self.tables.read().map_err(|_| poisoned())?;
        Ok(guard.delivery_services.get(&id).cloned())
    }

    fn delivery_services_by_xml_id(
        &self,
        xml_id: &str,
    ) -> Result<Vec<DeliveryServiceRecord>, CatalogError> {
        let guard = self.tables.read().map_err(|_| poisoned())?;
        Ok(guard
            .delivery_services
            .values()
            .filter(|record| record.xml_id.as_str() == xml_id)
            .cloned()
            .collect())
    }

    fn type_record(&self, id: TypeId) -> Result<Option<TypeRecord>, CatalogError> {
        let guard = self.tables.read().map_err(|_| poisoned())?;
        Ok(guard.types.get(&id).cloned())
    }

    fn types_by_name(&self, name: &str) -> Result<Vec<TypeRecord>, CatalogError> {
        let guard = self.tables.read().map_err(|_| poisoned())?;
        Ok(guard.types.values().filter(|record| record.name.as_str() == name).cloned().collect())
    }
}

/// Returns the error reported for a poisoned catalog lock.
fn poisoned() -> CatalogError {
    CatalogError::Unavailable("catalog lock poisoned".to_string())
}
