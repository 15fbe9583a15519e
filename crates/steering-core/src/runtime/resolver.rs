// crates/steering-core/src/runtime/resolver.rs
// ============================================================================
// Module: Catalog Resolver
// Description: Name-to-identifier resolution over a catalog.
// Purpose: Implement ReferenceResolver for any Catalog.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`CatalogResolver`] performs a fresh catalog read on every call. Names are
//! expected to be unique; duplicates are reported as ambiguous rather than
//! silently picking one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::DeliveryServiceId;
use crate::core::TypeId;
use crate::interfaces::Catalog;
use crate::interfaces::ReferenceKind;
use crate::interfaces::ReferenceResolver;
use crate::interfaces::ResolveError;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver backed by a shared catalog.
#[derive(Clone)]
pub struct CatalogResolver {
    /// Catalog consulted on every lookup.
    catalog: Arc<dyn Catalog>,
}

impl CatalogResolver {
    /// Creates a resolver over the given catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
        }
    }
}

impl ReferenceResolver for CatalogResolver {
    fn resolve_type(&self, name: &str) -> Result<TypeId, ResolveError> {
        let matches = self.catalog.types_by_name(name)?;
        match matches.as_slice() {
            [] => Err(ResolveError::NotFound {
                kind: ReferenceKind::Type,
                name: name.to_string(),
            }),
            [record] => Ok(record.id),
            _ => Err(ResolveError::Ambiguous {
                kind: ReferenceKind::Type,
                name: name.to_string(),
                matches: matches.len(),
            }),
        }
    }

    fn resolve_delivery_service(&self, xml_id: &str) -> Result<DeliveryServiceId, ResolveError> {
        let matches = self.catalog.delivery_services_by_xml_id(xml_id)?;
        match matches.as_slice() {
            [] => Err(ResolveError::NotFound {
                kind: ReferenceKind::DeliveryService,
                name: xml_id.to_string(),
            }),
            [record] => Ok(record.id),
            _ => Err(ResolveError::Ambiguous {
                kind: ReferenceKind::DeliveryService,
                name: xml_id.to_string(),
                matches: matches.len(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
