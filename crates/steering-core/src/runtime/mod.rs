// crates/steering-core/src/runtime/mod.rs
// ============================================================================
// Module: Steering Runtime
// Description: Resolver, stores, authorizer, listing, and the target service.
// Purpose: Implement steering target operations over the core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules hold the concrete building blocks: an in-memory catalog and
//! store, the catalog-backed resolver, the role authorizer, read-side
//! enrichment, and [`SteeringTargetService`], which every transport calls
//! into.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod authz;
pub mod catalog;
pub mod error;
pub mod integrity;
pub mod listing;
pub mod resolver;
pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use authz::AllowAllAuthorizer;
pub use authz::RoleAuthorizer;
pub use catalog::InMemoryCatalog;
pub use error::Operation;
pub use error::SteeringError;
pub use integrity::check_edge_references;
pub use integrity::check_type_reference;
pub use listing::SteeringTargetListing;
pub use resolver::CatalogResolver;
pub use service::CreateSteeringTarget;
pub use service::SteeringTargetService;
pub use service::UpdateSteeringTarget;
pub use store::InMemorySteeringTargetStore;
pub use store::KeyedLocks;
pub use store::SharedSteeringTargetStore;
