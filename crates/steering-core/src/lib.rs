// crates/steering-core/src/lib.rs
// ============================================================================
// Module: Steering Core Library
// Description: Public API surface for steering target management.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Steering core manages the edges between steering delivery services and
//! their target delivery services: name resolution, compound-key uniqueness,
//! referential integrity against read-only catalogs, and ordered,
//! name-enriched reads. Transports and durable stores plug in through the
//! traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuthzError;
pub use interfaces::Catalog;
pub use interfaces::CatalogError;
pub use interfaces::ChangeAction;
pub use interfaces::ChangeSink;
pub use interfaces::NoopChangeSink;
pub use interfaces::ReferenceKind;
pub use interfaces::ReferenceResolver;
pub use interfaces::ResolveError;
pub use interfaces::SteeringAction;
pub use interfaces::SteeringAuthorizer;
pub use interfaces::SteeringChangeEvent;
pub use interfaces::SteeringTargetStore;
pub use interfaces::StoreError;
pub use runtime::AllowAllAuthorizer;
pub use runtime::CatalogResolver;
pub use runtime::CreateSteeringTarget;
pub use runtime::InMemoryCatalog;
pub use runtime::InMemorySteeringTargetStore;
pub use runtime::Operation;
pub use runtime::RoleAuthorizer;
pub use runtime::SharedSteeringTargetStore;
pub use runtime::SteeringError;
pub use runtime::SteeringTargetListing;
pub use runtime::SteeringTargetService;
pub use runtime::UpdateSteeringTarget;
pub use runtime::check_edge_references;
pub use runtime::check_type_reference;
