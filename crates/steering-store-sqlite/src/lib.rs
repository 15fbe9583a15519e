// crates/steering-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Steering Target Store
// Description: Durable SteeringTargetStore backend using SQLite.
// Purpose: Persist steering target edges across restarts.
// Dependencies: steering-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`SteeringTargetStore`] that keeps one
//! row per `(delivery service, target)` pair and runs every mutation in a
//! single transaction. Database contents are untrusted and are validated on
//! read.
//!
//! [`SteeringTargetStore`]: steering_core::SteeringTargetStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteSteeringTargetStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
