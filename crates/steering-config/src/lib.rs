// crates/steering-config/src/lib.rs
// ============================================================================
// Module: Steering Config Library
// Description: Canonical config model and validation for steering.toml.
// Purpose: Single source of truth for server, store, and catalog settings.
// Dependencies: steering-core, steering-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `steering-config` loads `steering.toml`, applies defaults, and validates
//! the result fail-closed. Config inputs are treated as untrusted: size,
//! encoding, and path limits are enforced before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
