// crates/steering-api/src/lib.rs
// ============================================================================
// Module: Steering API Library
// Description: HTTP transport for the steering target service.
// Purpose: Authenticate callers, map requests onto the service, and audit.
// Dependencies: steering-core, steering-config, steering-store-sqlite, axum
// ============================================================================

//! ## Overview
//! `steering-api` exposes the steering target service over HTTP using
//! Traffic Ops style JSON envelopes. Every request is authenticated by a
//! [`RequestAuthenticator`], turned into an explicit
//! [`steering_core::RequestContext`], and audited through an [`AuditSink`].
//! Security posture: request bodies, headers, and path segments are
//! untrusted and size-limited.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod envelope;
mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditChangeSink;
pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::ChangeAuditEvent;
pub use audit::ErrorAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::StderrAuditSink;
pub use auth::AuthAuditEvent;
pub use auth::AuthContext;
pub use auth::AuthError;
pub use auth::AuthMethod;
pub use auth::DefaultAuthenticator;
pub use auth::InboundRequest;
pub use auth::RequestAuthenticator;
pub use auth::token_fingerprint;
pub use envelope::Alert;
pub use envelope::AlertLevel;
pub use envelope::Envelope;
pub use server::SteeringServer;
pub use server::SteeringServerError;
