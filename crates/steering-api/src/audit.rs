// crates/steering-api/src/audit.rs
// ============================================================================
// Module: API Audit Logging
// Description: Structured audit events for authentication, changes, requests.
// Purpose: Emit JSON-line audit logs without a logging framework dependency.
// Dependencies: steering-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every audit record is a single JSON object with an `event` field. The
//! [`StderrAuditSink`] writes one object per line to stderr; deployments
//! route stderr to their log pipeline. Committed steering target changes
//! reach the sink through [`AuditChangeSink`], which adapts the service's
//! change hook. Backend failures answered with a generic 500 are recorded as
//! [`ErrorAuditEvent`]s carrying the full message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use steering_core::ChangeSink;
use steering_core::SteeringChangeEvent;

use crate::auth::AuthAuditEvent;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Committed steering target change record.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Change payload.
    #[serde(flatten)]
    pub change: SteeringChangeEvent,
}

impl ChangeAuditEvent {
    /// Wraps a committed change.
    #[must_use]
    pub fn new(change: SteeringChangeEvent) -> Self {
        Self {
            event: "steering_target_change",
            timestamp_ms: now_millis(),
            change,
        }
    }
}

/// Completed HTTP request record.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier.
    pub request_id: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Handling latency in milliseconds.
    pub latency_ms: u128,
}

impl RequestAuditEvent {
    /// Builds a request record.
    #[must_use]
    pub fn new(
        request_id: Option<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        latency_ms: u128,
    ) -> Self {
        Self {
            event: "request",
            timestamp_ms: now_millis(),
            request_id,
            method: method.into(),
            path: path.into(),
            status,
            latency_ms,
        }
    }
}

/// Internal failure record carrying detail withheld from the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier.
    pub request_id: Option<String>,
    /// Caller subject.
    pub subject: String,
    /// Failing operation label.
    pub operation: String,
    /// Backend error message.
    pub message: String,
}

impl ErrorAuditEvent {
    /// Builds an internal failure record.
    #[must_use]
    pub fn new(
        request_id: Option<String>,
        subject: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event: "error",
            timestamp_ms: now_millis(),
            request_id,
            subject: subject.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Any audit record.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AuditEvent {
    /// Authentication or authorization decision.
    Auth(AuthAuditEvent),
    /// Committed steering target change.
    Change(ChangeAuditEvent),
    /// Completed HTTP request.
    Request(RequestAuditEvent),
    /// Internal failure hidden from the caller.
    Error(ErrorAuditEvent),
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &AuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr().lock(), "{payload}");
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Adapts an [`AuditSink`] to the service change hook.
pub struct AuditChangeSink {
    /// Destination sink.
    sink: Arc<dyn AuditSink>,
}

impl AuditChangeSink {
    /// Wraps `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
        }
    }
}

impl ChangeSink for AuditChangeSink {
    fn record_change(&self, event: &SteeringChangeEvent) {
        self.sink.record(&AuditEvent::Change(ChangeAuditEvent::new(event.clone())));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the Unix epoch, or zero if the clock is before it.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |duration| duration.as_millis())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
