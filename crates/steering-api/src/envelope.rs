// crates/steering-api/src/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: Traffic Ops style response envelope and alerts.
// Purpose: Give every API response one shape for payloads and messages.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Responses are `{"response": ..., "alerts": [...]}`. Either member is
//! omitted when empty. Errors carry a single `error` alert and no response.

use serde::Deserialize;
use serde::Serialize;
use steering_core::SteeringTargetView;

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Operation succeeded.
    Success,
    /// Informational note.
    Info,
    /// Non-fatal problem with the returned data.
    Warning,
    /// Operation failed.
    Error,
}

/// Message attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Severity.
    pub level: AlertLevel,
    /// Human-readable text.
    pub text: String,
}

impl Alert {
    /// Builds a success alert.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Success,
            text: text.into(),
        }
    }

    /// Builds a warning alert.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Warning,
            text: text.into(),
        }
    }

    /// Builds an error alert.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Error,
            text: text.into(),
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Payload, absent on errors and deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
    /// Attached alerts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
}

impl<T> Envelope<T> {
    /// Wraps a payload without alerts.
    #[must_use]
    pub const fn response(response: T) -> Self {
        Self {
            response: Some(response),
            alerts: Vec::new(),
        }
    }

    /// Appends an alert.
    #[must_use]
    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alerts.push(alert);
        self
    }
}

impl Envelope<()> {
    /// Builds a payload-free envelope carrying `alert`.
    #[must_use]
    pub fn alert(alert: Alert) -> Self {
        Self {
            response: None,
            alerts: vec![alert],
        }
    }
}

/// Returns warning alerts for every inconsistent reference in `views`.
#[must_use]
pub fn inconsistency_alerts(views: &[SteeringTargetView]) -> Vec<Alert> {
    views
        .iter()
        .flat_map(|view| {
            let key = view.key();
            view.inconsistencies.iter().map(move |inconsistency| {
                Alert::warning(format!("steering target {key}: {inconsistency}"))
            })
        })
        .collect()
}
