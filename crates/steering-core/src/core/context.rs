// crates/steering-core/src/core/context.rs
// ============================================================================
// Module: Request Context
// Description: Request-scoped caller identity passed into every operation.
// Purpose: Replace ambient sessions with explicit per-call credentials.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Transports authenticate the caller and build a [`RequestContext`] that is
//! handed to each service call. Nothing about the caller is held in shared
//! state between requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::XmlId;

// ============================================================================
// SECTION: Principal
// ============================================================================

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalRole {
    /// Full access.
    Admin,
    /// Operators may mutate any steering delivery service.
    Operations,
    /// Steering users may mutate only their assigned delivery services.
    Steering,
    /// Read access only.
    ReadOnly,
}

impl PrincipalRole {
    /// Returns the stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operations => "operations",
            Self::Steering => "steering",
            Self::ReadOnly => "read_only",
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Subject name used in audit records.
    pub subject: String,
    /// Assigned role.
    pub role: PrincipalRole,
    /// Delivery services a steering principal may mutate.
    pub delivery_services: Vec<XmlId>,
}

impl Principal {
    /// Builds an admin principal.
    #[must_use]
    pub fn admin(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: PrincipalRole::Admin,
            delivery_services: Vec::new(),
        }
    }

    /// Builds a steering principal assigned to the given delivery services.
    #[must_use]
    pub fn steering(subject: impl Into<String>, delivery_services: Vec<XmlId>) -> Self {
        Self {
            subject: subject.into(),
            role: PrincipalRole::Steering,
            delivery_services,
        }
    }
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context handed to every service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Authenticated caller.
    pub principal: Principal,
    /// Optional request identifier for auditing.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds a context for the given principal.
    #[must_use]
    pub const fn new(principal: Principal) -> Self {
        Self {
            principal,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
