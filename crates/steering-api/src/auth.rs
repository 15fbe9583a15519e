// crates/steering-api/src/auth.rs
// ============================================================================
// Module: API Authentication
// Description: Authentication of inbound HTTP requests.
// Purpose: Map callers to principals with fail-closed local and bearer modes.
// Dependencies: steering-config, steering-core, serde, sha2
// ============================================================================

//! ## Overview
//! Authentication turns the peer address and `Authorization` header of a
//! request into a [`Principal`]. In `local_only` mode only loopback peers are
//! accepted and act as the `loopback` admin. In `bearer_token` mode the token
//! must match a configured principal. Raw tokens never leave this module;
//! audit events carry a SHA-256 fingerprint instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use steering_config::ServerAuthConfig;
use steering_config::ServerAuthMode;
use steering_core::Principal;
use steering_core::PrincipalRole;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted `Authorization` header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;
/// Subject assigned to loopback callers in local-only mode.
pub const LOOPBACK_SUBJECT: &str = "loopback";

// ============================================================================
// SECTION: Inbound Request
// ============================================================================

/// Transport facts about a request used for authentication.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// `Authorization` header value.
    pub auth_header: Option<String>,
    /// Request identifier for auditing.
    pub request_id: Option<String>,
}

impl InboundRequest {
    /// Builds an inbound request description.
    #[must_use]
    pub const fn new(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self {
            peer_ip,
            auth_header,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns true when the peer IP is loopback.
    #[must_use]
    pub fn peer_is_loopback(&self) -> bool {
        self.peer_ip.is_some_and(|ip| ip.is_loopback())
    }
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Authentication method used for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Loopback access in local-only mode.
    Local,
    /// Bearer token authentication.
    BearerToken,
}

impl AuthMethod {
    /// Returns the stable label for the method.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::BearerToken => "bearer_token",
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Authentication method.
    pub method: AuthMethod,
    /// Resolved principal.
    pub principal: Principal,
    /// Token fingerprint for bearer auth.
    pub token_fingerprint: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or invalid credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Authenticates inbound requests.
pub trait RequestAuthenticator: Send + Sync {
    /// Returns the authenticated caller for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the request carries no acceptable
    /// credentials.
    fn authenticate(&self, request: &InboundRequest) -> Result<AuthContext, AuthError>;
}

// ============================================================================
// SECTION: Default Authenticator
// ============================================================================

/// Authenticator derived from server auth configuration.
pub struct DefaultAuthenticator {
    /// Configured mode.
    mode: ServerAuthMode,
    /// Principals keyed by bearer token.
    principals: BTreeMap<String, Principal>,
}

impl DefaultAuthenticator {
    /// Builds an authenticator from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        let principals = config
            .principals
            .iter()
            .map(|entry| {
                let principal = Principal {
                    subject: entry.name.trim().to_string(),
                    role: entry.role,
                    delivery_services: entry.assigned_delivery_services(),
                };
                (entry.token.clone(), principal)
            })
            .collect();
        Self {
            mode: config.mode,
            principals,
        }
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }
}

impl RequestAuthenticator for DefaultAuthenticator {
    fn authenticate(&self, request: &InboundRequest) -> Result<AuthContext, AuthError> {
        match self.mode {
            ServerAuthMode::LocalOnly => authenticate_local_only(request),
            ServerAuthMode::BearerToken => {
                let token = parse_bearer_token(request.auth_header.as_deref())?;
                let principal = self
                    .principals
                    .get(&token)
                    .ok_or_else(|| AuthError::Unauthenticated("invalid bearer token".to_string()))?;
                Ok(AuthContext {
                    method: AuthMethod::BearerToken,
                    principal: principal.clone(),
                    token_fingerprint: Some(token_fingerprint(&token)),
                })
            }
        }
    }
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Authentication and authorization audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuthAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// Auth method label.
    auth_method: Option<&'static str>,
    /// Caller subject.
    subject: Option<String>,
    /// Caller role.
    role: Option<&'static str>,
    /// Bearer token fingerprint (sha256).
    token_fingerprint: Option<String>,
    /// Caller IP address.
    peer_ip: Option<String>,
    /// Request identifier.
    request_id: Option<String>,
    /// Failure reason for deny events.
    reason: Option<String>,
}

impl AuthAuditEvent {
    /// Builds an allow event for an authenticated request.
    #[must_use]
    pub fn allowed(request: &InboundRequest, auth: &AuthContext) -> Self {
        Self {
            event: "auth",
            decision: "allow",
            auth_method: Some(auth.method.label()),
            subject: Some(auth.principal.subject.clone()),
            role: Some(auth.principal.role.as_str()),
            token_fingerprint: auth.token_fingerprint.clone(),
            peer_ip: request.peer_ip.map(|ip| ip.to_string()),
            request_id: request.request_id.clone(),
            reason: None,
        }
    }

    /// Builds a deny event for a request that failed authentication.
    #[must_use]
    pub fn denied(request: &InboundRequest, error: &AuthError) -> Self {
        Self {
            event: "auth",
            decision: "deny",
            auth_method: None,
            subject: None,
            role: None,
            token_fingerprint: None,
            peer_ip: request.peer_ip.map(|ip| ip.to_string()),
            request_id: request.request_id.clone(),
            reason: Some(error.to_string()),
        }
    }

    /// Builds a deny event for an authenticated caller refused an action.
    #[must_use]
    pub fn forbidden(
        request: &InboundRequest,
        auth: &AuthContext,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event: "authz",
            decision: "deny",
            reason: Some(reason.into()),
            ..Self::allowed(request, auth)
        }
    }

    /// Returns the decision label.
    #[must_use]
    pub const fn decision(&self) -> &'static str {
        self.decision
    }

    /// Returns the subject, if the caller authenticated.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the token fingerprint, if any.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.token_fingerprint.as_deref()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the lowercase hex SHA-256 fingerprint of a bearer token.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

/// Accepts loopback peers as the loopback admin.
fn authenticate_local_only(request: &InboundRequest) -> Result<AuthContext, AuthError> {
    if !request.peer_is_loopback() {
        return Err(AuthError::Unauthenticated(
            "local-only mode requires loopback access".to_string(),
        ));
    }
    Ok(AuthContext {
        method: AuthMethod::Local,
        principal: Principal {
            subject: LOOPBACK_SUBJECT.to_string(),
            role: PrincipalRole::Admin,
            delivery_services: Vec::new(),
        },
        token_fingerprint: None,
    })
}

/// Extracts the token from a `Bearer` authorization header.
fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization".to_string()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token.to_string())
}
