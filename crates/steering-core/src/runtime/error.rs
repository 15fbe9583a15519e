// crates/steering-core/src/runtime/error.rs
// ============================================================================
// Module: Steering Errors
// Description: Operation-scoped errors returned by the steering target service.
// Purpose: Carry the failing operation and field in every reported error.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Every [`SteeringError`] renders as `<operation>: <detail>`. Resolver, store,
//! and authorizer failures are converted here with the operation attached so
//! callers never have to guess which step failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::DeliveryServiceId;
use crate::core::ReferenceField;
use crate::interfaces::AuthzError;
use crate::interfaces::ResolveError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Operation
// ============================================================================

/// Public steering target operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create an edge.
    Create,
    /// List the edges of a steering delivery service.
    List,
    /// Read a single edge.
    Get,
    /// Update an edge.
    Update,
    /// Delete an edge.
    Delete,
}

impl Operation {
    /// Returns the label used as the error prefix.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "creating steering target",
            Self::List => "getting steering targets",
            Self::Get => "steering target get",
            Self::Update => "updating steering target",
            Self::Delete => "deleting steering target",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Steering Error
// ============================================================================

/// Steering target service errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SteeringError {
    /// A required field is missing or malformed.
    #[error("{operation}: {field}: {message}")]
    Validation {
        /// Failing operation.
        operation: Operation,
        /// Offending request field.
        field: &'static str,
        /// What is wrong with the field.
        message: String,
    },
    /// A name or key pair does not exist.
    #[error("{operation}: {subject}: not found")]
    NotFound {
        /// Failing operation.
        operation: Operation,
        /// What was looked up.
        subject: String,
    },
    /// A name matched more than one catalog entry.
    #[error("{operation}: {subject}: ambiguous")]
    Ambiguous {
        /// Failing operation.
        operation: Operation,
        /// What was looked up.
        subject: String,
    },
    /// The key pair already exists.
    #[error(
        "{operation}: steering target deliveryServiceId {delivery_service_id} targetId \
         {target_id} already exists"
    )]
    Conflict {
        /// Failing operation.
        operation: Operation,
        /// Steering delivery service.
        delivery_service_id: DeliveryServiceId,
        /// Target delivery service.
        target_id: DeliveryServiceId,
    },
    /// An id does not reference an eligible catalog entry.
    #[error("{operation}: invalid {field} {id}: {reason}")]
    InvalidReference {
        /// Failing operation.
        operation: Operation,
        /// Offending field.
        field: ReferenceField,
        /// Raw identifier.
        id: u64,
        /// Why the reference is not acceptable.
        reason: String,
    },
    /// The caller may not perform the operation.
    #[error("{operation}: unauthorized: {reason}")]
    Unauthorized {
        /// Failing operation.
        operation: Operation,
        /// Denial reason.
        reason: String,
    },
    /// Backend failure.
    #[error("{operation}: {message}")]
    Store {
        /// Failing operation.
        operation: Operation,
        /// Backend error text.
        message: String,
    },
}

impl SteeringError {
    /// Returns the operation that failed.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Validation {
                operation, ..
            }
            | Self::NotFound {
                operation, ..
            }
            | Self::Ambiguous {
                operation, ..
            }
            | Self::Conflict {
                operation, ..
            }
            | Self::InvalidReference {
                operation, ..
            }
            | Self::Unauthorized {
                operation, ..
            }
            | Self::Store {
                operation, ..
            } => *operation,
        }
    }

    /// Builds a validation error.
    #[must_use]
    pub fn validation(
        operation: Operation,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            operation,
            field,
            message: message.into(),
        }
    }

    /// Converts a store error, attaching the operation.
    #[must_use]
    pub fn from_store(operation: Operation, error: StoreError) -> Self {
        match error {
            StoreError::Conflict(key) => Self::Conflict {
                operation,
                delivery_service_id: key.delivery_service_id,
                target_id: key.target_id,
            },
            StoreError::NotFound(key) => Self::NotFound {
                operation,
                subject: format!("steering target {key}"),
            },
            StoreError::InvalidReference {
                field,
                id,
                reason,
            } => Self::InvalidReference {
                operation,
                field,
                id,
                reason,
            },
            other @ (StoreError::Catalog(_)
            | StoreError::Io(_)
            | StoreError::Store(_)
            | StoreError::Corrupt(_)
            | StoreError::VersionMismatch(_)) => Self::Store {
                operation,
                message: other.to_string(),
            },
        }
    }

    /// Converts a resolution error for the given request field.
    #[must_use]
    pub fn from_resolve(operation: Operation, field: ReferenceField, error: ResolveError) -> Self {
        match error {
            ResolveError::NotFound {
                name, ..
            } => Self::NotFound {
                operation,
                subject: format!("getting {} '{name}'", field.lookup_label()),
            },
            ResolveError::Ambiguous {
                name,
                matches,
                ..
            } => Self::Ambiguous {
                operation,
                subject: format!("getting {} '{name}' ({matches} matches)", field.lookup_label()),
            },
            ResolveError::Catalog(err) => Self::Store {
                operation,
                message: err.to_string(),
            },
        }
    }

    /// Converts an authorization error.
    #[must_use]
    pub fn from_authz(operation: Operation, error: AuthzError) -> Self {
        match error {
            AuthzError::Denied(reason) => Self::Unauthorized {
                operation,
                reason,
            },
            AuthzError::Unavailable(message) => Self::Store {
                operation,
                message,
            },
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
