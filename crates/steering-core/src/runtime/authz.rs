// crates/steering-core/src/runtime/authz.rs
// ============================================================================
// Module: Role Authorizer
// Description: Role and assignment based authorization for steering targets.
// Purpose: Gate mutations by principal role and delivery service assignment.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Every role may read. Admin and operations principals may mutate any
//! steering delivery service. Steering principals may mutate only the
//! delivery services they are assigned, matched by resolving each assigned XML
//! ID against the live catalog on every call. Read-only principals never
//! mutate. Assignment lookups that fail for reasons other than a missing name
//! deny the request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::DeliveryServiceId;
use crate::core::PrincipalRole;
use crate::core::RequestContext;
use crate::interfaces::AuthzError;
use crate::interfaces::ReferenceResolver;
use crate::interfaces::ResolveError;
use crate::interfaces::SteeringAction;
use crate::interfaces::SteeringAuthorizer;

// ============================================================================
// SECTION: Role Authorizer
// ============================================================================

/// Authorizer driven by [`PrincipalRole`] and delivery service assignments.
#[derive(Clone)]
pub struct RoleAuthorizer {
    /// Resolver used to match assigned XML IDs.
    resolver: Arc<dyn ReferenceResolver>,
}

impl RoleAuthorizer {
    /// Creates an authorizer resolving assignments through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn ReferenceResolver>) -> Self {
        Self {
            resolver,
        }
    }

    /// Returns true when one of the assigned XML IDs names the delivery service.
    fn is_assigned(
        &self,
        ctx: &RequestContext,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<bool, AuthzError> {
        for xml_id in &ctx.principal.delivery_services {
            match self.resolver.resolve_delivery_service(xml_id.as_str()) {
                Ok(id) if id == delivery_service_id => return Ok(true),
                Ok(_) | Err(ResolveError::NotFound { .. }) => {}
                Err(err) => return Err(AuthzError::Unavailable(err.to_string())),
            }
        }
        Ok(false)
    }
}

impl SteeringAuthorizer for RoleAuthorizer {
    fn authorize(
        &self,
        ctx: &RequestContext,
        action: SteeringAction,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<(), AuthzError> {
        if action == SteeringAction::Read {
            return Ok(());
        }
        match ctx.principal.role {
            PrincipalRole::Admin | PrincipalRole::Operations => Ok(()),
            PrincipalRole::Steering => {
                if self.is_assigned(ctx, delivery_service_id)? {
                    Ok(())
                } else {
                    Err(AuthzError::Denied(format!(
                        "principal '{}' is not assigned to delivery service {delivery_service_id}",
                        ctx.principal.subject
                    )))
                }
            }
            PrincipalRole::ReadOnly => Err(AuthzError::Denied(format!(
                "principal '{}' has read-only access",
                ctx.principal.subject
            ))),
        }
    }
}

/// Authorizer that permits every action.
pub struct AllowAllAuthorizer;

impl SteeringAuthorizer for AllowAllAuthorizer {
    fn authorize(
        &self,
        _ctx: &RequestContext,
        _action: SteeringAction,
        _delivery_service_id: DeliveryServiceId,
    ) -> Result<(), AuthzError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
