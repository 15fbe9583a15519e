// crates/steering-api/src/routes.rs
// ============================================================================
// Module: API Routes
// Description: HTTP handlers for steering targets and ping.
// Purpose: Translate HTTP requests into service calls and envelopes.
// Dependencies: steering-core, axum, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Each handler authenticates the caller, parses path ids and the JSON body,
//! then runs the synchronous service call off the async executor. Failures
//! become an error envelope with the status the error kind maps to.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::Extension;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use steering_core::CreateSteeringTarget;
use steering_core::DeliveryServiceId;
use steering_core::RequestContext;
use steering_core::SteeringError;
use steering_core::SteeringTargetService;
use steering_core::SteeringValue;
use steering_core::UpdateSteeringTarget;

use crate::audit::AuditEvent;
use crate::audit::AuditSink;
use crate::audit::ErrorAuditEvent;
use crate::audit::RequestAuditEvent;
use crate::auth::AuthAuditEvent;
use crate::auth::AuthContext;
use crate::auth::InboundRequest;
use crate::auth::RequestAuthenticator;
use crate::envelope::Alert;
use crate::envelope::Envelope;
use crate::envelope::inconsistency_alerts;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the request identifier.
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
/// Maximum accepted length of a caller-supplied request identifier.
const MAX_REQUEST_ID_LENGTH: usize = 128;
/// Success alert text for creates.
const CREATED_TEXT: &str = "Delivery service target creation was successful.";
/// Success alert text for updates.
const UPDATED_TEXT: &str = "Delivery service target update was successful.";
/// Success alert text for deletes.
const DELETED_TEXT: &str = "Delivery service target delete was successful.";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for all handlers.
pub struct ApiState {
    /// Steering target service.
    pub service: SteeringTargetService,
    /// Request authenticator.
    pub authenticator: Arc<dyn RequestAuthenticator>,
    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,
    /// Counter for generated request identifiers.
    pub next_request_id: AtomicU64,
}

impl ApiState {
    /// Builds handler state.
    pub fn new(
        service: SteeringTargetService,
        authenticator: Arc<dyn RequestAuthenticator>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            service,
            authenticator,
            audit,
            next_request_id: AtomicU64::new(1),
        }
    }
}

/// Identifier assigned to the current request.
#[derive(Debug, Clone)]
struct RequestId(String);

/// Builds the API router over `state`.
pub fn build_router(state: Arc<ApiState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/steering/{ds_id}/targets", get(list_targets).post(create_target))
        .route(
            "/api/steering/{ds_id}/targets/{target_id}",
            get(get_target).put(update_target).delete(delete_target),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), track_request))
        .with_state(state)
}

// ============================================================================
// SECTION: Request Bodies
// ============================================================================

/// POST body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTargetBody {
    /// Steering type name.
    #[serde(rename = "type")]
    type_name: Option<String>,
    /// Target delivery service XML ID.
    target: Option<String>,
    /// Weight or rank.
    value: Option<SteeringValue>,
    /// Optional steering delivery service XML ID; must match the path.
    delivery_service: Option<String>,
}

/// PUT body.
#[derive(Debug, Deserialize)]
struct UpdateTargetBody {
    /// Steering type name.
    #[serde(rename = "type")]
    type_name: Option<String>,
    /// Weight or rank.
    value: Option<SteeringValue>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error rendered as an error envelope.
#[derive(Debug)]
struct ApiError {
    /// Response status.
    status: StatusCode,
    /// Alert text.
    message: String,
}

impl ApiError {
    /// Builds an error with the given status.
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<SteeringError> for ApiError {
    fn from(err: SteeringError) -> Self {
        let status = status_for(&err);
        let message = match err {
            SteeringError::Store {
                operation, ..
            } => format!("{operation}: internal server error"),
            other => other.to_string(),
        };
        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::alert(Alert::error(self.message)))).into_response()
    }
}

/// Maps a service error to its HTTP status.
const fn status_for(err: &SteeringError) -> StatusCode {
    match err {
        SteeringError::Validation {
            ..
        }
        | SteeringError::InvalidReference {
            ..
        } => StatusCode::BAD_REQUEST,
        SteeringError::NotFound {
            ..
        } => StatusCode::NOT_FOUND,
        SteeringError::Conflict {
            ..
        } => StatusCode::CONFLICT,
        SteeringError::Unauthorized {
            ..
        } => StatusCode::FORBIDDEN,
        SteeringError::Ambiguous {
            ..
        }
        | SteeringError::Store {
            ..
        } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Assigns a request id and records a request audit event.
async fn track_request(
    State(state): State<Arc<ApiState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = request_id_from(&state, request.headers());
    request.extensions_mut().insert(RequestId(request_id.clone()));
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    state.audit.record(&AuditEvent::Request(RequestAuditEvent::new(
        Some(request_id),
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis(),
    )));
    response
}

/// Accepts a well-formed caller request id or generates one.
fn request_id_from(state: &ApiState, headers: &HeaderMap) -> String {
    let supplied = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| {
            !value.is_empty()
                && value.len() <= MAX_REQUEST_ID_LENGTH
                && value.chars().all(|ch| ch.is_ascii_graphic())
        });
    supplied.map_or_else(
        || format!("req-{}", state.next_request_id.fetch_add(1, Ordering::Relaxed)),
        str::to_string,
    )
}

// ============================================================================
// SECTION: Caller
// ============================================================================

/// Authenticated caller of one request.
struct Caller {
    /// Transport facts used for auditing.
    inbound: InboundRequest,
    /// Authentication outcome.
    auth: AuthContext,
    /// Context passed into the service.
    ctx: RequestContext,
}

impl Caller {
    /// Authenticates the request and records the decision.
    fn authenticate(
        state: &ApiState,
        peer: SocketAddr,
        headers: &HeaderMap,
        request_id: &RequestId,
    ) -> Result<Self, ApiError> {
        let auth_header =
            headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
        let inbound =
            InboundRequest::new(Some(peer.ip()), auth_header).with_request_id(request_id.0.clone());
        match state.authenticator.authenticate(&inbound) {
            Ok(auth) => {
                state.audit.record(&AuditEvent::Auth(AuthAuditEvent::allowed(&inbound, &auth)));
                let ctx = RequestContext::new(auth.principal.clone())
                    .with_request_id(request_id.0.clone());
                Ok(Self {
                    inbound,
                    auth,
                    ctx,
                })
            }
            Err(err) => {
                state.audit.record(&AuditEvent::Auth(AuthAuditEvent::denied(&inbound, &err)));
                Err(ApiError::new(StatusCode::UNAUTHORIZED, err.to_string()))
            }
        }
    }

    /// Converts a service failure, auditing authorization denials and the
    /// backend detail of store failures.
    fn fail(&self, state: &ApiState, err: SteeringError) -> ApiError {
        match &err {
            SteeringError::Unauthorized {
                reason, ..
            } => {
                state.audit.record(&AuditEvent::Auth(AuthAuditEvent::forbidden(
                    &self.inbound,
                    &self.auth,
                    reason.clone(),
                )));
            }
            SteeringError::Store {
                operation,
                message,
            } => {
                state.audit.record(&AuditEvent::Error(ErrorAuditEvent::new(
                    self.inbound.request_id.clone(),
                    self.auth.principal.subject.clone(),
                    operation.label(),
                    message.clone(),
                )));
            }
            _ => {}
        }
        ApiError::from(err)
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /api/ping`.
async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ping": "pong" }))
}

/// Fallback for unknown routes.
async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not found")
}

/// `GET /api/steering/{ds_id}/targets`.
async fn list_targets(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(ds_raw): Path<String>,
) -> Response {
    respond(run_blocking(|| {
        let caller = Caller::authenticate(&state, peer, &headers, &request_id)?;
        let ds_id = parse_id("deliveryServiceId", &ds_raw)?;
        let views = state.service.list(&caller.ctx, ds_id).map_err(|err| caller.fail(&state, err))?;
        let alerts = inconsistency_alerts(&views);
        let mut envelope = Envelope::response(views);
        envelope.alerts = alerts;
        Ok(Json(envelope).into_response())
    }))
}

/// `GET /api/steering/{ds_id}/targets/{target_id}`.
async fn get_target(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path((ds_raw, target_raw)): Path<(String, String)>,
) -> Response {
    respond(run_blocking(|| {
        let caller = Caller::authenticate(&state, peer, &headers, &request_id)?;
        let ds_id = parse_id("deliveryServiceId", &ds_raw)?;
        let target_id = parse_id("targetId", &target_raw)?;
        let view = state
            .service
            .get(&caller.ctx, ds_id, target_id)
            .map_err(|err| caller.fail(&state, err))?;
        let views = vec![view];
        let alerts = inconsistency_alerts(&views);
        let mut envelope = Envelope::response(views);
        envelope.alerts = alerts;
        Ok(Json(envelope).into_response())
    }))
}

/// `POST /api/steering/{ds_id}/targets`.
async fn create_target(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(ds_raw): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(run_blocking(|| {
        let caller = Caller::authenticate(&state, peer, &headers, &request_id)?;
        let ds_id = parse_id("deliveryServiceId", &ds_raw)?;
        let body: CreateTargetBody = read_json(body)?;
        let request = CreateSteeringTarget {
            type_name: body.type_name,
            delivery_service: body.delivery_service,
            target: body.target,
            value: body.value,
        };
        let view = state
            .service
            .create_under(&caller.ctx, ds_id, request)
            .map_err(|err| caller.fail(&state, err))?;
        let mut alerts = inconsistency_alerts(std::slice::from_ref(&view));
        alerts.insert(0, Alert::success(CREATED_TEXT));
        let mut envelope = Envelope::response(view);
        envelope.alerts = alerts;
        Ok(Json(envelope).into_response())
    }))
}

/// `PUT /api/steering/{ds_id}/targets/{target_id}`.
async fn update_target(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path((ds_raw, target_raw)): Path<(String, String)>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    respond(run_blocking(|| {
        let caller = Caller::authenticate(&state, peer, &headers, &request_id)?;
        let ds_id = parse_id("deliveryServiceId", &ds_raw)?;
        let target_id = parse_id("targetId", &target_raw)?;
        let body: UpdateTargetBody = read_json(body)?;
        let request = UpdateSteeringTarget {
            delivery_service_id: ds_id,
            target_id,
            type_name: body.type_name,
            value: body.value,
        };
        let view =
            state.service.update(&caller.ctx, request).map_err(|err| caller.fail(&state, err))?;
        let mut alerts = inconsistency_alerts(std::slice::from_ref(&view));
        alerts.insert(0, Alert::success(UPDATED_TEXT));
        let mut envelope = Envelope::response(view);
        envelope.alerts = alerts;
        Ok(Json(envelope).into_response())
    }))
}

/// `DELETE /api/steering/{ds_id}/targets/{target_id}`.
async fn delete_target(
    State(state): State<Arc<ApiState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path((ds_raw, target_raw)): Path<(String, String)>,
) -> Response {
    respond(run_blocking(|| {
        let caller = Caller::authenticate(&state, peer, &headers, &request_id)?;
        let ds_id = parse_id("deliveryServiceId", &ds_raw)?;
        let target_id = parse_id("targetId", &target_raw)?;
        state
            .service
            .delete(&caller.ctx, ds_id, target_id)
            .map_err(|err| caller.fail(&state, err))?;
        Ok(Json(Envelope::alert(Alert::success(DELETED_TEXT))).into_response())
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Collapses a handler outcome into a response.
fn respond(result: Result<Response, ApiError>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}

/// Runs a synchronous service call, shifting to a blocking context when the
/// runtime allows it.
fn run_blocking<T>(call: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(call)
        }
        _ => call(),
    }
}

/// Parses a numeric path id.
fn parse_id(field: &str, raw: &str) -> Result<DeliveryServiceId, ApiError> {
    raw.trim()
        .parse::<u64>()
        .map(DeliveryServiceId::new)
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid {field}: '{raw}'")))
}

/// Decodes a JSON request body.
fn read_json<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, ApiError> {
    let bytes = body.map_err(|rejection| {
        let status = rejection.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(status, "request body too large")
        } else {
            ApiError::new(status, rejection.body_text())
        }
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| {
            ApiError::new(StatusCode::BAD_REQUEST, format!("malformed JSON body: {err}"))
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use steering_core::Operation;
    use steering_core::ReferenceField;

    use super::*;

    #[test]
    fn status_mapping_follows_error_kind() {
        let cases = [
            (
                SteeringError::validation(Operation::Create, "type", "required"),
                StatusCode::BAD_REQUEST,
            ),
            (
                SteeringError::InvalidReference {
                    operation: Operation::Create,
                    field: ReferenceField::Type,
                    id: 50,
                    reason: "not a steering type".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                SteeringError::NotFound {
                    operation: Operation::Get,
                    subject: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                SteeringError::Conflict {
                    operation: Operation::Create,
                    delivery_service_id: DeliveryServiceId::new(1),
                    target_id: DeliveryServiceId::new(2),
                },
                StatusCode::CONFLICT,
            ),
            (
                SteeringError::Ambiguous {
                    operation: Operation::Create,
                    subject: "x".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SteeringError::Unauthorized {
                    operation: Operation::Delete,
                    reason: "read only".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ApiError::from(SteeringError::Store {
            operation: Operation::List,
            message: "disk I/O error at /var/lib/steering".to_string(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "getting steering targets: internal server error");
    }

    #[test]
    fn path_ids_must_be_unsigned_integers() {
        assert_eq!(parse_id("targetId", " 12 ").unwrap(), DeliveryServiceId::new(12));
        assert_eq!(parse_id("targetId", "-1").unwrap_err().status, StatusCode::BAD_REQUEST);
        assert_eq!(parse_id("targetId", "abc").unwrap_err().status, StatusCode::BAD_REQUEST);
    }
}
