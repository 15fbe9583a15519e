// crates/steering-api/tests/common/mod.rs
// ============================================================================
// Module: API Test Helpers
// Description: Fixture configuration and oneshot request helpers.
// Purpose: Drive the router in-process with a mocked peer address.
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::Router;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Value;
use steering_api::AuditEvent;
use steering_api::AuditSink;
use steering_api::SteeringServer;
use steering_config::SteeringConfig;
use tower::ServiceExt;

/// Catalog shared by every API test.
pub const CATALOG_TOML: &str = r#"
[[catalog.types]]
id = 40
name = "STEERING_ORDER"
use_in_table = "steering_target"

[[catalog.types]]
id = 41
name = "STEERING_WEIGHT"
use_in_table = "steering_target"

[[catalog.types]]
id = 50
name = "HTTP"
use_in_table = "deliveryservice"

[[catalog.delivery_services]]
id = 1
xml_id = "steering-ds1"
kind = "STEERING"

[[catalog.delivery_services]]
id = 2
xml_id = "steering-ds2"
kind = "CLIENT_STEERING"

[[catalog.delivery_services]]
id = 10
xml_id = "ds-target-a"
kind = "HTTP"

[[catalog.delivery_services]]
id = 11
xml_id = "ds-target-b"
kind = "HTTP"
"#;

/// Bearer auth section with one principal per role.
pub const BEARER_AUTH_TOML: &str = r#"
[server.auth]
mode = "bearer_token"

[[server.auth.principals]]
name = "admin"
token = "admin-token"
role = "admin"

[[server.auth.principals]]
name = "reader"
token = "reader-token"
role = "read_only"

[[server.auth.principals]]
name = "tenant"
token = "tenant-token"
role = "steering"
delivery_services = ["steering-ds1"]
"#;

/// Loopback peer address.
pub fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000))
}

/// Non-loopback peer address.
pub fn remote() -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 7], 40_000))
}

/// Audit sink that keeps every event as JSON.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Recorded events.
    pub events: Mutex<Vec<Value>>,
}

impl RecordingAuditSink {
    /// Returns recorded events whose `event` field equals `kind`.
    pub fn of_kind(&self, kind: &str) -> Vec<Value> {
        self.events.lock().unwrap().iter().filter(|event| event["event"] == kind).cloned().collect()
    }

    /// Returns every recorded event serialized as one string.
    pub fn dump(&self) -> String {
        self.events.lock().unwrap().iter().map(Value::to_string).collect::<Vec<_>>().join("\n")
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(serde_json::to_value(event).unwrap());
    }
}

/// Parses `extra` plus the fixture catalog into a config.
pub fn config(extra: &str) -> SteeringConfig {
    SteeringConfig::from_toml_str(&format!("{extra}\n{CATALOG_TOML}")).unwrap()
}

/// Builds a router for `config` with a recording audit sink.
pub fn app_with(config: SteeringConfig, peer: SocketAddr) -> (Router, Arc<RecordingAuditSink>) {
    let audit = Arc::new(RecordingAuditSink::default());
    let server = SteeringServer::with_audit_sink(config, audit.clone()).unwrap();
    (server.router().layer(MockConnectInfo(peer)), audit)
}

/// Builds a local-only router reached from loopback.
pub fn local_app() -> (Router, Arc<RecordingAuditSink>) {
    app_with(config(""), loopback())
}

/// Builds a bearer-auth router reached from loopback.
pub fn bearer_app() -> (Router, Arc<RecordingAuditSink>) {
    app_with(config(BEARER_AUTH_TOML), loopback())
}

/// Response status, headers of interest, and decoded JSON body.
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// `x-request-id` header value.
    pub request_id: Option<String>,
    /// Decoded body, or `Null` when empty or not JSON.
    pub body: Value,
}

/// Sends one request through the router.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    send_raw(app, method, uri, token, body.map(|value| value.to_string().into_bytes())).await
}

/// Sends one request with a raw body through the router.
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Vec<u8>>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(bytes) => builder.header(CONTENT_TYPE, "application/json").body(Body::from(bytes)),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        request_id,
        body,
    }
}
