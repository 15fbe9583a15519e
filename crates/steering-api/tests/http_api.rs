// crates/steering-api/tests/http_api.rs
// ============================================================================
// Module: HTTP API Tests
// Description: End-to-end steering target lifecycle over the HTTP router.
// Purpose: Validate routes, envelopes, status mapping, and body limits.
// Dependencies: steering-api, axum, tower, http-body-util
// ============================================================================

//! ## Overview
//! Drives the router in-process with `tower::ServiceExt::oneshot` from a
//! mocked loopback peer in local-only mode.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use axum::Router;
use axum::http::StatusCode;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

use crate::common::TestResponse;
use crate::common::app_with;
use crate::common::config;
use crate::common::local_app;
use crate::common::loopback;
use crate::common::send;
use crate::common::send_raw;

const TARGETS: &str = "/api/steering/1/targets";

fn create_body(type_name: &str, target: &str, value: i64) -> Value {
    json!({ "type": type_name, "target": target, "value": value })
}

async fn post_target(app: &Router, type_name: &str, target: &str, value: i64) -> TestResponse {
    send(app, "POST", TARGETS, None, Some(create_body(type_name, target, value))).await
}

#[tokio::test]
async fn ping_answers_pong() {
    let (app, _) = local_app();
    let response = send(&app, "GET", "/api/ping", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "ping": "pong" }));
}

#[tokio::test]
async fn create_then_list_round_trips() {
    let (app, _) = local_app();
    let created = post_target(&app, "STEERING_ORDER", "ds-target-a", 7).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["alerts"][0]["level"], "success");
    assert_eq!(
        created.body["response"],
        json!({
            "deliveryServiceId": 1,
            "deliveryService": "steering-ds1",
            "targetId": 10,
            "target": "ds-target-a",
            "typeId": 40,
            "type": "STEERING_ORDER",
            "value": 7
        })
    );

    let listed = send(&app, "GET", TARGETS, None, None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["response"], json!([created.body["response"].clone()]));
    assert!(listed.body.get("alerts").is_none());
}

#[tokio::test]
async fn list_orders_by_value_then_target() {
    let (app, _) = local_app();
    for (target, value) in [("ds-target-b", 5), ("steering-ds2", -1), ("ds-target-a", 5)] {
        let response = post_target(&app, "STEERING_WEIGHT", target, value).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    }
    let listed = send(&app, "GET", TARGETS, None, None).await;
    let targets: Vec<u64> = listed.body["response"]
        .as_array()
        .unwrap()
        .iter()
        .map(|view| view["targetId"].as_u64().unwrap())
        .collect();
    assert_eq!(targets, vec![2, 10, 11]);
}

#[tokio::test]
async fn create_accepts_string_values_and_matching_delivery_service() {
    let (app, _) = local_app();
    let body = json!({
        "type": "STEERING_ORDER",
        "target": "ds-target-a",
        "value": "-12345",
        "deliveryService": "steering-ds1"
    });
    let response = send(&app, "POST", TARGETS, None, Some(body)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["response"]["value"], -12_345);
}

#[tokio::test]
async fn create_rejects_mismatched_delivery_service() {
    let (app, _) = local_app();
    let body = json!({
        "type": "STEERING_ORDER",
        "target": "ds-target-a",
        "value": 1,
        "deliveryService": "steering-ds2"
    });
    let response = send(&app, "POST", TARGETS, None, Some(body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["alerts"][0]["level"], "error");
    assert!(response.body.get("response").is_none());
}

#[tokio::test]
async fn create_error_statuses() {
    let (app, _) = local_app();
    let first = post_target(&app, "STEERING_ORDER", "ds-target-a", 1).await;
    assert_eq!(first.status, StatusCode::OK);

    let duplicate = post_target(&app, "STEERING_WEIGHT", "ds-target-a", 2).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let missing_body = json!({ "target": "ds-target-b", "value": 1 });
    let missing_type = send(&app, "POST", TARGETS, None, Some(missing_body)).await;
    assert_eq!(missing_type.status, StatusCode::BAD_REQUEST);

    let unknown_target = post_target(&app, "STEERING_ORDER", "nope", 1).await;
    assert_eq!(unknown_target.status, StatusCode::NOT_FOUND);
    assert_eq!(
        unknown_target.body["alerts"][0]["text"],
        "creating steering target: getting target ds 'nope': not found"
    );

    let wrong_type = post_target(&app, "HTTP", "ds-target-b", 1).await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);

    let not_steering = send(
        &app,
        "POST",
        "/api/steering/10/targets",
        None,
        Some(create_body("STEERING_ORDER", "ds-target-b", 1)),
    )
    .await;
    assert_eq!(not_steering.status, StatusCode::BAD_REQUEST);

    let listed = send(&app, "GET", TARGETS, None, None).await;
    assert_eq!(listed.body["response"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_single_target() {
    let (app, _) = local_app();
    post_target(&app, "STEERING_ORDER", "ds-target-b", 3).await;
    let found = send(&app, "GET", "/api/steering/1/targets/11", None, None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["response"].as_array().unwrap().len(), 1);
    assert_eq!(found.body["response"][0]["target"], "ds-target-b");

    let missing = send(&app, "GET", "/api/steering/1/targets/10", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_value_scenario() {
    let (app, audit) = local_app();
    post_target(&app, "STEERING_ORDER", "ds-target-a", -12_345).await;
    let listed = send(&app, "GET", TARGETS, None, None).await;
    let first = listed.body["response"][0].clone();
    let new_value = if first["value"] == -12_345 { -12_344 } else { -12_345 };

    let updated = send(
        &app,
        "PUT",
        "/api/steering/1/targets/10",
        None,
        Some(json!({ "type": first["type"].clone(), "value": new_value })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["alerts"][0]["level"], "success");

    let reread = send(&app, "GET", TARGETS, None, None).await;
    let view = &reread.body["response"][0];
    assert_eq!(view["value"], new_value);
    for field in ["deliveryServiceId", "deliveryService", "targetId", "target", "typeId", "type"] {
        assert_eq!(view[field], first[field], "{field} changed");
    }
    let changes = audit.of_kind("steering_target_change");
    let actions: Vec<&str> =
        changes.iter().map(|event| event["action"].as_str().unwrap()).collect();
    assert_eq!(actions, vec!["created", "updated"]);
    assert_eq!(changes[1]["subject"], "loopback");
}

#[tokio::test]
async fn update_requires_existing_pair_and_fields() {
    let (app, _) = local_app();
    let missing = send(
        &app,
        "PUT",
        "/api/steering/1/targets/10",
        None,
        Some(json!({ "type": "STEERING_ORDER", "value": 1 })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    post_target(&app, "STEERING_ORDER", "ds-target-a", 1).await;
    let no_value = send(
        &app,
        "PUT",
        "/api/steering/1/targets/10",
        None,
        Some(json!({ "type": "STEERING_ORDER" })),
    )
    .await;
    assert_eq!(no_value.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_all_targets_scenario() {
    let (app, _) = local_app();
    for (ds, target) in [(1, "ds-target-a"), (1, "ds-target-b"), (2, "ds-target-a")] {
        let uri = format!("/api/steering/{ds}/targets");
        let response =
            send(&app, "POST", &uri, None, Some(create_body("STEERING_WEIGHT", target, 1))).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    for ds in [1, 2] {
        let uri = format!("/api/steering/{ds}/targets");
        let listed = send(&app, "GET", &uri, None, None).await;
        for view in listed.body["response"].as_array().unwrap() {
            let delete_uri = format!("{uri}/{}", view["targetId"]);
            let deleted = send(&app, "DELETE", &delete_uri, None, None).await;
            assert_eq!(deleted.status, StatusCode::OK);
            assert!(deleted.body.get("response").is_none());
            assert_eq!(deleted.body["alerts"][0]["level"], "success");
        }
        let after = send(&app, "GET", &uri, None, None).await;
        assert_eq!(after.body["response"], json!([]));
    }
    let again = send(&app, "DELETE", "/api/steering/1/targets/10", None, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let (app, _) = local_app();
    let bad_path = send(&app, "GET", "/api/steering/abc/targets", None, None).await;
    assert_eq!(bad_path.status, StatusCode::BAD_REQUEST);
    let negative = send(&app, "DELETE", "/api/steering/1/targets/-1", None, None).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let bad_json = send_raw(&app, "POST", TARGETS, None, Some(b"{\"type\":".to_vec())).await;
    assert_eq!(bad_json.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_json.body["alerts"][0]["level"], "error");

    let bad_value = send(
        &app,
        "POST",
        TARGETS,
        None,
        Some(json!({ "type": "STEERING_ORDER", "target": "ds-target-a", "value": "ten" })),
    )
    .await;
    assert_eq!(bad_value.status, StatusCode::BAD_REQUEST);

    let unknown = send(&app, "GET", "/api/nope", None, None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversize_body_is_rejected() {
    let (app, _) = app_with(config("[server]\nmax_body_bytes = 64\n"), loopback());
    let padding = "x".repeat(128);
    let body =
        json!({ "type": "STEERING_ORDER", "target": "ds-target-a", "value": 1, "pad": padding });
    let response = send(&app, "POST", TARGETS, None, Some(body)).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["alerts"][0]["text"], "request body too large");
}

#[tokio::test]
async fn request_ids_are_echoed_or_generated() {
    let (app, audit) = local_app();
    let response = send(&app, "GET", "/api/ping", None, None).await;
    let generated = response.request_id.unwrap();
    assert!(generated.starts_with("req-"));
    let requests = audit.of_kind("request");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["request_id"], generated.as_str());
    assert_eq!(requests[0]["path"], "/api/ping");
    assert_eq!(requests[0]["status"], 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sqlite_store_survives_server_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("steering.sqlite");
    let store_toml = format!("[store]\ntype = \"sqlite\"\npath = {:?}\n", path.to_string_lossy());
    {
        let (app, _) = app_with(config(&store_toml), loopback());
        let response = post_target(&app, "STEERING_ORDER", "ds-target-a", 4).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    let (app, _) = app_with(config(&store_toml), loopback());
    let listed = send(&app, "GET", TARGETS, None, None).await;
    assert_eq!(listed.body["response"][0]["value"], 4);
    assert_eq!(listed.body["response"][0]["target"], "ds-target-a");
}

#[tokio::test(flavor = "multi_thread")]
async fn store_failures_hide_detail_but_audit_it() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("steering.sqlite");
    let store_toml = format!("[store]\ntype = \"sqlite\"\npath = {:?}\n", path.to_string_lossy());
    let (app, audit) = app_with(config(&store_toml), loopback());
    let created = post_target(&app, "STEERING_ORDER", "ds-target-a", 4).await;
    assert_eq!(created.status, StatusCode::OK);

    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE steering_targets SET type = -3", params![]).unwrap();
    drop(connection);

    let listed = send(&app, "GET", TARGETS, None, None).await;
    assert_eq!(listed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        listed.body["alerts"][0]["text"],
        "getting steering targets: internal server error"
    );
    assert!(!listed.body.to_string().contains("negative"));

    let errors = audit.of_kind("error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["operation"], "getting steering targets");
    assert_eq!(errors[0]["subject"], "loopback");
    assert_eq!(errors[0]["request_id"], Value::from(listed.request_id.unwrap()));
    assert!(errors[0]["message"].as_str().unwrap().contains("negative type id -3"));
}
