//! HTTP tests for the simulation service.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; no socket
//! is opened. Catalog lookups read the demo projects under `demos/projects`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use espsim_runner::server::{build_router, AppState};
use espsim_runner::{DirectoryCatalog, DEFAULT_MAX_TICKS};
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// Helper Functions
// ============================================================================

fn router() -> Router {
    let catalog = Arc::new(DirectoryCatalog::new("../../demos/projects"));
    build_router(AppState::new(catalog, DEFAULT_MAX_TICKS))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_simulate(body: Value) -> (StatusCode, Value) {
    send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/simulate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

// ============================================================================
// Read-only Routes
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "espsim"}));
}

#[tokio::test]
async fn test_capabilities_listing() {
    let (status, body) = get("/api/capabilities").await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    let names: Vec<_> = entries.iter().map(|e| e["capability"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["wifi_ap", "wifi_sta", "tcp_server", "http_server", "mqtt_client", "ble_peripheral"]
    );

    let tcp = &entries[2]["parameters"][0];
    assert_eq!(tcp["key"], "port");
    assert_eq!(tcp["type"], "integer");
    assert_eq!(tcp["default"], "8080");
}

// ============================================================================
// Simulate
// ============================================================================

#[tokio::test]
async fn test_simulate_inline_features() {
    let (status, body) = post_simulate(json!({
        "project_name": "Inline",
        "features": [
            {"name": "wifi_ap", "params": {"ssid": "Test", "channel": 1}},
            {"name": "tcp_server", "params": {"port": 8080}}
        ]
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["board_type"], "ESP32");
    assert_eq!(body["ip_address"], "192.168.4.1");
    assert_eq!(body["ap_ssid"], "Test");
    assert!(body.get("web_server").is_none());
    assert!(body["logs"]
        .as_array()
        .unwrap()
        .contains(&json!("[2] tcp_server: listening on port 8080")));
}

#[tokio::test]
async fn test_simulate_from_catalog() {
    let (status, body) = post_simulate(json!({"project_name": "espcomms"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["ap_ssid"], "ESP32_Comms_Hub");
    assert_eq!(body["server_banner"], "TCP server on port 8080");
}

#[tokio::test]
async fn test_request_board_overrides_manifest() {
    let (status, body) = post_simulate(json!({
        "project_name": "Cat Detection Camera",
        "board_type": "esp32-c6"
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board_type"], "ESP32-C6");
    assert_eq!(body["web_server"], true);
}

#[tokio::test]
async fn test_manifest_board_used_when_request_has_none() {
    let (status, body) = post_simulate(json!({"project_name": "Cat Detection Camera"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board_type"], "ESP32-S3");
    assert_eq!(body["server_banner"], "HTTP server on port 80");
}

#[tokio::test]
async fn test_misspelled_request_key_is_400() {
    for request in [
        json!({"project_name": "Typo", "board": "esp32-s2", "features": ["ble_peripheral"]}),
        json!({"project_name": "espcomms", "feature": ["wifi_ap"]}),
        json!({
            "project_name": "Typo",
            "features": [{"name": "wifi_sta", "parmas": {"ssid": "HomeNet"}}]
        }),
    ] {
        let (status, body) = post_simulate(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidRequest");
    }
}

#[tokio::test]
async fn test_unknown_project_is_404() {
    let (status, body) = post_simulate(json!({"project_name": "Never Generated"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ProjectNotFound");
}

#[tokio::test]
async fn test_conflict_is_422() {
    let (status, body) = post_simulate(json!({
        "project_name": "Both",
        "features": ["wifi_ap", "wifi_sta"]
    }))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ConflictingCapabilities");
    assert_eq!(body["capability"], "wifi_ap");
    assert_eq!(body["field"], "features");
}

#[tokio::test]
async fn test_invalid_parameter_names_field() {
    let (status, body) = post_simulate(json!({
        "project_name": "Ports",
        "features": [{"name": "tcp_server", "params": {"port": 70000}}]
    }))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InvalidParameter");
    assert_eq!(body["capability"], "tcp_server");
    assert_eq!(body["field"], "port");
}

#[tokio::test]
async fn test_bad_project_name_is_422_not_404() {
    let (status, body) = post_simulate(json!({"project_name": "../../etc"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "project_name");
    assert!(body.get("capability").is_none());
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (status, body) = send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/simulate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"features\": []}"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
}
