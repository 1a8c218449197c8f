// crates/sonarqube-mcp/tests/http.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: Debug routes, CORS, and JSON-RPC over HTTP on a real socket.
// Purpose: Verify the HTTP transport shares the dispatch pipeline.
// Dependencies: axum, reqwest, sonarqube-mcp, tokio
// ============================================================================

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
    reason = "Test-only assertions."
)]

mod common;

use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use sonarqube_mcp::McpServer;

use crate::common::StubApi;
use crate::common::server_with;
use crate::common::test_config;

/// Serves the HTTP app on an ephemeral port and returns its base URL.
async fn spawn(api: Arc<StubApi>) -> String {
    spawn_server(server_with(api)).await
}

/// Serves an already built server on an ephemeral port.
async fn spawn_server(server: McpServer) -> String {
    let app = server.http_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Fetches a URL and decodes the JSON body.
async fn get(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

/// Tests the identity and endpoint index.
#[tokio::test]
async fn index_lists_endpoints() {
    let base = spawn(Arc::new(StubApi::new())).await;
    let (status, body) = get(&format!("{base}/")).await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "sonarqube-mcp-server");
    assert!(body["endpoints"]["/rpc"].is_string());
}

/// Tests health with a reachable upstream and a secret-free config echo.
#[tokio::test]
async fn health_reports_upstream_and_config() {
    let base = spawn(Arc::new(StubApi::new())).await;
    let (status, body) = get(&format!("{base}/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["mcp_server"], "running");
    assert_eq!(body["sonarqube"]["status"], "UP");
    assert_eq!(body["sonarqube"]["accessible"], true);
    assert_eq!(body["config"]["authMethod"], "token");
    assert_eq!(body["config"]["port"], 8080);
    assert!(!body.to_string().contains("squ_test_token"));
}

/// Tests health with an unreachable upstream.
#[tokio::test]
async fn health_degrades_when_upstream_fails() {
    let base = spawn(Arc::new(StubApi::new().failing("system_status"))).await;
    let (status, body) = get(&format!("{base}/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["sonarqube"]["status"], "DOWN");
    assert_eq!(body["sonarqube"]["accessible"], false);
}

/// Tests catalog summaries.
#[tokio::test]
async fn catalog_summaries() {
    let base = spawn(Arc::new(StubApi::new())).await;
    let (_, tools) = get(&format!("{base}/tools")).await;
    assert_eq!(tools["total"], 10);
    assert_eq!(tools["tools"][9]["name"], "generate_project_report");
    let (_, resources) = get(&format!("{base}/resources")).await;
    assert_eq!(resources["total"], 5);
    assert_eq!(resources["resources"][0]["uri"], "sonarqube://server/info");
}

/// Tests the projects route on success and on upstream failure.
#[tokio::test]
async fn projects_route_reports_failures_as_500() {
    let base = spawn(Arc::new(StubApi::new())).await;
    let (status, body) = get(&format!("{base}/projects")).await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 2);

    let base = spawn(Arc::new(StubApi::new().failing("list_projects"))).await;
    let (status, body) = get(&format!("{base}/projects")).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to fetch projects");
    assert!(body["message"].as_str().unwrap().contains("list_projects exploded"));
}

/// Tests unmatched paths and CORS preflight handling.
#[tokio::test]
async fn unknown_paths_and_preflight() {
    let base = spawn(Arc::new(StubApi::new())).await;
    let response = reqwest::get(format!("{base}/nowhere")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap().to_str().unwrap(),
        "*"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Not found"}));

    let preflight = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/rpc"))
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status().as_u16(), 200);
    assert!(preflight.headers().get("access-control-allow-methods").is_some());
}

/// Tests JSON-RPC over HTTP through the shared handler.
#[tokio::test]
async fn rpc_endpoint_dispatches_requests() {
    let api = Arc::new(StubApi::new());
    let base = spawn(Arc::clone(&api)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/rpc"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                      "params": {"name": "get_project", "arguments": {"projectKey": "alpha"}}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let project: Value =
        serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(project["key"], "alpha");
    assert_eq!(api.calls("get_project"), 1);

    let invalid = client
        .post(format!("{base}/rpc"))
        .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                      "params": {"name": "get_project_issues",
                                 "arguments": {"projectKey": "alpha", "pageSize": 1000}}}))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32602);
    assert_eq!(api.calls("get_issues"), 0);

    let notification = client
        .post(format!("{base}/rpc"))
        .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .send()
        .await
        .unwrap();
    assert_eq!(notification.status().as_u16(), 202);
}

/// Builds a `tools/list` request padded to roughly `size` bytes.
fn padded_request(size: usize) -> Vec<u8> {
    serde_json::to_vec(&json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list",
                               "params": {"pad": "x".repeat(size)}}))
    .unwrap()
}

/// Tests that `/rpc` honors the configured limit above the extractor default.
#[tokio::test]
async fn rpc_accepts_bodies_up_to_the_configured_limit() {
    let mut config = test_config();
    config.server.max_body_bytes = 4 * 1024 * 1024;
    let base = spawn_server(McpServer::new(config, Arc::new(StubApi::new())).unwrap()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/rpc"))
        .header("content-type", "application/json")
        .body(padded_request(3 * 1024 * 1024))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 10);
}

/// Tests that bodies over the limit get a JSON-RPC error envelope.
#[tokio::test]
async fn rpc_rejects_oversized_bodies_with_json_rpc_error() {
    let mut config = test_config();
    config.server.max_body_bytes = 1024;
    let base = spawn_server(McpServer::new(config, Arc::new(StubApi::new())).unwrap()).await;
    let client = reqwest::Client::new();
    for size in [2 * 1024, 48 * 1024] {
        let response = client
            .post(format!("{base}/rpc"))
            .header("content-type", "application/json")
            .body(padded_request(size))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 413);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["error"]["message"], "request body too large");
    }
}
