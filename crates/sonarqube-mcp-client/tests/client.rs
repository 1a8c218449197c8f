// crates/sonarqube-mcp-client/tests/client.rs
// ============================================================================
// Module: SonarQube Client Tests
// Description: HTTP-level tests for the SonarQube client.
// Purpose: Validate credentials, query shapes, and failure mapping.
// Dependencies: sonarqube-mcp-client, tiny_http, base64
// ============================================================================

//! ## Overview
//! Drives [`SonarQubeClient`] against a scripted local stub and checks:
//! - Exactly one credential kind per request
//! - Query parameters for each upstream endpoint
//! - 404 mapping to "absent" and non-404 failures propagating
//! - The health probe degrading instead of failing

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

use std::net::TcpListener;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use sonarqube_mcp_client::ApiError;
use sonarqube_mcp_client::Credentials;
use sonarqube_mcp_client::IssueFilters;
use sonarqube_mcp_client::SonarQubeApi;

use crate::common::StubServer;
use crate::common::basic_client;
use crate::common::client_for;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encodes an expected basic-auth header value.
fn basic_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// Wraps a JSON body as a 200 response.
fn ok(body: &serde_json::Value) -> (u16, String) {
    (200, body.to_string())
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Tests that basic credentials are sent on every request.
#[tokio::test]
async fn basic_credentials_are_sent_on_every_request() {
    let stub = StubServer::spawn(vec![ok(&json!({"status": "UP", "version": "10.4", "id": "x"}))]);
    let client = basic_client(&stub.base_url);

    let status = client.system_status().await.unwrap();
    assert_eq!(status.status, "UP");

    let request = stub.next_request();
    assert_eq!(request.url, "/api/system/status");
    assert_eq!(request.authorization, Some(basic_header("admin", "secret")));
}

/// Tests that token is sent as username with empty password.
#[tokio::test]
async fn token_is_sent_as_username_with_empty_password() {
    let stub = StubServer::spawn(vec![ok(&json!({"components": []}))]);
    let client = client_for(
        &stub.base_url,
        Credentials::select("admin", "secret", Some("squ_token")),
    );

    client.list_projects().await.unwrap();

    let request = stub.next_request();
    assert_eq!(request.authorization, Some(basic_header("squ_token", "")));
}

// ============================================================================
// SECTION: Projects
// ============================================================================

/// Tests that list projects returns empty for empty server.
#[tokio::test]
async fn list_projects_returns_empty_for_empty_server() {
    let stub = StubServer::spawn(vec![ok(&json!({"paging": {"total": 0}, "components": []}))]);
    let projects = basic_client(&stub.base_url).list_projects().await.unwrap();
    assert!(projects.is_empty());
}

/// Tests that get project selects single key.
#[tokio::test]
async fn get_project_selects_single_key() {
    let stub = StubServer::spawn(vec![ok(&json!({
        "components": [{"key": "demo", "name": "Demo", "qualifier": "TRK", "lastAnalysisDate": "2026-01-01T00:00:00+0000"}]
    }))]);
    let project = basic_client(&stub.base_url).get_project("demo").await.unwrap().unwrap();
    assert_eq!(project.name, "Demo");
    assert_eq!(project.last_analysis_date.as_deref(), Some("2026-01-01T00:00:00+0000"));
    assert_eq!(stub.next_request().url, "/api/projects/search?projects=demo");
}

/// Tests that get project maps empty result and 404 to none.
#[tokio::test]
async fn get_project_maps_empty_result_and_404_to_none() {
    let stub = StubServer::spawn(vec![
        ok(&json!({"components": []})),
        (404, json!({"errors": [{"msg": "missing"}]}).to_string()),
    ]);
    let client = basic_client(&stub.base_url);
    assert!(client.get_project("ghost").await.unwrap().is_none());
    assert!(client.get_project("ghost").await.unwrap().is_none());
}

/// Tests that server errors propagate with upstream message.
#[tokio::test]
async fn server_errors_propagate_with_upstream_message() {
    let stub = StubServer::spawn(vec![(
        500,
        json!({"errors": [{"msg": "database is gone"}]}).to_string(),
    )]);
    let err = basic_client(&stub.base_url).get_project("demo").await.unwrap_err();
    match err {
        ApiError::Status {
            status,
            message,
            ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database is gone");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Tests that malformed body is a decode error.
#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let stub = StubServer::spawn(vec![(200, "not json".to_string())]);
    let err = basic_client(&stub.base_url).list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Tests that issue search sends filters and default page size.
#[tokio::test]
async fn issue_search_sends_filters_and_default_page_size() {
    let stub = StubServer::spawn(vec![
        ok(&json!({"issues": []})),
        ok(&json!({"issues": [{
            "key": "AX1",
            "rule": "rust:S100",
            "severity": "MAJOR",
            "component": "demo:src/lib.rs",
            "project": "demo",
            "line": 12,
            "message": "Rename this",
            "status": "OPEN",
            "type": "CODE_SMELL"
        }]})),
    ]);
    let client = basic_client(&stub.base_url);

    client.get_issues("demo", &IssueFilters::default()).await.unwrap();
    assert_eq!(stub.next_request().url, "/api/issues/search?componentKeys=demo&ps=100");

    let filters = IssueFilters {
        severities: vec!["MAJOR".to_string(), "BLOCKER".to_string()],
        resolved: Some(false),
        page_size: Some(50),
        ..IssueFilters::default()
    };
    let issues = client.get_issues("demo", &filters).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue_type, "CODE_SMELL");
    assert_eq!(issues[0].line, Some(12));
    assert_eq!(
        stub.next_request().url,
        "/api/issues/search?componentKeys=demo&ps=50&severities=MAJOR%2CBLOCKER&resolved=false"
    );
}

// ============================================================================
// SECTION: Measures
// ============================================================================

/// Tests that coverage reshapes measures and leaves missing fields unset.
#[tokio::test]
async fn coverage_reshapes_measures_and_leaves_missing_fields_unset() {
    let stub = StubServer::spawn(vec![ok(&json!({
        "component": {
            "key": "demo",
            "measures": [
                {"metric": "line_coverage", "value": "81.2"},
                {"metric": "uncovered_lines", "value": "40"}
            ]
        }
    }))]);
    let coverage = basic_client(&stub.base_url).get_code_coverage("demo").await.unwrap();
    assert_eq!(coverage.line_coverage.as_deref(), Some("81.2"));
    assert_eq!(coverage.uncovered_lines.as_deref(), Some("40"));
    assert!(coverage.branch_coverage.is_none());
    assert_eq!(
        stub.next_request().url,
        "/api/measures/component?component=demo&metricKeys=line_coverage%2Cbranch_coverage%2Cuncovered_lines%2Cuncovered_conditions"
    );
}

/// Tests that raw metrics carry the component key.
#[tokio::test]
async fn raw_metrics_carry_the_component_key() {
    let stub = StubServer::spawn(vec![ok(&json!({
        "component": {"key": "demo", "measures": [{"metric": "bugs", "value": "2"}]}
    }))]);
    let metrics = basic_client(&stub.base_url).get_project_metrics("demo", &["bugs"]).await.unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].component, "demo");
}

// ============================================================================
// SECTION: Quality Gates and History
// ============================================================================

/// Tests that quality gate status reads project status block.
#[tokio::test]
async fn quality_gate_status_reads_project_status_block() {
    let stub = StubServer::spawn(vec![
        ok(&json!({"projectStatus": {
            "status": "ERROR",
            "conditions": [{"status": "ERROR", "metricKey": "coverage", "comparator": "LT", "errorThreshold": "80", "actualValue": "61.0"}]
        }})),
        (404, String::new()),
    ]);
    let client = basic_client(&stub.base_url);
    let status = client.get_quality_gate_status("demo").await.unwrap().unwrap();
    assert_eq!(status.status, "ERROR");
    assert_eq!(status.conditions[0].metric_key, "coverage");
    assert_eq!(
        stub.next_request().url,
        "/api/qualitygates/project_status?projectKey=demo"
    );
    assert!(client.get_quality_gate_status("ghost").await.unwrap().is_none());
}

/// Tests that quality gates and history use their envelopes.
#[tokio::test]
async fn quality_gates_and_history_use_their_envelopes() {
    let stub = StubServer::spawn(vec![
        ok(&json!({"qualitygates": [{"id": 1, "name": "Sonar way", "isDefault": true, "isBuiltIn": true}]})),
        ok(&json!({"analyses": [{"key": "A1", "date": "2026-02-01T10:00:00+0000", "events": []}]})),
    ]);
    let client = basic_client(&stub.base_url);

    let gates = client.get_quality_gates().await.unwrap();
    assert_eq!(gates[0].name, "Sonar way");
    assert!(gates[0].is_default);
    assert_eq!(stub.next_request().url, "/api/qualitygates/list");

    let history = client.get_analysis_history("demo", 5).await.unwrap();
    assert_eq!(history[0].key, "A1");
    assert_eq!(history[0].details.get("events"), Some(&json!([])));
    assert_eq!(stub.next_request().url, "/api/project_analyses/search?project=demo&ps=5");
}

// ============================================================================
// SECTION: Health
// ============================================================================

/// Tests that health check reports reachable status.
#[tokio::test]
async fn health_check_reports_reachable_status() {
    let stub = StubServer::spawn(vec![ok(&json!({"status": "STARTING"}))]);
    let report = basic_client(&stub.base_url).health_check().await;
    assert!(report.accessible);
    assert_eq!(report.status, "STARTING");
    assert!(!report.is_healthy());
}

/// Tests that health check degrades when unreachable.
#[tokio::test]
async fn health_check_degrades_when_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let report = basic_client(&format!("http://{addr}")).health_check().await;
    assert!(!report.accessible);
    assert_eq!(report.status, "DOWN");
    assert!(report.error.is_some());
}
