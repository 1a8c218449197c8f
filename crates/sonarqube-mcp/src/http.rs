// crates/sonarqube-mcp/src/http.rs
// ============================================================================
// Module: HTTP Surface
// Description: Debug routes and JSON-RPC over HTTP.
// Purpose: Let operators probe the server and drive it without stdio.
// Dependencies: axum, serde_json, sonarqube-mcp-config
// ============================================================================

//! ## Overview
//! Read-only debug routes (`/`, `/health`, `/tools`, `/resources`,
//! `/projects`) plus `POST /rpc`, which feeds the same message handler as the
//! stdio transport. Every response carries permissive CORS headers and
//! `OPTIONS` preflights are answered directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use sonarqube_mcp_config::ConfigSummary;

use crate::server::SERVER_NAME;
use crate::server::SERVER_VERSION;
use crate::server::ServerState;
use crate::telemetry::McpTransport;

// ============================================================================
// SECTION: State
// ============================================================================

/// State shared by HTTP handlers.
#[derive(Clone)]
struct HttpState {
    /// Message handler shared with stdio.
    rpc: Arc<ServerState>,
    /// Secret-free configuration view.
    summary: Arc<ConfigSummary>,
}

/// Builds the HTTP application.
pub(crate) fn app(shared: Arc<ServerState>, summary: ConfigSummary) -> Router {
    let state = HttpState {
        rpc: shared,
        summary: Arc::new(summary),
    };
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/tools", get(tools))
        .route("/resources", get(resources))
        .route("/projects", get(projects))
        .route("/rpc", post(rpc))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Server identity and endpoint index.
async fn index() -> Json<Value> {
    Json(json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "description": "MCP server exposing SonarQube code quality data",
        "endpoints": {
            "/health": "Server and SonarQube health",
            "/tools": "Available MCP tools",
            "/resources": "Available MCP resources",
            "/projects": "SonarQube projects",
            "/rpc": "JSON-RPC 2.0 endpoint (POST)",
        },
    }))
}

/// Health of this process and of the upstream.
async fn health(State(state): State<HttpState>) -> Json<Value> {
    let sonarqube = state.rpc.router.api().health_check().await;
    let status = if sonarqube.is_healthy() { "healthy" } else { "degraded" };
    Json(json!({
        "status": status,
        "mcp_server": "running",
        "sonarqube": sonarqube,
        "config": {
            "url": state.summary.url,
            "authMethod": state.summary.auth_method,
            "mode": state.summary.mode.as_str(),
            "port": state.summary.http_port,
        },
    }))
}

/// Operation summaries.
async fn tools(State(state): State<HttpState>) -> Json<Value> {
    let tools: Vec<Value> = state
        .rpc
        .router
        .list_tools()
        .into_iter()
        .map(|tool| json!({"name": tool.name, "description": tool.description}))
        .collect();
    Json(json!({"total": tools.len(), "tools": tools}))
}

/// Resource summaries.
async fn resources(State(state): State<HttpState>) -> Json<Value> {
    let resources = state.rpc.router.list_resources();
    Json(json!({"total": resources.len(), "resources": resources}))
}

/// Upstream project list.
async fn projects(State(state): State<HttpState>) -> Response {
    match state.rpc.router.api().list_projects().await {
        Ok(projects) => {
            Json(json!({"total": projects.len(), "projects": projects})).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to fetch projects", "message": err.to_string()})),
        )
            .into_response(),
    }
}

/// JSON-RPC over HTTP.
///
/// The body is read under the configured message limit rather than the
/// extractor default, so every oversized body gets a JSON-RPC error.
async fn rpc(State(state): State<HttpState>, request: Request) -> Response {
    let limit = state.rpc.max_body_bytes.saturating_add(1);
    let (status, payload) = match to_bytes(request.into_body(), limit).await {
        Ok(bytes) => state.rpc.handle_message(McpTransport::Http, &bytes).await,
        Err(_) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Some(state.rpc.reject_oversized(McpTransport::Http)),
        ),
    };
    match payload {
        Some(payload) => {
            (status, [(header::CONTENT_TYPE, "application/json")], payload).into_response()
        }
        None => status.into_response(),
    }
}

/// Unmatched paths.
async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response()
}

// ============================================================================
// SECTION: CORS
// ============================================================================

/// Answers preflights and adds CORS headers to every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        Response::new(Body::empty())
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
