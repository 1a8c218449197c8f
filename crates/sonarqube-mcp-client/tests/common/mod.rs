// crates/sonarqube-mcp-client/tests/common/mod.rs
// ============================================================================
// Module: Client Test Fixtures
// Description: Scripted SonarQube stub server for client tests.
// Purpose: Record outbound requests and replay canned responses.
// Dependencies: tiny_http
// ============================================================================

//! ## Overview
//! [`StubServer`] answers a fixed script of responses in order, one per
//! request, and records the URL and `Authorization` header of each request.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use sonarqube_mcp_client::ClientConfig;
use sonarqube_mcp_client::Credentials;
use sonarqube_mcp_client::SonarQubeClient;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Stub Server
// ============================================================================

/// Request observed by the stub server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Path and query string.
    pub url: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
}

/// Scripted upstream stand-in bound to an ephemeral local port.
pub struct StubServer {
    /// Base URL of the stub.
    pub base_url: String,
    /// Recorded requests in arrival order.
    requests: mpsc::Receiver<RecordedRequest>,
}

impl StubServer {
    /// Starts a stub that answers `script` in order and then stops.
    pub fn spawn(script: Vec<(u16, String)>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let (sender, requests) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in script {
                let Ok(request) = server.recv() else {
                    return;
                };
                let authorization = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Authorization"))
                    .map(|header| header.value.as_str().to_string());
                let _ = sender.send(RecordedRequest {
                    url: request.url().to_string(),
                    authorization,
                });
                let response = Response::from_string(body).with_status_code(status);
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Returns the next recorded request.
    pub fn next_request(&self) -> RecordedRequest {
        self.requests.recv_timeout(Duration::from_secs(5)).unwrap()
    }
}

// ============================================================================
// SECTION: Client Builders
// ============================================================================

/// Builds a client against `base_url` using the given credential.
pub fn client_for(base_url: &str, credentials: Credentials) -> SonarQubeClient {
    SonarQubeClient::new(ClientConfig {
        base_url: base_url.to_string(),
        credentials,
        timeout_ms: 5_000,
    })
    .unwrap()
}

/// Builds a basic-auth client against `base_url`.
pub fn basic_client(base_url: &str) -> SonarQubeClient {
    client_for(base_url, Credentials::select("admin", "secret", None))
}
