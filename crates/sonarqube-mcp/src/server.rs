// crates/sonarqube-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server over stdio and HTTP transports.
// Purpose: Expose the SonarQube catalog via JSON-RPC 2.0.
// Dependencies: axum, tokio, serde_json, sonarqube-mcp-client, sonarqube-mcp-config
// ============================================================================

//! ## Overview
//! The MCP server speaks JSON-RPC 2.0 over stdio, HTTP, or both at once. Every
//! message from either transport goes through one shared message handler,
//! which parses the envelope, dispatches through [`ToolRouter`], and emits one
//! audit event and one metric observation. Transports only move bytes.
//!
//! Stdio accepts newline-delimited JSON and `Content-Length` framed messages
//! and answers each request in the framing it arrived with. Requests run as
//! independent tasks; a single writer task serializes the output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use sonarqube_mcp_client::SonarQubeClient;
use sonarqube_mcp_config::AuditConfig;
use sonarqube_mcp_config::ServerMode;
use sonarqube_mcp_config::SonarQubeMcpConfig;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::audit::LifecycleLevel;
use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::McpFileAuditSink;
use crate::audit::McpLifecycleEvent;
use crate::audit::McpNoopAuditSink;
use crate::audit::McpStderrAuditSink;
use crate::catalog::Catalog;
use crate::catalog::SharedApi;
use crate::http;
use crate::router::DispatchError;
use crate::router::ResourceDefinition;
use crate::router::ToolDefinition;
use crate::router::ToolRouter;
use crate::telemetry::McpMethod;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMetrics;
use crate::telemetry::McpOutcome;
use crate::telemetry::McpTransport;
use crate::telemetry::NoopMetrics;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Server name announced by `initialize`.
pub const SERVER_NAME: &str = "sonarqube-mcp-server";
/// Server version announced by `initialize`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Cap on a single stdio header line.
const MAX_HEADER_LINE_BYTES: usize = 8 * 1024;
/// Outbound frames buffered ahead of the stdio writer.
const STDIO_WRITE_QUEUE: usize = 64;
/// Response used when a response envelope cannot be serialized.
const SERIALIZATION_FALLBACK: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"serialization failed"}}"#;

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: SonarQubeMcpConfig,
    /// Shared request-handling state.
    state: Arc<ServerState>,
}

impl McpServer {
    /// Builds a server from configuration with a live upstream client.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration is invalid or
    /// initialization fails.
    pub fn from_config(config: SonarQubeMcpConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let client = SonarQubeClient::new(config.client_config())
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        Self::new(config, Arc::new(client))
    }

    /// Builds a server around an existing upstream implementation.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration is invalid or the audit
    /// sink cannot be opened.
    pub fn new(config: SonarQubeMcpConfig, api: SharedApi) -> Result<Self, McpServerError> {
        let audit = build_audit_sink(&config.server.audit)?;
        Self::with_sinks(config, api, audit, Arc::new(NoopMetrics))
    }

    /// Builds a server with explicit audit and metrics sinks.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration or the catalog is invalid.
    pub fn with_sinks(
        config: SonarQubeMcpConfig,
        api: SharedApi,
        audit: Arc<dyn McpAuditSink>,
        metrics: Arc<dyn McpMetrics>,
    ) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let catalog = Catalog::sonarqube().map_err(|err| McpServerError::Init(err.to_string()))?;
        let router = ToolRouter::new(Arc::new(catalog), api);
        let state = Arc::new(ServerState {
            router,
            max_body_bytes: config.server.max_body_bytes,
            audit,
            metrics,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the dispatch bridge.
    #[must_use]
    pub fn router(&self) -> &ToolRouter {
        &self.state.router
    }

    /// Builds the HTTP application without binding a socket.
    #[must_use]
    pub fn http_app(&self) -> axum::Router {
        http::app(Arc::clone(&self.state), self.config.summary())
    }

    /// Handles one raw JSON-RPC message and returns the serialized response,
    /// or `None` for notifications.
    pub async fn handle_message(&self, transport: McpTransport, bytes: &[u8]) -> Option<Vec<u8>> {
        self.state.handle_message(transport, bytes).await.1
    }

    /// Serves requests using the configured transports.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when a transport fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let audit = Arc::clone(&self.state.audit);
        if self.config.uses_cleartext_credentials() {
            audit.record_lifecycle(&McpLifecycleEvent::new(
                LifecycleLevel::Warning,
                format!(
                    "credentials are sent to {} over cleartext http; prefer https",
                    self.config.sonarqube.url
                ),
            ));
        }
        let mode = self.config.server.mode;
        audit.record_lifecycle(&McpLifecycleEvent::new(
            LifecycleLevel::Info,
            format!("sonarqube mcp server starting (mode {})", mode.as_str()),
        ));
        let result = match mode {
            ServerMode::Stdio => serve_stdio(Arc::clone(&self.state)).await,
            ServerMode::Http => serve_http(&self).await,
            ServerMode::Both => {
                tokio::try_join!(serve_stdio(Arc::clone(&self.state)), serve_http(&self))
                    .map(|_| ())
            }
        };
        if let Err(err) = &result {
            audit.record_lifecycle(&McpLifecycleEvent::new(LifecycleLevel::Error, err.to_string()));
        }
        result
    }
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn McpAuditSink>, McpServerError> {
    if !config.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = McpFileAuditSink::new(Path::new(path))
                .map_err(|err| McpServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(McpStderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Message framing observed on stdio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    /// One JSON document per line.
    Newline,
    /// `Content-Length` header block followed by the body.
    ContentLength,
}

/// One message read from stdio.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inbound {
    /// Message body within the size limit.
    Message {
        /// Framing the message arrived with.
        framing: Framing,
        /// Raw body.
        payload: Vec<u8>,
    },
    /// Message body over the size limit; already drained from the stream.
    Oversized {
        /// Framing the message arrived with.
        framing: Framing,
    },
}

/// Serves JSON-RPC requests over stdin/stdout until stdin closes.
async fn serve_stdio(state: Arc<ServerState>) -> Result<(), McpServerError> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(STDIO_WRITE_QUEUE);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(frame) = rx.recv().await {
            if stdout.write_all(&frame).await.is_err() || stdout.flush().await.is_err() {
                return Err(McpServerError::Transport("stdio write failed".to_string()));
            }
        }
        Ok(())
    });
    state.audit.record_lifecycle(&McpLifecycleEvent::new(
        LifecycleLevel::Info,
        "SonarQube MCP Server running on stdio",
    ));
    while let Some(inbound) = read_message(&mut reader, state.max_body_bytes).await? {
        let state = Arc::clone(&state);
        let tx = tx.clone();
        tokio::spawn(async move {
            let (framing, reply) = match inbound {
                Inbound::Message {
                    framing,
                    payload,
                } => (framing, state.handle_message(McpTransport::Stdio, &payload).await.1),
                Inbound::Oversized {
                    framing,
                } => (framing, Some(state.reject_oversized(McpTransport::Stdio))),
            };
            if let Some(reply) = reply {
                let _ = tx.send(encode_frame(framing, &reply)).await;
            }
        });
    }
    drop(tx);
    writer.await.map_err(|_| McpServerError::Transport("stdio writer failed".to_string()))?
}

/// Reads the next stdio message; `None` at end of stream.
///
/// Lines are read with a byte cap so an unterminated line cannot grow without
/// bound; bytes are passed through undecoded, so non-UTF-8 input becomes a
/// JSON-RPC parse failure instead of a transport failure.
pub(crate) async fn read_message<R>(
    reader: &mut R,
    max_body_bytes: usize,
) -> Result<Option<Inbound>, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let line = match read_capped_line(reader, max_body_bytes).await? {
            Line::Eof => return Ok(None),
            Line::Overlong => {
                return Ok(Some(Inbound::Oversized {
                    framing: Framing::Newline,
                }));
            }
            Line::Complete(line) => line,
        };
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(length) = content_length(trimmed)? {
            return read_framed_body(reader, length, max_body_bytes).await.map(Some);
        }
        if trimmed.len() > max_body_bytes {
            return Ok(Some(Inbound::Oversized {
                framing: Framing::Newline,
            }));
        }
        return Ok(Some(Inbound::Message {
            framing: Framing::Newline,
            payload: trimmed.to_vec(),
        }));
    }
}

/// One line read under a byte cap.
enum Line {
    /// End of stream before any byte.
    Eof,
    /// Line within the cap, terminator included when present.
    Complete(Vec<u8>),
    /// Line over the cap; consumed through its terminator.
    Overlong,
}

/// Reads one line holding at most `cap` content bytes plus a line terminator.
async fn read_capped_line<R>(reader: &mut R, cap: usize) -> Result<Line, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    let limit = u64::try_from(cap.saturating_add(2)).unwrap_or(u64::MAX);
    let mut line = Vec::new();
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut line).await.map_err(read_error)?;
    if read == 0 {
        return Ok(Line::Eof);
    }
    if line.last() != Some(&b'\n') && u64::try_from(read).unwrap_or(u64::MAX) >= limit {
        discard_line(reader).await?;
        return Ok(Line::Overlong);
    }
    Ok(Line::Complete(line))
}

/// Skips input through the next newline or end of stream.
async fn discard_line<R>(reader: &mut R) -> Result<(), McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buffer = reader.fill_buf().await.map_err(read_error)?;
        if buffer.is_empty() {
            return Ok(());
        }
        let (consumed, done) = match buffer.iter().position(|byte| *byte == b'\n') {
            Some(index) => (index + 1, true),
            None => (buffer.len(), false),
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}

/// Parses a `Content-Length` header line, ignoring header-name case.
fn content_length(line: &[u8]) -> Result<Option<usize>, McpServerError> {
    let Ok(line) = std::str::from_utf8(line) else {
        return Ok(None);
    };
    let Some((name, value)) = line.split_once(':') else {
        return Ok(None);
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| McpServerError::Transport("invalid content length".to_string()))
}

/// Reads the rest of a header block and its body.
async fn read_framed_body<R>(
    reader: &mut R,
    length: usize,
    max_body_bytes: usize,
) -> Result<Inbound, McpServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_capped_line(reader, MAX_HEADER_LINE_BYTES).await? {
            Line::Eof => {
                return Err(McpServerError::Transport("stdio closed mid-frame".to_string()));
            }
            Line::Complete(header) if header.trim_ascii().is_empty() => break,
            Line::Complete(_) | Line::Overlong => {}
        }
    }
    if length > max_body_bytes {
        let expected = u64::try_from(length).unwrap_or(u64::MAX);
        let skipped = tokio::io::copy(&mut (&mut *reader).take(expected), &mut tokio::io::sink())
            .await
            .map_err(read_error)?;
        if skipped < expected {
            return Err(McpServerError::Transport("stdio closed mid-frame".to_string()));
        }
        return Ok(Inbound::Oversized {
            framing: Framing::ContentLength,
        });
    }
    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await.map_err(read_error)?;
    Ok(Inbound::Message {
        framing: Framing::ContentLength,
        payload,
    })
}

/// Maps a stdin read failure.
fn read_error(_: std::io::Error) -> McpServerError {
    McpServerError::Transport("stdio read failed".to_string())
}

/// Frames an outbound payload the way its request was framed.
pub(crate) fn encode_frame(framing: Framing, payload: &[u8]) -> Vec<u8> {
    match framing {
        Framing::Newline => {
            let mut frame = Vec::with_capacity(payload.len() + 1);
            frame.extend_from_slice(payload);
            frame.push(b'\n');
            frame
        }
        Framing::ContentLength => {
            let mut frame = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
            frame.extend_from_slice(payload);
            frame
        }
    }
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Serves the HTTP surface until the listener fails.
async fn serve_http(server: &McpServer) -> Result<(), McpServerError> {
    let addr = server
        .config
        .server
        .http_addr()
        .map_err(|err| McpServerError::Config(err.to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| McpServerError::Transport(format!("http bind {addr} failed: {err}")))?;
    server.state.audit.record_lifecycle(&McpLifecycleEvent::new(
        LifecycleLevel::Info,
        format!("SonarQube MCP HTTP server listening on http://{addr}"),
    ));
    axum::serve(listener, server.http_app())
        .await
        .map_err(|_| McpServerError::Transport("http server failed".to_string()))
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Shared state behind every transport.
pub(crate) struct ServerState {
    /// Dispatch bridge.
    pub(crate) router: ToolRouter,
    /// Maximum accepted message size.
    pub(crate) max_body_bytes: usize,
    /// Audit sink.
    audit: Arc<dyn McpAuditSink>,
    /// Metrics sink.
    metrics: Arc<dyn McpMetrics>,
}

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Parameters for `tools/call`.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Operation name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Parameters for `resources/read`.
#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    /// Resource URI.
    uri: String,
}

/// Payload for `tools/list`.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Operation definitions.
    tools: Vec<ToolDefinition>,
}

/// Payload for `resources/list`.
#[derive(Debug, Serialize)]
struct ResourceListResult {
    /// Resource definitions.
    resources: Vec<ResourceDefinition>,
}

/// A handled message plus the labels needed for audit and metrics.
struct Exchange {
    /// HTTP status for the HTTP transport.
    status: StatusCode,
    /// JSON-RPC id rendered as text.
    request_id: Option<String>,
    /// Method classification.
    method: McpMethod,
    /// Operation name or resource URI.
    operation: Option<String>,
    /// Error kind label on failure.
    error_kind: Option<&'static str>,
    /// Response envelope; `None` for notifications.
    response: Option<JsonRpcResponse>,
}

impl Exchange {
    /// Builds an exchange that answers without a request id.
    fn rejected(status: StatusCode, code: i64, message: &str, kind: &'static str) -> Self {
        Self {
            status,
            request_id: None,
            method: McpMethod::Invalid,
            operation: None,
            error_kind: Some(kind),
            response: Some(error_response(Value::Null, code, message.to_string())),
        }
    }
}

impl ServerState {
    /// Handles one raw message end to end.
    ///
    /// Returns the HTTP status and the serialized response, which is `None`
    /// for notifications.
    pub(crate) async fn handle_message(
        &self,
        transport: McpTransport,
        bytes: &[u8],
    ) -> (StatusCode, Option<Vec<u8>>) {
        let started = Instant::now();
        let exchange = if bytes.len() > self.max_body_bytes {
            oversized_exchange()
        } else {
            self.exchange(bytes).await
        };
        let payload = exchange.response.as_ref().map(|response| {
            serde_json::to_vec(response).unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_vec())
        });
        let response_bytes = payload.as_ref().map_or(0, Vec::len);
        self.observe(transport, &exchange, bytes.len(), response_bytes, started);
        (exchange.status, payload)
    }

    /// Answers a message that was dropped for exceeding the size limit.
    pub(crate) fn reject_oversized(&self, transport: McpTransport) -> Vec<u8> {
        let started = Instant::now();
        let exchange = oversized_exchange();
        let payload = exchange
            .response
            .as_ref()
            .and_then(|response| serde_json::to_vec(response).ok())
            .unwrap_or_else(|| SERIALIZATION_FALLBACK.to_vec());
        self.observe(transport, &exchange, self.max_body_bytes, payload.len(), started);
        payload
    }

    /// Parses and dispatches one message.
    async fn exchange(&self, bytes: &[u8]) -> Exchange {
        let Ok(request) = serde_json::from_slice::<JsonRpcRequest>(bytes) else {
            return Exchange::rejected(
                StatusCode::BAD_REQUEST,
                -32600,
                "invalid json-rpc request",
                "invalid_request",
            );
        };
        let Some(id) = request.id else {
            return Exchange {
                status: StatusCode::ACCEPTED,
                request_id: None,
                method: McpMethod::Notification,
                operation: Some(request.method),
                error_kind: None,
                response: None,
            };
        };
        let request_id = Some(render_id(&id));
        let method = McpMethod::from_name(&request.method);
        if request.jsonrpc != "2.0" {
            return Exchange {
                status: StatusCode::BAD_REQUEST,
                request_id,
                method,
                operation: None,
                error_kind: Some("invalid_request"),
                response: Some(error_response(id, -32600, "invalid json-rpc version".to_string())),
            };
        }
        let params = request.params.unwrap_or(Value::Null);
        let (operation, outcome) = match method {
            McpMethod::Initialize => (None, Ok(initialize_result())),
            McpMethod::Ping => (None, Ok(json!({}))),
            McpMethod::ToolsList => (
                None,
                to_result(&ToolListResult {
                    tools: self.router.list_tools(),
                }),
            ),
            McpMethod::ResourcesList => (
                None,
                to_result(&ResourceListResult {
                    resources: self.router.list_resources(),
                }),
            ),
            McpMethod::ToolsCall => match serde_json::from_value::<ToolCallParams>(params) {
                Ok(call) => {
                    let result = self.router.call_tool(&call.name, call.arguments).await;
                    (Some(call.name), result.map_err(RpcFailure::from).and_then(|r| to_result(&r)))
                }
                Err(_) => (None, Err(RpcFailure::invalid_params("invalid tool params"))),
            },
            McpMethod::ResourcesRead => match serde_json::from_value::<ResourceReadParams>(params) {
                Ok(read) => {
                    let result = self.router.read_resource(&read.uri).await;
                    (Some(read.uri), result.map_err(RpcFailure::from).and_then(|r| to_result(&r)))
                }
                Err(_) => (None, Err(RpcFailure::invalid_params("invalid resource params"))),
            },
            McpMethod::Notification | McpMethod::Invalid | McpMethod::Other => (
                None,
                Err(RpcFailure {
                    status: StatusCode::BAD_REQUEST,
                    code: -32601,
                    message: format!("method not found: {}", request.method),
                    kind: "method_not_found",
                }),
            ),
        };
        match outcome {
            Ok(result) => Exchange {
                status: StatusCode::OK,
                request_id,
                method,
                operation,
                error_kind: None,
                response: Some(JsonRpcResponse {
                    jsonrpc: "2.0",
                    id,
                    result: Some(result),
                    error: None,
                }),
            },
            Err(failure) => Exchange {
                status: failure.status,
                request_id,
                method,
                operation,
                error_kind: Some(failure.kind),
                response: Some(error_response(id, failure.code, failure.message)),
            },
        }
    }

    /// Emits the audit event and metric observations for an exchange.
    fn observe(
        &self,
        transport: McpTransport,
        exchange: &Exchange,
        request_bytes: usize,
        response_bytes: usize,
        started: Instant,
    ) {
        let error_code =
            exchange.response.as_ref().and_then(|r| r.error.as_ref()).map(|error| error.code);
        let outcome = if error_code.is_some() { McpOutcome::Error } else { McpOutcome::Ok };
        let event = McpMetricEvent {
            transport,
            method: exchange.method,
            operation: exchange.operation.clone(),
            outcome,
            error_code,
            error_kind: exchange.error_kind,
            request_bytes,
            response_bytes,
        };
        self.metrics.record_request(event.clone());
        self.metrics.record_latency(event, started.elapsed());
        self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
            request_id: exchange.request_id.clone(),
            transport,
            method: exchange.method,
            operation: exchange.operation.clone(),
            outcome,
            error_code,
            error_kind: exchange.error_kind,
            request_bytes,
            response_bytes,
        }));
    }
}

/// Method-level failure before it becomes a JSON-RPC error.
struct RpcFailure {
    /// HTTP status for the HTTP transport.
    status: StatusCode,
    /// JSON-RPC error code.
    code: i64,
    /// Error message.
    message: String,
    /// Error kind label.
    kind: &'static str,
}

impl RpcFailure {
    /// Builds an invalid-params failure.
    fn invalid_params(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: -32602,
            message: message.to_string(),
            kind: "invalid_params",
        }
    }
}

impl From<DispatchError> for RpcFailure {
    fn from(err: DispatchError) -> Self {
        let status = match err {
            DispatchError::HandlerFailure {
                ..
            } => StatusCode::OK,
            DispatchError::NotFound {
                ..
            }
            | DispatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            code: err.code(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Serializes a result payload.
fn to_result<T: Serialize>(value: &T) -> Result<Value, RpcFailure> {
    serde_json::to_value(value).map_err(|_| RpcFailure {
        status: StatusCode::OK,
        code: -32603,
        message: "serialization failed".to_string(),
        kind: "serialization",
    })
}

/// Returns the `initialize` result.
fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {"tools": {}, "resources": {}},
        "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
    })
}

/// Builds the exchange for a message over the size limit.
fn oversized_exchange() -> Exchange {
    Exchange::rejected(
        StatusCode::PAYLOAD_TOO_LARGE,
        -32600,
        "request body too large",
        "payload_too_large",
    )
}

/// Builds a JSON-RPC error envelope.
fn error_response(id: Value, code: i64, message: String) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message,
        }),
    }
}

/// Renders a JSON-RPC id for audit records.
fn render_id(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
