// crates/sonarqube-mcp/src/audit.rs
// ============================================================================
// Module: MCP Audit Logging
// Description: Structured audit and lifecycle events.
// Purpose: Emit JSON-line logs without touching stdout.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Stdout carries the stdio protocol, so every log line goes through an
//! [`McpAuditSink`]: stderr by default, an append-only file when configured.
//! Events never include request arguments or credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::telemetry::McpMethod;
use crate::telemetry::McpOutcome;
use crate::telemetry::McpTransport;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Per-request audit event.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// JSON-RPC id when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: McpTransport,
    /// Method classification.
    pub method: McpMethod,
    /// Operation name or resource URI when present.
    pub operation: Option<String>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct an audit event.
pub struct McpAuditEventParams {
    /// JSON-RPC id when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: McpTransport,
    /// Method classification.
    pub method: McpMethod,
    /// Operation name or resource URI when present.
    pub operation: Option<String>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl McpAuditEvent {
    /// Creates an audit event stamped with the current time.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        Self {
            event: "mcp_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            transport: params.transport,
            method: params.method,
            operation: params.operation,
            outcome: params.outcome,
            error_code: params.error_code,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
        }
    }
}

/// Severity of a lifecycle notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleLevel {
    /// Informational notice.
    Info,
    /// Operator warning.
    Warning,
    /// Failure notice.
    Error,
}

/// Server lifecycle notice (startup, shutdown, warnings).
#[derive(Debug, Clone, Serialize)]
pub struct McpLifecycleEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity.
    pub level: LifecycleLevel,
    /// Notice text.
    pub message: String,
}

impl McpLifecycleEvent {
    /// Creates a lifecycle notice stamped with the current time.
    #[must_use]
    pub fn new(level: LifecycleLevel, message: impl Into<String>) -> Self {
        Self {
            event: "mcp_lifecycle",
            timestamp_ms: now_ms(),
            level,
            message: message.into(),
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for MCP events.
pub trait McpAuditSink: Send + Sync {
    /// Records a request event.
    fn record(&self, event: &McpAuditEvent);

    /// Records a lifecycle notice.
    fn record_lifecycle(&self, _event: &McpLifecycleEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct McpStderrAuditSink;

impl McpStderrAuditSink {
    /// Writes one serialized event line.
    fn emit<T: Serialize>(event: &T) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

impl McpAuditSink for McpStderrAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        Self::emit(event);
    }

    fn record_lifecycle(&self, event: &McpLifecycleEvent) {
        Self::emit(event);
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct McpFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl McpFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event line.
    fn emit<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl McpAuditSink for McpFileAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        self.emit(event);
    }

    fn record_lifecycle(&self, event: &McpLifecycleEvent) {
        self.emit(event);
    }
}

/// No-op audit sink.
pub struct McpNoopAuditSink;

impl McpAuditSink for McpNoopAuditSink {
    fn record(&self, _event: &McpAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
