// crates/sonarqube-mcp/src/lib.rs
// ============================================================================
// Module: SonarQube MCP
// Description: MCP server exposing SonarQube operations and resources.
// Purpose: Provide the catalog, dispatch bridge, and transports.
// Dependencies: sonarqube-mcp-client, sonarqube-mcp-config, axum, jsonschema, tokio
// ============================================================================

//! ## Overview
//! SonarQube MCP publishes a fixed catalog of named operations and readable
//! resources. Requests from stdio or HTTP pass through one
//! [`ToolRouter`], which validates input against each operation's contract
//! and normalizes failures into [`DispatchError`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod catalog;
mod http;
pub mod report;
pub mod resources;
pub mod router;
pub mod server;
pub mod telemetry;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::LifecycleLevel;
pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpFileAuditSink;
pub use audit::McpLifecycleEvent;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use catalog::Catalog;
pub use catalog::CatalogError;
pub use catalog::HandlerError;
pub use catalog::OperationDescriptor;
pub use catalog::ResourceDescriptor;
pub use catalog::SharedApi;
pub use report::IssuesSummary;
pub use report::ProjectReport;
pub use router::DispatchError;
pub use router::ResourceContents;
pub use router::ResourceDefinition;
pub use router::ResourceReadResult;
pub use router::Target;
pub use router::ToolCallResult;
pub use router::ToolContent;
pub use router::ToolDefinition;
pub use router::ToolRouter;
pub use server::McpServer;
pub use server::McpServerError;
pub use telemetry::MCP_LATENCY_BUCKETS_MS;
pub use telemetry::McpMethod;
pub use telemetry::McpMetricEvent;
pub use telemetry::McpMetrics;
pub use telemetry::McpOutcome;
pub use telemetry::McpTransport;
pub use telemetry::NoopMetrics;
