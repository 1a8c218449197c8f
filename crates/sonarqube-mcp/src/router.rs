// crates/sonarqube-mcp/src/router.rs
// ============================================================================
// Module: Tool Router
// Description: Dispatch bridge between transports and the catalog.
// Purpose: Resolve, validate, invoke, and normalize every request.
// Dependencies: jsonschema, serde, serde_json, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! [`ToolRouter`] is the single place where raw handler failures are caught.
//! Each request moves from resolving to completed: lookup by exact name or
//! URI, contract validation for operations, then handler invocation with the
//! shared upstream client. Transports only translate wire formats to and from
//! this pipeline.
//!
//! ## Invariants
//! - Unknown names and URIs yield [`DispatchError::NotFound`] and invoke nothing.
//! - Contract violations yield [`DispatchError::InvalidInput`] before the
//!   handler runs.
//! - Every handler failure becomes [`DispatchError::HandlerFailure`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::catalog::OperationDescriptor;
use crate::catalog::ResourceDescriptor;
use crate::catalog::SharedApi;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Operation summary returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Operation name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema input contract.
    pub input_schema: Value,
}

/// Resource summary returned by `resources/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    /// Resource URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Media type.
    pub mime_type: String,
}

impl From<&OperationDescriptor> for ToolDefinition {
    fn from(op: &OperationDescriptor) -> Self {
        Self {
            name: op.name.clone(),
            description: op.description.clone(),
            input_schema: op.input_schema.clone(),
        }
    }
}

impl From<&ResourceDescriptor> for ResourceDefinition {
    fn from(resource: &ResourceDescriptor) -> Self {
        Self {
            uri: resource.uri.clone(),
            name: resource.name.clone(),
            description: resource.description.clone(),
            mime_type: resource.mime_type.clone(),
        }
    }
}

/// Result envelope for `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallResult {
    /// Ordered output content.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Returns the concatenated text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|item| match item {
                ToolContent::Text {
                    text,
                } => text.as_str(),
            })
            .collect()
    }
}

/// Tool output payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Plain text output.
    Text {
        /// Text payload.
        text: String,
    },
}

/// Result envelope for `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReadResult {
    /// Resource contents; always exactly one entry.
    pub contents: Vec<ResourceContents>,
}

/// Content of a read resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// Resource URI.
    pub uri: String,
    /// Media type.
    pub mime_type: String,
    /// Text content.
    pub text: String,
}

// ============================================================================
// SECTION: Tool Router
// ============================================================================

/// Dispatch bridge shared by every transport.
#[derive(Clone)]
pub struct ToolRouter {
    /// Immutable catalog.
    catalog: Arc<Catalog>,
    /// Shared upstream client.
    api: SharedApi,
}

impl ToolRouter {
    /// Creates a router over a catalog and upstream client.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, api: SharedApi) -> Self {
        Self {
            catalog,
            api,
        }
    }

    /// Returns the shared upstream client.
    #[must_use]
    pub fn api(&self) -> &SharedApi {
        &self.api
    }

    /// Lists operations in catalog order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.catalog.operations().map(ToolDefinition::from).collect()
    }

    /// Lists resources in catalog order.
    #[must_use]
    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        self.catalog.resources().iter().map(ResourceDefinition::from).collect()
    }

    /// Resolves, validates, and invokes an operation.
    ///
    /// A null `arguments` value is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for unknown names, contract violations, and
    /// handler failures.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallResult, DispatchError> {
        let (descriptor, validator) =
            self.catalog.operation(name).ok_or_else(|| DispatchError::NotFound {
                target: Target::Operation,
                id: name.to_string(),
            })?;
        let input = if arguments.is_null() { Value::Object(Map::new()) } else { arguments };
        let violations: Vec<String> =
            validator.iter_errors(&input).map(|error| error.to_string()).collect();
        if !violations.is_empty() {
            return Err(DispatchError::InvalidInput(format!(
                "invalid arguments for {name}: {}",
                violations.join("; ")
            )));
        }
        let handler = Arc::clone(&descriptor.handler);
        let text = handler(input, Arc::clone(&self.api)).await.map_err(|err| {
            DispatchError::HandlerFailure {
                target: Target::Operation,
                message: err.to_string(),
            }
        })?;
        Ok(ToolCallResult {
            content: vec![ToolContent::Text {
                text,
            }],
        })
    }

    /// Resolves and reads a resource.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for unknown URIs and handler failures.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceReadResult, DispatchError> {
        let resource = self.catalog.resource(uri).ok_or_else(|| DispatchError::NotFound {
            target: Target::Resource,
            id: uri.to_string(),
        })?;
        let handler = Arc::clone(&resource.handler);
        let text = handler(Arc::clone(&self.api)).await.map_err(|err| {
            DispatchError::HandlerFailure {
                target: Target::Resource,
                message: err.to_string(),
            }
        })?;
        Ok(ResourceReadResult {
            contents: vec![ResourceContents {
                uri: resource.uri.clone(),
                mime_type: resource.mime_type.clone(),
                text,
            }],
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Kind of catalog entry a request addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Named operation (`tools/call`).
    Operation,
    /// Resource URI (`resources/read`).
    Resource,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operation => f.write_str("Tool"),
            Self::Resource => f.write_str("Resource"),
        }
    }
}

/// Normalized dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No catalog entry matches the requested identifier.
    #[error("{target} {id} not found")]
    NotFound {
        /// Addressed entry kind.
        target: Target,
        /// Requested name or URI.
        id: String,
    },
    /// Input failed the operation contract.
    #[error("{0}")]
    InvalidInput(String),
    /// Handler raised a failure.
    #[error("{} failed: {message}", failure_label(*target))]
    HandlerFailure {
        /// Addressed entry kind.
        target: Target,
        /// Original failure message.
        message: String,
    },
}

impl DispatchError {
    /// Returns the JSON-RPC error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::NotFound {
                target: Target::Operation,
                ..
            } => -32601,
            Self::NotFound {
                target: Target::Resource,
                ..
            } => -32600,
            Self::InvalidInput(_) => -32602,
            Self::HandlerFailure {
                ..
            } => -32603,
        }
    }

    /// Returns a stable label for audit and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound {
                ..
            } => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::HandlerFailure {
                ..
            } => "handler_failure",
        }
    }
}

/// Message prefix for handler failures.
const fn failure_label(target: Target) -> &'static str {
    match target {
        Target::Operation => "Tool execution",
        Target::Resource => "Resource read",
    }
}
