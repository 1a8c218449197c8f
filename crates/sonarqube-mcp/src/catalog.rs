// crates/sonarqube-mcp/src/catalog.rs
// ============================================================================
// Module: Operation Catalog
// Description: Immutable registry of operations and resources.
// Purpose: Declare the invocable surface once and index it for lookup.
// Dependencies: jsonschema, serde_json, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! The catalog is data, not a conditional chain: an ordered list of
//! [`OperationDescriptor`] and [`ResourceDescriptor`] records plus keyed
//! indexes built once at construction. Input contracts are compiled to
//! validators up front so a malformed contract fails startup rather than the
//! first request.
//!
//! ## Invariants
//! - Operation names and resource URIs are unique.
//! - Listing order equals declaration order for the process lifetime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use sonarqube_mcp_client::ApiError;
use sonarqube_mcp_client::SonarQubeApi;
use thiserror::Error;

use crate::resources;
use crate::tools;

// ============================================================================
// SECTION: Handler Types
// ============================================================================

/// Boxed, sendable future returned by handlers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Upstream client shared by every handler invocation.
pub type SharedApi = Arc<dyn SonarQubeApi>;

/// Operation handler: validated input plus client to text output.
pub type OperationHandler =
    Arc<dyn Fn(Value, SharedApi) -> BoxFuture<Result<String, HandlerError>> + Send + Sync>;

/// Resource handler: client to text content.
pub type ResourceHandler =
    Arc<dyn Fn(SharedApi) -> BoxFuture<Result<String, HandlerError>> + Send + Sync>;

/// Failures raised by operation and resource handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Upstream call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Validated input could not be decoded into the request type.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Output serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Named, invocable operation.
#[derive(Clone)]
pub struct OperationDescriptor {
    /// Unique operation name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema input contract.
    pub input_schema: Value,
    /// Handler invoked after validation.
    pub handler: OperationHandler,
}

impl OperationDescriptor {
    /// Builds a descriptor from an async handler function.
    #[must_use]
    pub fn new<F, Fut>(name: &str, description: &str, input_schema: Value, handler: F) -> Self
    where
        F: Fn(Value, SharedApi) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            handler: Arc::new(move |input, api| Box::pin(handler(input, api))),
        }
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Named, argument-less readable document.
#[derive(Clone)]
pub struct ResourceDescriptor {
    /// Unique resource URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Media type of the content.
    pub mime_type: String,
    /// Content producer.
    pub handler: ResourceHandler,
}

impl ResourceDescriptor {
    /// Builds a descriptor from an async content function.
    #[must_use]
    pub fn new<F, Fut>(uri: &str, name: &str, description: &str, mime_type: &str, handler: F) -> Self
    where
        F: Fn(SharedApi) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
    {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: mime_type.to_string(),
            handler: Arc::new(move |api| Box::pin(handler(api))),
        }
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("uri", &self.uri)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Operation paired with its compiled input validator.
struct CatalogOperation {
    /// Declared operation.
    descriptor: OperationDescriptor,
    /// Compiled input contract.
    validator: Validator,
}

/// Immutable operation and resource catalog.
pub struct Catalog {
    /// Operations in declaration order.
    operations: Vec<CatalogOperation>,
    /// Operation name to position.
    operation_index: BTreeMap<String, usize>,
    /// Resources in declaration order.
    resources: Vec<ResourceDescriptor>,
    /// Resource URI to position.
    resource_index: BTreeMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, compiling every input contract.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on duplicate keys or an invalid contract.
    pub fn new(
        operations: Vec<OperationDescriptor>,
        resources: Vec<ResourceDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut operation_index = BTreeMap::new();
        let mut compiled = Vec::with_capacity(operations.len());
        for descriptor in operations {
            if operation_index.insert(descriptor.name.clone(), compiled.len()).is_some() {
                return Err(CatalogError::DuplicateOperation(descriptor.name));
            }
            let validator = compile_contract(&descriptor.name, &descriptor.input_schema)?;
            compiled.push(CatalogOperation {
                descriptor,
                validator,
            });
        }
        let mut resource_index = BTreeMap::new();
        for (position, resource) in resources.iter().enumerate() {
            if resource_index.insert(resource.uri.clone(), position).is_some() {
                return Err(CatalogError::DuplicateResource(resource.uri.clone()));
            }
        }
        Ok(Self {
            operations: compiled,
            operation_index,
            resources,
            resource_index,
        })
    }

    /// Builds the SonarQube operation and resource catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when a built-in contract is invalid.
    pub fn sonarqube() -> Result<Self, CatalogError> {
        Self::new(tools::operations(), resources::resources())
    }

    /// Iterates operations in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter().map(|entry| &entry.descriptor)
    }

    /// Returns resources in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    /// Looks up an operation and its validator by exact name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<(&OperationDescriptor, &Validator)> {
        let entry = self.operations.get(*self.operation_index.get(name)?)?;
        Some((&entry.descriptor, &entry.validator))
    }

    /// Looks up a resource by exact URI.
    #[must_use]
    pub fn resource(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(*self.resource_index.get(uri)?)
    }
}

/// Compiles an input contract under JSON Schema 2020-12.
fn compile_contract(name: &str, schema: &Value) -> Result<Validator, CatalogError> {
    jsonschema::options().with_draft(Draft::Draft202012).build(schema).map_err(|err| {
        CatalogError::InvalidSchema {
            name: name.to_string(),
            message: err.to_string(),
        }
    })
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog construction failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two operations share a name.
    #[error("duplicate operation name: {0}")]
    DuplicateOperation(String),
    /// Two resources share a URI.
    #[error("duplicate resource uri: {0}")]
    DuplicateResource(String),
    /// An input contract failed to compile.
    #[error("invalid input schema for {name}: {message}")]
    InvalidSchema {
        /// Operation name.
        name: String,
        /// Compilation error.
        message: String,
    },
}

// ============================================================================
// SECTION: Tests
// ============================================================================
