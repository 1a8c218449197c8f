// crates/sonarqube-mcp/src/tools.rs
// ============================================================================
// Module: SonarQube Operations
// Description: Operation declarations and handlers for the catalog.
// Purpose: Map validated MCP tool input onto upstream client calls.
// Dependencies: serde, serde_json, time, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! Each operation pairs a JSON Schema input contract with an async handler.
//! Handlers decode their already-validated input into a typed request, call
//! the upstream client, and render pretty-printed JSON text. A missing remote
//! entity renders as descriptive text; only upstream failures raise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use sonarqube_mcp_client::DEFAULT_HISTORY_PAGE_SIZE;
use sonarqube_mcp_client::DEFAULT_ISSUE_PAGE_SIZE;
use sonarqube_mcp_client::IssueFilters;
use sonarqube_mcp_client::MAX_ISSUE_PAGE_SIZE;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::catalog::HandlerError;
use crate::catalog::OperationDescriptor;
use crate::catalog::SharedApi;
use crate::report;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest analysis history page accepted by the operation contract.
const MAX_HISTORY_PAGE_SIZE: u32 = 100;
/// Accepted issue severities.
const SEVERITIES: &[&str] = &["INFO", "MINOR", "MAJOR", "CRITICAL", "BLOCKER"];
/// Accepted issue types.
const ISSUE_TYPES: &[&str] = &["CODE_SMELL", "BUG", "VULNERABILITY", "SECURITY_HOTSPOT"];

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// Returns the operation list in catalog order.
#[must_use]
pub fn operations() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "get_system_status",
            "Get SonarQube server status and version information",
            empty_contract(),
            get_system_status,
        ),
        OperationDescriptor::new(
            "list_projects",
            "List all projects in SonarQube",
            empty_contract(),
            list_projects,
        ),
        OperationDescriptor::new(
            "get_project",
            "Get detailed information about a specific project",
            project_contract(json!({})),
            get_project,
        ),
        OperationDescriptor::new(
            "get_project_issues",
            "Get issues for a specific project with optional filtering",
            project_contract(json!({
                "severities": {
                    "type": "array",
                    "items": {"type": "string", "enum": SEVERITIES},
                    "description": "Filter by severities"
                },
                "types": {
                    "type": "array",
                    "items": {"type": "string", "enum": ISSUE_TYPES},
                    "description": "Filter by issue types"
                },
                "statuses": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Filter by statuses"
                },
                "resolved": {"type": "boolean", "description": "Filter by resolution status"},
                "pageSize": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_ISSUE_PAGE_SIZE,
                    "default": DEFAULT_ISSUE_PAGE_SIZE,
                    "description": "Number of issues to return"
                }
            })),
            get_project_issues,
        ),
        OperationDescriptor::new(
            "get_quality_gate_status",
            "Get quality gate status for a project",
            project_contract(json!({})),
            get_quality_gate_status,
        ),
        OperationDescriptor::new(
            "get_code_coverage",
            "Get code coverage metrics for a project",
            project_contract(json!({})),
            get_code_coverage,
        ),
        OperationDescriptor::new(
            "get_code_quality_metrics",
            "Get code quality metrics for a project (bugs, vulnerabilities, code smells, etc.)",
            project_contract(json!({})),
            get_code_quality_metrics,
        ),
        OperationDescriptor::new(
            "get_analysis_history",
            "Get analysis history for a project",
            project_contract(json!({
                "pageSize": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_HISTORY_PAGE_SIZE,
                    "default": DEFAULT_HISTORY_PAGE_SIZE,
                    "description": "Number of analyses to return"
                }
            })),
            get_analysis_history,
        ),
        OperationDescriptor::new(
            "health_check",
            "Check if SonarQube server is healthy and accessible",
            empty_contract(),
            health_check,
        ),
        OperationDescriptor::new(
            "generate_project_report",
            "Generate a comprehensive report for a project including quality metrics, issues \
             summary, and coverage",
            project_contract(json!({
                "includeIssues": {
                    "type": "boolean",
                    "default": true,
                    "description": "Include issues in the report"
                },
                "includeHistory": {
                    "type": "boolean",
                    "default": false,
                    "description": "Include analysis history"
                }
            })),
            report::generate_project_report,
        ),
    ]
}

/// Contract for operations without input.
fn empty_contract() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

/// Contract for project-scoped operations with extra optional properties.
fn project_contract(extra: Value) -> Value {
    let mut properties = json!({
        "projectKey": {"type": "string", "minLength": 1, "description": "The project key"}
    });
    if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        target.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["projectKey"],
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Input for single-project operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRequest {
    /// Project key.
    project_key: String,
}

/// Input for `get_project_issues`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuesRequest {
    /// Project key.
    project_key: String,
    /// Severity allowlist.
    #[serde(default)]
    severities: Vec<String>,
    /// Type allowlist.
    #[serde(default)]
    types: Vec<String>,
    /// Status allowlist.
    #[serde(default)]
    statuses: Vec<String>,
    /// Resolution filter.
    #[serde(default)]
    resolved: Option<bool>,
    /// Page size.
    #[serde(default = "default_issue_page_size")]
    page_size: u32,
}

/// Input for `get_analysis_history`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRequest {
    /// Project key.
    project_key: String,
    /// Page size.
    #[serde(default = "default_history_page_size")]
    page_size: u32,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Returns upstream server status.
async fn get_system_status(_input: Value, api: SharedApi) -> Result<String, HandlerError> {
    pretty(&api.system_status().await?)
}

/// Returns every project.
async fn list_projects(_input: Value, api: SharedApi) -> Result<String, HandlerError> {
    pretty(&api.list_projects().await?)
}

/// Returns one project or a not-found notice.
async fn get_project(input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let request: ProjectRequest = decode(input)?;
    match api.get_project(&request.project_key).await? {
        Some(project) => pretty(&project),
        None => Ok(project_not_found(&request.project_key)),
    }
}

/// Returns filtered issues for a project.
async fn get_project_issues(input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let request: IssuesRequest = decode(input)?;
    let filters = IssueFilters {
        severities: request.severities,
        types: request.types,
        statuses: request.statuses,
        resolved: request.resolved,
        page_size: Some(request.page_size),
    };
    let issues = api.get_issues(&request.project_key, &filters).await?;
    pretty(&json!({
        "projectKey": request.project_key,
        "totalIssues": issues.len(),
        "issues": issues,
    }))
}

/// Returns quality gate status or a not-found notice.
async fn get_quality_gate_status(input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let request: ProjectRequest = decode(input)?;
    match api.get_quality_gate_status(&request.project_key).await? {
        Some(status) => pretty(&status),
        None => Ok(format!("No quality gate status found for project \"{}\"", request.project_key)),
    }
}

/// Returns coverage measures.
async fn get_code_coverage(input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let request: ProjectRequest = decode(input)?;
    let coverage = api.get_code_coverage(&request.project_key).await?;
    pretty(&json!({"projectKey": request.project_key, "coverage": coverage}))
}

/// Returns quality measures.
async fn get_code_quality_metrics(input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let request: ProjectRequest = decode(input)?;
    let metrics = api.get_code_quality_metrics(&request.project_key).await?;
    pretty(&json!({"projectKey": request.project_key, "qualityMetrics": metrics}))
}

/// Returns recent analyses.
async fn get_analysis_history(input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let request: HistoryRequest = decode(input)?;
    let history = api.get_analysis_history(&request.project_key, request.page_size).await?;
    pretty(&json!({"projectKey": request.project_key, "analysisHistory": history}))
}

/// Probes upstream health; never fails on an unreachable server.
async fn health_check(_input: Value, api: SharedApi) -> Result<String, HandlerError> {
    let report = api.health_check().await;
    let mut body = json!({
        "healthy": report.is_healthy(),
        "status": report.status,
        "timestamp": rfc3339_now(),
    });
    if let (Some(error), Some(map)) = (report.error, body.as_object_mut()) {
        map.insert("error".to_string(), Value::String(error));
    }
    pretty(&body)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a JSON value into a typed request payload.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, HandlerError> {
    serde_json::from_value(payload).map_err(|err| HandlerError::InvalidArguments(err.to_string()))
}

/// Renders a value as pretty-printed JSON.
pub(crate) fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, HandlerError> {
    serde_json::to_string_pretty(value).map_err(|err| HandlerError::Serialization(err.to_string()))
}

/// Formats the not-found notice for a project key.
pub(crate) fn project_not_found(project_key: &str) -> String {
    format!("Project \"{project_key}\" not found")
}

/// Returns the current UTC time as RFC 3339.
pub(crate) fn rfc3339_now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

/// Default issue page size.
const fn default_issue_page_size() -> u32 {
    DEFAULT_ISSUE_PAGE_SIZE
}

/// Default history page size.
const fn default_history_page_size() -> u32 {
    DEFAULT_HISTORY_PAGE_SIZE
}
