// crates/sonarqube-mcp/src/resources.rs
// ============================================================================
// Module: SonarQube Resources
// Description: Readable resource declarations and content producers.
// Purpose: Expose server info, project overview, gates, and setup guides.
// Dependencies: serde, serde_json, tokio, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! Resources take no arguments. The projects overview fans out one task per
//! project and isolates failures per project: a project whose measures cannot
//! be fetched carries an error marker while the others are still reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use sonarqube_mcp_client::ApiError;
use sonarqube_mcp_client::CoverageMetrics;
use sonarqube_mcp_client::Project;
use sonarqube_mcp_client::QualityMetrics;
use sonarqube_mcp_client::SonarQubeApi;

use crate::catalog::HandlerError;
use crate::catalog::ResourceDescriptor;
use crate::catalog::SharedApi;
use crate::tools::pretty;
use crate::tools::rfc3339_now;

// ============================================================================
// SECTION: Static Content
// ============================================================================

/// Scanner configuration guide for TypeScript projects.
const TYPESCRIPT_CONFIG_GUIDE: &str = include_str!("../assets/typescript-config.txt");
/// Container setup guide.
const DOCKER_SETUP_GUIDE: &str = include_str!("../assets/docker-setup.md");
/// Marker stored in place of measures for a project that failed.
const METRICS_FAILED: &str = "Failed to fetch metrics";
/// Gate status reported when a project has none.
const GATE_UNKNOWN: &str = "UNKNOWN";

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// Returns the resource list in catalog order.
#[must_use]
pub fn resources() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::new(
            "sonarqube://server/info",
            "SonarQube Server Information",
            "Current SonarQube server status, version, and configuration",
            "application/json",
            server_info,
        ),
        ResourceDescriptor::new(
            "sonarqube://projects/overview",
            "Projects Overview",
            "Overview of all projects in SonarQube with basic metrics",
            "application/json",
            projects_overview,
        ),
        ResourceDescriptor::new(
            "sonarqube://quality-gates/list",
            "Quality Gates",
            "List of all configured quality gates",
            "application/json",
            quality_gates,
        ),
        ResourceDescriptor::new(
            "sonarqube://config/typescript",
            "TypeScript Configuration",
            "SonarQube configuration for TypeScript/JavaScript projects",
            "text/plain",
            typescript_config,
        ),
        ResourceDescriptor::new(
            "sonarqube://setup/docker",
            "Docker Setup Instructions",
            "Instructions for setting up SonarQube with Docker",
            "text/markdown",
            docker_setup,
        ),
    ]
}

// ============================================================================
// SECTION: Overview Types
// ============================================================================

/// Measures attached to a project in the overview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectMetrics {
    /// Quality measures.
    quality: QualityMetrics,
    /// Coverage measures.
    coverage: CoverageMetrics,
    /// Gate status label, `UNKNOWN` when absent.
    quality_gate_status: String,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Renders upstream server status.
async fn server_info(api: SharedApi) -> Result<String, HandlerError> {
    pretty(&api.system_status().await?)
}

/// Renders every project with its headline measures.
async fn projects_overview(api: SharedApi) -> Result<String, HandlerError> {
    let projects = api.list_projects().await?;
    let tasks: Vec<_> = projects
        .iter()
        .map(|project| {
            let api = Arc::clone(&api);
            let key = project.key.clone();
            tokio::spawn(async move { project_metrics(api.as_ref(), &key).await })
        })
        .collect();
    let mut entries = Vec::with_capacity(projects.len());
    for (project, task) in projects.iter().zip(tasks) {
        let metrics = match task.await {
            Ok(Ok(metrics)) => serde_json::to_value(metrics)
                .map_err(|err| HandlerError::Serialization(err.to_string()))?,
            Ok(Err(_)) | Err(_) => json!({"error": METRICS_FAILED}),
        };
        entries.push(overview_entry(project, metrics)?);
    }
    pretty(&json!({
        "totalProjects": projects.len(),
        "projects": entries,
        "generatedAt": rfc3339_now(),
    }))
}

/// Renders configured quality gates.
async fn quality_gates(api: SharedApi) -> Result<String, HandlerError> {
    pretty(&api.get_quality_gates().await?)
}

/// Returns the scanner configuration guide.
async fn typescript_config(_api: SharedApi) -> Result<String, HandlerError> {
    Ok(TYPESCRIPT_CONFIG_GUIDE.to_string())
}

/// Returns the container setup guide.
async fn docker_setup(_api: SharedApi) -> Result<String, HandlerError> {
    Ok(DOCKER_SETUP_GUIDE.to_string())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fetches the overview measures for one project concurrently.
async fn project_metrics(api: &dyn SonarQubeApi, key: &str) -> Result<ProjectMetrics, ApiError> {
    let (quality, coverage, gate) = tokio::try_join!(
        api.get_code_quality_metrics(key),
        api.get_code_coverage(key),
        api.get_quality_gate_status(key)
    )?;
    Ok(ProjectMetrics {
        quality,
        coverage,
        quality_gate_status: gate
            .map(|gate| gate.status)
            .filter(|status| !status.is_empty())
            .unwrap_or_else(|| GATE_UNKNOWN.to_string()),
    })
}

/// Merges a project snapshot with its `metrics` value.
fn overview_entry(project: &Project, metrics: Value) -> Result<Value, HandlerError> {
    let mut entry =
        serde_json::to_value(project).map_err(|err| HandlerError::Serialization(err.to_string()))?;
    if let Value::Object(map) = &mut entry {
        map.insert("metrics".to_string(), metrics);
    }
    Ok(entry)
}
