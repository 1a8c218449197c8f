// crates/sonarqube-mcp/tests/common/mod.rs
// ============================================================================
// Module: MCP Test Fixtures
// Description: Recording in-memory SonarQube double and server builders.
// Purpose: Exercise dispatch, aggregation, and transports without a network.
// Dependencies: async-trait, sonarqube-mcp, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! [`StubApi`] serves two fixture projects (`alpha`, `beta`) with distinct
//! measures and counts every upstream call by name, so tests can assert which
//! calls a request did or did not make. Failures are injected per call name
//! or per project.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Map;
use sonarqube_mcp::McpServer;
use sonarqube_mcp::ToolRouter;
use sonarqube_mcp_client::Analysis;
use sonarqube_mcp_client::ApiError;
use sonarqube_mcp_client::Issue;
use sonarqube_mcp_client::IssueFilters;
use sonarqube_mcp_client::Metric;
use sonarqube_mcp_client::Project;
use sonarqube_mcp_client::QualityGate;
use sonarqube_mcp_client::QualityGateStatus;
use sonarqube_mcp_client::SonarQubeApi;
use sonarqube_mcp_client::SystemStatus;
use sonarqube_mcp_config::SonarQubeMcpConfig;

// ============================================================================
// SECTION: Stub API
// ============================================================================

/// Recording SonarQube double.
#[derive(Default)]
pub struct StubApi {
    /// Call counts keyed by method name.
    calls: Mutex<BTreeMap<&'static str, usize>>,
    /// Method names that fail with an upstream 500.
    failing_calls: BTreeSet<&'static str>,
    /// Projects whose measure fetches fail.
    failing_projects: BTreeSet<String>,
    /// Delay applied to measure fetches.
    measure_delay: Option<Duration>,
}

impl StubApi {
    /// Creates a stub with no injected failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call to `method` fail.
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing_calls.insert(method);
        self
    }

    /// Makes measure fetches for `project_key` fail.
    pub fn failing_project(mut self, project_key: &str) -> Self {
        self.failing_projects.insert(project_key.to_string());
        self
    }

    /// Delays measure fetches so concurrent requests overlap.
    pub fn with_measure_delay(mut self, delay: Duration) -> Self {
        self.measure_delay = Some(delay);
        self
    }

    /// Returns how many times `method` was called.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Returns the total number of upstream calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Counts a call and applies any scripted failure.
    fn record(&self, method: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        if self.failing_calls.contains(method) {
            return Err(ApiError::Status {
                path: format!("/stub/{method}"),
                status: 500,
                message: format!("{method} exploded"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SonarQubeApi for StubApi {
    async fn system_status(&self) -> Result<SystemStatus, ApiError> {
        self.record("system_status")?;
        Ok(SystemStatus {
            status: "UP".to_string(),
            version: "10.4.1".to_string(),
            id: "stub".to_string(),
        })
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.record("list_projects")?;
        Ok(vec![project("alpha"), project("beta")])
    }

    async fn get_project(&self, project_key: &str) -> Result<Option<Project>, ApiError> {
        self.record("get_project")?;
        Ok(matches!(project_key, "alpha" | "beta").then(|| project(project_key)))
    }

    async fn get_issues(
        &self,
        project_key: &str,
        filters: &IssueFilters,
    ) -> Result<Vec<Issue>, ApiError> {
        self.record("get_issues")?;
        let count = filters.page_size.unwrap_or(100).min(12);
        Ok((0..count).map(|n| issue(project_key, n)).collect())
    }

    async fn get_project_metrics(
        &self,
        project_key: &str,
        metric_keys: &[&str],
    ) -> Result<Vec<Metric>, ApiError> {
        self.record("get_project_metrics")?;
        if let Some(delay) = self.measure_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_projects.contains(project_key) {
            return Err(ApiError::Unreachable(format!("measures for {project_key} timed out")));
        }
        let bugs = if project_key == "alpha" { "3" } else { "7" };
        let coverage = if project_key == "alpha" { "87.5" } else { "41.0" };
        let all = [("bugs", bugs), ("line_coverage", coverage), ("unrecognized_metric", "1")];
        Ok(all
            .iter()
            .filter(|(key, _)| metric_keys.contains(key) || *key == "unrecognized_metric")
            .map(|(key, value)| Metric {
                metric: (*key).to_string(),
                value: (*value).to_string(),
                component: project_key.to_string(),
            })
            .collect())
    }

    async fn get_quality_gates(&self) -> Result<Vec<QualityGate>, ApiError> {
        self.record("get_quality_gates")?;
        Ok(vec![QualityGate {
            id: None,
            name: "Sonar way".to_string(),
            is_default: true,
            is_built_in: true,
        }])
    }

    async fn get_quality_gate_status(
        &self,
        project_key: &str,
    ) -> Result<Option<QualityGateStatus>, ApiError> {
        self.record("get_quality_gate_status")?;
        Ok((project_key == "alpha").then(|| QualityGateStatus {
            status: "OK".to_string(),
            conditions: Vec::new(),
        }))
    }

    async fn get_analysis_history(
        &self,
        project_key: &str,
        page_size: u32,
    ) -> Result<Vec<Analysis>, ApiError> {
        self.record("get_analysis_history")?;
        Ok((0..page_size.min(3))
            .map(|n| Analysis {
                key: format!("{project_key}-analysis-{n}"),
                date: format!("2026-10-0{}T10:00:00+0000", n + 1),
                details: Map::new(),
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a fixture project.
pub fn project(key: &str) -> Project {
    Project {
        key: key.to_string(),
        name: format!("Project {key}"),
        qualifier: "TRK".to_string(),
        last_analysis_date: None,
        revision: None,
    }
}

/// Builds a fixture issue; severity and type rotate with `n`.
pub fn issue(project_key: &str, n: u32) -> Issue {
    let severity = if n % 3 == 0 { "MAJOR" } else { "MINOR" };
    let issue_type = if n % 2 == 0 { "BUG" } else { "CODE_SMELL" };
    Issue {
        key: format!("{project_key}-issue-{n}"),
        rule: "typescript:S1481".to_string(),
        severity: severity.to_string(),
        component: format!("{project_key}:src/index.ts"),
        project: project_key.to_string(),
        line: Some(u64::from(n) + 1),
        message: "Remove this unused variable".to_string(),
        effort: None,
        debt: None,
        status: "OPEN".to_string(),
        issue_type: issue_type.to_string(),
    }
}

/// Returns a valid token-authenticated config with auditing disabled.
pub fn test_config() -> SonarQubeMcpConfig {
    let mut config = SonarQubeMcpConfig::default();
    config.sonarqube.token = Some("squ_test_token".to_string());
    config.server.audit.enabled = false;
    config
}

/// Builds a server over `api`.
pub fn server_with(api: Arc<StubApi>) -> McpServer {
    McpServer::new(test_config(), api).unwrap()
}

/// Builds a router over `api`.
pub fn router_with(api: Arc<StubApi>) -> ToolRouter {
    server_with(api).router().clone()
}
