// crates/sonarqube-mcp/src/report.rs
// ============================================================================
// Module: Project Report
// Description: Composite report assembled from several upstream calls.
// Purpose: Back the `generate_project_report` operation.
// Dependencies: serde, tokio, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! The report first resolves the project; an unknown key short-circuits with a
//! descriptive notice. Quality gate status, quality metrics, coverage, and the
//! optional issue and history fetches then run concurrently. Any failure in
//! those fetches fails the whole report, which is rendered as descriptive text
//! rather than raised, so callers always receive a success-shaped result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sonarqube_mcp_client::Analysis;
use sonarqube_mcp_client::CoverageMetrics;
use sonarqube_mcp_client::Issue;
use sonarqube_mcp_client::IssueFilters;
use sonarqube_mcp_client::Project;
use sonarqube_mcp_client::QualityGateStatus;
use sonarqube_mcp_client::QualityMetrics;
use sonarqube_mcp_client::SonarQubeApi;

use crate::catalog::HandlerError;
use crate::catalog::SharedApi;
use crate::tools::decode;
use crate::tools::pretty;
use crate::tools::project_not_found;
use crate::tools::rfc3339_now;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Issues fetched for the summary.
const REPORT_ISSUE_PAGE_SIZE: u32 = 500;
/// Analyses fetched for the history section.
const REPORT_HISTORY_PAGE_SIZE: u32 = 5;
/// Issues retained as a representative sample.
const ISSUE_SAMPLE_SIZE: usize = 10;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Input for `generate_project_report`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRequest {
    /// Project key.
    project_key: String,
    /// Include the issue summary.
    #[serde(default = "include_issues_default")]
    include_issues: bool,
    /// Include recent analyses.
    #[serde(default)]
    include_history: bool,
}

/// Assembled project report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    /// Project snapshot.
    pub project: Project,
    /// Quality gate evaluation, null when none exists.
    pub quality_gate: Option<QualityGateStatus>,
    /// Quality and coverage measures.
    pub metrics: ReportMetrics,
    /// Issue summary, null when not requested.
    pub issues: Option<IssuesSummary>,
    /// Recent analyses, null when not requested.
    pub history: Option<Vec<Analysis>>,
    /// Report generation time (RFC 3339).
    pub generated_at: String,
}

/// Measure groups inside a report.
#[derive(Debug, Serialize)]
pub struct ReportMetrics {
    /// Quality measures.
    pub quality: QualityMetrics,
    /// Coverage measures.
    pub coverage: CoverageMetrics,
}

/// Issue tallies plus a leading sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesSummary {
    /// Number of issues fetched.
    pub total: usize,
    /// Issue count per severity.
    pub by_severity: BTreeMap<String, usize>,
    /// Issue count per type.
    pub by_type: BTreeMap<String, usize>,
    /// First issues in upstream order.
    pub top10_issues: Vec<Issue>,
}

impl IssuesSummary {
    /// Folds an issue list into tallies and a sample.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let mut by_severity = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        for issue in &issues {
            *by_severity.entry(issue.severity.clone()).or_insert(0) += 1;
            *by_type.entry(issue.issue_type.clone()).or_insert(0) += 1;
        }
        let total = issues.len();
        let top10_issues = issues.into_iter().take(ISSUE_SAMPLE_SIZE).collect();
        Self {
            total,
            by_severity,
            by_type,
            top10_issues,
        }
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Generates the project report text.
pub(crate) async fn generate_project_report(
    input: Value,
    api: SharedApi,
) -> Result<String, HandlerError> {
    let request: ReportRequest = decode(input)?;
    match build_report(&request, api.as_ref()).await {
        Ok(Some(report)) => pretty(&report),
        Ok(None) => Ok(project_not_found(&request.project_key)),
        Err(err) => Ok(format!("Error generating report: {err}")),
    }
}

/// Fetches and assembles the report; `None` when the project is unknown.
async fn build_report(
    request: &ReportRequest,
    api: &dyn SonarQubeApi,
) -> Result<Option<ProjectReport>, HandlerError> {
    let key = request.project_key.as_str();
    let Some(project) = api.get_project(key).await? else {
        return Ok(None);
    };
    let issues = async {
        if !request.include_issues {
            return Ok(None);
        }
        let filters = IssueFilters {
            page_size: Some(REPORT_ISSUE_PAGE_SIZE),
            ..IssueFilters::default()
        };
        api.get_issues(key, &filters).await.map(|issues| Some(IssuesSummary::from_issues(issues)))
    };
    let history = async {
        if !request.include_history {
            return Ok(None);
        }
        api.get_analysis_history(key, REPORT_HISTORY_PAGE_SIZE).await.map(Some)
    };
    let (quality_gate, quality, coverage, issues, history) = tokio::try_join!(
        api.get_quality_gate_status(key),
        api.get_code_quality_metrics(key),
        api.get_code_coverage(key),
        issues,
        history
    )?;
    Ok(Some(ProjectReport {
        project,
        quality_gate,
        metrics: ReportMetrics {
            quality,
            coverage,
        },
        issues,
        history,
        generated_at: rfc3339_now(),
    }))
}

/// Issues are included unless disabled.
const fn include_issues_default() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        clippy::missing_docs_in_private_items,
        reason = "Test-only assertions."
    )]

    use serde_json::json;
    use sonarqube_mcp_client::Issue;

    use super::IssuesSummary;

    fn issue(key: &str, severity: &str, issue_type: &str) -> Issue {
        Issue {
            key: key.to_string(),
            rule: "rust:S1".to_string(),
            severity: severity.to_string(),
            component: "demo:src/lib.rs".to_string(),
            project: "demo".to_string(),
            line: None,
            message: "fix".to_string(),
            effort: None,
            debt: None,
            status: "OPEN".to_string(),
            issue_type: issue_type.to_string(),
        }
    }

    #[test]
    fn summary_tallies_by_severity_and_type() {
        let issues = vec![
            issue("1", "MAJOR", "BUG"),
            issue("2", "MAJOR", "CODE_SMELL"),
            issue("3", "BLOCKER", "BUG"),
        ];
        let summary = serde_json::to_value(IssuesSummary::from_issues(issues)).unwrap();
        assert_eq!(summary["total"], json!(3));
        assert_eq!(summary["bySeverity"], json!({"BLOCKER": 1, "MAJOR": 2}));
        assert_eq!(summary["byType"], json!({"BUG": 2, "CODE_SMELL": 1}));
        assert_eq!(summary["top10Issues"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn summary_sample_keeps_first_ten_in_upstream_order() {
        let issues: Vec<_> = (0..25).map(|n| issue(&n.to_string(), "MINOR", "BUG")).collect();
        let summary = IssuesSummary::from_issues(issues);
        assert_eq!(summary.total, 25);
        let keys: Vec<_> = summary.top10_issues.iter().map(|issue| issue.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
    }

    #[test]
    fn empty_issue_list_yields_empty_tallies() {
        let summary = IssuesSummary::from_issues(Vec::new());
        assert_eq!(summary.total, 0);
        assert!(summary.by_severity.is_empty());
        assert!(summary.top10_issues.is_empty());
    }
}
