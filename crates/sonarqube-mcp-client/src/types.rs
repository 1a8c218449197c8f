// crates/sonarqube-mcp-client/src/types.rs
// ============================================================================
// Module: SonarQube Entities
// Description: Read-only entity snapshots returned by the SonarQube web API.
// Purpose: Give the dispatch layer typed values instead of raw JSON.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every type here is a snapshot of exactly one upstream round trip. Nothing is
//! cached or merged across calls. Field names serialize in the camelCase shape
//! the upstream API uses so operation output mirrors what SonarQube reports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: System
// ============================================================================

/// Server status as reported by `/api/system/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Server status label (`UP`, `STARTING`, `DOWN`, ...).
    #[serde(default)]
    pub status: String,
    /// Server version string.
    #[serde(default)]
    pub version: String,
    /// Server instance identifier.
    #[serde(default)]
    pub id: String,
}

/// Outcome of the cheap health probe.
///
/// # Invariants
/// - `accessible == false` implies `status == "DOWN"` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Reported status, or `DOWN` when the probe failed.
    pub status: String,
    /// Whether the upstream answered at all.
    pub accessible: bool,
    /// Probe failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// Status label used when the upstream did not report one.
    pub const UNKNOWN: &'static str = "UNKNOWN";
    /// Status label used when the probe failed.
    pub const DOWN: &'static str = "DOWN";

    /// Builds a report for a successful probe.
    #[must_use]
    pub fn reachable(status: &str) -> Self {
        let status = if status.trim().is_empty() { Self::UNKNOWN } else { status };
        Self {
            status: status.to_string(),
            accessible: true,
            error: None,
        }
    }

    /// Builds a report for a failed probe.
    #[must_use]
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            status: Self::DOWN.to_string(),
            accessible: false,
            error: Some(error.into()),
        }
    }

    /// Returns true when the upstream is reachable and reports `UP`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.accessible && self.status == "UP"
    }
}

// ============================================================================
// SECTION: Projects
// ============================================================================

/// Project component as returned by `/api/projects/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Stable project key.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Component qualifier (`TRK` for projects).
    #[serde(default)]
    pub qualifier: String,
    /// Timestamp of the most recent analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis_date: Option<String>,
    /// SCM revision of the most recent analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Issue as returned by `/api/issues/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Issue key.
    pub key: String,
    /// Rule identifier.
    #[serde(default)]
    pub rule: String,
    /// Severity label.
    #[serde(default)]
    pub severity: String,
    /// Component key the issue is attached to.
    #[serde(default)]
    pub component: String,
    /// Owning project key.
    #[serde(default)]
    pub project: String,
    /// Line number, when the issue is line-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// Issue message.
    #[serde(default)]
    pub message: String,
    /// Remediation effort.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
    /// Technical debt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt: Option<String>,
    /// Workflow status.
    #[serde(default)]
    pub status: String,
    /// Issue type label.
    #[serde(default, rename = "type")]
    pub issue_type: String,
}

/// Optional, independently combinable filters for issue searches.
///
/// # Invariants
/// - Empty sets are treated as "no filter", never as "match nothing".
/// - Filters combine conjunctively upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilters {
    /// Severity allowlist.
    pub severities: Vec<String>,
    /// Issue type allowlist.
    pub types: Vec<String>,
    /// Status allowlist.
    pub statuses: Vec<String>,
    /// Resolution filter.
    pub resolved: Option<bool>,
    /// Page size (defaults to 100, capped at 500).
    pub page_size: Option<u32>,
}

// ============================================================================
// SECTION: Measures
// ============================================================================

/// Raw measurement returned by `/api/measures/component`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric key.
    pub metric: String,
    /// Measured value.
    #[serde(default)]
    pub value: String,
    /// Component key the measure belongs to.
    #[serde(default)]
    pub component: String,
}

// ============================================================================
// SECTION: Quality Gates
// ============================================================================

/// Quality gate summary from `/api/qualitygates/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityGate {
    /// Gate identifier (numeric or string depending on server version).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Gate name.
    pub name: String,
    /// Whether this gate is the default.
    #[serde(default)]
    pub is_default: bool,
    /// Whether this gate ships with the server.
    #[serde(default)]
    pub is_built_in: bool,
}

/// Quality gate evaluation for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGateStatus {
    /// Overall gate status (`OK`, `ERROR`, `NONE`).
    pub status: String,
    /// Evaluated conditions in upstream order.
    #[serde(default)]
    pub conditions: Vec<QualityGateCondition>,
}

/// Single evaluated quality gate condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityGateCondition {
    /// Condition status.
    pub status: String,
    /// Metric the condition evaluates.
    pub metric_key: String,
    /// Comparison operator.
    #[serde(default)]
    pub comparator: String,
    /// Failure threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_threshold: Option<String>,
    /// Measured value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
}

// ============================================================================
// SECTION: Analyses
// ============================================================================

/// Analysis record from `/api/project_analyses/search`.
///
/// Fields beyond `key` and `date` vary across server versions and are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Analysis key.
    #[serde(default)]
    pub key: String,
    /// Analysis timestamp.
    #[serde(default)]
    pub date: String,
    /// Remaining upstream fields (events, versions, revisions).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}
