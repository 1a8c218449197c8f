// crates/sonarqube-mcp-client/src/measures.rs
// ============================================================================
// Module: Measure Reshaping
// Description: Fixed metric-key to field mappings for coverage and quality.
// Purpose: Turn flat measure lists into named-field records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The upstream returns measures as a flat `{metric, value}` list. The records
//! here assign each recognized metric key to a named field. Keys missing from
//! the response leave their field unset and unrecognized keys are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::types::Metric;

// ============================================================================
// SECTION: Metric Keys
// ============================================================================

/// Metric keys requested for the coverage group.
pub const COVERAGE_METRIC_KEYS: &[&str] =
    &["line_coverage", "branch_coverage", "uncovered_lines", "uncovered_conditions"];

/// Metric keys requested for the quality group.
pub const QUALITY_METRIC_KEYS: &[&str] = &[
    "code_smells",
    "bugs",
    "vulnerabilities",
    "security_hotspots",
    "duplicated_lines",
    "duplicated_lines_density",
    "sqale_rating",
    "reliability_rating",
    "security_rating",
];

// ============================================================================
// SECTION: Coverage
// ============================================================================

/// Coverage measures for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageMetrics {
    /// `line_coverage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_coverage: Option<String>,
    /// `branch_coverage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_coverage: Option<String>,
    /// `uncovered_lines`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncovered_lines: Option<String>,
    /// `uncovered_conditions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncovered_conditions: Option<String>,
}

impl CoverageMetrics {
    /// Folds a measure list into coverage fields.
    #[must_use]
    pub fn from_measures(measures: &[Metric]) -> Self {
        let mut record = Self::default();
        for measure in measures {
            let slot = match measure.metric.as_str() {
                "line_coverage" => &mut record.line_coverage,
                "branch_coverage" => &mut record.branch_coverage,
                "uncovered_lines" => &mut record.uncovered_lines,
                "uncovered_conditions" => &mut record.uncovered_conditions,
                _ => continue,
            };
            *slot = Some(measure.value.clone());
        }
        record
    }
}

// ============================================================================
// SECTION: Quality
// ============================================================================

/// Code quality measures for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// `code_smells`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_smells: Option<String>,
    /// `bugs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<String>,
    /// `vulnerabilities`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<String>,
    /// `security_hotspots`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_hotspots: Option<String>,
    /// `duplicated_lines`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicated_lines: Option<String>,
    /// `duplicated_lines_density`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicated_lines_density: Option<String>,
    /// `sqale_rating`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainability_rating: Option<String>,
    /// `reliability_rating`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability_rating: Option<String>,
    /// `security_rating`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_rating: Option<String>,
}

impl QualityMetrics {
    /// Folds a measure list into quality fields.
    #[must_use]
    pub fn from_measures(measures: &[Metric]) -> Self {
        let mut record = Self::default();
        for measure in measures {
            let slot = match measure.metric.as_str() {
                "code_smells" => &mut record.code_smells,
                "bugs" => &mut record.bugs,
                "vulnerabilities" => &mut record.vulnerabilities,
                "security_hotspots" => &mut record.security_hotspots,
                "duplicated_lines" => &mut record.duplicated_lines,
                "duplicated_lines_density" => &mut record.duplicated_lines_density,
                "sqale_rating" => &mut record.maintainability_rating,
                "reliability_rating" => &mut record.reliability_rating,
                "security_rating" => &mut record.security_rating,
                _ => continue,
            };
            *slot = Some(measure.value.clone());
        }
        record
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
