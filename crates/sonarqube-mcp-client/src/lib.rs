// crates/sonarqube-mcp-client/src/lib.rs
// ============================================================================
// Module: SonarQube MCP Client
// Description: Typed, authenticated access to the SonarQube web API.
// Purpose: Provide the upstream seam consumed by the MCP operation catalog.
// Dependencies: async-trait, reqwest, serde, thiserror
// ============================================================================

//! ## Overview
//! The client crate owns every outbound call to SonarQube. Callers depend on
//! the [`SonarQubeApi`] trait so the catalog can be exercised against
//! in-memory doubles; [`SonarQubeClient`] is the HTTP implementation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod measures;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ApiError;
pub use client::ClientConfig;
pub use client::Credentials;
pub use client::DEFAULT_HISTORY_PAGE_SIZE;
pub use client::DEFAULT_ISSUE_PAGE_SIZE;
pub use client::DEFAULT_TIMEOUT_MS;
pub use client::MAX_ISSUE_PAGE_SIZE;
pub use client::SonarQubeApi;
pub use client::SonarQubeClient;
pub use measures::COVERAGE_METRIC_KEYS;
pub use measures::CoverageMetrics;
pub use measures::QUALITY_METRIC_KEYS;
pub use measures::QualityMetrics;
pub use types::Analysis;
pub use types::HealthReport;
pub use types::Issue;
pub use types::IssueFilters;
pub use types::Metric;
pub use types::Project;
pub use types::QualityGate;
pub use types::QualityGateCondition;
pub use types::QualityGateStatus;
pub use types::SystemStatus;
