// crates/sonarqube-mcp-client/src/client.rs
// ============================================================================
// Module: SonarQube Client
// Description: Authenticated HTTP façade over the SonarQube web API.
// Purpose: Translate typed intents into bounded upstream calls.
// Dependencies: async-trait, reqwest, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SonarQubeApi`] is the seam the dispatch layer depends on; the production
//! implementation is [`SonarQubeClient`]. Every call carries the fixed
//! per-request timeout and exactly one credential kind. There are no retries and
//! no caching: a transient upstream failure is surfaced immediately.
//!
//! ## Invariants
//! - A configured token is the sole credential; username/password are never
//!   sent alongside it.
//! - `get_project` and `get_quality_gate_status` return `None` only on a 404;
//!   every other failure propagates.
//! - `health_check` never fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::measures::COVERAGE_METRIC_KEYS;
use crate::measures::CoverageMetrics;
use crate::measures::QUALITY_METRIC_KEYS;
use crate::measures::QualityMetrics;
use crate::types::Analysis;
use crate::types::HealthReport;
use crate::types::Issue;
use crate::types::IssueFilters;
use crate::types::Metric;
use crate::types::Project;
use crate::types::QualityGate;
use crate::types::QualityGateStatus;
use crate::types::SystemStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default upstream request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default issue page size.
pub const DEFAULT_ISSUE_PAGE_SIZE: u32 = 100;
/// Upstream cap on issue page size.
pub const MAX_ISSUE_PAGE_SIZE: u32 = 500;
/// Default analysis history page size.
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 10;
/// User agent for outbound requests.
const USER_AGENT: &str = concat!("sonarqube-mcp/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Credential used for every upstream request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// User token, sent as the basic-auth username with an empty password.
    Token(String),
    /// Username and password basic auth.
    Basic {
        /// Login name.
        username: String,
        /// Login password.
        password: String,
    },
}

impl Credentials {
    /// Selects the credential: a non-empty token wins outright.
    #[must_use]
    pub fn select(username: &str, password: &str, token: Option<&str>) -> Self {
        match token.map(str::trim).filter(|token| !token.is_empty()) {
            Some(token) => Self::Token(token.to_string()),
            None => Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
        }
    }

    /// Returns a stable label for the credential kind.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Basic {
                ..
            } => "basic",
        }
    }

    /// Attaches the credential to an outbound request.
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Token(token) => request.basic_auth(token, Some("")),
            Self::Basic {
                username,
                password,
            } => request.basic_auth(username, Some(password)),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Basic {
                username,
                ..
            } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Connection settings for [`SonarQubeClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `http://localhost:9000`.
    pub base_url: String,
    /// Selected credential.
    pub credentials: Credentials,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upstream call failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or timeout.
    #[error("sonarqube unreachable: {0}")]
    Unreachable(String),
    /// Non-success HTTP status.
    #[error("sonarqube request {path} failed with status {status}: {message}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Upstream error message.
        message: String,
    },
    /// Response body did not match the expected shape.
    #[error("sonarqube response decode failed: {0}")]
    Decode(String),
    /// HTTP client construction failure.
    #[error("sonarqube client error: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: API Trait
// ============================================================================

/// Typed view of the SonarQube web API used by the operation catalog.
#[async_trait]
pub trait SonarQubeApi: Send + Sync {
    /// Fetches the server status.
    async fn system_status(&self) -> Result<SystemStatus, ApiError>;

    /// Lists all projects; empty when the server has none.
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    /// Fetches a project by key; `None` when it does not exist.
    async fn get_project(&self, project_key: &str) -> Result<Option<Project>, ApiError>;

    /// Searches issues for a project.
    async fn get_issues(
        &self,
        project_key: &str,
        filters: &IssueFilters,
    ) -> Result<Vec<Issue>, ApiError>;

    /// Fetches the named measures for a project.
    async fn get_project_metrics(
        &self,
        project_key: &str,
        metric_keys: &[&str],
    ) -> Result<Vec<Metric>, ApiError>;

    /// Lists configured quality gates.
    async fn get_quality_gates(&self) -> Result<Vec<QualityGate>, ApiError>;

    /// Fetches the quality gate status for a project; `None` when not found.
    async fn get_quality_gate_status(
        &self,
        project_key: &str,
    ) -> Result<Option<QualityGateStatus>, ApiError>;

    /// Fetches recent analyses, most recent first as returned upstream.
    async fn get_analysis_history(
        &self,
        project_key: &str,
        page_size: u32,
    ) -> Result<Vec<Analysis>, ApiError>;

    /// Fetches and reshapes the coverage measures for a project.
    async fn get_code_coverage(&self, project_key: &str) -> Result<CoverageMetrics, ApiError> {
        let measures = self.get_project_metrics(project_key, COVERAGE_METRIC_KEYS).await?;
        Ok(CoverageMetrics::from_measures(&measures))
    }

    /// Fetches and reshapes the quality measures for a project.
    async fn get_code_quality_metrics(
        &self,
        project_key: &str,
    ) -> Result<QualityMetrics, ApiError> {
        let measures = self.get_project_metrics(project_key, QUALITY_METRIC_KEYS).await?;
        Ok(QualityMetrics::from_measures(&measures))
    }

    /// Probes the server status; degrades to `DOWN` instead of failing.
    async fn health_check(&self) -> HealthReport {
        match self.system_status().await {
            Ok(status) => HealthReport::reachable(&status.status),
            Err(err) => HealthReport::unreachable(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// Production [`SonarQubeApi`] backed by `reqwest`.
pub struct SonarQubeClient {
    /// Base URL without a trailing slash.
    base_url: String,
    /// Credential attached to every request.
    credentials: Credentials,
    /// Shared HTTP client with the fixed timeout.
    http: Client,
}

impl SonarQubeClient {
    /// Builds a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] when the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|err| ApiError::Client(format!("invalid base url {base_url}: {err}")))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ApiError::Client(err.to_string()))?;
        Ok(Self {
            base_url,
            credentials: config.credentials,
            http,
        })
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the credential kind label.
    #[must_use]
    pub const fn auth_method(&self) -> &'static str {
        self.credentials.method()
    }

    /// Issues an authenticated GET request.
    async fn send(&self, path: &str, query: &[(&str, String)]) -> Result<Response, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let request = self.credentials.apply(self.http.get(url).query(query));
        request.send().await.map_err(|err| ApiError::Unreachable(err.to_string()))
    }

    /// Issues a GET request and decodes a successful JSON response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.send(path, query).await?;
        decode(path, ensure_success(path, response).await?).await
    }

    /// Issues a GET request where a 404 means "absent".
    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        let response = self.send(path, query).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(path, ensure_success(path, response).await?).await.map(Some)
    }
}

#[async_trait]
impl SonarQubeApi for SonarQubeClient {
    async fn system_status(&self) -> Result<SystemStatus, ApiError> {
        self.get_json("/api/system/status", &[]).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let page: ComponentsPage = self.get_json("/api/projects/search", &[]).await?;
        Ok(page.components)
    }

    async fn get_project(&self, project_key: &str) -> Result<Option<Project>, ApiError> {
        let page: Option<ComponentsPage> = self
            .get_json_optional("/api/projects/search", &[("projects", project_key.to_string())])
            .await?;
        Ok(page.and_then(|page| page.components.into_iter().next()))
    }

    async fn get_issues(
        &self,
        project_key: &str,
        filters: &IssueFilters,
    ) -> Result<Vec<Issue>, ApiError> {
        let page: IssuesPage = self.get_json("/api/issues/search", &issue_query(project_key, filters)).await?;
        Ok(page.issues)
    }

    async fn get_project_metrics(
        &self,
        project_key: &str,
        metric_keys: &[&str],
    ) -> Result<Vec<Metric>, ApiError> {
        let query = [("component", project_key.to_string()), ("metricKeys", metric_keys.join(","))];
        let page: MeasuresPage = self.get_json("/api/measures/component", &query).await?;
        let Some(component) = page.component else {
            return Ok(Vec::new());
        };
        let owner = component.key.unwrap_or_else(|| project_key.to_string());
        Ok(component
            .measures
            .into_iter()
            .map(|mut measure| {
                if measure.component.is_empty() {
                    measure.component.clone_from(&owner);
                }
                measure
            })
            .collect())
    }

    async fn get_quality_gates(&self) -> Result<Vec<QualityGate>, ApiError> {
        let page: QualityGatesPage = self.get_json("/api/qualitygates/list", &[]).await?;
        Ok(page.qualitygates)
    }

    async fn get_quality_gate_status(
        &self,
        project_key: &str,
    ) -> Result<Option<QualityGateStatus>, ApiError> {
        let page: Option<ProjectStatusPage> = self
            .get_json_optional(
                "/api/qualitygates/project_status",
                &[("projectKey", project_key.to_string())],
            )
            .await?;
        Ok(page.and_then(|page| page.project_status))
    }

    async fn get_analysis_history(
        &self,
        project_key: &str,
        page_size: u32,
    ) -> Result<Vec<Analysis>, ApiError> {
        let query = [("project", project_key.to_string()), ("ps", page_size.to_string())];
        let page: AnalysesPage = self.get_json("/api/project_analyses/search", &query).await?;
        Ok(page.analyses)
    }
}

// ============================================================================
// SECTION: Response Envelopes
// ============================================================================

/// `/api/projects/search` envelope.
#[derive(Deserialize)]
struct ComponentsPage {
    /// Matching projects.
    #[serde(default)]
    components: Vec<Project>,
}

/// `/api/issues/search` envelope.
#[derive(Deserialize)]
struct IssuesPage {
    /// Matching issues.
    #[serde(default)]
    issues: Vec<Issue>,
}

/// `/api/measures/component` envelope.
#[derive(Deserialize)]
struct MeasuresPage {
    /// Measured component, absent for unknown keys on some versions.
    #[serde(default)]
    component: Option<MeasuredComponent>,
}

/// Component block inside a measures response.
#[derive(Deserialize)]
struct MeasuredComponent {
    /// Component key.
    #[serde(default)]
    key: Option<String>,
    /// Measures for the requested metric keys.
    #[serde(default)]
    measures: Vec<Metric>,
}

/// `/api/qualitygates/list` envelope.
#[derive(Deserialize)]
struct QualityGatesPage {
    /// Configured gates.
    #[serde(default)]
    qualitygates: Vec<QualityGate>,
}

/// `/api/qualitygates/project_status` envelope.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectStatusPage {
    /// Gate evaluation.
    #[serde(default)]
    project_status: Option<QualityGateStatus>,
}

/// `/api/project_analyses/search` envelope.
#[derive(Deserialize)]
struct AnalysesPage {
    /// Analyses, most recent first.
    #[serde(default)]
    analyses: Vec<Analysis>,
}

/// Upstream error body.
#[derive(Deserialize)]
struct ErrorBody {
    /// Error entries.
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

/// Single upstream error entry.
#[derive(Deserialize)]
struct ErrorEntry {
    /// Error message.
    msg: String,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the issue search query string.
fn issue_query(project_key: &str, filters: &IssueFilters) -> Vec<(&'static str, String)> {
    let page_size =
        filters.page_size.unwrap_or(DEFAULT_ISSUE_PAGE_SIZE).clamp(1, MAX_ISSUE_PAGE_SIZE);
    let mut query = vec![("componentKeys", project_key.to_string()), ("ps", page_size.to_string())];
    if !filters.severities.is_empty() {
        query.push(("severities", filters.severities.join(",")));
    }
    if !filters.types.is_empty() {
        query.push(("types", filters.types.join(",")));
    }
    if !filters.statuses.is_empty() {
        query.push(("statuses", filters.statuses.join(",")));
    }
    if let Some(resolved) = filters.resolved {
        query.push(("resolved", resolved.to_string()));
    }
    query
}

/// Converts a non-success response into [`ApiError::Status`].
async fn ensure_success(path: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|body| body.errors.into_iter().map(|entry| entry.msg).collect::<Vec<_>>().join("; "))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unexpected status").to_string());
    Err(ApiError::Status {
        path: path.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Decodes a JSON response body.
async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(|err| ApiError::Unreachable(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(format!("{path}: {err}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
