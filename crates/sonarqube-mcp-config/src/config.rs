// crates/sonarqube-mcp-config/src/config.rs
// ============================================================================
// Module: SonarQube MCP Configuration
// Description: Configuration loading, environment overrides, and validation.
// Purpose: Resolve upstream credentials and transport settings fail-closed.
// Dependencies: serde, toml, url, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! Configuration is resolved in three layers: built-in defaults, an optional
//! TOML file, then environment variables. The merged result is validated once;
//! an invalid configuration never reaches the transports.
//!
//! Security posture: configuration inputs are untrusted; secrets never appear
//! in [`ConfigSummary`] or `Debug` output of the client credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use sonarqube_mcp_client::ClientConfig;
use sonarqube_mcp_client::Credentials;
use sonarqube_mcp_client::DEFAULT_TIMEOUT_MS;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config filename, read from the working directory when present.
pub const DEFAULT_CONFIG_NAME: &str = "sonarqube-mcp.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SONARQUBE_MCP_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default upstream base URL.
const DEFAULT_SONARQUBE_URL: &str = "http://localhost:9000";
/// Default upstream username.
const DEFAULT_USERNAME: &str = "admin";
/// Default HTTP bind address.
const DEFAULT_HTTP_BIND: &str = "127.0.0.1";
/// Default HTTP port.
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Environment variable names recognized as overrides.
pub mod env_keys {
    /// Upstream base URL.
    pub const URL: &str = "SONARQUBE_URL";
    /// Upstream username.
    pub const USERNAME: &str = "SONARQUBE_USERNAME";
    /// Upstream password.
    pub const PASSWORD: &str = "SONARQUBE_PASSWORD";
    /// Upstream token.
    pub const TOKEN: &str = "SONARQUBE_TOKEN";
    /// Transport mode selector.
    pub const MODE: &str = "MCP_MODE";
    /// HTTP bind address.
    pub const HTTP_BIND: &str = "MCP_HTTP_BIND";
    /// HTTP port.
    pub const HTTP_PORT: &str = "HTTP_PORT";
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// SonarQube MCP server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SonarQubeMcpConfig {
    /// Upstream connection settings.
    #[serde(default)]
    pub sonarqube: SonarQubeConfig,
    /// Transport settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream connection settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SonarQubeConfig {
    /// Base URL of the SonarQube server.
    #[serde(default = "default_url")]
    pub url: String,
    /// Basic-auth username.
    #[serde(default = "default_username")]
    pub username: String,
    /// Basic-auth password; mandatory unless a token is set.
    #[serde(default)]
    pub password: Option<String>,
    /// User token; replaces username/password when set.
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SonarQubeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: None,
            token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for SonarQubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarQubeConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl SonarQubeConfig {
    /// Returns the token when it is set and non-blank.
    fn effective_token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|token| !token.is_empty())
    }

    /// Validates upstream connection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.url.trim()).map_err(|err| {
            ConfigError::Invalid(format!("sonarqube.url is not a valid url: {err}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "sonarqube.url must start with http:// or https://".to_string(),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid("sonarqube.url must include a host".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "sonarqube.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.effective_token().is_none() {
            if self.username.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "sonarqube.username is required when no token is set".to_string(),
                ));
            }
            if self.password.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Invalid(
                    "sonarqube.password is required when no token is set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Transports served by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Duplex stdin/stdout only.
    #[default]
    Stdio,
    /// HTTP debug surface only.
    Http,
    /// Both transports concurrently.
    Both,
}

impl ServerMode {
    /// Returns the config label for the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Both => "both",
        }
    }
}

impl FromStr for ServerMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::Invalid(format!(
                "server.mode must be stdio, http or both (got {other})"
            ))),
        }
    }
}

/// Transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transports to serve.
    #[serde(default)]
    pub mode: ServerMode,
    /// HTTP bind address.
    #[serde(default = "default_http_bind")]
    pub http_bind: String,
    /// HTTP port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Maximum inbound request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: ServerMode::default(),
            http_bind: default_http_bind(),
            http_port: default_http_port(),
            max_body_bytes: default_max_body_bytes(),
            audit: AuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the HTTP socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the bind address is not an IP.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = IpAddr::from_str(self.http_bind.trim()).map_err(|_| {
            ConfigError::Invalid(format!(
                "server.http_bind must be an IP address (got {})",
                self.http_bind
            ))
        })?;
        Ok(SocketAddr::new(ip, self.http_port))
    }

    /// Validates transport settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::Invalid(
                "server.http_port must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        self.http_addr()?;
        self.audit.validate()
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let trimmed = path.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid("server.audit.path must be non-empty".to_string()));
            }
            if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
                return Err(ConfigError::Invalid(
                    "server.audit.path exceeds max length".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Secret-free view of the effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    /// Upstream base URL.
    pub url: String,
    /// Credential kind (`token` or `basic`).
    pub auth_method: &'static str,
    /// Transport mode.
    pub mode: ServerMode,
    /// HTTP bind address.
    pub http_bind: String,
    /// HTTP port.
    pub http_port: u16,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Whether audit logging is enabled.
    pub audit_enabled: bool,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SonarQubeMcpConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration using an injected environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit file is missing, the file is
    /// malformed, an override is unparsable, or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => Self::from_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration file without applying overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides; empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = read(env_keys::URL) {
            self.sonarqube.url = url;
        }
        if let Some(username) = read(env_keys::USERNAME) {
            self.sonarqube.username = username;
        }
        if let Some(password) = read(env_keys::PASSWORD) {
            self.sonarqube.password = Some(password);
        }
        if let Some(token) = read(env_keys::TOKEN) {
            self.sonarqube.token = Some(token);
        }
        if let Some(mode) = read(env_keys::MODE) {
            self.server.mode = mode.parse()?;
        }
        if let Some(bind) = read(env_keys::HTTP_BIND) {
            self.server.http_bind = bind;
        }
        if let Some(port) = read(env_keys::HTTP_PORT) {
            self.server.http_port = port.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} must be a port number (got {port})", env_keys::HTTP_PORT))
            })?;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sonarqube.validate()?;
        self.server.validate()
    }

    /// Returns the upstream credential kind.
    #[must_use]
    pub fn auth_method(&self) -> &'static str {
        if self.sonarqube.effective_token().is_some() { "token" } else { "basic" }
    }

    /// Returns true when credentials travel over cleartext HTTP.
    #[must_use]
    pub fn uses_cleartext_credentials(&self) -> bool {
        Url::parse(self.sonarqube.url.trim()).is_ok_and(|url| url.scheme() == "http")
    }

    /// Builds the upstream client settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let sonarqube = &self.sonarqube;
        ClientConfig {
            base_url: sonarqube.url.trim().to_string(),
            credentials: Credentials::select(
                &sonarqube.username,
                sonarqube.password.as_deref().unwrap_or_default(),
                sonarqube.effective_token(),
            ),
            timeout_ms: sonarqube.timeout_ms,
        }
    }

    /// Returns a secret-free summary.
    #[must_use]
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            url: self.sonarqube.url.clone(),
            auth_method: self.auth_method(),
            mode: self.server.mode,
            http_bind: self.server.http_bind.clone(),
            http_port: self.server.http_port,
            timeout_ms: self.sonarqube.timeout_ms,
            audit_enabled: self.server.audit.enabled,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; `None` means defaults plus environment only.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Default upstream URL.
fn default_url() -> String {
    DEFAULT_SONARQUBE_URL.to_string()
}

/// Default upstream username.
fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

/// Default upstream timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default HTTP bind address.
fn default_http_bind() -> String {
    DEFAULT_HTTP_BIND.to_string()
}

/// Default HTTP port.
const fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}
