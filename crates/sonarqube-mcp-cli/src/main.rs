// crates/sonarqube-mcp-cli/src/main.rs
// ============================================================================
// Module: SonarQube MCP CLI Entry Point
// Description: Command dispatcher for the SonarQube MCP server.
// Purpose: Start the server, validate configuration, and print the catalog.
// Dependencies: clap, serde, serde_json, sonarqube-mcp, sonarqube-mcp-config, tokio
// ============================================================================

//! ## Overview
//! `sonarqube-mcp serve` loads configuration, builds the upstream client and
//! catalog once, and serves the configured transports. `config validate`
//! prints a secret-free summary and `catalog` prints the operation and
//! resource catalog as JSON. Stdout is reserved for the protocol while
//! serving; diagnostics go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use sonarqube_mcp::Catalog;
use sonarqube_mcp::McpServer;
use sonarqube_mcp::ResourceDefinition;
use sonarqube_mcp::ToolDefinition;
use sonarqube_mcp_config::ServerMode;
use sonarqube_mcp_config::SonarQubeMcpConfig;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "sonarqube-mcp", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the SonarQube MCP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the operation and resource catalog as JSON.
    Catalog,
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to sonarqube-mcp.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Transport mode override.
    #[arg(long, value_enum, value_name = "MODE")]
    mode: Option<ModeArg>,
    /// HTTP port override.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, then print a redacted summary.
    Validate(ConfigValidateCommand),
}

/// Configuration for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Transport modes accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    /// Stdio only.
    Stdio,
    /// HTTP only.
    Http,
    /// Stdio and HTTP concurrently.
    Both,
}

impl From<ModeArg> for ServerMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Stdio => Self::Stdio,
            ModeArg::Http => Self::Http,
            ModeArg::Both => Self::Both,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("sonarqube-mcp {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        let mut command = Cli::command();
        command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => command_config_validate(&command),
        Commands::Catalog => command_catalog(),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the MCP server until its transports stop.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = SonarQubeMcpConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    apply_serve_overrides(&mut config, &command);
    let server = McpServer::from_config(config)
        .map_err(|err| CliError::new(format!("failed to start server: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Applies command-line overrides on top of loaded configuration.
fn apply_serve_overrides(config: &mut SonarQubeMcpConfig, command: &ServeCommand) {
    if let Some(mode) = command.mode {
        config.server.mode = mode.into();
    }
    if let Some(port) = command.port {
        config.server.http_port = port;
    }
}

/// Validates configuration and prints its redacted summary.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = SonarQubeMcpConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_json(&serde_json::to_value(config.summary()).map_err(serialization_error)?)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the catalog.
fn command_catalog() -> CliResult<ExitCode> {
    write_json(&catalog_json()?)?;
    Ok(ExitCode::SUCCESS)
}

/// Catalog listing printed by `catalog`; same entries as `tools/list` and
/// `resources/list`.
#[derive(Debug, Serialize)]
struct CatalogListing {
    /// Operation definitions in catalog order.
    tools: Vec<ToolDefinition>,
    /// Resource definitions in catalog order.
    resources: Vec<ResourceDefinition>,
}

/// Renders the catalog listing as JSON.
fn catalog_json() -> CliResult<Value> {
    let catalog = Catalog::sonarqube()
        .map_err(|err| CliError::new(format!("catalog is invalid: {err}")))?;
    let listing = CatalogListing {
        tools: catalog.operations().map(ToolDefinition::from).collect(),
        resources: catalog.resources().iter().map(ResourceDefinition::from).collect(),
    };
    serde_json::to_value(listing).map_err(serialization_error)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes pretty JSON to stdout.
fn write_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(serialization_error)?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Wraps a JSON serialization failure.
fn serialization_error(error: serde_json::Error) -> CliError {
    CliError::new(format!("failed to serialize output: {error}"))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
