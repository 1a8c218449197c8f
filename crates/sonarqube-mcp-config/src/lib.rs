// crates/sonarqube-mcp-config/src/lib.rs
// ============================================================================
// Module: SonarQube MCP Config Library
// Description: Canonical configuration model and validation.
// Purpose: Single source of truth for sonarqube-mcp.toml semantics.
// Dependencies: serde, toml, sonarqube-mcp-client
// ============================================================================

//! ## Overview
//! `sonarqube-mcp-config` loads the server configuration from an optional TOML
//! file, layers environment overrides on top, and validates the result
//! fail-closed before anything touches the network.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
