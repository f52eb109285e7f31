//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, printing is handled by the caller

use std::path::Path;

use thiserror::Error;
use tracing::info;

use super::OutputFormat;
use crate::catalog::{
    select_latest, DigitalOceanCatalog, KubernetesVersion, LookupError, VersionCatalog,
};
use crate::config::{load_cluster_config, load_plan_file, ConfigError, Settings, SettingsError};
use crate::resolver::{
    diff_plans, precheck_constraints, validate_config, Plan, PlannedChange, ResolveError,
    Resolver, ValidationResult,
};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Lookup(#[from] LookupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Catalog client built from settings, authenticated when a token is available
pub fn build_catalog(settings: &Settings) -> DigitalOceanCatalog {
    let catalog = DigitalOceanCatalog::new(settings.api_url.clone(), settings.timeout());
    match settings.token() {
        Some(token) => catalog.with_token(token),
        None => {
            info!(
                "{} is not set; querying the version catalog without a token",
                settings.token_env
            );
            catalog
        }
    }
}

// ============================================================================
// Validate
// ============================================================================

/// Validate a configuration file. Never touches the network.
/// Graph constraints are checked too, so a passing file only fails `plan` on
/// the version lookup. A passing result still carries any warnings.
pub fn validate_file(path: &Path, settings: &Settings) -> CommandResult<ValidationResult> {
    let config = load_cluster_config(path)?;
    let validated = match validate_config(&config) {
        Ok(validated) => validated,
        Err(result) => return Ok(result),
    };

    let mut result = ValidationResult::new();
    for violation in precheck_constraints(&validated, &settings.resolver_defaults()) {
        result.add(violation.into());
    }
    for warning in validated.warnings {
        result.add(warning);
    }
    Ok(result)
}

// ============================================================================
// Plan / Diff
// ============================================================================

/// Resolve a configuration file into a plan
pub async fn plan_file(
    path: &Path,
    catalog: &dyn VersionCatalog,
    settings: &Settings,
) -> CommandResult<Plan> {
    let config = load_cluster_config(path)?;
    let resolver = Resolver::new(catalog).with_defaults(settings.resolver_defaults());
    Ok(resolver.resolve(&config).await?)
}

/// Resolve a configuration file and compare it with a saved plan
pub async fn diff_file(
    previous: &Path,
    path: &Path,
    catalog: &dyn VersionCatalog,
    settings: &Settings,
) -> CommandResult<Vec<PlannedChange>> {
    let previous = load_plan_file(previous)?;
    let next = plan_file(path, catalog, settings).await?;
    Ok(diff_plans(&previous, &next)?)
}

/// Write a plan as pretty JSON, creating parent directories
pub fn save_plan(plan: &Plan, path: &Path) -> CommandResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(plan)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Render a plan in the requested format
pub fn render_plan(plan: &Plan, format: OutputFormat) -> CommandResult<String> {
    Ok(match format {
        OutputFormat::Table => super::format_plan(plan),
        OutputFormat::Json => serde_json::to_string_pretty(plan)?,
        OutputFormat::Yaml => {
            serde_yaml::to_string(plan).map_err(|e| CommandError::Yaml(e.to_string()))?
        }
    })
}

/// Render a change list in the requested format
pub fn render_changes(changes: &[PlannedChange], format: OutputFormat) -> CommandResult<String> {
    Ok(match format {
        OutputFormat::Table => super::format_changes(changes),
        OutputFormat::Json => serde_json::to_string_pretty(changes)?,
        OutputFormat::Yaml => {
            serde_yaml::to_string(changes).map_err(|e| CommandError::Yaml(e.to_string()))?
        }
    })
}

// ============================================================================
// Versions
// ============================================================================

/// Available versions, newest first, optionally filtered by prefix
pub async fn list_versions(
    catalog: &dyn VersionCatalog,
    prefix: Option<&str>,
) -> CommandResult<Vec<KubernetesVersion>> {
    let mut remaining = catalog.available_versions().await?;
    let prefix = prefix.unwrap_or("");

    let mut sorted = Vec::with_capacity(remaining.len());
    while let Some(latest) = select_latest(&remaining, prefix) {
        remaining.retain(|v| v.slug != latest.slug);
        sorted.push(latest);
    }
    Ok(sorted)
}
