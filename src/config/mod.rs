pub mod input;
pub mod parse;
pub mod settings;

pub use input::{
    AddonInput, ClusterConfig, FirewallInput, FirewallRuleInput, MaintenancePolicyInput,
    NodePoolInput, ProjectInput, RegistryInput, TaintInput,
};
pub use parse::{parse_cluster_config, strip_jsonc_comments, InputFormat, ParseError};
pub use settings::{load_settings, load_settings_from, Settings, SettingsError};

use std::path::Path;
use thiserror::Error;

use crate::resolver::Plan;

/// Errors for file I/O operations (separate from pure parsing errors)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cluster config error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Plan file is not valid JSON: {0}")]
    PlanError(String),
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load a cluster configuration; `.yaml`/`.yml` files are YAML, anything else JSONC
pub fn load_cluster_config(path: &Path) -> Result<ClusterConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let format = InputFormat::from_extension(path.extension().and_then(|e| e.to_str()));
    Ok(parse_cluster_config(&content, format)?)
}

/// Load a plan previously written with `doksplan plan --output json`
pub fn load_plan_file(path: &Path) -> Result<Plan, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ConfigError::PlanError(e.to_string()))
}
