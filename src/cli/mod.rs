//! CLI module for doksplan
//!
//! Subcommands:
//! - `doksplan validate` - Check a cluster configuration and list every problem
//! - `doksplan plan` - Resolve a configuration into ordered resource intents
//! - `doksplan diff` - Compare a saved plan with a fresh resolution
//! - `doksplan versions` - List Kubernetes versions offered by the provider

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "doksplan")]
#[command(about = "Resolve DigitalOcean Kubernetes cluster configurations into ordered resource plans")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to settings file (default: ~/.doksplan/config)
    #[arg(long, global = true, env = "DOKSPLAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to a .env file holding the API token
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a cluster configuration file
    Validate(ValidateArgs),

    /// Resolve a cluster configuration into a plan
    Plan(PlanArgs),

    /// Show what changed between a saved plan and the current configuration
    Diff(DiffArgs),

    /// List available Kubernetes versions
    Versions(VersionsArgs),
}

/// Output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Columnar table (default)
    #[default]
    Table,
    /// Pretty JSON
    Json,
    Yaml,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the cluster configuration (JSON, JSONC or YAML)
    pub file: PathBuf,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Path to the cluster configuration (JSON, JSONC or YAML)
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Also write the plan as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

/// Arguments for the diff command
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Plan previously saved with `plan --save`
    pub previous: PathBuf,

    /// Path to the cluster configuration (JSON, JSONC or YAML)
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for the versions command
#[derive(Parser, Debug)]
pub struct VersionsArgs {
    /// Only list versions starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::parse_from(["doksplan", "validate", "cluster.yaml"]);
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.file, PathBuf::from("cluster.yaml")),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_parse_plan_json() {
        let cli = Cli::parse_from([
            "doksplan",
            "plan",
            "cluster.json",
            "-o",
            "json",
            "--save",
            "plan.json",
        ]);
        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.output, OutputFormat::Json);
                assert_eq!(args.save, Some(PathBuf::from("plan.json")));
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_cli_parse_diff() {
        let cli = Cli::parse_from(["doksplan", "diff", "old.json", "cluster.yaml"]);
        match cli.command {
            Commands::Diff(args) => {
                assert_eq!(args.previous, PathBuf::from("old.json"));
                assert_eq!(args.output, OutputFormat::Table);
            }
            _ => panic!("Expected Diff command"),
        }
    }

    #[test]
    fn test_cli_verbose_levels() {
        let cli = Cli::parse_from(["doksplan", "-vvv", "versions"]);
        assert_eq!(cli.verbose, 3);

        let cli = Cli::parse_from(["doksplan", "versions", "--prefix", "1.31."]);
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Versions(args) => assert_eq!(args.prefix.as_deref(), Some("1.31.")),
            _ => panic!("Expected Versions command"),
        }
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli = Cli::parse_from([
            "doksplan",
            "validate",
            "c.json",
            "--config",
            "/tmp/settings",
            "--env-file",
            ".env",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/settings")));
        assert_eq!(cli.env_file, Some(PathBuf::from(".env")));
    }
}
