use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use doksplan::cli::{
    build_catalog, diff_file, format_constraints, format_validation_report, format_versions,
    list_versions, plan_file, render_changes, render_plan, save_plan, validate_file, Cli,
    CommandError, Commands,
};
use doksplan::config::{load_settings, load_settings_from, Settings};
use doksplan::resolver::ResolveError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(ref env_file) = cli.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            report(&e);
            process::exit(1);
        }
    }
}

/// Print the full error, including a validation batch or constraint list
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<CommandError>() {
        Some(CommandError::Resolve(ResolveError::Validation(result))) => {
            eprint!("{}", format_validation_report(result, "configuration"));
        }
        Some(CommandError::Resolve(ResolveError::GraphConstraint(constraints))) => {
            eprintln!("Resource graph is invalid:\n");
            eprint!("{}", format_constraints(constraints));
        }
        _ => eprintln!("Error: {:#}", err),
    }
}

fn settings_for(cli: &Cli) -> anyhow::Result<Settings> {
    let settings = match cli.config {
        Some(ref path) => load_settings_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };
    debug!("Using version catalog at {}", settings.api_url);
    Ok(settings)
}

/// Run the selected command; the returned value is the process exit code
async fn run(cli: Cli) -> anyhow::Result<i32> {
    let settings = settings_for(&cli)?;

    match cli.command {
        Commands::Validate(args) => {
            let result = validate_file(&args.file, &settings)?;
            print!(
                "{}",
                format_validation_report(&result, &args.file.display().to_string())
            );
            Ok(if result.passed { 0 } else { 1 })
        }

        Commands::Plan(args) => {
            let catalog = build_catalog(&settings);
            let plan = plan_file(&args.file, &catalog, &settings).await?;
            if let Some(ref path) = args.save {
                save_plan(&plan, path)?;
                debug!("Saved plan to {}", path.display());
            }
            println!("{}", render_plan(&plan, args.output)?);
            Ok(0)
        }

        Commands::Diff(args) => {
            let catalog = build_catalog(&settings);
            let changes = diff_file(&args.previous, &args.file, &catalog, &settings).await?;
            println!("{}", render_changes(&changes, args.output)?);
            Ok(0)
        }

        Commands::Versions(args) => {
            let catalog = build_catalog(&settings);
            let versions = list_versions(&catalog, args.prefix.as_deref()).await?;
            print!("{}", format_versions(&versions));
            Ok(0)
        }
    }
}
