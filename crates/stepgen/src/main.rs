//! Command-line entry point for stepgen.
//!
//! Reads the configuration, runs one generation pass and exits with `2` on
//! configuration errors and `1` on any other fatal diagnostic.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use stepgen::config::{ConfigOverrides, GeneratorConfig, LogLevel};
use stepgen::error::GeneratorError;
use stepgen::logging::init_logging;
use stepgen::pipeline::{FsSuiteWriter, run};

/// Generate jest-cucumber suites from Gherkin documents and ECMAScript step
/// definitions.
#[derive(Parser, Debug)]
#[command(name = "stepgen", version, about)]
struct Args {
    /// Project configuration file (defaults to `stepgen.json` when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root searched for `*.stepdefinitions.*` files.
    #[arg(long)]
    steps: Option<PathBuf>,

    /// Root searched for `.feature` documents.
    #[arg(long)]
    features: Option<PathBuf>,

    /// Where feature digests are recorded between runs.
    #[arg(long)]
    hash_file: Option<PathBuf>,

    /// Regenerate every suite and leave the hash record untouched.
    #[arg(long)]
    force: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn main() {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            let fallback = GeneratorConfig::default();
            init_logging(&fallback);
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "starting stepgen");

    if let Err(e) = run(&config, &mut FsSuiteWriter) {
        tracing::error!("{e}");
        std::process::exit(if e.is_config() { 2 } else { 1 });
    }
}

fn build_config(args: &Args) -> Result<GeneratorConfig, GeneratorError> {
    let config = GeneratorConfig::load(args.config.as_deref())?;
    Ok(config.apply_overrides(ConfigOverrides {
        steps: args.steps.clone(),
        features: args.features.clone(),
        hash_file: args.hash_file.clone(),
        force: args.force,
        log_level: args.log_level,
    }))
}
