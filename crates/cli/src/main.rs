//! tenet: evaluate compliance specs against a resource inventory.
//!
//! Resources come from a fixture provider (schema YAML plus one JSON file per
//! resource type). The report is printed to stdout as JSON; logs go to stderr.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tenet_core::config::load_dotenv;
use tenet_core::TenetConfig;
use tenet_graph::{install_providers, FixtureProvider, ProviderModule, ResourceStore, StoreOptions};
use tenet_rules::{validate_spec, EvalOptions, SpecEvaluator, SpecLoader};

use crate::cli::{CliArgs, Command, EvalArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = TenetConfig::from_env();
    config.log_summary();

    match args.command {
        Command::Eval(eval_args) => eval(eval_args, config).await,
    }
}

fn required(flag: Option<PathBuf>, fallback: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    flag.or(fallback)
        .with_context(|| format!("no {what} given (flag or environment)"))
}

async fn eval(args: EvalArgs, config: TenetConfig) -> Result<ExitCode> {
    let spec_path = required(args.spec, config.paths.spec.clone(), "spec path")?;
    let schema_dir = required(args.schema_dir, config.paths.schema_dir.clone(), "schema directory")?;
    let fixtures_dir = required(args.fixtures, config.paths.fixtures_dir.clone(), "fixtures directory")?;

    let provider = FixtureProvider::new(&schema_dir, &fixtures_dir);
    let modules: Vec<&dyn ProviderModule> = vec![&provider];
    let (registry, loaders) = install_providers(modules).context("failed to install providers")?;
    let registry = Arc::new(registry);

    let (spec, results) = SpecLoader::new(&spec_path)
        .load()
        .with_context(|| format!("failed to load spec from {}", spec_path.display()))?;
    let failed = results.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        bail!("{failed} spec file(s) failed to load");
    }

    let validation = validate_spec(&spec, &registry);
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    for err in &validation.errors {
        match &err.suggestion {
            Some(hint) => error!(path = %err.path, "{} ({hint})", err.message),
            None => error!(path = %err.path, "{}", err.message),
        }
    }
    if !validation.valid {
        bail!("spec has {} validation error(s)", validation.errors.len());
    }
    if args.validate_only {
        info!(rules = spec.rules().len(), "spec is valid");
        return Ok(ExitCode::SUCCESS);
    }

    let mut evaluation = config.evaluation.clone();
    if let Some(n) = args.max_concurrency {
        evaluation.max_concurrent_rules = n.max(1);
    }
    if let Some(secs) = args.timeout {
        evaluation.run_timeout_secs = secs;
    }

    let cancel = CancellationToken::new();
    let store = Arc::new(ResourceStore::with_options(
        Arc::clone(&registry),
        loaders,
        StoreOptions {
            load_timeout: evaluation.load_timeout(),
        },
        cancel.clone(),
    ));
    let watchdog = tokio::spawn(cancel_on_interrupt(cancel, evaluation.run_timeout()));

    let evaluator = SpecEvaluator::new(registry, store, EvalOptions::from(&evaluation));
    let report = evaluator.evaluate(&spec).await;
    watchdog.abort();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Cancel the run on Ctrl-C or when the run timeout elapses.
async fn cancel_on_interrupt(cancel: CancellationToken, run_timeout: Option<Duration>) {
    let deadline = async {
        match run_timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => warn!("interrupted, cancelling run"),
        _ = deadline => warn!(timeout = ?run_timeout, "run timed out, cancelling"),
    }
    cancel.cancel();
}
