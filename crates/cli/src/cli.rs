use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Evaluate compliance specs against a resource inventory.
#[derive(Parser, Debug)]
#[command(name = "tenet", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a spec and evaluate it against fixture resources.
    Eval(EvalArgs),
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Spec file, or a directory of spec files.
    #[arg(long, env = "TENET_SPEC_PATH")]
    pub spec: Option<PathBuf>,

    /// Directory of ResourceSchema YAML documents.
    #[arg(long, env = "TENET_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Directory of `<provider>.<group>.<name>.json` resource files.
    #[arg(long, env = "TENET_FIXTURES_DIR")]
    pub fixtures: Option<PathBuf>,

    /// Cancel the run after this many seconds (0 = no limit).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Rules evaluated concurrently.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Stop after validation.
    #[arg(long)]
    pub validate_only: bool,
}
