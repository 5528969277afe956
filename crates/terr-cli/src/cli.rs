//! Command structures and arg parsing (via `clap`), mirroring the teacher's derive-based
//! `Cli`/`Commands` split.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "territory-opt", version, about = "Sales territory assignment optimizer")]
pub struct Cli {
    /// Log verbosity passed to `tracing-subscriber`'s `EnvFilter` (e.g. "info", "debug").
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one solve over an account/rep snapshot and print the result.
    Solve {
        /// JSON snapshot: `{"accounts": [...], "reps": [...]}` (§6.1).
        #[arg(long)]
        input: PathBuf,

        /// TOML configuration file. Omit to use built-in defaults (§4.12).
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Reference date every date-sensitive rule measures against, as `YYYY-MM-DD`.
        /// Defaults to the current local date; pass this for a reproducible run.
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Validate a configuration file without running a solve.
    ValidateConfig {
        #[arg(long)]
        config: PathBuf,
    },

    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn build_cli_command() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
