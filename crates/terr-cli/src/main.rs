use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use terr_cli::cli::{Cli, Commands};
use terr_cli::commands::{completions, solve, validate_config};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default tracing subscriber failed");

    let result = match cli.command {
        Commands::Solve { input, config, format, as_of } => solve::run(solve::SolveArgs {
            input,
            config,
            format,
            as_of,
        }),
        Commands::ValidateConfig { config } => validate_config::run(&config),
        Commands::Completions { shell } => completions::run(shell),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
