//! `territory-opt solve` (§4.15): loads a snapshot + configuration, runs one solve,
//! and prints the result.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use terr_algo::dispatch::{SolverRegistry, SolverSession};
use terr_solver::RemoteQuotaStore;

use crate::config::load_configuration;
use crate::output::{render, OutputFormat};
use crate::snapshot::load_snapshot;

pub struct SolveArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub as_of: Option<String>,
}

pub fn run(args: SolveArgs) -> Result<()> {
    let (accounts, reps) = load_snapshot(&args.input)?;
    let configuration = load_configuration(args.config.as_deref())?;

    let today = match args.as_of {
        Some(raw) => chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("--as-of value '{raw}' is not a YYYY-MM-DD date"))?,
        None => chrono::Local::now().date_naive(),
    };
    let today_str = today.format("%Y-%m-%d").to_string();

    // The CLI is a fresh process per invocation, so the session's in-memory quota
    // counter alone cannot enforce a *daily* cap across runs; seed it from the
    // persistent store and fold this run's calls back in afterward.
    let quota_store = RemoteQuotaStore::default_location().ok();
    let calls_already_today = quota_store
        .as_ref()
        .and_then(|store| store.calls_today(&today_str).ok())
        .unwrap_or(0);
    let remaining_quota = configuration
        .solver_settings
        .daily_remote_call_quota
        .saturating_sub(calls_already_today);

    let mut registry = SolverRegistry::new();
    #[cfg(feature = "solver-highs")]
    registry.register(Arc::new(terr_algo::dispatch::HighsBackend));
    #[cfg(feature = "solver-cbc")]
    registry.register(Arc::new(terr_algo::dispatch::CbcBackend));
    #[cfg(feature = "remote-solver")]
    registry.register(Arc::new(terr_algo::dispatch::RemoteBackend::new(
        configuration.solver_settings.remote_endpoint.as_deref(),
    )));

    let session = SolverSession::new(registry, remaining_quota);

    info!(accounts = accounts.len(), reps = reps.len(), mode = ?configuration.mode, %today_str, "starting solve");
    let result = terr_algo::run_solve(&accounts, &reps, &configuration, today, &session)?;
    info!(
        proposals = result.proposals.len(),
        unassigned = result.unassigned.len(),
        "solve finished"
    );

    if let Some(store) = &quota_store {
        for _ in 0..session.calls_today() {
            let _ = store.record_call(&today_str);
        }
    }

    render(&result, args.format)
}
