//! `SolverDispatcher`: the linear fallback state machine of §4.7.
//!
//! 1. In-process MIP (HiGHS) when `vars < in_process_var_threshold`.
//! 2. Remote MIP service, on step 1's absence or failure, quota permitting.
//! 3. Secondary open-source MIP (CBC) when `vars < secondary_var_threshold`.
//! 4. Heuristic fallback (the waterfall engine), regardless of configured mode.
//!
//! This mirrors the teacher's `OpfDispatcher`: a dispatcher orchestrating a registry
//! of strategy objects, rather than an `if`/`else` chain hardcoding backend names.

use std::time::Duration;
use tracing::{info, warn};

use terr_core::diagnostics::Diagnostics;
use terr_core::SolverSettings;

use super::session::SolverSession;
use super::traits::{BackendError, MipSolution};
use crate::model::AssignmentProblem;

/// What the dispatcher decided after exhausting every MIP option.
pub enum DispatchOutcome {
    Solved(MipSolution),
    /// No MIP backend could be used or all attempts failed; the caller must fall back
    /// to the waterfall heuristic, even in `relaxed` mode (§4.7 step 4).
    UseHeuristicFallback,
}

pub struct SolverDispatcher<'a> {
    session: &'a SolverSession,
}

impl<'a> SolverDispatcher<'a> {
    pub fn new(session: &'a SolverSession) -> Self {
        Self { session }
    }

    pub fn dispatch(
        &self,
        problem: &AssignmentProblem,
        settings: &SolverSettings,
        diagnostics: &mut Diagnostics,
    ) -> DispatchOutcome {
        if problem.is_empty() {
            return DispatchOutcome::Solved(MipSolution::default());
        }
        let vars = problem.variable_count();

        // Step 1: in-process MIP.
        if vars < settings.in_process_var_threshold {
            if let Some(backend) = self.session.registry.select("highs", |_| true) {
                let budget = Duration::from_secs(settings.in_process_time_budget_secs);
                info!(vars, backend = "highs", "attempting in-process solve");
                match backend.solve(problem, budget) {
                    Ok(solution) if solution.is_usable() => return DispatchOutcome::Solved(solution),
                    Ok(solution) => {
                        warn!(status = ?solution.status, "in-process solve returned unusable status");
                        diagnostics.add_warning("solver", "in-process solve did not reach a usable status");
                    }
                    Err(err) => {
                        warn!(error = %err, "in-process solve failed");
                        diagnostics.add_warning("solver", &format!("in-process solve failed: {err}"));
                    }
                }
            }
        }

        // Step 2: remote MIP service.
        if self.session.remote_quota_available() {
            if let Some(backend) = self.session.registry.select("remote", |_| true) {
                let budget_secs = if vars >= settings.remote_large_var_threshold {
                    settings.remote_large_time_budget_secs
                } else {
                    settings.remote_time_budget_secs
                };
                info!(vars, backend = "remote", budget_secs, "attempting remote solve");
                self.session.record_remote_call();
                match backend.solve(problem, Duration::from_secs(budget_secs)) {
                    Ok(solution) if solution.is_usable() => return DispatchOutcome::Solved(solution),
                    Ok(solution) => {
                        warn!(status = ?solution.status, "remote solve returned unusable status");
                        diagnostics.add_warning("solver", "remote solve did not reach a usable status");
                    }
                    Err(err) => {
                        warn!(error = %err, "remote solve failed");
                        diagnostics.add_warning("solver", &format!("remote solve failed: {err}"));
                    }
                }
            }
        } else {
            diagnostics.add_warning("solver", "daily remote solver quota exhausted; skipping remote attempt");
        }

        // Step 3: secondary open-source MIP (CBC).
        if vars < settings.secondary_var_threshold {
            if let Some(backend) = self.session.registry.select("cbc", |_| true) {
                let budget = Duration::from_secs(settings.secondary_time_budget_secs);
                info!(vars, backend = "cbc", "attempting secondary solve");
                match backend.solve(problem, budget) {
                    Ok(solution) if solution.is_usable() => return DispatchOutcome::Solved(solution),
                    Ok(solution) => {
                        warn!(status = ?solution.status, "secondary solve returned unusable status");
                        diagnostics.add_warning("solver", "secondary solve did not reach a usable status");
                    }
                    Err(err) => {
                        warn!(error = %err, "secondary solve failed");
                        diagnostics.add_warning("solver", &format!("secondary solve failed: {err}"));
                    }
                }
            }
        }

        // Step 4: heuristic fallback.
        diagnostics.add_warning(
            "solver",
            "all MIP backends exhausted or unavailable; falling back to waterfall heuristic",
        );
        DispatchOutcome::UseHeuristicFallback
    }
}

fn _assert_send_error<T: std::error::Error>() {}
#[allow(dead_code)]
fn _check() {
    _assert_send_error::<BackendError>();
}
