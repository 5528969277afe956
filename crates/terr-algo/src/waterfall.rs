//! Waterfall engine (C8): the priority-ordered cascade of §4.8.
//!
//! Each enabled stage in `priority_config` gets first crack at the accounts still
//! unplaced when it runs; whatever it cannot place flows down to the next stage.
//! Manual holdover always runs first and residual optimization always runs last,
//! regardless of what `priority_config` says: they are not configurable stages.
//!
//! The capacity-aware override for the stability-accounts stage (§9 Open Question) is
//! computed exactly once, from the *current* (pre-solve) load snapshot, before any
//! stage runs. Re-evaluating it per account as the waterfall progresses would let an
//! account's lock outcome depend on processing order, which the resolved Open Question
//! rules out explicitly.

use std::collections::HashMap;

use terr_core::diagnostics::Diagnostics;
use terr_core::{
    Account, AccountId, BalancePenalties, Configuration, PriorityKind, Rep, RepId, ScoringConstants,
};

use crate::dispatch::{DispatchOutcome, SolverDispatcher, SolverSession};
use crate::eligibility::{compute_eligibility, restrict_to_known_parent_rep};
use crate::locks::{manual_lock_for_account, stability_lock_for_account, LockReason};
use crate::model::build_assignment_problem;
use crate::scoring::{continuity_score, geography_score};
use crate::weights::normalize;
use terr_core::classify::{effective_arr, is_customer};

/// One account's placement by the waterfall, tagged with the stage that placed it and,
/// for locked stages, the specific lock reason (carried through to rationale, C11).
#[derive(Debug, Clone)]
pub struct StagePlacement {
    pub account_id: AccountId,
    pub rep_id: RepId,
    pub stage: PriorityKind,
    pub lock_reason: Option<LockReason>,
}

/// Result of running the full waterfall over one account set (§4.8).
#[derive(Debug, Clone, Default)]
pub struct WaterfallResult {
    pub placements: Vec<StagePlacement>,
    /// Accounts no stage could place, with the cause to report on the `Unassigned` entity.
    pub unplaced: Vec<(AccountId, terr_core::UnassignedCause)>,
    pub balance_slack_total: f64,
    pub solve_time_ms: u64,
}

#[derive(Default, Clone, Copy)]
struct CurrentLoad {
    arr: f64,
    cre: f64,
    count: u32,
}

fn snapshot_current_loads(accounts: &[Account]) -> HashMap<RepId, CurrentLoad> {
    let mut loads: HashMap<RepId, CurrentLoad> = HashMap::new();
    for account in accounts {
        let Some(owner_id) = &account.current_owner_id else {
            continue;
        };
        let load = loads.entry(owner_id.clone()).or_default();
        load.arr += effective_arr(account);
        if account.cre_risk {
            load.cre += 1.0;
        }
        load.count += 1;
    }
    loads
}

fn rep_at_or_over_cap(rep_id: &RepId, reps: &HashMap<RepId, Rep>, loads: &HashMap<RepId, CurrentLoad>) -> bool {
    let Some(rep) = reps.get(rep_id) else {
        return false;
    };
    let load = loads.get(rep_id).copied().unwrap_or_default();
    if let Some(max) = rep.capacity_max_arr {
        if load.arr >= max {
            return true;
        }
    }
    if let Some(max) = rep.capacity_max_cre {
        if load.cre >= max {
            return true;
        }
    }
    if let Some(max) = rep.capacity_max_accounts {
        if load.count >= max {
            return true;
        }
    }
    false
}

fn known_parent_rep(
    account_id: &AccountId,
    placements: &[StagePlacement],
) -> Option<RepId> {
    placements
        .iter()
        .find(|p| &p.account_id == account_id)
        .map(|p| p.rep_id.clone())
}

/// Run the waterfall engine over `accounts` (§4.8). `reps` must be keyed by id.
/// `today` is the caller-supplied reference date used by every date-sensitive rule.
pub fn run(
    accounts: &[Account],
    reps: &HashMap<RepId, Rep>,
    configuration: &Configuration,
    session: &SolverSession,
    today: chrono::NaiveDate,
    diagnostics: &mut Diagnostics,
) -> WaterfallResult {
    let mut placements: Vec<StagePlacement> = Vec::new();
    let mut remaining: Vec<&Account> = accounts.iter().collect();
    let mut balance_slack_total = 0.0;
    let mut solve_time_ms = 0u64;

    let current_loads = snapshot_current_loads(accounts);
    // Resolved Open Question (§9): computed once, before the stability stage runs, and
    // never re-derived mid-cascade.
    let capacity_override_enabled = configuration.constraint_flags.capacity_hard_cap;

    // Stage 0: manual holdover. Always first, not gated by priority_config.
    remaining.retain(|account| {
        match manual_lock_for_account(account, reps, &configuration.stability_flags) {
            Some(lock) => {
                diagnostics.add_warning_with_entity("lock", lock.reason.description(), account.id.value());
                placements.push(StagePlacement {
                    account_id: lock.account_id,
                    rep_id: lock.rep_id,
                    stage: PriorityKind::ManualHoldover,
                    lock_reason: Some(LockReason::Manual),
                });
                false
            }
            None => true,
        }
    });

    // Stage 1: stability accounts, if configured and enabled.
    if stage_enabled(configuration, PriorityKind::StabilityAccounts) {
        remaining.retain(|account| {
            match stability_lock_for_account(account, reps, &configuration.stability_flags, today) {
                Some(lock) => {
                    if capacity_override_enabled && rep_at_or_over_cap(&lock.rep_id, reps, &current_loads) {
                        diagnostics.add_warning_with_entity(
                            "lock",
                            "stability lock released: current owner at or over capacity",
                            account.id.value(),
                        );
                        true
                    } else {
                        diagnostics.add_warning_with_entity("lock", lock.reason.description(), account.id.value());
                        placements.push(StagePlacement {
                            account_id: lock.account_id,
                            rep_id: lock.rep_id,
                            stage: PriorityKind::StabilityAccounts,
                            lock_reason: Some(lock.reason),
                        });
                        false
                    }
                }
                None => true,
            }
        });
    }

    // Stages 2-5: optimization stages, each narrowing eligibility by its own predicate.
    if stage_enabled(configuration, PriorityKind::TeamAlignment) {
        run_optimization_stage(
            &mut remaining,
            reps,
            configuration,
            PriorityKind::TeamAlignment,
            &placements.clone(),
            session,
            today,
            &mut placements,
            &mut balance_slack_total,
            &mut solve_time_ms,
            diagnostics,
            move |account, rep, sc, _today| {
                crate::scoring::team_alignment_score(account.employees, rep.team_tier, sc)
                    .map(|s| s >= sc.min_tier_match_pct)
                    .unwrap_or(false)
            },
        );
    }
    if stage_enabled(configuration, PriorityKind::GeographyAndContinuity) {
        run_optimization_stage(
            &mut remaining,
            reps,
            configuration,
            PriorityKind::GeographyAndContinuity,
            &placements.clone(),
            session,
            today,
            &mut placements,
            &mut balance_slack_total,
            &mut solve_time_ms,
            diagnostics,
            {
                let territory_mappings = configuration.territory_mappings.clone();
                move |account, rep, sc, today| {
                    geography_score(account, rep, &territory_mappings, sc) >= sc.sibling_threshold
                        && continuity_score(account, rep, today, sc) >= sc.parent_continuity_threshold
                }
            },
        );
    }
    if stage_enabled(configuration, PriorityKind::ContinuityOnly) {
        run_optimization_stage(
            &mut remaining,
            reps,
            configuration,
            PriorityKind::ContinuityOnly,
            &placements.clone(),
            session,
            today,
            &mut placements,
            &mut balance_slack_total,
            &mut solve_time_ms,
            diagnostics,
            |account, rep, sc, today| continuity_score(account, rep, today, sc) >= sc.parent_continuity_threshold,
        );
    }
    if stage_enabled(configuration, PriorityKind::GeographyOnly) {
        run_optimization_stage(
            &mut remaining,
            reps,
            configuration,
            PriorityKind::GeographyOnly,
            &placements.clone(),
            session,
            today,
            &mut placements,
            &mut balance_slack_total,
            &mut solve_time_ms,
            diagnostics,
            {
                let territory_mappings = configuration.territory_mappings.clone();
                move |account, rep, sc, _today| {
                    geography_score(account, rep, &territory_mappings, sc) >= sc.sibling_threshold
                }
            },
        );
    }

    // Final stage: residual optimization. Always runs, over whatever is left, with no
    // predicate filter and no balance penalties (hard capacity + linking only, §4.8).
    let mut unplaced = Vec::new();
    if !remaining.is_empty() {
        let prior_placements = placements.clone();
        let mut elig = compute_eligibility(&remaining, reps, configuration.constraint_flags.strategic_pool, diagnostics);
        restrict_to_known_parent_rep(
            &mut elig,
            &remaining,
            configuration.constraint_flags.parent_child_linking,
            |parent_id| known_parent_rep(parent_id, &prior_placements),
            diagnostics,
        );

        let solvable: Vec<&Account> = remaining
            .iter()
            .copied()
            .filter(|a| elig.get(&a.id).map(|e| !e.0.is_empty()).unwrap_or(false))
            .collect();
        let empty_eligibility: Vec<AccountId> = remaining
            .iter()
            .filter(|a| elig.get(&a.id).map(|e| e.0.is_empty()).unwrap_or(true))
            .map(|a| a.id.clone())
            .collect();
        for account_id in empty_eligibility {
            unplaced.push((account_id, terr_core::UnassignedCause::NoEligibleRep));
        }

        if !solvable.is_empty() {
            let weights_of = |a: &Account| {
                normalize(&if is_customer(a) {
                    configuration.customer_weights
                } else {
                    configuration.prospect_weights
                })
            };
            let problem = build_assignment_problem(
                &solvable,
                reps,
                &elig,
                weights_of,
                &configuration.territory_mappings,
                &configuration.scoring_constants,
                today,
                &configuration.constraint_flags,
                &BalancePenalties::default(),
            );
            let dispatcher = SolverDispatcher::new(session);
            match dispatcher.dispatch(&problem, &configuration.solver_settings, diagnostics) {
                DispatchOutcome::Solved(solution) => {
                    balance_slack_total += solution.balance_slack_total;
                    solve_time_ms += solution.solve_time_ms;
                    for (account_id, rep_id) in solution.assignment {
                        placements.push(StagePlacement {
                            account_id,
                            rep_id,
                            stage: PriorityKind::ResidualOptimization,
                            lock_reason: None,
                        });
                    }
                }
                DispatchOutcome::UseHeuristicFallback => {
                    diagnostics.add_warning(
                        "solver",
                        "residual optimization stage could not solve; accounts left unassigned",
                    );
                    for account in &solvable {
                        unplaced.push((account.id.clone(), terr_core::UnassignedCause::SolverFailure));
                    }
                }
            }
        }
    }

    WaterfallResult {
        placements,
        unplaced,
        balance_slack_total,
        solve_time_ms,
    }
}

fn stage_enabled(configuration: &Configuration, kind: PriorityKind) -> bool {
    configuration
        .priority_config
        .iter()
        .any(|s| s.kind == kind && s.enabled)
}

/// Run one filtered-optimization stage (§4.8): narrow eligibility by `predicate`,
/// restrict parent-linked children to their already-placed parent's rep, solve a mini
/// MIP over whatever remains solvable, and leave everything else in `remaining` to flow
/// down to the next stage.
#[allow(clippy::too_many_arguments)]
fn run_optimization_stage(
    remaining: &mut Vec<&Account>,
    reps: &HashMap<RepId, Rep>,
    configuration: &Configuration,
    stage: PriorityKind,
    prior_placements: &[StagePlacement],
    session: &SolverSession,
    today: chrono::NaiveDate,
    placements: &mut Vec<StagePlacement>,
    balance_slack_total: &mut f64,
    solve_time_ms: &mut u64,
    diagnostics: &mut Diagnostics,
    predicate: impl Fn(&Account, &Rep, &ScoringConstants, chrono::NaiveDate) -> bool,
) {
    if remaining.is_empty() {
        return;
    }

    let mut elig = compute_eligibility(remaining, reps, configuration.constraint_flags.strategic_pool, diagnostics);
    for account in remaining.iter() {
        if let Some(entry) = elig.get_mut(&account.id) {
            entry.0.retain(|rep_id| {
                reps.get(rep_id)
                    .map(|rep| predicate(account, rep, &configuration.scoring_constants, today))
                    .unwrap_or(false)
            });
        }
    }
    restrict_to_known_parent_rep(
        &mut elig,
        remaining,
        configuration.constraint_flags.parent_child_linking,
        |parent_id| known_parent_rep(parent_id, prior_placements),
        diagnostics,
    );

    let solvable: Vec<&Account> = remaining
        .iter()
        .copied()
        .filter(|a| elig.get(&a.id).map(|e| !e.0.is_empty()).unwrap_or(false))
        .collect();
    if solvable.is_empty() {
        return;
    }

    let weights_of = |a: &Account| {
        normalize(&if is_customer(a) {
            configuration.customer_weights
        } else {
            configuration.prospect_weights
        })
    };
    let problem = build_assignment_problem(
        &solvable,
        reps,
        &elig,
        weights_of,
        &configuration.territory_mappings,
        &configuration.scoring_constants,
        today,
        &configuration.constraint_flags,
        &configuration.balance_penalties,
    );

    let dispatcher = SolverDispatcher::new(session);
    match dispatcher.dispatch(&problem, &configuration.solver_settings, diagnostics) {
        DispatchOutcome::Solved(solution) => {
            *balance_slack_total += solution.balance_slack_total;
            *solve_time_ms += solution.solve_time_ms;
            let placed_ids: std::collections::HashSet<AccountId> = solution.assignment.keys().cloned().collect();
            for (account_id, rep_id) in solution.assignment {
                placements.push(StagePlacement {
                    account_id,
                    rep_id,
                    stage,
                    lock_reason: None,
                });
            }
            remaining.retain(|a| !placed_ids.contains(&a.id));
        }
        DispatchOutcome::UseHeuristicFallback => {
            diagnostics.add_warning(
                "solver",
                &format!("{stage:?} stage could not solve; accounts flow to the next stage"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::registry::SolverRegistry;
    use terr_core::{ConstraintFlags, Mode, ObjectiveWeights, PriorityStep, StabilityFlags};

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    fn session() -> SolverSession {
        SolverSession::new(SolverRegistry::new(), 50)
    }

    fn configuration(priority_config: Vec<PriorityStep>) -> Configuration {
        Configuration::new(
            Mode::Waterfall,
            ObjectiveWeights::default(),
            ObjectiveWeights::default(),
            StabilityFlags::default(),
            ConstraintFlags::default(),
            BalancePenalties::default(),
            HashMap::new(),
            priority_config,
            ScoringConstants::default(),
            terr_core::SolverSettings::default(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn manual_holdover_always_runs_even_with_empty_priority_config() {
        let mut account = Account::new("A-1");
        account.exclude_from_reassignment = true;
        account.current_owner_id = Some(RepId::new("R-1"));
        let reps = HashMap::from([(RepId::new("R-1"), Rep::new("R-1"))]);
        let config = configuration(Vec::new());
        let session = session();
        let mut diag = Diagnostics::new();
        let result = run(&[account], &reps, &config, &session, today(), &mut diag);
        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.placements[0].stage, PriorityKind::ManualHoldover);
    }

    #[test]
    fn disabled_stage_is_skipped_leaving_accounts_for_residual() {
        let account = Account::new("A-1");
        let reps = HashMap::from([(RepId::new("R-1"), Rep::new("R-1"))]);
        // No stages enabled: everything should fall through to residual optimization,
        // which in turn reports UseHeuristicFallback (no registered backend) as unplaced.
        let config = configuration(Vec::new());
        let session = session();
        let mut diag = Diagnostics::new();
        let result = run(&[account.clone()], &reps, &config, &session, today(), &mut diag);
        assert!(result.placements.is_empty());
        assert_eq!(result.unplaced.len(), 1);
        assert_eq!(result.unplaced[0].0, account.id);
    }

    #[test]
    fn stability_lock_released_when_owner_at_capacity() {
        let mut account = Account::new("A-1");
        account.cre_risk = true;
        account.current_owner_id = Some(RepId::new("R-1"));
        account.arr_primary = Some(100.0);
        let mut rep = Rep::new("R-1");
        rep.capacity_max_arr = Some(50.0); // already under the account's own ARR at start
        let reps = HashMap::from([(RepId::new("R-1"), rep)]);
        let config = configuration(vec![PriorityStep {
            kind: PriorityKind::StabilityAccounts,
            enabled: true,
            position: 1,
        }]);
        let session = session();
        let mut diag = Diagnostics::new();
        let result = run(&[account.clone()], &reps, &config, &session, today(), &mut diag);
        // Released: falls through the stability stage, ends up unplaced (no backend registered).
        assert!(result.placements.iter().all(|p| p.stage != PriorityKind::StabilityAccounts));
    }
}
