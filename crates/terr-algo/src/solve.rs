//! Solve orchestration (C12): the public entry point that ties every other stage
//! together into one `{accounts, reps, Configuration} -> SolveResult` call.
//!
//! Mirrors the teacher's top-level `solve_opf` entry point: validate, dispatch to the
//! configured engine, and turn whatever comes back into the output entities: nothing
//! else in this crate reaches for `tracing` or builds a `Proposal` directly.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, info_span};

use terr_core::diagnostics::Diagnostics;
use terr_core::error::FatalError;
use terr_core::{Account, AccountId, Configuration, Mode, Proposal, Rep, RepId, Scores, Unassigned, UnassignedCause};

use crate::dispatch::SolverSession;
use crate::locks::{evaluate_locks, LockReason};
use crate::metrics::{compute_metrics, Metrics};
use crate::rationale::{locked_rationale, scored_confidence, scored_rationale};
use crate::relaxed::{self, RelaxedOutcome};
use crate::scoring::{continuity_score, geography_score, team_alignment_score};
use crate::validation::check_input_invariants;
use crate::waterfall;
use crate::weights::normalize;
use terr_core::classify::is_customer;

/// Everything one call to [`solve`] produces (§3.1, §6.3).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolveResult {
    pub proposals: Vec<Proposal>,
    pub unassigned: Vec<Unassigned>,
    pub metrics: Metrics,
    /// Non-fatal issues accumulated across every stage of this solve. A solve with
    /// errors in here still returns a fully consistent `proposals`/`unassigned` split:
    /// the errors explain *why* an account landed where it did, they never gate it.
    pub diagnostics: Diagnostics,
}

struct Placement {
    account_id: AccountId,
    rep_id: RepId,
    lock_reason: Option<LockReason>,
}

/// Run one full solve over `accounts`/`reps` under `configuration` (§1).
///
/// `today` is the caller-supplied reference date every date-sensitive rule measures
/// against; `session` carries the registered MIP backends and the remote-call quota
/// counter across however many dispatcher calls this solve makes.
///
/// Returns `Err` only for the two classes of error in §7 that are detectable before a
/// solve ever starts (`Configuration` is validated at construction time already, so in
/// practice only `InputInvariantError` reaches this function). Everything else,
/// no eligible rep, solver timeouts, degraded fallbacks, is folded into
/// `SolveResult::unassigned` and `SolveResult::diagnostics`.
pub fn solve(
    accounts: &[Account],
    reps: &[Rep],
    configuration: &Configuration,
    today: chrono::NaiveDate,
    session: &SolverSession,
) -> Result<SolveResult, FatalError> {
    let _span = info_span!(
        "solve",
        accounts = accounts.len(),
        reps = reps.len(),
        mode = ?configuration.mode,
    )
    .entered();

    check_input_invariants(accounts, reps)?;

    let reps_by_id: HashMap<RepId, Rep> = reps.iter().cloned().map(|r| (r.id.clone(), r)).collect();
    let accounts_by_id: HashMap<AccountId, &Account> = accounts.iter().map(|a| (a.id.clone(), a)).collect();

    let mut diagnostics = Diagnostics::new();
    let mut placements: Vec<Placement> = Vec::new();
    let mut unassigned: Vec<Unassigned> = Vec::new();
    let mut solve_time_ms = 0u64;
    let mut balance_slack_total = 0.0;

    match configuration.mode {
        Mode::Waterfall => {
            let result = waterfall::run(accounts, &reps_by_id, configuration, session, today, &mut diagnostics);
            solve_time_ms += result.solve_time_ms;
            balance_slack_total += result.balance_slack_total;
            for p in result.placements {
                placements.push(Placement {
                    account_id: p.account_id,
                    rep_id: p.rep_id,
                    lock_reason: p.lock_reason,
                });
            }
            for (account_id, cause) in result.unplaced {
                unassigned.push(Unassigned {
                    account_id,
                    cause,
                    detail: cause.to_string(),
                });
            }
        }
        Mode::Relaxed => {
            let partition = evaluate_locks(accounts, &reps_by_id, &configuration.stability_flags, today, &mut diagnostics);
            for lock in &partition.locked {
                placements.push(Placement {
                    account_id: lock.account_id.clone(),
                    rep_id: lock.rep_id.clone(),
                    lock_reason: Some(lock.reason),
                });
            }

            let free_accounts: Vec<&Account> = partition
                .free
                .iter()
                .filter_map(|id| accounts_by_id.get(id).copied())
                .collect();
            let locked_parent_rep =
                |id: &AccountId| partition.locked.iter().find(|l| &l.account_id == id).map(|l| l.rep_id.clone());

            let run = relaxed::run(&free_accounts, &reps_by_id, configuration, session, today, locked_parent_rep, &mut diagnostics);
            for account_id in &run.no_eligible_rep {
                unassigned.push(Unassigned {
                    account_id: account_id.clone(),
                    cause: UnassignedCause::NoEligibleRep,
                    detail: UnassignedCause::NoEligibleRep.to_string(),
                });
            }

            match run.outcome {
                RelaxedOutcome::Solved(solution) => {
                    solve_time_ms += solution.solve_time_ms;
                    balance_slack_total += solution.balance_slack_total;
                    for (account_id, rep_id) in solution.assignment {
                        placements.push(Placement {
                            account_id,
                            rep_id,
                            lock_reason: None,
                        });
                    }
                }
                RelaxedOutcome::UseHeuristicFallback => {
                    // §4.7 step 4 applies "regardless of configured mode": discard the
                    // relaxed attempt entirely and resolve the whole account set (locks
                    // included) through the waterfall cascade instead.
                    diagnostics.add_warning(
                        "solver",
                        "relaxed engine exhausted every MIP backend; falling back to the waterfall heuristic over the full account set",
                    );
                    placements.clear();
                    unassigned.clear();

                    let result = waterfall::run(accounts, &reps_by_id, configuration, session, today, &mut diagnostics);
                    solve_time_ms += result.solve_time_ms;
                    balance_slack_total += result.balance_slack_total;
                    for p in result.placements {
                        placements.push(Placement {
                            account_id: p.account_id,
                            rep_id: p.rep_id,
                            lock_reason: p.lock_reason,
                        });
                    }
                    for (account_id, cause) in result.unplaced {
                        unassigned.push(Unassigned {
                            account_id,
                            cause,
                            detail: cause.to_string(),
                        });
                    }
                }
            }
        }
    }

    let mut proposals = Vec::with_capacity(placements.len());
    for placement in &placements {
        let (Some(account), Some(rep)) = (accounts_by_id.get(&placement.account_id), reps_by_id.get(&placement.rep_id)) else {
            continue;
        };
        proposals.push(build_proposal(account, rep, placement.lock_reason, configuration, today));
    }
    proposals.sort_by(|a, b| a.account_id.value().cmp(b.account_id.value()));
    unassigned.sort_by(|a, b| a.account_id.value().cmp(b.account_id.value()));

    // Every input account must appear in proposals or unassigned exactly once (§6.3).
    // Nothing in the engines above should leave a gap, but this is the one place that
    // can see the whole input set at once to guarantee it.
    let placed_ids: std::collections::HashSet<&AccountId> = placements.iter().map(|p| &p.account_id).collect();
    let reported_unassigned: std::collections::HashSet<&AccountId> = unassigned.iter().map(|u| &u.account_id).collect();
    for account in accounts {
        if !placed_ids.contains(&account.id) && !reported_unassigned.contains(&account.id) {
            diagnostics.add_error_with_entity(
                "solve",
                "account was not covered by any engine stage",
                account.id.value(),
            );
            unassigned.push(Unassigned {
                account_id: account.id.clone(),
                cause: UnassignedCause::InfeasibleCapacity,
                detail: "account was not covered by any engine stage".to_string(),
            });
        }
    }
    unassigned.sort_by(|a, b| a.account_id.value().cmp(b.account_id.value()));

    let reps_by_id_ref: HashMap<RepId, &Rep> = reps.iter().map(|r| (r.id.clone(), r)).collect();
    let metrics = compute_metrics(
        &proposals,
        &accounts_by_id,
        &reps_by_id_ref,
        &configuration.scoring_constants,
        &configuration.territory_mappings,
        solve_time_ms,
        balance_slack_total,
        accounts.len(),
    );

    info!(
        proposals = proposals.len(),
        unassigned = unassigned.len(),
        issues = diagnostics.issues.len(),
        "solve finished"
    );

    Ok(SolveResult {
        proposals,
        unassigned,
        metrics,
        diagnostics,
    })
}

fn build_proposal(
    account: &Account,
    rep: &Rep,
    lock_reason: Option<LockReason>,
    configuration: &Configuration,
    today: chrono::NaiveDate,
) -> Proposal {
    let weights = normalize(&if is_customer(account) {
        configuration.customer_weights
    } else {
        configuration.prospect_weights
    });
    let geography = geography_score(account, rep, &configuration.territory_mappings, &configuration.scoring_constants);
    let continuity = continuity_score(account, rep, today, &configuration.scoring_constants);
    let team_alignment = team_alignment_score(account.employees, rep.team_tier, &configuration.scoring_constants);

    let (rationale, confidence) = if let Some(reason) = lock_reason {
        (locked_rationale(reason, &configuration.priority_config), 1.0)
    } else {
        let rationale = scored_rationale(
            geography,
            continuity,
            team_alignment,
            weights,
            &configuration.scoring_constants,
            &configuration.priority_config,
        );
        let confidence = scored_confidence(geography, continuity, team_alignment, weights);
        (rationale, confidence)
    };

    Proposal {
        account_id: account.id.clone(),
        rep_id: rep.id.clone(),
        priority_label: rationale.label.clone(),
        rationale: rationale.to_string(),
        scores: Scores {
            geography: Some(geography),
            continuity: Some(continuity),
            team_alignment,
        },
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::registry::SolverRegistry;
    use terr_core::{BalancePenalties, ConstraintFlags, ObjectiveWeights, ScoringConstants, StabilityFlags};

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    fn session() -> SolverSession {
        SolverSession::new(SolverRegistry::new(), 50)
    }

    fn configuration(mode: Mode) -> Configuration {
        Configuration::new(
            mode,
            ObjectiveWeights::default(),
            ObjectiveWeights::default(),
            StabilityFlags::default(),
            ConstraintFlags::default(),
            BalancePenalties::default(),
            HashMap::new(),
            Vec::new(),
            ScoringConstants::default(),
            terr_core::SolverSettings::default(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_account_ids_before_solving() {
        let accounts = vec![Account::new("A-1"), Account::new("A-1")];
        let reps = vec![Rep::new("R-1")];
        let err = solve(&accounts, &reps, &configuration(Mode::Waterfall), today(), &session()).unwrap_err();
        assert!(matches!(err, FatalError::InputInvariant(_)));
    }

    #[test]
    fn manual_lock_produces_a_p0_proposal_with_full_confidence() {
        let mut account = Account::new("A-1");
        account.exclude_from_reassignment = true;
        account.current_owner_id = Some(RepId::new("R-1"));
        let accounts = vec![account.clone()];
        let reps = vec![Rep::new("R-1")];
        let result = solve(&accounts, &reps, &configuration(Mode::Waterfall), today(), &session()).unwrap();
        assert_eq!(result.proposals.len(), 1);
        assert_eq!(result.proposals[0].priority_label, "P0");
        assert_eq!(result.proposals[0].confidence, 1.0);
        assert!(result.unassigned.is_empty());
    }

    #[test]
    fn every_input_account_appears_exactly_once() {
        let mut locked = Account::new("A-1");
        locked.exclude_from_reassignment = true;
        locked.current_owner_id = Some(RepId::new("R-1"));
        let free = Account::new("A-2"); // no eligible rep registered
        let accounts = vec![locked, free.clone()];
        let reps = vec![Rep::new("R-1")];
        let result = solve(&accounts, &reps, &configuration(Mode::Waterfall), today(), &session()).unwrap();
        assert_eq!(result.proposals.len() + result.unassigned.len(), 2);
        assert!(result.unassigned.iter().any(|u| u.account_id == free.id));
    }

    #[test]
    fn relaxed_mode_falls_back_to_waterfall_when_no_backend_registered() {
        let account = Account::new("A-1");
        let accounts = vec![account.clone()];
        let reps = vec![Rep::new("R-1")];
        let result = solve(&accounts, &reps, &configuration(Mode::Relaxed), today(), &session()).unwrap();
        assert!(result
            .diagnostics
            .issues_by_category("solver")
            .any(|i| i.message.contains("falling back to the waterfall heuristic")));
        assert_eq!(result.proposals.len() + result.unassigned.len(), 1);
    }
}
