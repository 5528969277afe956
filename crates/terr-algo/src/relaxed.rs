//! Relaxed engine (C9): a single weighted MIP over every free account (§4.9), in
//! contrast to the waterfall's priority cascade. Labels are resolved from score
//! dominance (C11) rather than from which stage placed an account.
//!
//! §4.7 step 4 applies "regardless of configured mode": if the dispatcher exhausts
//! every MIP backend, the caller must fall back to the waterfall heuristic even when
//! `relaxed` was configured. That fallback is orchestrated one level up, in `solve.rs`,
//! since it runs over the *entire* account set rather than just this engine's free
//! accounts: this module only reports that the fallback is needed.

use std::collections::HashMap;

use terr_core::diagnostics::Diagnostics;
use terr_core::{Account, AccountId, Configuration, Rep, RepId};

use crate::dispatch::{DispatchOutcome, MipSolution, SolverDispatcher, SolverSession};
use crate::eligibility::{compute_eligibility, restrict_to_known_parent_rep};
use crate::model::build_assignment_problem;
use crate::weights::normalize;
use terr_core::classify::is_customer;

/// Outcome of one relaxed pass over the free accounts (§4.9).
pub enum RelaxedOutcome {
    Solved(MipSolution),
    /// The dispatcher exhausted every MIP backend; the caller must fall back to the
    /// waterfall heuristic over the *full* account set (§4.7 step 4).
    UseHeuristicFallback,
}

/// Full result of one relaxed pass: the dispatcher's outcome over whatever had at least
/// one eligible rep, plus the accounts that never made it into the model because their
/// eligible set came back empty (§4.5): these would otherwise make the MIP's per-account
/// assignment constraint infeasible, so they are excluded before the model is ever built.
pub struct RelaxedRun {
    pub outcome: RelaxedOutcome,
    pub no_eligible_rep: Vec<AccountId>,
}

/// Run the relaxed engine over `free_accounts` (§4.9). Parent-child linkage to accounts
/// locked outside this set (e.g. a locked parent with a free child) is resolved via
/// `locked_parent_rep` before eligibility is computed, mirroring the singleton
/// restriction the waterfall applies stage-to-stage.
pub fn run(
    free_accounts: &[&Account],
    reps_by_id: &HashMap<RepId, Rep>,
    configuration: &Configuration,
    session: &SolverSession,
    today: chrono::NaiveDate,
    locked_parent_rep: impl Fn(&AccountId) -> Option<RepId>,
    diagnostics: &mut Diagnostics,
) -> RelaxedRun {
    if free_accounts.is_empty() {
        return RelaxedRun {
            outcome: RelaxedOutcome::Solved(MipSolution::default()),
            no_eligible_rep: Vec::new(),
        };
    }

    let mut eligibility = compute_eligibility(
        free_accounts,
        reps_by_id,
        configuration.constraint_flags.strategic_pool,
        diagnostics,
    );
    restrict_to_known_parent_rep(
        &mut eligibility,
        free_accounts,
        configuration.constraint_flags.parent_child_linking,
        locked_parent_rep,
        diagnostics,
    );

    let solvable: Vec<&Account> = free_accounts
        .iter()
        .copied()
        .filter(|a| eligibility.get(&a.id).map(|e| !e.0.is_empty()).unwrap_or(false))
        .collect();
    let no_eligible_rep: Vec<AccountId> = free_accounts
        .iter()
        .filter(|a| eligibility.get(&a.id).map(|e| e.0.is_empty()).unwrap_or(true))
        .map(|a| a.id.clone())
        .collect();

    if solvable.is_empty() {
        return RelaxedRun {
            outcome: RelaxedOutcome::Solved(MipSolution::default()),
            no_eligible_rep,
        };
    }

    let weights_of = |account: &Account| {
        normalize(&if is_customer(account) {
            configuration.customer_weights
        } else {
            configuration.prospect_weights
        })
    };
    let problem = build_assignment_problem(
        &solvable,
        reps_by_id,
        &eligibility,
        weights_of,
        &configuration.territory_mappings,
        &configuration.scoring_constants,
        today,
        &configuration.constraint_flags,
        &configuration.balance_penalties,
    );

    let dispatcher = SolverDispatcher::new(session);
    let outcome = match dispatcher.dispatch(&problem, &configuration.solver_settings, diagnostics) {
        DispatchOutcome::Solved(solution) => RelaxedOutcome::Solved(solution),
        DispatchOutcome::UseHeuristicFallback => RelaxedOutcome::UseHeuristicFallback,
    };
    RelaxedRun { outcome, no_eligible_rep }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::registry::SolverRegistry;
    use terr_core::{BalancePenalties, ConstraintFlags, Mode, ObjectiveWeights, ScoringConstants, StabilityFlags};

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    fn configuration() -> Configuration {
        Configuration::new(
            Mode::Relaxed,
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
    fn empty_account_set_solves_trivially() {
        let config = configuration();
        let session = SolverSession::new(SolverRegistry::new(), 50);
        let mut diag = Diagnostics::new();
        let result = run(&[], &HashMap::new(), &config, &session, today(), |_| None, &mut diag);
        assert!(matches!(result.outcome, RelaxedOutcome::Solved(_)));
        assert!(result.no_eligible_rep.is_empty());
    }

    #[test]
    fn falls_back_to_heuristic_when_no_backend_registered() {
        let account = Account::new("A-1");
        let reps = HashMap::from([(RepId::new("R-1"), Rep::new("R-1"))]);
        let config = configuration();
        let session = SolverSession::new(SolverRegistry::new(), 50);
        let mut diag = Diagnostics::new();
        let result = run(&[&account], &reps, &config, &session, today(), |_| None, &mut diag);
        assert!(matches!(result.outcome, RelaxedOutcome::UseHeuristicFallback));
    }

    #[test]
    fn account_with_empty_eligibility_is_excluded_from_the_model() {
        let mut account = Account::new("A-1");
        account.is_strategic = true; // no strategic rep registered -> empty eligibility
        let reps = HashMap::from([(RepId::new("R-1"), Rep::new("R-1"))]);
        let config = configuration();
        let session = SolverSession::new(SolverRegistry::new(), 50);
        let mut diag = Diagnostics::new();
        let result = run(&[&account], &reps, &config, &session, today(), |_| None, &mut diag);
        assert_eq!(result.no_eligible_rep, vec![account.id]);
        // Trivially solved: nothing left once the empty-eligibility account is excluded.
        assert!(matches!(result.outcome, RelaxedOutcome::Solved(_)));
    }

    #[test]
    fn restricts_child_to_locked_parents_rep_before_solving() {
        let mut child = Account::new("A-2");
        child.parent_id = Some(AccountId::new("A-1"));
        let reps = HashMap::from([
            (RepId::new("R-1"), Rep::new("R-1")),
            (RepId::new("R-2"), Rep::new("R-2")),
        ]);
        let config = configuration();
        let session = SolverSession::new(SolverRegistry::new(), 50);
        let mut diag = Diagnostics::new();
        let locked_parent_rep = |id: &AccountId| {
            if id.value() == "A-1" {
                Some(RepId::new("R-1"))
            } else {
                None
            }
        };
        let result = run(&[&child], &reps, &config, &session, today(), locked_parent_rep, &mut diag);
        assert!(matches!(result.outcome, RelaxedOutcome::UseHeuristicFallback));
        assert!(result.no_eligible_rep.is_empty());
    }
}
