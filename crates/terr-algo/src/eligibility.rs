//! Eligibility filter (C5): per-free-account set of admissible reps.
//!
//! Parent-child linking is *not* enforced here: narrowing a child's eligibility to a
//! singleton would require solving parents first. Instead the model builder (C6) adds
//! `x[c,r] = x[p,r]` equality constraints directly, so parents and children can be
//! solved in the same MIP (§4.5).

use std::collections::HashMap;
use terr_core::diagnostics::Diagnostics;
use terr_core::{Account, AccountId, Rep, RepId};

/// The admissible rep set for one free account.
#[derive(Debug, Clone, Default)]
pub struct EligibleReps(pub Vec<RepId>);

/// Compute `eligible(a)` for every free account (§4.5). Accounts whose eligible set
/// ends up empty are reported via `diagnostics` with cause `"no eligible rep"` and are
/// expected to be excluded from the model and emitted as unassigned by the caller.
pub fn compute_eligibility(
    accounts: &[&Account],
    reps: &HashMap<RepId, Rep>,
    strategic_pool_enabled: bool,
    diagnostics: &mut Diagnostics,
) -> HashMap<AccountId, EligibleReps> {
    let pool_base: Vec<&Rep> = reps
        .values()
        .filter(|r| r.is_eligible_pool_member())
        .collect();

    let mut result = HashMap::new();
    for account in accounts {
        let mut eligible: Vec<RepId> = pool_base
            .iter()
            .filter(|r| {
                if strategic_pool_enabled {
                    account.is_strategic == r.is_strategic_rep
                } else {
                    true
                }
            })
            .map(|r| r.id.clone())
            .collect();
        eligible.sort();

        if eligible.is_empty() {
            diagnostics.add_error_with_entity("eligibility", "no eligible rep", account.id.value());
        }
        result.insert(account.id.clone(), EligibleReps(eligible));
    }
    result
}

/// Narrow eligibility to a singleton for any account whose parent has *already* been
/// placed outside this model (locked, or assigned in an earlier waterfall stage).
/// The model builder's `x[c,r] = x[p,r]` constraint only links parent and child when
/// both appear in the same MIP; when the parent was pinned before the model was ever
/// built, this is the only place left to enforce §4.5's parent-child rule.
///
/// `resolved_parent_rep` returns the rep id a parent account was placed with, if known.
/// An account whose singleton target isn't in its own base-eligible set is emptied and
/// reported via `diagnostics` rather than silently assigned to an ineligible rep.
pub fn restrict_to_known_parent_rep(
    eligible: &mut HashMap<AccountId, EligibleReps>,
    accounts: &[&Account],
    parent_child_linking_enabled: bool,
    resolved_parent_rep: impl Fn(&AccountId) -> Option<RepId>,
    diagnostics: &mut Diagnostics,
) {
    if !parent_child_linking_enabled {
        return;
    }
    for account in accounts {
        let Some(parent_id) = &account.parent_id else {
            continue;
        };
        let Some(target) = resolved_parent_rep(parent_id) else {
            continue;
        };
        if let Some(entry) = eligible.get_mut(&account.id) {
            if entry.0.contains(&target) {
                entry.0 = vec![target];
            } else {
                entry.0.clear();
                diagnostics.add_error_with_entity(
                    "eligibility",
                    "parent-child link requires a rep outside the child's eligible pool",
                    account.id.value(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terr_core::{Account, Rep};

    fn reps_with(reps: Vec<Rep>) -> HashMap<RepId, Rep> {
        reps.into_iter().map(|r| (r.id.clone(), r)).collect()
    }

    #[test]
    fn excludes_inactive_and_opted_out_reps() {
        let account = Account::new("A-1");
        let mut inactive = Rep::new("R-1");
        inactive.is_active = false;
        let mut opted_out = Rep::new("R-2");
        opted_out.include_in_assignments = false;
        let active = Rep::new("R-3");
        let reps = reps_with(vec![inactive, opted_out, active]);
        let mut diag = Diagnostics::new();
        let result = compute_eligibility(&[&account], &reps, true, &mut diag);
        assert_eq!(result[&account.id].0, vec![RepId::new("R-3")]);
    }

    #[test]
    fn strategic_pool_is_closed_both_directions() {
        let mut strategic_account = Account::new("A-1");
        strategic_account.is_strategic = true;
        let normal_account = Account::new("A-2");

        let mut strategic_rep = Rep::new("R-1");
        strategic_rep.is_strategic_rep = true;
        let normal_rep = Rep::new("R-2");
        let reps = reps_with(vec![strategic_rep, normal_rep]);

        let mut diag = Diagnostics::new();
        let result = compute_eligibility(
            &[&strategic_account, &normal_account],
            &reps,
            true,
            &mut diag,
        );
        assert_eq!(result[&strategic_account.id].0, vec![RepId::new("R-1")]);
        assert_eq!(result[&normal_account.id].0, vec![RepId::new("R-2")]);
    }

    #[test]
    fn empty_eligibility_reported_as_error() {
        let mut account = Account::new("A-1");
        account.is_strategic = true;
        let reps = reps_with(vec![Rep::new("R-1")]);
        let mut diag = Diagnostics::new();
        let result = compute_eligibility(&[&account], &reps, true, &mut diag);
        assert!(result[&account.id].0.is_empty());
        assert_eq!(diag.error_count(), 1);
    }

    #[test]
    fn strategic_pool_disabled_ignores_flag() {
        let mut strategic_account = Account::new("A-1");
        strategic_account.is_strategic = true;
        let normal_rep = Rep::new("R-1");
        let reps = reps_with(vec![normal_rep]);
        let mut diag = Diagnostics::new();
        let result = compute_eligibility(&[&strategic_account], &reps, false, &mut diag);
        assert_eq!(result[&strategic_account.id].0, vec![RepId::new("R-1")]);
    }

    #[test]
    fn restricts_child_to_locked_parents_rep() {
        let mut child = Account::new("A-2");
        child.parent_id = Some(AccountId::new("A-1"));
        let r1 = RepId::new("R-1");
        let mut eligible = HashMap::new();
        eligible.insert(child.id.clone(), EligibleReps(vec![r1.clone(), RepId::new("R-2")]));
        let mut diag = Diagnostics::new();
        restrict_to_known_parent_rep(
            &mut eligible,
            &[&child],
            true,
            |parent| {
                if parent.value() == "A-1" {
                    Some(r1.clone())
                } else {
                    None
                }
            },
            &mut diag,
        );
        assert_eq!(eligible[&child.id].0, vec![r1]);
    }

    #[test]
    fn empties_eligibility_when_locked_parent_rep_not_admissible() {
        let mut child = Account::new("A-2");
        child.parent_id = Some(AccountId::new("A-1"));
        let mut eligible = HashMap::new();
        eligible.insert(child.id.clone(), EligibleReps(vec![RepId::new("R-2")]));
        let mut diag = Diagnostics::new();
        restrict_to_known_parent_rep(
            &mut eligible,
            &[&child],
            true,
            |_| Some(RepId::new("R-1")),
            &mut diag,
        );
        assert!(eligible[&child.id].0.is_empty());
        assert_eq!(diag.error_count(), 1);
    }
}
