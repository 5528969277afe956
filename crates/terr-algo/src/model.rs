//! Assignment model builder (C6): a solver-agnostic intermediate representation of
//! the territory assignment MIP, consumed by the in-process backends (C7, via
//! `good_lp`) and rendered to LP text for the remote backend (§6.2).
//!
//! Variables and constraints are emitted in `id` order for both accounts and reps so
//! that two identical inputs produce byte-identical models (§4.6 determinism clause).

use std::collections::{BTreeMap, HashMap};
use terr_core::classify::effective_arr;
use terr_core::{Account, AccountId, Rep, RepId};

use crate::eligibility::EligibleReps;
use crate::scoring::{continuity_score, geography_score, team_alignment_score_for_cost};
use crate::weights::NormalizedWeights;

/// One of the three soft-balanced metrics (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMetric {
    Arr,
    Atr,
    Pipeline,
}

/// A single enabled balance penalty: which metric, its L1 weight, and the per-rep
/// target (typically the fleet mean).
#[derive(Debug, Clone)]
pub struct BalanceSpec {
    pub metric: BalanceMetric,
    pub weight: f64,
    pub target_per_rep: f64,
}

/// Optional hard caps for one rep (§4.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct RepCapacity {
    pub max_arr: Option<f64>,
    pub max_cre: Option<f64>,
    pub max_accounts: Option<u32>,
}

/// Neutral, solver-agnostic representation of the territory assignment MIP.
///
/// Built once per solve attempt (waterfall stage or relaxed pass) from the free
/// accounts and their eligible rep sets; handed to whichever `MipBackend` the
/// dispatcher (C7) selects.
#[derive(Debug, Clone)]
pub struct AssignmentProblem {
    /// Accounts with a decision to make, in `id` order.
    pub accounts: Vec<AccountId>,
    /// Every rep referenced by at least one account's eligible set, in `id` order.
    pub reps: Vec<RepId>,
    /// `eligible(a)` per account, already sorted.
    pub eligible: BTreeMap<AccountId, Vec<RepId>>,
    /// `c[a,r]` cost coefficients (§4.6); only defined for eligible pairs.
    pub cost: HashMap<(AccountId, RepId), f64>,
    /// `(parent, child)` pairs present in `accounts`, enforced via `x[c,r] = x[p,r]`.
    pub parent_child_links: Vec<(AccountId, AccountId)>,
    /// Hard caps, keyed by rep.
    pub capacity: HashMap<RepId, RepCapacity>,
    pub arr_of: HashMap<AccountId, f64>,
    pub cre_indicator_of: HashMap<AccountId, f64>,
    pub atr_of: HashMap<AccountId, f64>,
    pub pipeline_of: HashMap<AccountId, f64>,
    pub balances: Vec<BalanceSpec>,
}

impl AssignmentProblem {
    pub fn variable_count(&self) -> usize {
        self.eligible.values().map(|v| v.len()).sum::<usize>()
            + self.balances.len() * self.reps.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Build an [`AssignmentProblem`] for the given free accounts (§4.6).
///
/// `weights` must already be normalized per account's segment (customer vs prospect,
/// see C2); `eligibility` comes from C5. Parent-child links are included only when
/// both accounts are present in `accounts` (a parent outside the current stage's
/// residual set cannot be linked against).
#[allow(clippy::too_many_arguments)]
pub fn build_assignment_problem(
    accounts: &[&Account],
    reps_by_id: &HashMap<RepId, Rep>,
    eligibility: &HashMap<AccountId, EligibleReps>,
    weights_of: impl Fn(&Account) -> NormalizedWeights,
    territory_mappings: &HashMap<String, String>,
    scoring_constants: &terr_core::ScoringConstants,
    today: chrono::NaiveDate,
    constraint_flags: &terr_core::ConstraintFlags,
    balance_penalties: &terr_core::BalancePenalties,
) -> AssignmentProblem {
    let mut account_ids: Vec<AccountId> = accounts.iter().map(|a| a.id.clone()).collect();
    account_ids.sort();

    let present: std::collections::HashSet<&AccountId> = account_ids.iter().collect();
    let by_id: HashMap<&AccountId, &Account> = accounts.iter().map(|a| (&a.id, *a)).collect();

    let mut rep_set: std::collections::BTreeSet<RepId> = std::collections::BTreeSet::new();
    let mut eligible: BTreeMap<AccountId, Vec<RepId>> = BTreeMap::new();
    let mut cost: HashMap<(AccountId, RepId), f64> = HashMap::new();

    for account_id in &account_ids {
        let account = by_id[account_id];
        let mut reps: Vec<RepId> = eligibility
            .get(account_id)
            .map(|e| e.0.clone())
            .unwrap_or_default();
        reps.sort();

        let w = weights_of(account);
        for rep_id in &reps {
            rep_set.insert(rep_id.clone());
            let rep = &reps_by_id[rep_id];
            let geo = geography_score(account, rep, territory_mappings, scoring_constants);
            let cont = continuity_score(account, rep, today, scoring_constants);
            let team = team_alignment_score_for_cost(account.employees, rep.team_tier, scoring_constants);
            let score = w.continuity * cont + w.geography * geo + w.team_alignment * team;
            cost.insert((account_id.clone(), rep_id.clone()), -score);
        }
        eligible.insert(account_id.clone(), reps);
    }

    let mut parent_child_links = Vec::new();
    if constraint_flags.parent_child_linking {
        for account_id in &account_ids {
            let account = by_id[account_id];
            if let Some(parent_id) = &account.parent_id {
                if present.contains(parent_id) {
                    parent_child_links.push((parent_id.clone(), account_id.clone()));
                }
            }
        }
    }

    let mut capacity = HashMap::new();
    if constraint_flags.capacity_hard_cap {
        for rep_id in &rep_set {
            let rep = &reps_by_id[rep_id];
            capacity.insert(
                rep_id.clone(),
                RepCapacity {
                    max_arr: rep.capacity_max_arr,
                    max_cre: rep.capacity_max_cre,
                    max_accounts: rep.capacity_max_accounts,
                },
            );
        }
    }

    let mut arr_of = HashMap::new();
    let mut cre_indicator_of = HashMap::new();
    let mut atr_of = HashMap::new();
    let mut pipeline_of = HashMap::new();
    for account_id in &account_ids {
        let account = by_id[account_id];
        arr_of.insert(account_id.clone(), effective_arr(account));
        cre_indicator_of.insert(account_id.clone(), if account.cre_risk { 1.0 } else { 0.0 });
        atr_of.insert(account_id.clone(), account.atr);
        pipeline_of.insert(account_id.clone(), account.pipeline_value);
    }

    let rep_count = rep_set.len().max(1) as f64;
    let mut balances = Vec::new();
    if balance_penalties.arr.enabled {
        let total: f64 = arr_of.values().sum();
        balances.push(BalanceSpec {
            metric: BalanceMetric::Arr,
            weight: balance_penalties.arr.weight,
            target_per_rep: total / rep_count,
        });
    }
    if balance_penalties.atr.enabled {
        let total: f64 = atr_of.values().sum();
        balances.push(BalanceSpec {
            metric: BalanceMetric::Atr,
            weight: balance_penalties.atr.weight,
            target_per_rep: total / rep_count,
        });
    }
    if balance_penalties.pipeline.enabled {
        let total: f64 = pipeline_of.values().sum();
        balances.push(BalanceSpec {
            metric: BalanceMetric::Pipeline,
            weight: balance_penalties.pipeline.weight,
            target_per_rep: total / rep_count,
        });
    }

    AssignmentProblem {
        accounts: account_ids,
        reps: rep_set.into_iter().collect(),
        eligible,
        cost,
        parent_child_links,
        capacity,
        arr_of,
        cre_indicator_of,
        atr_of,
        pipeline_of,
        balances,
    }
}

/// Render the problem as CPLEX-LP text for the remote MIP service (§6.2). Variable
/// names are `x#<account>#<rep>` and `u#<metric>#<rep>` / `d#<metric>#<rep>` for
/// balance slacks; the remote solver is expected to echo column names back verbatim.
pub fn to_lp_text(problem: &AssignmentProblem) -> String {
    let mut lp = String::new();
    lp.push_str("\\ territory assignment problem\n");
    lp.push_str("Minimize\n obj:");

    for account_id in &problem.accounts {
        for rep_id in &problem.eligible[account_id] {
            let c = problem.cost[&(account_id.clone(), rep_id.clone())];
            lp.push_str(&format!(" {:+.10} x#{}#{}", c, account_id.value(), rep_id.value()));
        }
    }
    for balance in &problem.balances {
        for rep_id in &problem.reps {
            let metric = metric_label(balance.metric);
            lp.push_str(&format!(
                " {:+.10} u#{}#{} {:+.10} d#{}#{}",
                balance.weight,
                metric,
                rep_id.value(),
                balance.weight,
                metric,
                rep_id.value()
            ));
        }
    }
    lp.push('\n');

    lp.push_str("Subject To\n");
    for account_id in &problem.accounts {
        let reps = &problem.eligible[account_id];
        lp.push_str(&format!(" assign_{}:", account_id.value()));
        for rep_id in reps {
            lp.push_str(&format!(" + x#{}#{}", account_id.value(), rep_id.value()));
        }
        lp.push_str(" = 1\n");
    }

    for (parent, child) in &problem.parent_child_links {
        let parent_reps: std::collections::HashSet<&RepId> = problem.eligible[parent].iter().collect();
        let child_reps: std::collections::HashSet<&RepId> = problem.eligible[child].iter().collect();
        for rep_id in parent_reps.union(&child_reps) {
            let in_parent = parent_reps.contains(rep_id);
            let in_child = child_reps.contains(rep_id);
            if in_parent && in_child {
                lp.push_str(&format!(
                    " link_{}_{}_{}: x#{}#{} - x#{}#{} = 0\n",
                    parent.value(),
                    child.value(),
                    rep_id.value(),
                    child.value(),
                    rep_id.value(),
                    parent.value(),
                    rep_id.value()
                ));
            } else if in_child {
                lp.push_str(&format!(
                    " link_{}_{}_{}: x#{}#{} = 0\n",
                    parent.value(),
                    child.value(),
                    rep_id.value(),
                    child.value(),
                    rep_id.value()
                ));
            } else if in_parent {
                lp.push_str(&format!(
                    " link_{}_{}_{}: x#{}#{} = 0\n",
                    parent.value(),
                    child.value(),
                    rep_id.value(),
                    parent.value(),
                    rep_id.value()
                ));
            }
        }
    }

    for rep_id in &problem.reps {
        if let Some(cap) = problem.capacity.get(rep_id) {
            if let Some(max_arr) = cap.max_arr {
                lp.push_str(&format!(" cap_arr_{}:", rep_id.value()));
                for account_id in &problem.accounts {
                    if problem.eligible[account_id].contains(rep_id) {
                        let coeff = problem.arr_of[account_id];
                        lp.push_str(&format!(" {:+.10} x#{}#{}", coeff, account_id.value(), rep_id.value()));
                    }
                }
                lp.push_str(&format!(" <= {:.10}\n", max_arr));
            }
            if let Some(max_cre) = cap.max_cre {
                lp.push_str(&format!(" cap_cre_{}:", rep_id.value()));
                for account_id in &problem.accounts {
                    if problem.eligible[account_id].contains(rep_id) {
                        let coeff = problem.cre_indicator_of[account_id];
                        lp.push_str(&format!(" {:+.10} x#{}#{}", coeff, account_id.value(), rep_id.value()));
                    }
                }
                lp.push_str(&format!(" <= {:.10}\n", max_cre));
            }
            if let Some(max_accounts) = cap.max_accounts {
                lp.push_str(&format!(" cap_cnt_{}:", rep_id.value()));
                for account_id in &problem.accounts {
                    if problem.eligible[account_id].contains(rep_id) {
                        lp.push_str(&format!(" +1 x#{}#{}", account_id.value(), rep_id.value()));
                    }
                }
                lp.push_str(&format!(" <= {}\n", max_accounts));
            }
        }
    }

    for balance in &problem.balances {
        let metric = metric_label(balance.metric);
        let value_of: &HashMap<AccountId, f64> = match balance.metric {
            BalanceMetric::Arr => &problem.arr_of,
            BalanceMetric::Atr => &problem.atr_of,
            BalanceMetric::Pipeline => &problem.pipeline_of,
        };
        for rep_id in &problem.reps {
            lp.push_str(&format!(" bal_{}_{}:", metric, rep_id.value()));
            for account_id in &problem.accounts {
                if problem.eligible[account_id].contains(rep_id) {
                    let coeff = value_of[account_id];
                    lp.push_str(&format!(" {:+.10} x#{}#{}", coeff, account_id.value(), rep_id.value()));
                }
            }
            lp.push_str(&format!(
                " - u#{}#{} + d#{}#{} = {:.10}\n",
                metric,
                rep_id.value(),
                metric,
                rep_id.value(),
                balance.target_per_rep
            ));
        }
    }

    lp.push_str("Bounds\n");
    for balance in &problem.balances {
        let metric = metric_label(balance.metric);
        for rep_id in &problem.reps {
            lp.push_str(&format!(" u#{}#{} >= 0\n", metric, rep_id.value()));
            lp.push_str(&format!(" d#{}#{} >= 0\n", metric, rep_id.value()));
        }
    }

    lp.push_str("Binaries\n");
    for account_id in &problem.accounts {
        for rep_id in &problem.eligible[account_id] {
            lp.push_str(&format!(" x#{}#{}", account_id.value(), rep_id.value()));
        }
        lp.push('\n');
    }

    lp.push_str("End\n");
    lp
}

fn metric_label(metric: BalanceMetric) -> &'static str {
    match metric {
        BalanceMetric::Arr => "arr",
        BalanceMetric::Atr => "atr",
        BalanceMetric::Pipeline => "pipeline",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::EligibleReps;
    use terr_core::{Account, ConstraintFlags, Rep, ScoringConstants};

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    #[test]
    fn model_is_deterministic_across_input_order() {
        let mut a1 = Account::new("A-2");
        a1.territory_raw = Some("usa".into());
        let mut a2 = Account::new("A-1");
        a2.territory_raw = Some("usa".into());
        let mut rep = Rep::new("R-1");
        rep.region = Some("AMER-NA".into());
        let reps = HashMap::from([(rep.id.clone(), rep)]);

        let mut elig = HashMap::new();
        elig.insert(a1.id.clone(), EligibleReps(vec![RepId::new("R-1")]));
        elig.insert(a2.id.clone(), EligibleReps(vec![RepId::new("R-1")]));

        let weights_of = |_: &Account| NormalizedWeights {
            continuity: 0.4,
            geography: 0.3,
            team_alignment: 0.3,
        };

        let forward = build_assignment_problem(
            &[&a1, &a2],
            &reps,
            &elig,
            weights_of,
            &HashMap::new(),
            &ScoringConstants::default(),
            today(),
            &ConstraintFlags::default(),
            &terr_core::BalancePenalties::default(),
        );
        let backward = build_assignment_problem(
            &[&a2, &a1],
            &reps,
            &elig,
            weights_of,
            &HashMap::new(),
            &ScoringConstants::default(),
            today(),
            &ConstraintFlags::default(),
            &terr_core::BalancePenalties::default(),
        );
        assert_eq!(forward.accounts, backward.accounts);
        assert_eq!(to_lp_text(&forward), to_lp_text(&backward));
    }

    #[test]
    fn parent_child_link_included_when_both_present() {
        let mut parent = Account::new("A-1");
        parent.is_parent = true;
        let mut child = Account::new("A-2");
        child.parent_id = Some(parent.id.clone());
        let rep = Rep::new("R-1");
        let reps = HashMap::from([(rep.id.clone(), rep)]);
        let mut elig = HashMap::new();
        elig.insert(parent.id.clone(), EligibleReps(vec![RepId::new("R-1")]));
        elig.insert(child.id.clone(), EligibleReps(vec![RepId::new("R-1")]));

        let weights_of = |_: &Account| NormalizedWeights {
            continuity: 0.4,
            geography: 0.3,
            team_alignment: 0.3,
        };
        let problem = build_assignment_problem(
            &[&parent, &child],
            &reps,
            &elig,
            weights_of,
            &HashMap::new(),
            &ScoringConstants::default(),
            today(),
            &ConstraintFlags::default(),
            &terr_core::BalancePenalties::default(),
        );
        assert_eq!(problem.parent_child_links, vec![(parent.id, child.id)]);
    }

    #[test]
    fn lp_text_contains_assignment_and_binary_sections() {
        let account = Account::new("A-1");
        let rep = Rep::new("R-1");
        let reps = HashMap::from([(rep.id.clone(), rep)]);
        let mut elig = HashMap::new();
        elig.insert(account.id.clone(), EligibleReps(vec![RepId::new("R-1")]));
        let weights_of = |_: &Account| NormalizedWeights {
            continuity: 0.4,
            geography: 0.3,
            team_alignment: 0.3,
        };
        let problem = build_assignment_problem(
            &[&account],
            &reps,
            &elig,
            weights_of,
            &HashMap::new(),
            &ScoringConstants::default(),
            today(),
            &ConstraintFlags::default(),
            &terr_core::BalancePenalties::default(),
        );
        let lp = to_lp_text(&problem);
        assert!(lp.contains("Subject To"));
        assert!(lp.contains("assign_A-1"));
        assert!(lp.contains("Binaries"));
        assert!(lp.contains("x#A-1#R-1"));
    }
}
