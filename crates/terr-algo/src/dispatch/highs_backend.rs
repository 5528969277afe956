//! In-process MIP backend using HiGHS via `good_lp` (§4.7 step 1).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};

use terr_core::{AccountId, RepId};

use super::traits::{BackendError, MipBackend, MipSolution, SolveStatus};
use crate::model::AssignmentProblem;

#[derive(Debug, Clone, Copy, Default)]
pub struct HighsBackend;

impl MipBackend for HighsBackend {
    fn id(&self) -> &str {
        "highs"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, problem: &AssignmentProblem, budget: Duration) -> Result<MipSolution, BackendError> {
        let start = Instant::now();
        if problem.is_empty() {
            return Ok(MipSolution {
                status: Some(SolveStatus::Optimal),
                ..Default::default()
            });
        }

        let mut vars = variables!();
        let mut x: HashMap<(AccountId, RepId), Variable> = HashMap::new();
        let mut objective = Expression::from(0.0);

        for account_id in &problem.accounts {
            for rep_id in &problem.eligible[account_id] {
                let v = vars.add(variable().binary());
                let c = problem.cost[&(account_id.clone(), rep_id.clone())];
                objective += c * v;
                x.insert((account_id.clone(), rep_id.clone()), v);
            }
        }

        let mut slacks: HashMap<(&'static str, RepId, bool), Variable> = HashMap::new();
        for balance in &problem.balances {
            let metric = metric_label(balance.metric);
            for rep_id in &problem.reps {
                let u = vars.add(variable().min(0.0));
                let d = vars.add(variable().min(0.0));
                objective += balance.weight * u + balance.weight * d;
                slacks.insert((metric, rep_id.clone(), true), u);
                slacks.insert((metric, rep_id.clone(), false), d);
            }
        }

        let mut model = vars.minimise(objective).using(highs);
        model.set_time_limit(budget.as_secs_f64());

        for account_id in &problem.accounts {
            let mut expr = Expression::from(0.0);
            for rep_id in &problem.eligible[account_id] {
                expr += x[&(account_id.clone(), rep_id.clone())];
            }
            model = model.with(constraint!(expr == 1));
        }

        for (parent, child) in &problem.parent_child_links {
            let parent_reps: std::collections::HashSet<&RepId> = problem.eligible[parent].iter().collect();
            let child_reps: std::collections::HashSet<&RepId> = problem.eligible[child].iter().collect();
            for rep_id in parent_reps.union(&child_reps) {
                let parent_var = x.get(&(parent.clone(), (*rep_id).clone())).copied();
                let child_var = x.get(&(child.clone(), (*rep_id).clone())).copied();
                match (parent_var, child_var) {
                    (Some(p), Some(c)) => model = model.with(constraint!(c - p == 0)),
                    (Some(p), None) => model = model.with(constraint!(p == 0)),
                    (None, Some(c)) => model = model.with(constraint!(c == 0)),
                    (None, None) => {}
                }
            }
        }

        for rep_id in &problem.reps {
            let Some(cap) = problem.capacity.get(rep_id) else { continue };
            if let Some(max_arr) = cap.max_arr {
                let mut expr = Expression::from(0.0);
                for account_id in &problem.accounts {
                    if let Some(v) = x.get(&(account_id.clone(), rep_id.clone())) {
                        expr += problem.arr_of[account_id] * *v;
                    }
                }
                model = model.with(constraint!(expr <= max_arr));
            }
            if let Some(max_cre) = cap.max_cre {
                let mut expr = Expression::from(0.0);
                for account_id in &problem.accounts {
                    if let Some(v) = x.get(&(account_id.clone(), rep_id.clone())) {
                        expr += problem.cre_indicator_of[account_id] * *v;
                    }
                }
                model = model.with(constraint!(expr <= max_cre));
            }
            if let Some(max_accounts) = cap.max_accounts {
                let mut expr = Expression::from(0.0);
                for account_id in &problem.accounts {
                    if let Some(v) = x.get(&(account_id.clone(), rep_id.clone())) {
                        expr += *v;
                    }
                }
                model = model.with(constraint!(expr <= max_accounts as f64));
            }
        }

        for balance in &problem.balances {
            let metric = metric_label(balance.metric);
            let value_of: &HashMap<AccountId, f64> = match balance.metric {
                crate::model::BalanceMetric::Arr => &problem.arr_of,
                crate::model::BalanceMetric::Atr => &problem.atr_of,
                crate::model::BalanceMetric::Pipeline => &problem.pipeline_of,
            };
            for rep_id in &problem.reps {
                let mut expr = Expression::from(0.0);
                for account_id in &problem.accounts {
                    if let Some(v) = x.get(&(account_id.clone(), rep_id.clone())) {
                        expr += value_of[account_id] * *v;
                    }
                }
                let u = slacks[&(metric, rep_id.clone(), true)];
                let d = slacks[&(metric, rep_id.clone(), false)];
                model = model.with(constraint!(expr - balance.target_per_rep == u - d));
            }
        }

        let solution = model.solve().map_err(|e| BackendError::Solver(format!("{e:?}")))?;

        let mut assignment = HashMap::new();
        for ((account_id, rep_id), v) in &x {
            if solution.value(*v) > 0.5 {
                assignment.insert(account_id.clone(), rep_id.clone());
            }
        }

        let mut balance_slack_total = 0.0;
        for slack_var in slacks.values() {
            balance_slack_total += solution.value(*slack_var);
        }

        let objective_value: f64 = assignment
            .iter()
            .map(|(account_id, rep_id)| problem.cost[&(account_id.clone(), rep_id.clone())])
            .sum();

        Ok(MipSolution {
            status: Some(SolveStatus::Optimal),
            assignment,
            objective_value,
            balance_slack_total,
            solve_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn metric_label(metric: crate::model::BalanceMetric) -> &'static str {
    match metric {
        crate::model::BalanceMetric::Arr => "arr",
        crate::model::BalanceMetric::Atr => "atr",
        crate::model::BalanceMetric::Pipeline => "pipeline",
    }
}
