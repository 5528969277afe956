//! Solve metrics (C10): per-rep load summaries and fleet-wide rate statistics (§4.10),
//! computed once after a solve from its finished proposals and the original inputs.

use std::collections::HashMap;

use serde::Serialize;

#[cfg(feature = "desktop")]
use rayon::prelude::*;

use terr_core::classify::effective_arr;
use terr_core::{Account, AccountId, Proposal, Rep, RepId, ScoringConstants};

use crate::scoring::{geography_score, team_alignment_score};

/// One rep's accumulated load across the solved proposals (§4.10).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RepLoad {
    pub arr: f64,
    pub atr: f64,
    pub pipeline: f64,
    pub account_count: u32,
    pub cre_count: u32,
}

/// Fleet-wide metrics for one finished solve (§4.10).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    pub total_accounts: usize,
    pub reps_over_capacity: usize,
    pub solve_time_ms: u64,
    pub feasibility_slack_total: f64,

    pub continuity_rate: f64,
    pub high_value_continuity_rate: f64,

    pub geography_exact_rate: f64,
    pub geography_in_region_rate: f64,
    pub geography_cross_region_rate: f64,

    pub tier_exact_rate: f64,
    pub tier_one_level_rate: f64,
    pub tier_na_rate: f64,

    pub arr_cv: f64,
    pub atr_cv: f64,
    pub pipeline_cv: f64,

    pub capacity_utilization_max: f64,
    pub capacity_utilization_mean: f64,

    pub per_rep: HashMap<RepId, RepLoad>,
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (variance.sqrt() / mean) * 100.0
}

fn rate(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// One proposal's worth of metric inputs, scored independently of every other
/// proposal: safe to compute in parallel (§5, "scoring and metrics may be
/// parallelized over accounts via rayon").
///
/// Geography and tier rates are independent thresholds, not mutually exclusive
/// buckets (§4.10): an exact geography match also counts toward the in-region rate,
/// and an exact tier match also counts toward the one-level rate.
struct Contribution {
    rep_id: RepId,
    arr: f64,
    atr: f64,
    pipeline: f64,
    cre_risk: bool,
    continuity_hit: bool,
    high_value: bool,
    geo_exact: bool,
    geo_in_region: bool,
    geo_cross_region: bool,
    tier_known: bool,
    tier_exact: bool,
    tier_one_level: bool,
}

fn contribution_for(
    proposal: &Proposal,
    accounts_by_id: &HashMap<AccountId, &Account>,
    reps_by_id: &HashMap<RepId, &Rep>,
    constants: &ScoringConstants,
    territory_mappings: &HashMap<String, String>,
) -> Option<Contribution> {
    let account = *accounts_by_id.get(&proposal.account_id)?;
    let rep = *reps_by_id.get(&proposal.rep_id)?;

    // Identity, not the blended continuity score: `continuity_score` returns 0 for a
    // backfill-source owner (scoring.rs), but §4.10's continuity rate is defined purely
    // as "proposal's rep equals the account's current owner".
    let continuity_hit = account.current_owner_id.as_ref() == Some(&proposal.rep_id);
    let high_value = effective_arr(account) >= constants.value_threshold;

    let geo = geography_score(account, rep, territory_mappings, constants);
    let geo_exact = geo >= constants.geo_exact;
    let geo_in_region = geo >= constants.sibling_threshold;
    let geo_cross_region = geo <= constants.cross_region_metric_threshold;

    let tier = team_alignment_score(account.employees, rep.team_tier, constants);
    let tier_known = tier.is_some();
    let tier_exact = tier.map(|t| t >= 1.0).unwrap_or(false);
    let tier_one_level = tier.map(|t| t >= 0.60).unwrap_or(false);

    Some(Contribution {
        rep_id: proposal.rep_id.clone(),
        arr: effective_arr(account),
        atr: account.atr,
        pipeline: account.pipeline_value,
        cre_risk: account.cre_risk,
        continuity_hit,
        high_value,
        geo_exact,
        geo_in_region,
        geo_cross_region,
        tier_known,
        tier_exact,
        tier_one_level,
    })
}

#[cfg(feature = "desktop")]
fn contributions(
    proposals: &[Proposal],
    accounts_by_id: &HashMap<AccountId, &Account>,
    reps_by_id: &HashMap<RepId, &Rep>,
    constants: &ScoringConstants,
    territory_mappings: &HashMap<String, String>,
) -> Vec<Contribution> {
    proposals
        .par_iter()
        .filter_map(|p| contribution_for(p, accounts_by_id, reps_by_id, constants, territory_mappings))
        .collect()
}

#[cfg(not(feature = "desktop"))]
fn contributions(
    proposals: &[Proposal],
    accounts_by_id: &HashMap<AccountId, &Account>,
    reps_by_id: &HashMap<RepId, &Rep>,
    constants: &ScoringConstants,
    territory_mappings: &HashMap<String, String>,
) -> Vec<Contribution> {
    proposals
        .iter()
        .filter_map(|p| contribution_for(p, accounts_by_id, reps_by_id, constants, territory_mappings))
        .collect()
}

/// Compute the full metrics set for a finished solve (§4.10).
///
/// `accounts_by_id`/`reps_by_id` must cover every account named in `proposals`.
/// `territory_mappings` must be the same map the solve was configured with
/// (`configuration.territory_mappings`), so the geography rates agree with the
/// `geography` score already recorded on each `Proposal` rather than re-deriving it
/// against the built-in alias matcher alone. `solve_time_ms` and
/// `feasibility_slack_total` are carried forward from whatever dispatcher solves fed
/// into the final assignment (summed across waterfall stages, or taken directly from
/// the relaxed solve). Per-proposal scoring runs via [`contributions`]
/// (`rayon`-parallel under the `desktop` feature); the reduction into `per_rep` and the
/// rate counters below stays single-threaded since it folds into shared accumulators.
pub fn compute_metrics(
    proposals: &[Proposal],
    accounts_by_id: &HashMap<AccountId, &Account>,
    reps_by_id: &HashMap<RepId, &Rep>,
    constants: &ScoringConstants,
    territory_mappings: &HashMap<String, String>,
    solve_time_ms: u64,
    feasibility_slack_total: f64,
    total_accounts: usize,
) -> Metrics {
    let mut per_rep: HashMap<RepId, RepLoad> = HashMap::new();

    let mut continuity_hits = 0usize;
    let mut high_value_total = 0usize;
    let mut high_value_continuity_hits = 0usize;

    let mut geo_exact = 0usize;
    let mut geo_in_region = 0usize;
    let mut geo_cross_region = 0usize;

    let mut tier_known_total = 0usize;
    let mut tier_exact = 0usize;
    let mut tier_one_level = 0usize;

    for contribution in contributions(proposals, accounts_by_id, reps_by_id, constants, territory_mappings) {
        let load = per_rep.entry(contribution.rep_id).or_default();
        load.arr += contribution.arr;
        load.atr += contribution.atr;
        load.pipeline += contribution.pipeline;
        load.account_count += 1;
        if contribution.cre_risk {
            load.cre_count += 1;
        }

        if contribution.continuity_hit {
            continuity_hits += 1;
        }
        if contribution.high_value {
            high_value_total += 1;
            if contribution.continuity_hit {
                high_value_continuity_hits += 1;
            }
        }

        if contribution.geo_exact {
            geo_exact += 1;
        }
        if contribution.geo_in_region {
            geo_in_region += 1;
        }
        if contribution.geo_cross_region {
            geo_cross_region += 1;
        }

        if contribution.tier_known {
            tier_known_total += 1;
        }
        if contribution.tier_exact {
            tier_exact += 1;
        }
        if contribution.tier_one_level {
            tier_one_level += 1;
        }
    }

    let total = proposals.len().max(1);
    let mut reps_over_capacity = 0usize;
    let mut utilizations = Vec::new();
    for (rep_id, load) in &per_rep {
        if let Some(rep) = reps_by_id.get(rep_id) {
            if let Some(max_arr) = rep.capacity_max_arr {
                if max_arr > 0.0 {
                    let utilization = load.arr / max_arr;
                    utilizations.push(utilization);
                    if load.arr > max_arr {
                        reps_over_capacity += 1;
                    }
                    continue;
                }
            }
        }
        utilizations.push(0.0);
    }
    let capacity_utilization_max = utilizations.iter().cloned().fold(0.0_f64, f64::max);
    let capacity_utilization_mean = if utilizations.is_empty() {
        0.0
    } else {
        utilizations.iter().sum::<f64>() / utilizations.len() as f64
    };

    let arr_values: Vec<f64> = per_rep.values().map(|l| l.arr).collect();
    let atr_values: Vec<f64> = per_rep.values().map(|l| l.atr).collect();
    let pipeline_values: Vec<f64> = per_rep.values().map(|l| l.pipeline).collect();

    Metrics {
        total_accounts,
        reps_over_capacity,
        solve_time_ms,
        feasibility_slack_total,
        continuity_rate: rate(continuity_hits, total),
        high_value_continuity_rate: rate(high_value_continuity_hits, high_value_total),
        geography_exact_rate: rate(geo_exact, total),
        geography_in_region_rate: rate(geo_in_region, total),
        geography_cross_region_rate: rate(geo_cross_region, total),
        tier_exact_rate: rate(tier_exact, total),
        tier_one_level_rate: rate(tier_one_level, total),
        tier_na_rate: rate(total.saturating_sub(tier_known_total), total),
        arr_cv: coefficient_of_variation(&arr_values),
        atr_cv: coefficient_of_variation(&atr_values),
        pipeline_cv: coefficient_of_variation(&pipeline_values),
        capacity_utilization_max,
        capacity_utilization_mean,
        per_rep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terr_core::{AccountId, Scores, TeamTier};

    fn proposal(account_id: &str, rep_id: &str) -> Proposal {
        Proposal {
            account_id: AccountId::new(account_id),
            rep_id: RepId::new(rep_id),
            rationale: String::new(),
            scores: Scores::default(),
            priority_label: "RO".to_string(),
            confidence: 0.5,
        }
    }

    #[test]
    fn continuity_rate_counts_current_owner_matches() {
        let mut account = Account::new("A-1");
        account.current_owner_id = Some(RepId::new("R-1"));
        account.owner_change_date = Some(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let rep = Rep::new("R-1");
        let accounts = HashMap::from([(account.id.clone(), &account)]);
        let reps = HashMap::from([(rep.id.clone(), &rep)]);
        let proposals = vec![proposal("A-1", "R-1")];
        let metrics = compute_metrics(&proposals, &accounts, &reps, &ScoringConstants::default(), &HashMap::new(), 0, 0.0, 1);
        assert_eq!(metrics.continuity_rate, 1.0);
    }

    #[test]
    fn continuity_rate_counts_backfill_source_owner_by_identity() {
        // continuity_score returns 0 for a backfill-source owner, but the account is
        // still assigned back to that rep (e.g. no valid backfill target per §4.4
        // rule 2). The continuity rate must count this by owner identity regardless.
        let mut account = Account::new("A-1");
        account.current_owner_id = Some(RepId::new("R-1"));
        let mut rep = Rep::new("R-1");
        rep.is_backfill_source = true;
        let accounts = HashMap::from([(account.id.clone(), &account)]);
        let reps = HashMap::from([(rep.id.clone(), &rep)]);
        let proposals = vec![proposal("A-1", "R-1")];
        let metrics = compute_metrics(&proposals, &accounts, &reps, &ScoringConstants::default(), &HashMap::new(), 0, 0.0, 1);
        assert_eq!(metrics.continuity_rate, 1.0);
    }

    #[test]
    fn geography_rate_honors_configured_territory_mappings() {
        // A raw territory label the built-in alias matcher doesn't know, resolved only
        // through a configured override. Without threading `territory_mappings` through,
        // this would score as "unknown" (0.50) instead of an exact match.
        let mut account = Account::new("A-1");
        account.territory_raw = Some("Region-9000".to_string());
        let mut rep = Rep::new("R-1");
        rep.region = Some("AMER-NA".to_string());
        let territory_mappings = HashMap::from([("Region-9000".to_string(), "AMER-NA".to_string())]);
        let accounts = HashMap::from([(account.id.clone(), &account)]);
        let reps = HashMap::from([(rep.id.clone(), &rep)]);
        let proposals = vec![proposal("A-1", "R-1")];
        let metrics = compute_metrics(
            &proposals,
            &accounts,
            &reps,
            &ScoringConstants::default(),
            &territory_mappings,
            0,
            0.0,
            1,
        );
        assert_eq!(metrics.geography_exact_rate, 1.0);
    }

    #[test]
    fn capacity_over_subscription_is_counted() {
        let mut account = Account::new("A-1");
        account.arr_primary = Some(2.0);
        let mut rep = Rep::new("R-1");
        rep.capacity_max_arr = Some(1.0);
        let accounts = HashMap::from([(account.id.clone(), &account)]);
        let reps = HashMap::from([(rep.id.clone(), &rep)]);
        let proposals = vec![proposal("A-1", "R-1")];
        let metrics = compute_metrics(&proposals, &accounts, &reps, &ScoringConstants::default(), &HashMap::new(), 0, 0.0, 1);
        assert_eq!(metrics.reps_over_capacity, 1);
    }

    #[test]
    fn tier_na_rate_counts_unknown_team_alignment() {
        let account = Account::new("A-1");
        let mut rep = Rep::new("R-1");
        rep.team_tier = Some(TeamTier::Ent);
        let accounts = HashMap::from([(account.id.clone(), &account)]);
        let reps = HashMap::from([(rep.id.clone(), &rep)]);
        let proposals = vec![proposal("A-1", "R-1")];
        let metrics = compute_metrics(&proposals, &accounts, &reps, &ScoringConstants::default(), &HashMap::new(), 0, 0.0, 1);
        assert_eq!(metrics.tier_na_rate, 1.0);
    }

    #[test]
    fn empty_proposals_yield_zeroed_metrics() {
        let metrics = compute_metrics(&[], &HashMap::new(), &HashMap::new(), &ScoringConstants::default(), &HashMap::new(), 0, 0.0, 0);
        assert_eq!(metrics.continuity_rate, 0.0);
        assert_eq!(metrics.arr_cv, 0.0);
    }
}
