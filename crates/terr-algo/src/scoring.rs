//! Scoring functions (C3): pure per-(account, rep) geography, continuity, and
//! team-alignment scores, each in `[0, 1]` or `None` (§4.3).

use terr_core::classify::{are_siblings, classify_team_tier, effective_arr, region_of, region_parent};
use terr_core::{Account, Rep, ScoringConstants};

/// Geography score (§4.3.1): 1.0 exact match, 0.65 sibling regions, 0.40 same macro,
/// 0.20 otherwise, 0.50 when either side's region is unknown.
pub fn geography_score(
    account: &Account,
    rep: &Rep,
    territory_mappings: &std::collections::HashMap<String, String>,
    constants: &ScoringConstants,
) -> f64 {
    let region_a = region_of(account.territory_raw.as_deref(), territory_mappings);
    let region_r = rep.region.clone();

    match (region_a, region_r) {
        (Some(a), Some(r)) => {
            if a == r {
                constants.geo_exact
            } else if are_siblings(&a, &r) {
                constants.geo_sibling
            } else if region_parent(&a).is_some() && region_parent(&a) == region_parent(&r) {
                constants.geo_same_macro
            } else {
                constants.geo_cross_region
            }
        }
        _ => constants.geo_unknown,
    }
}

/// Continuity score (§4.3.2): 0 unless `rep` is the account's current, non-backfill
/// owner; otherwise a weighted blend of tenure, ownership breadth, and account value.
pub fn continuity_score(
    account: &Account,
    rep: &Rep,
    today: chrono::NaiveDate,
    constants: &ScoringConstants,
) -> f64 {
    let Some(owner_id) = &account.current_owner_id else {
        return 0.0;
    };
    if owner_id != &rep.id {
        return 0.0;
    }
    if rep.is_backfill_source {
        return 0.0;
    }

    let tenure_days = account
        .owner_change_date
        .map(|d| (today - d).num_days().max(0) as f64)
        .unwrap_or(0.0);
    let t = (tenure_days / constants.tenure_max_days).min(1.0);

    let owners = account.owners_lifetime_count.max(1) as f64;
    let b = if constants.max_owners > 1.0 {
        (1.0 - (owners - 1.0) / (constants.max_owners - 1.0)).max(0.0)
    } else {
        0.0
    };

    let v = (effective_arr(account) / constants.value_threshold).min(1.0);

    let score = constants.continuity_base
        + constants.continuity_w_tenure * t
        + constants.continuity_w_breadth * b
        + constants.continuity_w_value * v;
    score.clamp(0.0, 1.0)
}

/// Team-alignment score (§4.3.3). `None` when either side's tier is unknown: this is
/// semantically distinct from a low score and must not be conflated with it by callers.
pub fn team_alignment_score(
    account_employees: Option<u64>,
    rep_team_tier: Option<terr_core::TeamTier>,
    constants: &ScoringConstants,
) -> Option<f64> {
    let rep_tier = rep_team_tier?;
    // `classify_team_tier` treats `None` employees as SMB for display purposes, but
    // scoring must treat a missing account tier signal as genuinely unknown.
    account_employees?;
    let account_tier = classify_team_tier(account_employees);

    let distance = (rep_tier.index() - account_tier.index()).unsigned_abs();
    let base = match distance {
        0 => 1.00,
        1 => 0.60,
        2 => 0.25,
        _ => 0.05,
    };

    if rep_tier.index() > account_tier.index() {
        let penalty = constants.reaching_down_penalty * distance as f64;
        Some((base - penalty).max(0.0))
    } else {
        Some(base)
    }
}

/// Team-alignment score treating a `None` as the neutral constant 0.5, for use in the
/// MIP cost coefficient (§4.6) where every variable needs a concrete number. Rationale
/// and metrics must use [`team_alignment_score`] directly to preserve the null distinction.
pub fn team_alignment_score_for_cost(
    account_employees: Option<u64>,
    rep_team_tier: Option<terr_core::TeamTier>,
    constants: &ScoringConstants,
) -> f64 {
    team_alignment_score(account_employees, rep_team_tier, constants).unwrap_or(0.5)
}
