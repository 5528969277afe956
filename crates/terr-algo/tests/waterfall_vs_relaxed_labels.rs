//! Seed scenario: the same account, run through each mode under a configuration that
//! suits that mode, lands with a different rep and a different priority label. Neither
//! output is wrong: the label and the assignment both reflect the active mode's
//! configuration, not some mode-independent "true" answer.

use std::collections::HashMap;
use std::sync::Arc;

use terr_algo::dispatch::{HighsBackend, SolverRegistry, SolverSession};
use terr_algo::run_solve;
use terr_core::{
    Account, BalancePenalties, ConstraintFlags, Mode, ObjectiveWeights, PriorityKind, PriorityStep, Rep, RepId,
    ScoringConstants, StabilityFlags,
};

fn today() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
}

fn session() -> SolverSession {
    let mut registry = SolverRegistry::new();
    registry.register(Arc::new(HighsBackend));
    SolverSession::new(registry, 50)
}

fn reps() -> Vec<Rep> {
    let mut r1 = Rep::new("R-1");
    r1.region = Some("AMER-NA".into());
    let mut r2 = Rep::new("R-2");
    r2.region = Some("EMEA-NORTH".into());
    vec![r1, r2]
}

fn account() -> Account {
    let mut a = Account::new("A");
    a.territory_raw = Some("usa".into()); // exact match with R1, cross-region with R2
    a.current_owner_id = Some(RepId::new("R-2")); // full-tenure relationship with R2
    a.owner_change_date = Some(today() - chrono::Duration::days(730));
    a.owners_lifetime_count = 1;
    a.arr_primary = Some(1_000_000.0);
    a
}

#[test]
fn waterfall_with_geography_only_stage_places_on_the_geography_match() {
    let config = terr_core::Configuration::new(
        Mode::Waterfall,
        ObjectiveWeights::default(),
        ObjectiveWeights::default(),
        StabilityFlags::default(),
        ConstraintFlags::default(),
        BalancePenalties::default(),
        HashMap::new(),
        vec![PriorityStep {
            kind: PriorityKind::GeographyOnly,
            enabled: true,
            position: 1,
        }],
        ScoringConstants::default(),
        terr_core::SolverSettings::default(),
        false,
    )
    .unwrap();

    let accounts = vec![account()];
    let result = run_solve(&accounts, &reps(), &config, today(), &session()).unwrap();

    assert_eq!(result.proposals.len(), 1);
    let proposal = &result.proposals[0];
    assert_eq!(proposal.rep_id.value(), "R-1");
    assert_eq!(proposal.priority_label, "P1");
}

#[test]
fn relaxed_with_continuity_weighted_heavily_keeps_the_existing_owner() {
    let weights = ObjectiveWeights {
        continuity: 0.9,
        continuity_enabled: true,
        geography: 0.1,
        geography_enabled: true,
        team_alignment: 0.0,
        team_alignment_enabled: false,
    };
    let config = terr_core::Configuration::new(
        Mode::Relaxed,
        weights,
        weights,
        StabilityFlags::default(),
        ConstraintFlags::default(),
        BalancePenalties::default(),
        HashMap::new(),
        Vec::new(),
        ScoringConstants::default(),
        terr_core::SolverSettings::default(),
        false,
    )
    .unwrap();

    let accounts = vec![account()];
    let result = run_solve(&accounts, &reps(), &config, today(), &session()).unwrap();

    assert_eq!(result.proposals.len(), 1);
    let proposal = &result.proposals[0];
    assert_eq!(proposal.rep_id.value(), "R-2");
    // Falls back to the fixed default order: ContinuityOnly is position 4 absent a
    // configured `priority_config`, in contrast to waterfall's configured "P1" above.
    assert_eq!(proposal.priority_label, "P4");
}
