//! Seed scenario: with only geography weighted, accounts land with the rep whose
//! region matches their territory and nowhere else.

use std::collections::HashMap;
use std::sync::Arc;

use terr_algo::dispatch::{HighsBackend, SolverRegistry, SolverSession};
use terr_algo::run_solve;
use terr_core::{Account, BalancePenalties, ConstraintFlags, Mode, ObjectiveWeights, Rep, ScoringConstants, StabilityFlags};

fn today() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
}

fn session() -> SolverSession {
    let mut registry = SolverRegistry::new();
    registry.register(Arc::new(HighsBackend));
    SolverSession::new(registry, 50)
}

fn geo_only_weights() -> ObjectiveWeights {
    ObjectiveWeights {
        continuity: 0.0,
        continuity_enabled: false,
        geography: 1.0,
        geography_enabled: true,
        team_alignment: 0.0,
        team_alignment_enabled: false,
    }
}

#[test]
fn accounts_follow_matching_region_exactly() {
    let mut r1 = Rep::new("R-1");
    r1.region = Some("AMER-NA".into());
    let mut r2 = Rep::new("R-2");
    r2.region = Some("EMEA-NORTH".into());

    let mut a = Account::new("A");
    a.territory_raw = Some("usa".into());
    a.arr_primary = Some(100.0);
    let mut b = Account::new("B");
    b.territory_raw = Some("usa".into());
    b.arr_primary = Some(100.0);
    let mut c = Account::new("C");
    c.territory_raw = Some("uk".into());
    c.arr_primary = Some(100.0);
    let mut d = Account::new("D");
    d.territory_raw = Some("uk".into());
    d.arr_primary = Some(100.0);

    let accounts = vec![a, b, c, d];
    let reps = vec![r1, r2];

    let config = terr_core::Configuration::new(
        Mode::Relaxed,
        geo_only_weights(),
        geo_only_weights(),
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

    let result = run_solve(&accounts, &reps, &config, today(), &session()).unwrap();
    assert_eq!(result.proposals.len(), 4);
    assert!(result.unassigned.is_empty());

    let rep_of = |id: &str| {
        result
            .proposals
            .iter()
            .find(|p| p.account_id.value() == id)
            .map(|p| p.rep_id.value().to_string())
            .unwrap()
    };
    assert_eq!(rep_of("A"), "R-1");
    assert_eq!(rep_of("B"), "R-1");
    assert_eq!(rep_of("C"), "R-2");
    assert_eq!(rep_of("D"), "R-2");

    for p in &result.proposals {
        assert_eq!(p.scores.geography, Some(1.0));
        assert_eq!(p.scores.continuity, Some(0.0));
        assert_eq!(p.scores.team_alignment, None);
    }
}
