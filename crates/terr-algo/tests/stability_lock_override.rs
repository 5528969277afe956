//! Seed scenario: a CRE-at-risk account stays with its current owner no matter what
//! the scoring weights would otherwise prefer.

use std::collections::HashMap;
use std::sync::Arc;

use terr_algo::dispatch::{HighsBackend, SolverRegistry, SolverSession};
use terr_algo::run_solve;
use terr_core::{Account, BalancePenalties, ConstraintFlags, Mode, ObjectiveWeights, Rep, RepId, ScoringConstants, StabilityFlags};

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
fn cre_risk_lock_beats_a_pure_geography_objective() {
    let mut r1 = Rep::new("R-1");
    r1.region = Some("AMER-NA".into());
    let mut r2 = Rep::new("R-2");
    r2.region = Some("EMEA-NORTH".into());

    let mut a = Account::new("A");
    a.territory_raw = Some("usa".into()); // geography would prefer R1
    a.cre_risk = true;
    a.current_owner_id = Some(RepId::new("R-2"));
    a.arr_primary = Some(100.0);

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

    let accounts = vec![a];
    let reps = vec![r1, r2];
    let result = run_solve(&accounts, &reps, &config, today(), &session()).unwrap();

    assert_eq!(result.proposals.len(), 1);
    let proposal = &result.proposals[0];
    assert_eq!(proposal.rep_id.value(), "R-2");
    assert_eq!(proposal.priority_label, "P1");
    assert_eq!(proposal.confidence, 1.0);
    assert!(proposal.rationale.contains("churn risk"));
}
