//! Seed scenario: a hard ARR cap forces at least one account off its current owner
//! even when continuity is the only scored axis and would otherwise keep every
//! account exactly where it is.

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

fn continuity_only_weights() -> ObjectiveWeights {
    ObjectiveWeights {
        continuity: 1.0,
        continuity_enabled: true,
        geography: 0.0,
        geography_enabled: false,
        team_alignment: 0.0,
        team_alignment_enabled: false,
    }
}

#[test]
fn arr_cap_pushes_accounts_off_an_overloaded_owner() {
    let mut r1 = Rep::new("R-1");
    r1.capacity_max_arr = Some(1_000_000.0);
    let mut r2 = Rep::new("R-2");
    r2.capacity_max_arr = Some(1_000_000.0);
    let mut r3 = Rep::new("R-3");
    r3.capacity_max_arr = Some(1_000_000.0);

    let mut accounts = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let mut account = Account::new(name);
        account.current_owner_id = Some(RepId::new("R-1"));
        account.owner_change_date = Some(today() - chrono::Duration::days(730));
        account.owners_lifetime_count = 1;
        account.arr_primary = Some(400_000.0);
        accounts.push(account);
    }

    let config = terr_core::Configuration::new(
        Mode::Relaxed,
        continuity_only_weights(),
        continuity_only_weights(),
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

    let reps = vec![r1, r2, r3];
    let result = run_solve(&accounts, &reps, &config, today(), &session()).unwrap();

    assert_eq!(result.proposals.len(), 4);
    assert!(result.unassigned.is_empty());

    // 4 accounts * 400k ARR = 1.6M total, but R-1's cap only admits 2 of them (800k);
    // a third would breach the 1M cap. At least two accounts must move off R-1.
    let mut arr_by_rep: HashMap<String, f64> = HashMap::new();
    for p in &result.proposals {
        *arr_by_rep.entry(p.rep_id.value().to_string()).or_insert(0.0) += 400_000.0;
    }
    for (_, arr) in &arr_by_rep {
        assert!(*arr <= 1_000_000.0 + 1e-6, "a rep exceeded its ARR cap");
    }
    let r1_count = result.proposals.iter().filter(|p| p.rep_id.value() == "R-1").count();
    assert!(r1_count <= 2, "R-1 should retain at most 2 accounts under its cap, got {r1_count}");
    assert!(
        result.proposals.iter().any(|p| p.rep_id.value() != "R-1"),
        "at least one account must be reassigned off R-1"
    );
}
