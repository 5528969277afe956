//! Stability lock evaluator (C4): partitions accounts into `locked` and `free`,
//! applying the fixed six-rule cascade of §4.4 (first match wins).

use std::collections::HashMap;
use terr_core::diagnostics::Diagnostics;
use terr_core::{Account, AccountId, Rep, RepId, StabilityFlags};

/// Why an account was locked, in cascade order (§4.4). Carries the priority label
/// prefix each lock reason maps to in rationale (C11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    Manual,
    BackfillMigration,
    CreRisk,
    RenewalSoon,
    PeFirm,
    RecentChange,
}

impl LockReason {
    pub fn description(self) -> &'static str {
        match self {
            LockReason::Manual => "manually excluded from reassignment",
            LockReason::BackfillMigration => "migrated from a departing rep's backfill target",
            LockReason::CreRisk => "held with current owner due to churn risk",
            LockReason::RenewalSoon => "held with current owner ahead of renewal",
            LockReason::PeFirm => "held with current owner due to PE ownership",
            LockReason::RecentChange => "held with current owner after a recent reassignment",
        }
    }
}

/// One locked account: the account id, the rep it is pinned to, and why.
#[derive(Debug, Clone)]
pub struct Lock {
    pub account_id: AccountId,
    pub rep_id: RepId,
    pub reason: LockReason,
}

/// Output of the lock evaluator: accounts partitioned into `locked` and `free`,
/// the partition being an invariant observed by every downstream stage.
#[derive(Debug, Clone, Default)]
pub struct LockPartition {
    pub locked: Vec<Lock>,
    pub free: Vec<AccountId>,
}

fn days_between(from: chrono::NaiveDate, to: chrono::NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Evaluate the six-rule lock cascade for every account (§4.4). `reps` must be keyed
/// by id; a lock that targets an inactive or unavailable rep silently no-ops: the
/// account falls through to the next rule, and ultimately to `free` if none match.
pub fn evaluate_locks(
    accounts: &[Account],
    reps: &HashMap<RepId, Rep>,
    flags: &StabilityFlags,
    today: chrono::NaiveDate,
    diagnostics: &mut Diagnostics,
) -> LockPartition {
    let mut partition = LockPartition::default();

    for account in accounts {
        match lock_for_account(account, reps, flags, today) {
            Some(lock) => {
                diagnostics.add_warning_with_entity(
                    "lock",
                    lock.reason.description(),
                    account.id.value(),
                );
                partition.locked.push(lock);
            }
            None => partition.free.push(account.id.clone()),
        }
    }

    partition
}

pub fn owner_is_eligible(owner_id: &RepId, reps: &HashMap<RepId, Rep>) -> bool {
    reps.get(owner_id)
        .map(|r| r.is_eligible_pool_member())
        .unwrap_or(false)
}

fn lock_for_account(
    account: &Account,
    reps: &HashMap<RepId, Rep>,
    flags: &StabilityFlags,
    today: chrono::NaiveDate,
) -> Option<Lock> {
    if let Some(lock) = manual_lock_for_account(account, reps, flags) {
        return Some(lock);
    }
    // A manually-excluded account with no eligible current owner never falls through
    // to the stability rules below (§4.4 rule 1: "otherwise no lock").
    if flags.manual_lock && account.exclude_from_reassignment {
        return None;
    }
    stability_lock_for_account(account, reps, flags, today)
}

/// Rule 1 only: manual exclusion (§4.4). Exposed separately so the waterfall engine
/// (C8) can apply it as its own always-first stage without re-deriving the cascade.
pub fn manual_lock_for_account(
    account: &Account,
    reps: &HashMap<RepId, Rep>,
    flags: &StabilityFlags,
) -> Option<Lock> {
    if flags.manual_lock && account.exclude_from_reassignment {
        if let Some(owner_id) = &account.current_owner_id {
            if owner_is_eligible(owner_id, reps) {
                return Some(Lock {
                    account_id: account.id.clone(),
                    rep_id: owner_id.clone(),
                    reason: LockReason::Manual,
                });
            }
        }
    }
    None
}

/// Rules 2-6 only: backfill migration through recent change (§4.4). Exposed
/// separately so the waterfall engine's "stability accounts" stage can apply the
/// same cascade with its own capacity-aware override (§4.8).
pub fn stability_lock_for_account(
    account: &Account,
    reps: &HashMap<RepId, Rep>,
    flags: &StabilityFlags,
    today: chrono::NaiveDate,
) -> Option<Lock> {
    // 2. Backfill migration.
    if flags.backfill_migration {
        if let Some(owner_id) = &account.current_owner_id {
            if let Some(owner) = reps.get(owner_id) {
                if owner.is_backfill_source {
                    if let Some(target_id) = &owner.backfill_target_rep_id {
                        if owner_is_eligible(target_id, reps) {
                            return Some(Lock {
                                account_id: account.id.clone(),
                                rep_id: target_id.clone(),
                                reason: LockReason::BackfillMigration,
                            });
                        }
                    }
                    return None;
                }
            }
        }
    }

    // 3. CRE risk.
    if flags.cre_risk_lock && account.cre_risk {
        if let Some(owner_id) = &account.current_owner_id {
            if owner_is_eligible(owner_id, reps) {
                return Some(Lock {
                    account_id: account.id.clone(),
                    rep_id: owner_id.clone(),
                    reason: LockReason::CreRisk,
                });
            }
        }
    }

    // 4. Renewal soon.
    if flags.renewal_soon_lock {
        if let (Some(owner_id), Some(renewal_date)) = (&account.current_owner_id, account.renewal_date) {
            let days = days_between(today, renewal_date);
            if (0..=flags.renewal_soon_window_days).contains(&days) && owner_is_eligible(owner_id, reps) {
                return Some(Lock {
                    account_id: account.id.clone(),
                    rep_id: owner_id.clone(),
                    reason: LockReason::RenewalSoon,
                });
            }
        }
    }

    // 5. PE firm.
    if flags.pe_firm_lock && account.pe_firm.is_some() {
        if let Some(owner_id) = &account.current_owner_id {
            if owner_is_eligible(owner_id, reps) {
                return Some(Lock {
                    account_id: account.id.clone(),
                    rep_id: owner_id.clone(),
                    reason: LockReason::PeFirm,
                });
            }
        }
    }

    // 6. Recent change.
    if flags.recent_change_lock {
        if let (Some(owner_id), Some(change_date)) =
            (&account.current_owner_id, account.owner_change_date)
        {
            let days = days_between(change_date, today);
            if (0..=flags.recent_change_window_days).contains(&days) && owner_is_eligible(owner_id, reps) {
                return Some(Lock {
                    account_id: account.id.clone(),
                    rep_id: owner_id.clone(),
                    reason: LockReason::RecentChange,
                });
            }
        }
    }

    None
}
