//! Input invariant checks run once, before a solve ever starts (§7, `InputInvariantError`).
//!
//! These are rejected as a `FatalError` rather than accumulated as a warning: a
//! duplicate id or a dangling parent reference means the caller's snapshot is
//! malformed, not that optimization hit a hard case.

use std::collections::HashSet;

use terr_core::error::InputInvariantError;
use terr_core::{Account, Rep};

/// Check every invariant in §3.2 that depends only on the account/rep set itself
/// (not on a `Configuration`): no duplicate ids, every `parent_id` resolves to an
/// account present in the same snapshot, and no rep names itself as its own
/// backfill target.
pub fn check_input_invariants(accounts: &[Account], reps: &[Rep]) -> Result<(), InputInvariantError> {
    let mut account_ids = HashSet::new();
    for account in accounts {
        if !account_ids.insert(account.id.clone()) {
            return Err(InputInvariantError::DuplicateId {
                kind: "account",
                id: account.id.value().to_string(),
            });
        }
    }

    let mut rep_ids = HashSet::new();
    for rep in reps {
        if !rep_ids.insert(rep.id.clone()) {
            return Err(InputInvariantError::DuplicateId {
                kind: "rep",
                id: rep.id.value().to_string(),
            });
        }
        if let Some(target) = &rep.backfill_target_rep_id {
            if *target == rep.id {
                return Err(InputInvariantError::SelfBackfill(rep.id.value().to_string()));
            }
        }
    }

    for account in accounts {
        if let Some(parent_id) = &account.parent_id {
            if !account_ids.contains(parent_id) {
                return Err(InputInvariantError::UnknownParent {
                    child: account.id.value().to_string(),
                    parent: parent_id.value().to_string(),
                });
            }
        }
    }

    Ok(())
}
