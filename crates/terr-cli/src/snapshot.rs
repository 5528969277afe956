//! Loads the single-file JSON snapshot named in §6.1: `{"accounts": [...], "reps": [...]}`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use terr_core::{Account, Rep};

#[derive(Debug, Deserialize)]
struct Snapshot {
    accounts: Vec<Account>,
    reps: Vec<Rep>,
}

pub fn load_snapshot(path: &Path) -> Result<(Vec<Account>, Vec<Rep>)> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading snapshot file {}", path.display()))?;
    let snapshot: Snapshot =
        serde_json::from_str(&contents).with_context(|| format!("parsing snapshot JSON from {}", path.display()))?;
    Ok((snapshot.accounts, snapshot.reps))
}
