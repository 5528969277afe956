//! Persistent daily remote-call quota store (§4.7, §5).
//!
//! `SolverSession` (in `terr-algo`) tracks the in-process call count for the lifetime
//! of one dispatch run, but the CLI is a fresh process per invocation, so an
//! in-memory counter alone cannot enforce a *daily* cap across separate runs. This
//! store persists the count and the date it was last reset to a small JSON file
//! under the user's config directory, so repeated CLI invocations on the same day
//! share one quota.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

const STORE_FILE_NAME: &str = "remote-quota.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuotaRecord {
    /// Calendar date (`YYYY-MM-DD`) the count applies to.
    date: String,
    calls: u32,
}

/// A JSON-file-backed counter of remote MIP calls made so far today.
pub struct RemoteQuotaStore {
    path: PathBuf,
}

impl RemoteQuotaStore {
    /// Store rooted at `dirs::config_dir()/territory-opt/remote-quota.json`.
    pub fn default_location() -> SolverResult<Self> {
        let mut dir = dirs::config_dir()
            .ok_or_else(|| SolverError::QuotaStore("could not resolve config directory".into()))?;
        dir.push("territory-opt");
        Ok(Self::at_path(dir.join(STORE_FILE_NAME)))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Calls already recorded today, given `today` (the caller supplies the date so
    /// this module never calls into system clocks itself). A record from a previous
    /// day is treated as zero.
    pub fn calls_today(&self, today: &str) -> SolverResult<u32> {
        Ok(self.read()?.filter(|r| r.date == today).map(|r| r.calls).unwrap_or(0))
    }

    /// Record one more remote call for `today`, returning the new count.
    pub fn record_call(&self, today: &str) -> SolverResult<u32> {
        let current = self.calls_today(today)?;
        let updated = QuotaRecord {
            date: today.to_string(),
            calls: current + 1,
        };
        self.write(&updated)?;
        Ok(updated.calls)
    }

    fn read(&self) -> SolverResult<Option<QuotaRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| SolverError::QuotaStore(e.to_string()))?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| SolverError::QuotaStore(e.to_string()))
    }

    fn write(&self, record: &QuotaRecord) -> SolverResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SolverError::QuotaStore(e.to_string()))?;
        }
        let json = serde_json::to_string(record).map_err(|e| SolverError::QuotaStore(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| SolverError::QuotaStore(e.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
