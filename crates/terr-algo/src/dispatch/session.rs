//! `SolverSession`: the explicit, threaded-through state a dispatch run needs,
//! registered backends plus the daily remote-call quota (§4.7, §5).
//!
//! This replaces the global-singleton-registry pattern the teacher's `gat-core`
//! solver module used (a `Lazy<RwLock<SolverRegistry>>`): callers own a `SolverSession`
//! value and pass it explicitly, so quota state is never shared mutable state across
//! unrelated solves in the same process.

use std::sync::atomic::{AtomicU32, Ordering};

use super::registry::SolverRegistry;

/// Per-process remote-call bookkeeping plus the backend registry. One `SolverSession`
/// is expected to live for the lifetime of a CLI invocation or a long-running service
/// process; `record_remote_call` is the only mutation, and it is safe to call from
/// multiple threads (single-writer discipline is enforced by the atomic counter, not
/// by the caller).
pub struct SolverSession {
    pub registry: SolverRegistry,
    daily_quota: u32,
    calls_today: AtomicU32,
}

impl SolverSession {
    pub fn new(registry: SolverRegistry, daily_quota: u32) -> Self {
        Self {
            registry,
            daily_quota,
            calls_today: AtomicU32::new(0),
        }
    }

    /// Whether a remote call is still permitted under the daily quota.
    pub fn remote_quota_available(&self) -> bool {
        self.calls_today.load(Ordering::SeqCst) < self.daily_quota
    }

    /// Record one remote call; returns the new count.
    pub fn record_remote_call(&self) -> u32 {
        self.calls_today.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn calls_today(&self) -> u32 {
        self.calls_today.load(Ordering::SeqCst)
    }

    /// Reset the daily counter. Called by the CLI at the start of a new calendar day;
    /// never called automatically mid-process.
    pub fn reset_daily_counter(&self) {
        self.calls_today.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_available_until_exhausted() {
        let session = SolverSession::new(SolverRegistry::new(), 2);
        assert!(session.remote_quota_available());
        session.record_remote_call();
        assert!(session.remote_quota_available());
        session.record_remote_call();
        assert!(!session.remote_quota_available());
    }

    #[test]
    fn reset_restores_quota() {
        let session = SolverSession::new(SolverRegistry::new(), 1);
        session.record_remote_call();
        assert!(!session.remote_quota_available());
        session.reset_daily_counter();
        assert!(session.remote_quota_available());
    }
}
