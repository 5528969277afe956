//! Backend registry: a service locator for `MipBackend`s, selected by variable count
//! and availability rather than a hardcoded `if`-chain (§4.7), mirroring the teacher's
//! `SolverRegistry` for OPF backends.

use std::sync::Arc;

use super::traits::MipBackend;

/// Holds every backend known to this process, in registration order. `select` walks
/// the list and returns the first available backend whose `predicate` passes:
/// registration order doubles as preference order.
#[derive(Default)]
pub struct SolverRegistry {
    backends: Vec<Arc<dyn MipBackend>>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn MipBackend>) {
        self.backends.push(backend);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MipBackend>> {
        self.backends.iter().find(|b| b.id() == id).cloned()
    }

    /// First registered backend matching `id` that is currently available and for
    /// which `predicate` returns true.
    pub fn select(&self, id: &str, predicate: impl Fn(&dyn MipBackend) -> bool) -> Option<Arc<dyn MipBackend>> {
        self.backends
            .iter()
            .find(|b| b.id() == id && b.is_available() && predicate(b.as_ref()))
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::traits::{BackendError, MipSolution};
    use crate::model::AssignmentProblem;
    use std::time::Duration;

    struct StubBackend {
        id: &'static str,
        available: bool,
    }

    impl MipBackend for StubBackend {
        fn id(&self) -> &str {
            self.id
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn solve(&self, _problem: &AssignmentProblem, _budget: Duration) -> Result<MipSolution, BackendError> {
            Ok(MipSolution::default())
        }
    }

    #[test]
    fn get_finds_registered_backend_by_id() {
        let mut registry = SolverRegistry::new();
        registry.register(Arc::new(StubBackend {
            id: "highs",
            available: true,
        }));
        assert!(registry.get("highs").is_some());
        assert!(registry.get("cbc").is_none());
    }

    #[test]
    fn select_skips_unavailable_backends() {
        let mut registry = SolverRegistry::new();
        registry.register(Arc::new(StubBackend {
            id: "highs",
            available: false,
        }));
        assert!(registry.select("highs", |_| true).is_none());
    }
}
