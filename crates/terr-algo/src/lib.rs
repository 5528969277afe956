//! # terr-algo: Territory Assignment Optimization
//!
//! Scoring, eligibility, and solving for the territory assignment optimizer. Builds on
//! the domain model in `terr-core` to provide two solving engines (§1, §4.8, §4.9):
//!
//! | Mode | Description |
//! |------|-------------|
//! | [`Mode::Waterfall`] | Priority-ordered cascade: manual holdover, stability locks, then successively looser optimization stages, then a residual pass |
//! | [`Mode::Relaxed`] | One weighted MIP over every free account at once |
//!
//! ## Architecture
//!
//! Solver dispatch uses a Strategy Pattern mirroring the teacher lineage's OPF
//! dispatcher:
//!
//! - [`dispatch::MipBackend`]: defines how to solve an `AssignmentProblem` (HiGHS, CBC, remote)
//! - [`dispatch::SolverRegistry`]: service locator for registered backends
//! - [`dispatch::SolverSession`]: per-process state (registry + remote-call quota)
//! - [`dispatch::SolverDispatcher`]: orchestrates the size-routed fallback chain (§4.7)
//!
//! ## Pipeline
//!
//! 1. [`validation::check_input_invariants`]: reject malformed input before solving starts.
//! 2. [`locks`]: the six-rule stability lock cascade (§4.4), used directly by relaxed
//!    mode and folded into the waterfall's own first two stages.
//! 3. [`eligibility`]: per-account admissible rep sets (§4.5), plus cross-model
//!    parent-child restriction for accounts whose parent was placed outside the model.
//! 4. [`scoring`] / [`weights`]: the three scoring axes (§4.3) and objective-weight
//!    normalization (§4.2).
//! 5. [`model`]: builds the solver-agnostic `AssignmentProblem` IR and its LP-text
//!    rendering for the remote backend.
//! 6. [`waterfall`] / [`relaxed`]: the two solving engines (§4.8, §4.9).
//! 7. [`rationale`]: turns a proposal's scores into the structured explanation on the
//!    output entity (§4.11).
//! 8. [`metrics`]: fleet-wide rate and load statistics computed after a solve (§4.10).
//! 9. [`solve::solve`]: the public entry point tying all of the above together.

pub mod dispatch;
pub mod eligibility;
pub mod locks;
pub mod metrics;
pub mod model;
pub mod rationale;
pub mod relaxed;
pub mod scoring;
pub mod solve;
pub mod validation;
pub mod waterfall;
pub mod weights;

pub use model::AssignmentProblem;
pub use solve::{solve as run_solve, SolveResult};
pub use terr_core::Mode;
