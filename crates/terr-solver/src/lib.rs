//! Wire protocol and session-persistence helpers for the remote MIP solver service.
//!
//! The core optimizer never speaks HTTP directly; it hands a solver-agnostic problem
//! to `terr-algo`'s dispatcher, which, on the remote path, renders the problem to
//! CPLEX LP text and uses this crate's [`client::RemoteSolverClient`] to post it
//! (§6.2). This crate also owns the persistent daily-quota store ([`quota`]) since
//! quota state must outlive any single CLI invocation.

pub mod client;
pub mod error;
pub mod protocol;
pub mod quota;

pub use client::RemoteSolverClient;
pub use error::{SolverError, SolverResult};
pub use protocol::{LpRequest, LpResponse, Primal, RemoteStatus};
pub use quota::RemoteQuotaStore;
