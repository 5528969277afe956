//! # terr-cli: Command-Line Interface
//!
//! The `territory-opt` binary: loads an account/rep snapshot and a `Configuration`
//! from disk, runs one solve through `terr-algo`, and prints the result (§4.15).
//!
//! Everything that touches the filesystem or a terminal lives here: `terr-core` and
//! `terr-algo` never read a file or print anything themselves.
//!
//! ## Command Structure
//!
//! ```text
//! territory-opt
//! ├── solve             # Run a solve over a snapshot + configuration
//! ├── validate-config   # Check a configuration file without solving
//! └── completions       # Generate shell completion scripts
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod snapshot;

pub use cli::{build_cli_command, Cli, Commands};
