//! One module per subcommand, following the teacher's `commands/` layout.

pub mod completions;
pub mod solve;
pub mod validate_config;
