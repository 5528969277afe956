use std::io;

use anyhow::Result;
use clap_complete::{generate, Shell};

use crate::cli::build_cli_command;

pub fn run(shell: Shell) -> Result<()> {
    let mut cmd = build_cli_command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
