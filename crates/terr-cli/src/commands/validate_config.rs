//! `territory-opt validate-config` (§4.15): checks a configuration file without
//! running a solve.

use std::path::Path;

use anyhow::Result;

use crate::config::load_configuration;

pub fn run(config: &Path) -> Result<()> {
    load_configuration(Some(config))?;
    println!("{} is valid", config.display());
    Ok(())
}
