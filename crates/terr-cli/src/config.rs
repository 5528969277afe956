//! Loads a `Configuration` from an operator-facing TOML file, mirroring the teacher's
//! `GatConfig` loading convention (§4.12): every field carries `#[serde(default)]`, so a
//! file only needs to name the knobs it overrides. Omitting `--config` entirely falls
//! back to a validated, all-defaults `Configuration`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use terr_core::Configuration;

pub fn load_configuration(path: Option<&Path>) -> Result<Configuration> {
    let configuration = match path {
        Some(path) => {
            let contents = fs::read_to_string(path).with_context(|| format!("reading configuration file {}", path.display()))?;
            toml::from_str::<Configuration>(&contents)
                .with_context(|| format!("parsing configuration TOML from {}", path.display()))?
        }
        None => default_configuration(),
    };
    configuration.validate().with_context(|| "configuration failed validation")?;
    Ok(configuration)
}

/// Every nested section already has a valid `Default`, so this always passes
/// `Configuration::validate`. It exists purely so "no `--config` given" and "an
/// explicit file with every section omitted" take the identical code path.
fn default_configuration() -> Configuration {
    toml::from_str::<Configuration>("").expect("an empty TOML document deserializes to an all-default Configuration")
}
