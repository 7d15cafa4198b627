//! Config command handlers.

use anyhow::{Context, Result};
use uplink_core::config::{Config, paths};

/// Prints the resolved configuration as TOML.
pub fn show(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("serialize config")?;
    print!("{rendered}");
    Ok(())
}

/// Prints the config file path.
pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}
