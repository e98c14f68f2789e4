//! `medq config` – show the effective configuration or its location.

use anyhow::{Context, Result};
use medq_core::config;

pub fn run_config(path_only: bool) -> Result<()> {
    let path = config::config_path()?;
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }
    let cfg = config::load_or_init()?;
    let rendered = toml::to_string_pretty(&cfg).context("render config as TOML")?;
    println!("# {}", path.display());
    print!("{rendered}");
    Ok(())
}
