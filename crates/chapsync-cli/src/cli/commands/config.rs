//! `chapsync config` – show where the config lives and what is in effect.

use anyhow::Result;
use chapsync_core::config::SyncConfig;
use std::path::Path;

pub fn run_show_config(cfg: &SyncConfig, path: &Path) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", render_config(cfg)?);
    Ok(())
}

fn render_config(cfg: &SyncConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}
