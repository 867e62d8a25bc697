//! Config file resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// - `Some(dir)` gives `{dir}/config.toml`.
/// - Otherwise `$XDG_CONFIG_HOME/cinefind/config.toml` when that variable is
///   set and non-empty, else `~/.config/cinefind/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }
    let xdg = std::env::var("XDG_CONFIG_HOME").ok();
    let home = std::env::var("HOME").ok();
    config_home(xdg.as_deref(), home.as_deref()).map(|base| base.join("cinefind").join(CONFIG_FILE))
}

fn config_home(xdg: Option<&str>, home: Option<&str>) -> Result<PathBuf> {
    if let Some(xdg) = xdg.filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(xdg));
    }
    let home = home.context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home).join(".config"))
}
