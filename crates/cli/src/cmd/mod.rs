mod build;
mod clean;
mod list;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use xdeps_lib::config::Config;
use xdeps_lib::manifest::Manifest;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use list::cmd_list;

fn load_config(path: &Path) -> Result<Config> {
  let config =
    Config::load(path).with_context(|| format!("Failed to load configuration from {}", path.display()))?;
  debug!(path = ?path, host = %config.toolchain.host_triple, "configuration loaded");
  Ok(config)
}

/// The built-in manifest, narrowed to `names` when any are given.
fn selected(names: &[String]) -> Result<Manifest> {
  let manifest = xdeps_lib::libs::all().context("Built-in project table is invalid")?;
  if names.is_empty() {
    return Ok(manifest);
  }
  Ok(manifest.select(names)?)
}
