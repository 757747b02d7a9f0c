use std::path::Path;

use anyhow::{Context, Result};

use xdeps_lib::orchestrator::clean;

use super::{load_config, selected};
use crate::output::{print_info, print_success};

/// Remove source and build trees. Downloads and the install prefix stay.
pub fn cmd_clean(config: &Path, projects: &[String]) -> Result<()> {
  let config = load_config(config)?;
  let manifest = selected(projects)?;

  let removed = clean(&config.work_dirs(), &manifest).context("Clean failed")?;

  if removed.is_empty() {
    print_info("Nothing to clean");
  } else {
    for dir in &removed {
      println!("  {}", dir.display());
    }
    print_success(&format!("Removed {} director{}", removed.len(), if removed.len() == 1 { "y" } else { "ies" }));
  }
  Ok(())
}
