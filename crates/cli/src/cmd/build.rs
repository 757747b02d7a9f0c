//! Implementation of the `xdeps build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use xdeps_lib::orchestrator::Orchestrator;
use xdeps_lib::runner::SystemRunner;

use super::{load_config, selected};
use crate::output::{format_duration, print_error, print_stat, print_success};

/// Run the pipeline over the selected projects.
///
/// Halts at the first failing project and reports its phase together with
/// the failing tool's own output.
pub fn cmd_build(config: &Path, projects: &[String]) -> Result<()> {
  let start = Instant::now();
  let config = load_config(config)?;
  let manifest = selected(projects)?;

  let runner = SystemRunner;
  let orchestrator = Orchestrator::new(&runner, &config.toolchain, config.work_dirs())?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(orchestrator.run(&manifest))?;

  println!();
  if let Some(failure) = &report.failure {
    print_error(&format!("{} failed in {} phase", failure.project, failure.phase));
    eprintln!("{}", failure.error);
  } else {
    print_success("All projects installed");
  }
  print_stat("Built", &report.built().to_string());
  print_stat("Cached", &report.cached().to_string());
  print_stat("Prefix", &config.toolchain.install_prefix.display().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));

  if let Some(failure) = report.failure {
    bail!("{} failed in {} phase", failure.project, failure.phase);
  }
  Ok(())
}
