use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use xdeps_lib::orchestrator::is_complete;

use super::{load_config, selected};
use crate::output::{OutputFormat, print_json, symbols};

#[derive(Serialize)]
struct ProjectRow {
  name: String,
  version: Option<String>,
  backend: String,
  artifact: String,
  installed: bool,
}

pub fn cmd_list(config: &Path, output: OutputFormat) -> Result<()> {
  let config = load_config(config)?;
  let manifest = selected(&[])?;

  let rows: Vec<ProjectRow> = manifest
    .projects()
    .iter()
    .map(|p| ProjectRow {
      name: p.name.clone(),
      version: p.version(),
      backend: p.backend.to_string(),
      artifact: p.artifact.display().to_string(),
      installed: is_complete(&config.toolchain, p),
    })
    .collect();

  if output.is_json() {
    return print_json(&rows);
  }

  for row in &rows {
    let mark = if row.installed {
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
    } else {
      symbols::PENDING.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string()
    };
    println!(
      "{} {:<14} {:<28} {}",
      mark,
      row.name,
      row.version.as_deref().unwrap_or("-"),
      row.backend.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
  Ok(())
}
