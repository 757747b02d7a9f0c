//! Types shared by all backends.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::orchestrator::Phase;
use crate::runner::{Invocation, RunError};

/// One unit of work inside a build phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  Run(Invocation),
  WriteFile { path: PathBuf, contents: String },
  CopyFile { from: PathBuf, to: PathBuf },
  /// Replace the directory `to` with a copy of `from`.
  ReplaceDir { from: PathBuf, to: PathBuf },
  CreateDir(PathBuf),
}

/// Ordered steps for the configure, compile and install phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
  pub configure: Vec<Step>,
  pub compile: Vec<Step>,
  pub install: Vec<Step>,
}

impl BuildPlan {
  /// Every `Run` step in execution order.
  pub fn invocations(&self) -> impl Iterator<Item = &Invocation> {
    self
      .configure
      .iter()
      .chain(&self.compile)
      .chain(&self.install)
      .filter_map(|step| match step {
        Step::Run(inv) => Some(inv),
        _ => None,
      })
  }
}

#[derive(Debug, Error)]
pub enum StepError {
  #[error(transparent)]
  Run(#[from] RunError),

  #[error("I/O error at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("no known build target for host triple '{0}'")]
  UnsupportedHost(String),

  #[error("install finished but artifact {} is missing or empty", .0.display())]
  MissingArtifact(PathBuf),
}

impl StepError {
  pub fn io(path: &Path, source: std::io::Error) -> Self {
    StepError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// A step failure tagged with the phase it happened in.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct PhaseError {
  pub phase: Phase,
  #[source]
  pub source: StepError,
}

impl PhaseError {
  pub fn io(phase: Phase, path: &Path, source: std::io::Error) -> Self {
    PhaseError {
      phase,
      source: StepError::io(path, source),
    }
  }
}
