//! Types for pipeline runs.
//!
//! This module defines the per-project phases and outcomes, the run report,
//! and the error type that joins every module's failures.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::PhaseError;
use crate::extract::ExtractError;
use crate::fetch::FetchError;
use crate::lock::LockError;
use crate::manifest::ManifestError;
use crate::patch::PatchError;

/// A stage of the per-project pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Fetch,
  Extract,
  Patch,
  Configure,
  Compile,
  Install,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Phase::Fetch => "fetch",
      Phase::Extract => "extract",
      Phase::Patch => "patch",
      Phase::Configure => "configure",
      Phase::Compile => "compile",
      Phase::Install => "install",
    };
    write!(f, "{name}")
  }
}

/// Where a project currently is in the pipeline.
///
/// `Pending → Fetched → Extracted → Patched → Built`, with `Cached` as a
/// shortcut from `Pending` when the artifact already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectState {
  Pending,
  Fetched,
  Extracted,
  Patched,
  Built,
  Cached,
  Failed(Phase),
}

impl fmt::Display for ProjectState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProjectState::Pending => write!(f, "pending"),
      ProjectState::Fetched => write!(f, "fetched"),
      ProjectState::Extracted => write!(f, "extracted"),
      ProjectState::Patched => write!(f, "patched"),
      ProjectState::Built => write!(f, "built"),
      ProjectState::Cached => write!(f, "cached"),
      ProjectState::Failed(phase) => write!(f, "failed in {phase}"),
    }
  }
}

/// How a successfully completed project got its artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// The artifact was already installed; nothing ran.
  Cached,
  /// The full pipeline ran.
  Built,
}

/// Errors that halt a run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Fetch(FetchError),

  /// The downloaded bytes did not match the pinned digest.
  #[error(transparent)]
  Integrity(FetchError),

  #[error(transparent)]
  Extract(#[from] ExtractError),

  #[error(transparent)]
  Patch(#[from] PatchError),

  #[error(transparent)]
  Configure(PhaseError),

  #[error(transparent)]
  Compile(PhaseError),

  #[error(transparent)]
  Install(PhaseError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error("I/O error at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl PipelineError {
  pub fn io(path: &Path, source: std::io::Error) -> Self {
    PipelineError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

impl From<FetchError> for PipelineError {
  fn from(err: FetchError) -> Self {
    match err {
      FetchError::Integrity { .. } => PipelineError::Integrity(err),
      other => PipelineError::Fetch(other),
    }
  }
}

impl From<PhaseError> for PipelineError {
  fn from(err: PhaseError) -> Self {
    match err.phase {
      Phase::Install => PipelineError::Install(err),
      Phase::Compile => PipelineError::Compile(err),
      _ => PipelineError::Configure(err),
    }
  }
}

/// The project that stopped a run, and why.
#[derive(Debug)]
pub struct ProjectFailure {
  pub project: String,
  pub phase: Phase,
  pub error: PipelineError,
}

impl fmt::Display for ProjectFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} failed in {}: {}", self.project, self.phase, self.error)
  }
}

/// Result of running the pipeline over a manifest.
#[derive(Debug, Default)]
pub struct RunReport {
  /// Completed projects in manifest order.
  pub outcomes: Vec<(String, Outcome)>,

  /// Project that failed (at most one, stops the run).
  pub failure: Option<ProjectFailure>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.failure.is_none()
  }

  pub fn built(&self) -> usize {
    self.outcomes.iter().filter(|(_, o)| *o == Outcome::Built).count()
  }

  pub fn cached(&self) -> usize {
    self.outcomes.iter().filter(|(_, o)| *o == Outcome::Cached).count()
  }
}

/// Directories a run works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirs {
  /// Work directory holding the lock, `src/` and `build/`.
  pub root: PathBuf,
  /// Verified archives, shared between work dirs.
  pub downloads: PathBuf,
  /// Root that relative patch directories resolve against.
  pub patch_root: PathBuf,
}

impl WorkDirs {
  /// Default layout: everything below `root`, patches relative to it.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      downloads: root.join("downloads"),
      patch_root: root.clone(),
      root,
    }
  }

  pub fn sources(&self) -> PathBuf {
    self.root.join("src")
  }

  pub fn builds(&self) -> PathBuf {
    self.root.join("build")
  }
}

/// Contents of the source-ready marker written after extraction and patching.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceMarker {
  /// Marker format version.
  pub version: u32,
  /// Digest of the archive the tree came from.
  pub digest: String,
  /// Whether patches or edits were applied to the tree.
  pub patched: bool,
}
