//! Pipeline orchestration.
//!
//! Drives every project of a manifest through fetch, extract, patch and the
//! backend's configure/compile/install phases, strictly one after another
//! in manifest order.
//!
//! The installed artifact is the completion record: a project whose artifact
//! is a non-empty file under the install prefix is skipped without touching the network or
//! starting a process. The artifact is only ever produced by a successful
//! install, so an interrupted run simply resumes at the first project that
//! has none.
//!
//! The run stops at the first failing project.

mod types;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::backend::BuildContext;
use crate::consts::SOURCE_READY_MARKER;
use crate::extract::extract;
use crate::fetch::Fetcher;
use crate::lock::WorkLock;
use crate::manifest::Manifest;
use crate::patch;
use crate::project::Project;
use crate::runner::Runner;
use crate::toolchain::ToolchainConfig;
use crate::util::fs::remove_dir_if_exists;

pub use types::*;

/// Whether `project` is already installed for `toolchain`.
pub fn is_complete(toolchain: &ToolchainConfig, project: &Project) -> bool {
  toolchain.has_installed(&project.artifact)
}

pub struct Orchestrator<'a, R: Runner> {
  runner: &'a R,
  toolchain: &'a ToolchainConfig,
  dirs: WorkDirs,
  fetcher: Fetcher,
}

impl<'a, R: Runner> Orchestrator<'a, R> {
  pub fn new(runner: &'a R, toolchain: &'a ToolchainConfig, dirs: WorkDirs) -> Result<Self, PipelineError> {
    Ok(Self {
      runner,
      toolchain,
      dirs,
      fetcher: Fetcher::new()?,
    })
  }

  /// Run every project in `manifest`, in order, until one fails.
  ///
  /// Only failing to take the work-dir lock is returned as `Err`; a project
  /// failure is recorded in the report.
  pub async fn run(&self, manifest: &Manifest) -> Result<RunReport, PipelineError> {
    let _lock = WorkLock::acquire(&self.dirs.root, "xdeps build")?;
    let mut report = RunReport::default();

    info!(projects = manifest.len(), prefix = ?self.toolchain.install_prefix, "starting run");

    for project in manifest {
      match self.run_project(project).await {
        Ok(outcome) => report.outcomes.push((project.name.clone(), outcome)),
        Err(failure) => {
          error!(
            project = %failure.project,
            state = %ProjectState::Failed(failure.phase),
            error = %failure.error,
            "project failed"
          );
          report.failure = Some(failure);
          break;
        }
      }
    }

    info!(
      built = report.built(),
      cached = report.cached(),
      success = report.is_success(),
      "run finished"
    );
    Ok(report)
  }

  /// Take one project from `Pending` to `Built` or `Cached`.
  pub async fn run_project(&self, project: &Project) -> Result<Outcome, ProjectFailure> {
    let mut state = ProjectState::Pending;
    let fail = |phase: Phase, error: PipelineError| ProjectFailure {
      project: project.name.clone(),
      phase,
      error,
    };

    if is_complete(self.toolchain, project) {
      transition(project, &mut state, ProjectState::Cached);
      return Ok(Outcome::Cached);
    }

    let archive = self
      .fetcher
      .fetch(self.runner, &project.urls, &project.digest, &self.dirs.downloads)
      .await
      .map_err(|e| fail(Phase::Fetch, e.into()))?;
    transition(project, &mut state, ProjectState::Fetched);

    let base = project.base_dir_name();
    discard_foreign_source(&self.dirs.sources().join(&base), project).map_err(|e| fail(Phase::Extract, e))?;
    let extraction =
      extract(&archive, &self.dirs.sources(), Some(&base)).map_err(|e| fail(Phase::Extract, e.into()))?;
    transition(project, &mut state, ProjectState::Extracted);

    let source_dir = extraction.source_dir;
    if extraction.fresh {
      if let Some(spec) = &project.patches {
        patch::apply(self.runner, &source_dir, spec, &self.dirs.patch_root)
          .await
          .map_err(|e| fail(Phase::Patch, e.into()))?;
      }
      write_source_marker(&source_dir, project)
        .await
        .map_err(|e| fail(Phase::Patch, e))?;
    } else {
      debug!(project = %project.name, "source tree already prepared, not patching again");
    }
    transition(project, &mut state, ProjectState::Patched);

    let build_dir = self.dirs.builds().join(&base);
    if !project.backend.in_source() {
      remove_dir_if_exists(&build_dir).map_err(|e| fail(Phase::Configure, PipelineError::io(&build_dir, e)))?;
    }

    let ctx = BuildContext {
      project,
      source_dir: &source_dir,
      build_dir: &build_dir,
      toolchain: self.toolchain,
    };
    let artifact = project
      .backend
      .build(&ctx, self.runner)
      .await
      .map_err(|e| fail(e.phase, e.into()))?;
    transition(project, &mut state, ProjectState::Built);

    debug!(project = %project.name, artifact = ?artifact, "artifact installed");
    Ok(Outcome::Built)
  }
}

fn transition(project: &Project, state: &mut ProjectState, next: ProjectState) {
  info!(project = %project.name, from = %state, to = %next, "state change");
  *state = next;
}

/// Remove a prepared source tree whose marker names a different archive
/// digest than `project` now pins.
fn discard_foreign_source(source_dir: &Path, project: &Project) -> Result<(), PipelineError> {
  let Ok(text) = std::fs::read_to_string(source_dir.join(SOURCE_READY_MARKER)) else {
    return Ok(());
  };
  let expected = project.digest.to_string();
  let recorded = serde_json::from_str::<SourceMarker>(&text).ok().map(|m| m.digest);
  if recorded.as_deref() == Some(expected.as_str()) {
    return Ok(());
  }

  warn!(
    project = %project.name,
    path = ?source_dir,
    recorded = recorded.as_deref().unwrap_or("unreadable"),
    expected = %expected,
    "source tree was prepared from another archive, replacing"
  );
  remove_dir_if_exists(source_dir).map_err(|e| PipelineError::io(source_dir, e))?;
  Ok(())
}

async fn write_source_marker(source_dir: &Path, project: &Project) -> Result<(), PipelineError> {
  let marker = SourceMarker {
    version: 1,
    digest: project.digest.to_string(),
    patched: project.patches.is_some(),
  };
  let path = source_dir.join(SOURCE_READY_MARKER);
  let content = serde_json::to_string(&marker).map_err(|e| PipelineError::io(&path, std::io::Error::other(e)))?;
  fs::write(&path, format!("{content}\n"))
    .await
    .map_err(|e| PipelineError::io(&path, e))
}

/// Remove the source and build trees of `projects`.
///
/// Downloads and the install prefix are left alone. Returns the directories
/// that were actually removed.
pub fn clean(dirs: &WorkDirs, projects: &Manifest) -> Result<Vec<PathBuf>, PipelineError> {
  let _lock = WorkLock::acquire(&dirs.root, "xdeps clean")?;
  let mut removed = Vec::new();

  for project in projects {
    let base = project.base_dir_name();
    for dir in [dirs.sources().join(&base), dirs.builds().join(&base)] {
      if remove_dir_if_exists(&dir).map_err(|e| PipelineError::io(&dir, e))? {
        info!(project = %project.name, path = ?dir, "removed");
        removed.push(dir);
      }
    }
  }
  Ok(removed)
}
