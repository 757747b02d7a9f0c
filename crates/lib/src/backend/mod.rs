//! Build backends.
//!
//! The set of build systems is closed and known when a project is declared,
//! so it is an enum rather than a trait object. Every variant turns a
//! [`BuildContext`] into a [`BuildPlan`]: three ordered lists of [`Step`]s for
//! the configure, compile and install phases. Executing a plan is shared code,
//! so variants only differ in how they compute command lines, environment and
//! generated files.
//!
//! # Submodules
//!
//! - [`meson`], [`cmake`], [`autotools`] - the generic build systems
//! - [`zlib`], [`ffmpeg`], [`openssl`], [`boost`], [`jack`] - projects with
//!   home-grown build scripts or no build at all

pub mod autotools;
pub mod boost;
pub mod cmake;
pub mod ffmpeg;
pub mod jack;
pub mod meson;
pub mod openssl;
pub mod zlib;

mod types;

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::orchestrator::Phase;
use crate::project::Project;
use crate::runner::Runner;
use crate::toolchain::ToolchainConfig;
use crate::util::fs::replace_dir;

pub use autotools::AutotoolsOptions;
pub use types::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
  Meson,
  Cmake,
  Autotools(AutotoolsOptions),
  Zlib,
  Ffmpeg,
  OpenSsl,
  Boost,
  Jack,
}

impl Backend {
  /// Autotools with no pre-configure step and no subdir restriction.
  pub fn autotools() -> Self {
    Backend::Autotools(AutotoolsOptions::default())
  }

  /// Whether the project builds inside its source tree rather than a
  /// separate build directory.
  pub fn in_source(&self) -> bool {
    matches!(self, Backend::Zlib | Backend::OpenSsl | Backend::Boost | Backend::Jack)
  }

  /// Compute the full three-phase plan for one project.
  pub fn plan(&self, ctx: &BuildContext<'_>) -> Result<BuildPlan, StepError> {
    match self {
      Backend::Meson => Ok(meson::plan(ctx)),
      Backend::Cmake => Ok(cmake::plan(ctx)),
      Backend::Autotools(options) => Ok(autotools::plan(ctx, options)),
      Backend::Zlib => Ok(zlib::plan(ctx)),
      Backend::Ffmpeg => Ok(ffmpeg::plan(ctx)),
      Backend::OpenSsl => openssl::plan(ctx),
      Backend::Boost => Ok(boost::plan(ctx)),
      Backend::Jack => Ok(jack::plan(ctx)),
    }
  }

  /// Configure, compile and install one project, returning the artifact path.
  ///
  /// Each phase runs to completion before the next starts. The first failing
  /// step aborts the build and is reported with its phase.
  pub async fn build(&self, ctx: &BuildContext<'_>, runner: &impl Runner) -> Result<PathBuf, PhaseError> {
    let plan = self.plan(ctx).map_err(|source| PhaseError {
      phase: Phase::Configure,
      source,
    })?;

    if !self.in_source() {
      fs::create_dir_all(ctx.build_dir)
        .await
        .map_err(|e| PhaseError::io(Phase::Configure, ctx.build_dir, e))?;
    }

    for (phase, steps) in [
      (Phase::Configure, &plan.configure),
      (Phase::Compile, &plan.compile),
      (Phase::Install, &plan.install),
    ] {
      info!(project = %ctx.project.name, backend = %self, %phase, steps = steps.len(), "running phase");
      for step in steps {
        execute_step(step, runner)
          .await
          .map_err(|source| PhaseError { phase, source })?;
      }
    }

    let artifact = ctx.toolchain.installed(&ctx.project.artifact);
    if !ctx.toolchain.has_installed(&ctx.project.artifact) {
      return Err(PhaseError {
        phase: Phase::Install,
        source: StepError::MissingArtifact(artifact),
      });
    }

    Ok(artifact)
  }
}

impl fmt::Display for Backend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Backend::Meson => "meson",
      Backend::Cmake => "cmake",
      Backend::Autotools(_) => "autotools",
      Backend::Zlib => "zlib",
      Backend::Ffmpeg => "ffmpeg",
      Backend::OpenSsl => "openssl",
      Backend::Boost => "boost",
      Backend::Jack => "jack",
    };
    write!(f, "{name}")
  }
}

/// Everything a backend needs to plan one build.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
  pub project: &'a Project,
  pub source_dir: &'a Path,
  pub build_dir: &'a Path,
  pub toolchain: &'a ToolchainConfig,
}

impl BuildContext<'_> {
  /// Directory tools run in: the source tree for in-source backends.
  pub fn work_dir(&self) -> &Path {
    if self.project.backend.in_source() {
      self.source_dir
    } else {
      self.build_dir
    }
  }

  pub fn jobs(&self) -> String {
    self.toolchain.jobs.max(1).to_string()
  }
}

async fn execute_step(step: &Step, runner: &impl Runner) -> Result<(), StepError> {
  match step {
    Step::Run(invocation) => {
      runner.run(invocation).await?;
    }
    Step::CreateDir(path) => {
      fs::create_dir_all(path).await.map_err(|e| StepError::io(path, e))?;
    }
    Step::WriteFile { path, contents } => {
      debug!(path = ?path, "writing file");
      ensure_parent(path).await?;
      fs::write(path, contents).await.map_err(|e| StepError::io(path, e))?;
    }
    Step::CopyFile { from, to } => {
      ensure_parent(to).await?;
      fs::copy(from, to).await.map_err(|e| StepError::io(from, e))?;
    }
    Step::ReplaceDir { from, to } => {
      debug!(from = ?from, to = ?to, "replacing directory");
      replace_dir(from, to).map_err(|e| StepError::io(from, e))?;
    }
  }
  Ok(())
}

async fn ensure_parent(path: &Path) -> Result<(), StepError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).await.map_err(|e| StepError::io(parent, e))?;
  }
  Ok(())
}
