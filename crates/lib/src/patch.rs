//! Source modifications applied to a freshly extracted tree.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::project::{Edit, PatchSpec};
use crate::runner::{Invocation, RunError, Runner, path_arg};

#[derive(Debug, Error)]
pub enum PatchError {
  #[error("patch {} does not apply: {source}", .patch.display())]
  Rejected {
    patch: PathBuf,
    #[source]
    source: RunError,
  },

  #[error("edited file {} does not exist", .0.display())]
  MissingFile(PathBuf),

  #[error("patch directory {} does not exist", .0.display())]
  MissingDir(PathBuf),

  #[error("I/O error at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl PatchError {
  fn io(path: &Path, source: std::io::Error) -> Self {
    PatchError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// Apply `spec` to `source_dir`.
///
/// Relative patch directories are resolved against `patch_root`.
pub async fn apply(
  runner: &impl Runner,
  source_dir: &Path,
  spec: &PatchSpec,
  patch_root: &Path,
) -> Result<(), PatchError> {
  match spec {
    PatchSpec::Dir(dir) => {
      let dir = if dir.is_absolute() { dir.clone() } else { patch_root.join(dir) };
      apply_patch_dir(runner, source_dir, &dir).await
    }
    PatchSpec::Edits(edits) => apply_edits(source_dir, edits).await,
  }
}

/// Regular files in `dir`, sorted by file name.
pub async fn patch_files(dir: &Path) -> Result<Vec<PathBuf>, PatchError> {
  if !dir.is_dir() {
    return Err(PatchError::MissingDir(dir.to_path_buf()));
  }

  let mut files = Vec::new();
  let mut entries = fs::read_dir(dir).await.map_err(|e| PatchError::io(dir, e))?;
  while let Some(entry) = entries.next_entry().await.map_err(|e| PatchError::io(dir, e))? {
    let file_type = entry.file_type().await.map_err(|e| PatchError::io(&entry.path(), e))?;
    if file_type.is_file() {
      files.push(entry.path());
    }
  }
  files.sort();
  Ok(files)
}

fn patch_invocation(source_dir: &Path, patch: &Path, dry_run: bool) -> Invocation {
  let mut inv = Invocation::new("patch", source_dir).args([
    "-p1",
    "--forward",
    "--batch",
    "--fuzz=0",
    "--no-backup-if-mismatch",
  ]);
  if dry_run {
    inv = inv.arg("--dry-run");
  }
  inv.arg("-i").arg(path_arg(patch))
}

async fn apply_patch_dir(runner: &impl Runner, source_dir: &Path, dir: &Path) -> Result<(), PatchError> {
  let patches = patch_files(dir).await?;
  info!(dir = ?dir, count = patches.len(), "applying patches");

  for patch in patches {
    debug!(patch = ?patch, "applying patch");
    for dry_run in [true, false] {
      runner
        .run(&patch_invocation(source_dir, &patch, dry_run))
        .await
        .map_err(|source| PatchError::Rejected {
          patch: patch.clone(),
          source,
        })?;
    }
  }
  Ok(())
}

async fn apply_edits(source_dir: &Path, edits: &[Edit]) -> Result<(), PatchError> {
  for edit in edits {
    let path = source_dir.join(&edit.path);
    let original = match fs::read_to_string(&path).await {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(PatchError::MissingFile(path)),
      Err(e) => return Err(PatchError::io(&path, e)),
    };

    let edited = (edit.transform)(&original);
    if edited == original {
      warn!(path = ?path, "edit left the file unchanged");
      continue;
    }

    fs::write(&path, edited).await.map_err(|e| PatchError::io(&path, e))?;
    debug!(path = ?path, "edited");
  }
  Ok(())
}
