//! Filesystem helpers.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Recursively copy `from` into `to`, creating `to` and any parents.
///
/// Symlinks are recreated on Unix and followed elsewhere.
pub fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
  std::fs::create_dir_all(to)?;

  for entry in WalkDir::new(from).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    let rel = entry.path().strip_prefix(from).map_err(io::Error::other)?;
    if rel.as_os_str().is_empty() {
      continue;
    }
    let dest = to.join(rel);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      std::fs::create_dir_all(&dest)?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &dest)?;
    } else {
      std::fs::copy(entry.path(), &dest)?;
    }
  }

  Ok(())
}

/// Replace `to` with a copy of `from`.
///
/// The copy is assembled in a staging directory next to `to` and renamed into
/// place, so `to` never holds a partial tree.
pub fn replace_dir(from: &Path, to: &Path) -> io::Result<()> {
  let parent = to
    .parent()
    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
  std::fs::create_dir_all(parent)?;

  let staging = tempfile::Builder::new().prefix(".install-").tempdir_in(parent)?;
  let tree = staging.path().join("tree");
  copy_dir(from, &tree)?;

  remove_dir_if_exists(to)?;
  std::fs::rename(&tree, to)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
  let target = std::fs::read_link(src)?;
  if dest.symlink_metadata().is_ok() {
    std::fs::remove_file(dest)?;
  }
  std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
  if src.is_dir() {
    copy_dir(src, dest)
  } else {
    std::fs::copy(src, dest).map(|_| ())
  }
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<bool> {
  match std::fs::remove_dir_all(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}
