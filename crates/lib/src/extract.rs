//! Archive extraction into stable per-project source trees.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::{debug, info, warn};
use xz2::read::XzDecoder;

use crate::consts::SOURCE_READY_MARKER;
use crate::project::archive_base;

#[derive(Debug, Error)]
pub enum ExtractError {
  #[error("unsupported archive format: {}", .0.display())]
  Unsupported(PathBuf),

  #[error("corrupt archive {}: {source}", .archive.display())]
  Corrupt {
    archive: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("archive {} has an entry outside its root: {}", .archive.display(), .entry.display())]
  UnsafeEntry { archive: PathBuf, entry: PathBuf },

  #[error("I/O error at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ExtractError {
  fn io(path: &Path, source: std::io::Error) -> Self {
    ExtractError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  Tar,
  TarGz,
  TarXz,
  TarBz2,
}

impl ArchiveFormat {
  /// Detect the format from the file name.
  pub fn detect(file_name: &str) -> Option<Self> {
    let name = file_name.to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Some(ArchiveFormat::TarGz)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
      Some(ArchiveFormat::TarXz)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
      Some(ArchiveFormat::TarBz2)
    } else if name.ends_with(".tar") {
      Some(ArchiveFormat::Tar)
    } else {
      None
    }
  }

  fn decoder(self, file: File) -> Box<dyn Read> {
    let reader = BufReader::new(file);
    match self {
      ArchiveFormat::Tar => Box::new(reader),
      ArchiveFormat::TarGz => Box::new(GzDecoder::new(reader)),
      ArchiveFormat::TarXz => Box::new(XzDecoder::new(reader)),
      ArchiveFormat::TarBz2 => Box::new(BzDecoder::new(reader)),
    }
  }
}

/// Result of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
  pub source_dir: PathBuf,
  /// `true` when the tree was unpacked just now and still needs patching.
  pub fresh: bool,
}

/// Unpack `archive` to `dest_dir/<top_level>`.
///
/// `top_level` defaults to the archive's file name without its extension.
/// Whatever single directory the archive contains is renamed to that name;
/// an archive without a single root directory is unpacked into it directly.
///
/// A tree that already carries the source-ready marker is reused as is. A
/// tree without the marker was left behind by an interrupted run and is
/// replaced.
pub fn extract(archive: &Path, dest_dir: &Path, top_level: Option<&str>) -> Result<Extraction, ExtractError> {
  let file_name = archive
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or_else(|| ExtractError::Unsupported(archive.to_path_buf()))?;
  let format = ArchiveFormat::detect(file_name).ok_or_else(|| ExtractError::Unsupported(archive.to_path_buf()))?;

  let source_dir = dest_dir.join(top_level.unwrap_or_else(|| archive_base(file_name)));

  if source_dir.join(SOURCE_READY_MARKER).exists() {
    debug!(path = ?source_dir, "reusing extracted source tree");
    return Ok(Extraction {
      source_dir,
      fresh: false,
    });
  }

  if source_dir.exists() {
    warn!(path = ?source_dir, "removing incomplete source tree");
    fs::remove_dir_all(&source_dir).map_err(|e| ExtractError::io(&source_dir, e))?;
  }

  fs::create_dir_all(dest_dir).map_err(|e| ExtractError::io(dest_dir, e))?;
  let staging = tempfile::Builder::new()
    .prefix(".extract-")
    .tempdir_in(dest_dir)
    .map_err(|e| ExtractError::io(dest_dir, e))?;

  info!(archive = ?archive, dest = ?source_dir, "extracting");
  unpack(archive, format, staging.path())?;

  let entries: Vec<PathBuf> = fs::read_dir(staging.path())
    .map_err(|e| ExtractError::io(staging.path(), e))?
    .map(|entry| entry.map(|e| e.path()))
    .collect::<Result<_, _>>()
    .map_err(|e| ExtractError::io(staging.path(), e))?;

  match entries.as_slice() {
    [root] if root.is_dir() => {
      fs::rename(root, &source_dir).map_err(|e| ExtractError::io(root, e))?;
    }
    _ => {
      fs::create_dir_all(&source_dir).map_err(|e| ExtractError::io(&source_dir, e))?;
      for entry in &entries {
        if let Some(name) = entry.file_name() {
          fs::rename(entry, source_dir.join(name)).map_err(|e| ExtractError::io(entry, e))?;
        }
      }
    }
  }

  Ok(Extraction {
    source_dir,
    fresh: true,
  })
}

fn unpack(archive: &Path, format: ArchiveFormat, into: &Path) -> Result<(), ExtractError> {
  let corrupt = |source| ExtractError::Corrupt {
    archive: archive.to_path_buf(),
    source,
  };

  let file = File::open(archive).map_err(|e| ExtractError::io(archive, e))?;
  let mut tar = Archive::new(format.decoder(file));
  tar.set_preserve_mtime(true);

  for entry in tar.entries().map_err(corrupt)? {
    let mut entry = entry.map_err(corrupt)?;
    let unpacked = entry.unpack_in(into).map_err(corrupt)?;
    if !unpacked {
      let path = entry.path().map(|p| p.into_owned()).unwrap_or_default();
      return Err(ExtractError::UnsafeEntry {
        archive: archive.to_path_buf(),
        entry: path,
      });
    }
  }
  Ok(())
}
