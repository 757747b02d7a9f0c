//! Project definitions.
//!
//! A [`Project`] is immutable static data describing one third-party library:
//! where its source comes from, how to verify it, what it installs and which
//! backend builds it.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::backend::Backend;
use crate::digest::{DigestError, SourceDigest};

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("project '{0}' declares no source URL")]
  NoUrls(String),

  #[error("project '{artifact}': {source}")]
  Digest {
    artifact: String,
    #[source]
    source: DigestError,
  },

  #[error("artifact path '{0}' must be a non-empty relative path inside the install prefix")]
  BadArtifact(String),
}

/// A programmatic source edit: a pure text transformation of one file.
#[derive(Debug, Clone)]
pub struct Edit {
  /// Path relative to the source tree root.
  pub path: PathBuf,
  pub transform: fn(&str) -> String,
}

impl Edit {
  pub fn new(path: impl Into<PathBuf>, transform: fn(&str) -> String) -> Self {
    Self {
      path: path.into(),
      transform,
    }
  }
}

/// Source modifications applied right after a fresh extraction.
#[derive(Debug, Clone)]
pub enum PatchSpec {
  /// A directory of unified diffs, applied with `-p1` in lexical order.
  /// Relative paths resolve against the configured patch root.
  Dir(PathBuf),
  /// Programmatic edits, applied in declaration order.
  Edits(Vec<Edit>),
}

#[derive(Debug, Clone)]
pub struct Project {
  /// Logical name, inferred from the artifact.
  pub name: String,
  /// Mirrors of the same archive, in preference order.
  pub urls: Vec<String>,
  pub digest: SourceDigest,
  /// Relative to the install prefix. Its existence means "already built".
  pub artifact: PathBuf,
  pub backend: Backend,
  pub configure_args: Vec<String>,
  /// Appended to the toolchain's CPPFLAGS.
  pub cppflags: Option<String>,
  pub patches: Option<PatchSpec>,
  /// Source directory name, when it should differ from the archive name.
  pub base: Option<String>,
  /// Projects that must appear earlier in the manifest.
  pub requires: Vec<String>,
}

impl Project {
  pub fn new(urls: &[&str], digest: &str, artifact: &str, backend: Backend) -> Result<Self, ProjectError> {
    let artifact_path = PathBuf::from(artifact);
    if !is_relative_inside(&artifact_path) {
      return Err(ProjectError::BadArtifact(artifact.to_string()));
    }
    let name = infer_name(&artifact_path).ok_or_else(|| ProjectError::BadArtifact(artifact.to_string()))?;

    if urls.is_empty() {
      return Err(ProjectError::NoUrls(name));
    }

    let digest = SourceDigest::from_hex(digest).map_err(|source| ProjectError::Digest {
      artifact: artifact.to_string(),
      source,
    })?;

    Ok(Self {
      name,
      urls: urls.iter().map(|u| u.to_string()).collect(),
      digest,
      artifact: artifact_path,
      backend,
      configure_args: Vec::new(),
      cppflags: None,
      patches: None,
      base: None,
      requires: Vec::new(),
    })
  }

  pub fn configure_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.configure_args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn cppflags(mut self, flags: &str) -> Self {
    self.cppflags = Some(flags.to_string());
    self
  }

  pub fn patch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.patches = Some(PatchSpec::Dir(dir.into()));
    self
  }

  pub fn edits(mut self, edits: Vec<Edit>) -> Self {
    self.patches = Some(PatchSpec::Edits(edits));
    self
  }

  pub fn base(mut self, base: &str) -> Self {
    self.base = Some(base.to_string());
    self
  }

  pub fn requires(mut self, names: &[&str]) -> Self {
    self.requires.extend(names.iter().map(|n| n.to_string()));
    self
  }

  /// File name of the downloaded archive, taken from the first mirror.
  pub fn archive_name(&self) -> String {
    url_to_filename(&self.urls[0])
  }

  /// Directory name of the extracted source tree.
  pub fn base_dir_name(&self) -> String {
    self
      .base
      .clone()
      .unwrap_or_else(|| archive_base(&self.archive_name()).to_string())
  }

  /// Version string parsed from the base name, for display only.
  pub fn version(&self) -> Option<String> {
    parse_version(&self.base_dir_name())
  }
}

fn is_relative_inside(path: &Path) -> bool {
  let mut components = path.components().peekable();
  if components.peek().is_none() {
    return false;
  }
  components.all(|c| matches!(c, Component::Normal(_)))
}

/// `lib/libogg.a` → `libogg`, `lib/pkgconfig/jack.pc` → `jack`,
/// `include/openssl/ossl_typ.h` → `openssl`.
fn infer_name(artifact: &Path) -> Option<String> {
  let parts: Vec<&str> = artifact.iter().filter_map(|c| c.to_str()).collect();
  match parts.as_slice() {
    ["include", dir, _, ..] => Some(dir.to_string()),
    _ => artifact
      .file_name()
      .and_then(|f| f.to_str())
      .map(|f| f.split('.').next().unwrap_or(f).to_string())
      .filter(|n| !n.is_empty()),
  }
}

const ARCHIVE_EXTENSIONS: &[&str] = &[
  ".tar.gz", ".tgz", ".tar.xz", ".txz", ".tar.bz2", ".tbz2", ".tar",
];

/// Strip a known archive extension from a file name.
pub fn archive_base(file_name: &str) -> &str {
  ARCHIVE_EXTENSIONS
    .iter()
    .find_map(|ext| file_name.strip_suffix(ext))
    .unwrap_or(file_name)
}

fn parse_version(base: &str) -> Option<String> {
  if let Some(rest) = base.strip_prefix('v')
    && rest.starts_with(|c: char| c.is_ascii_digit())
  {
    return Some(rest.to_string());
  }

  base.char_indices().find_map(|(i, c)| {
    if c != '-' && c != '_' {
      return None;
    }
    let rest = &base[i + 1..];
    let rest = rest.strip_prefix('v').unwrap_or(rest);
    rest.starts_with(|c: char| c.is_ascii_digit()).then(|| rest.to_string())
  })
}

/// Convert a URL to a safe file name.
///
/// Takes the last path component and sanitizes it. Falls back to a fixed
/// name derived from the URL when no usable component exists.
pub fn url_to_filename(url: &str) -> String {
  let path = url.split(['?', '#']).next().unwrap_or(url);
  if let Some(filename) = path.rsplit('/').next() {
    let sanitized: String = filename
      .chars()
      .map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '+' {
          c
        } else {
          '_'
        }
      })
      .collect();

    if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
      return sanitized;
    }
  }

  let digest = crate::digest::hash_bytes(crate::digest::DigestAlgorithm::Sha256, url.as_bytes());
  format!("download_{}", &digest[..16])
}
