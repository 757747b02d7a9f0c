//! Configuration file loading.
//!
//! ```toml
//! [toolchain]
//! host_triple = "aarch64-linux-android"
//! cc = "aarch64-linux-android21-clang"
//! cxx = "aarch64-linux-android21-clang++"
//! ar = "llvm-ar"
//! install_prefix = "output/root"
//!
//! [paths]
//! work_dir = "output"
//! patches = "."
//! ```
//!
//! Relative paths are resolved against the directory containing the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::consts::WORK_DIR_ENV;
use crate::orchestrator::WorkDirs;
use crate::platform::paths::downloads_dir;
use crate::toolchain::ToolchainConfig;

pub const DEFAULT_CONFIG_FILE: &str = "xdeps.toml";
const DEFAULT_WORK_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid configuration in {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
  pub work_dir: Option<PathBuf>,
  pub downloads: Option<PathBuf>,
  pub patches: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  pub toolchain: ToolchainConfig,
  #[serde(default)]
  pub paths: PathsConfig,
  /// Directory relative paths were resolved against.
  #[serde(skip)]
  pub base_dir: PathBuf,
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}

impl Config {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let base_dir = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or(Path::new("."));
    Self::parse(&text, base_dir).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Parse configuration text, resolving relative paths against `base_dir`.
  pub fn parse(text: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
    let mut config: Config = toml::from_str(text)?;
    config.base_dir = base_dir.to_path_buf();

    let tc = &mut config.toolchain;
    tc.install_prefix = resolve(base_dir, &tc.install_prefix);
    tc.sysroot = tc.sysroot.as_deref().map(|p| resolve(base_dir, p));

    let paths = &mut config.paths;
    for path in [&mut paths.work_dir, &mut paths.downloads, &mut paths.patches] {
      *path = path.as_deref().map(|p| resolve(base_dir, p));
    }

    Ok(config)
  }

  /// Directories for a run.
  ///
  /// `XDEPS_WORK_DIR` overrides the configured work directory. Downloads
  /// default to the per-user cache, falling back to the work directory.
  pub fn work_dirs(&self) -> WorkDirs {
    let root = std::env::var_os(WORK_DIR_ENV)
      .filter(|v| !v.is_empty())
      .map(PathBuf::from)
      .or_else(|| self.paths.work_dir.clone())
      .unwrap_or_else(|| self.base_dir.join(DEFAULT_WORK_DIR));

    let downloads = self
      .paths
      .downloads
      .clone()
      .or_else(downloads_dir)
      .unwrap_or_else(|| root.join("downloads"));

    let patch_root = self.paths.patches.clone().unwrap_or_else(|| self.base_dir.clone());

    WorkDirs {
      root,
      downloads,
      patch_root,
    }
  }
}
