//! Cross-compilation target description.
//!
//! A [`ToolchainConfig`] is read once at startup and passed by reference into
//! every backend. Nothing in the pipeline mutates it or reads toolchain data
//! from the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Operating system family of the host triple, as far as the backends care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
  Linux,
  Android,
  Windows,
  Darwin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
  /// GNU host triple, e.g. `aarch64-linux-android` or `x86_64-w64-mingw32`.
  pub host_triple: String,

  pub cc: String,
  pub cxx: String,
  pub ar: String,
  #[serde(default = "default_arflags")]
  pub arflags: String,
  #[serde(default)]
  pub ranlib: Option<String>,
  #[serde(default)]
  pub nm: Option<String>,
  #[serde(default)]
  pub strip: Option<String>,
  #[serde(default)]
  pub windres: Option<String>,

  #[serde(default)]
  pub sysroot: Option<PathBuf>,

  #[serde(default)]
  pub cflags: String,
  #[serde(default)]
  pub cxxflags: String,
  #[serde(default)]
  pub cppflags: String,
  #[serde(default)]
  pub ldflags: String,
  #[serde(default)]
  pub libs: String,

  /// Shared prefix every project installs into.
  pub install_prefix: PathBuf,

  #[serde(default = "default_jobs")]
  pub jobs: usize,
}

fn default_arflags() -> String {
  "rcs".to_string()
}

fn default_jobs() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

fn join_flags<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
  parts
    .into_iter()
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

impl ToolchainConfig {
  /// A GCC-style toolchain whose tools are all prefixed with the host triple.
  pub fn new(host_triple: &str, install_prefix: impl Into<PathBuf>) -> Self {
    Self {
      host_triple: host_triple.to_string(),
      cc: format!("{host_triple}-gcc"),
      cxx: format!("{host_triple}-g++"),
      ar: format!("{host_triple}-ar"),
      arflags: default_arflags(),
      ranlib: None,
      nm: None,
      strip: None,
      windres: None,
      sysroot: None,
      cflags: "-O2".to_string(),
      cxxflags: "-O2".to_string(),
      cppflags: String::new(),
      ldflags: String::new(),
      libs: String::new(),
      install_prefix: install_prefix.into(),
      jobs: default_jobs(),
    }
  }

  fn prefixed_tool(&self, configured: &Option<String>, tool: &str) -> String {
    configured
      .clone()
      .unwrap_or_else(|| format!("{}-{}", self.host_triple, tool))
  }

  pub fn ranlib(&self) -> String {
    self.prefixed_tool(&self.ranlib, "ranlib")
  }

  pub fn nm(&self) -> String {
    self.prefixed_tool(&self.nm, "nm")
  }

  pub fn strip(&self) -> String {
    self.prefixed_tool(&self.strip, "strip")
  }

  pub fn windres(&self) -> String {
    self.prefixed_tool(&self.windres, "windres")
  }

  /// First component of the triple, e.g. `aarch64`, `armv7a`, `i686`.
  pub fn arch(&self) -> &str {
    self.host_triple.split('-').next().unwrap_or(&self.host_triple)
  }

  /// Normalized CPU family: `x86`, `x86_64`, `arm`, `aarch64`, or the raw arch.
  pub fn cpu_family(&self) -> &str {
    match self.arch() {
      "i386" | "i486" | "i586" | "i686" => "x86",
      arch if arch.starts_with("arm") => "arm",
      "arm64" => "aarch64",
      arch => arch,
    }
  }

  pub fn target_os(&self) -> TargetOs {
    let triple = self.host_triple.as_str();
    if triple.contains("mingw") || triple.contains("windows") {
      TargetOs::Windows
    } else if triple.contains("android") {
      TargetOs::Android
    } else if triple.contains("apple") || triple.contains("darwin") {
      TargetOs::Darwin
    } else {
      TargetOs::Linux
    }
  }

  pub fn is_windows(&self) -> bool {
    self.target_os() == TargetOs::Windows
  }

  pub fn include_dir(&self) -> PathBuf {
    self.install_prefix.join("include")
  }

  pub fn lib_dir(&self) -> PathBuf {
    self.install_prefix.join("lib")
  }

  pub fn pkg_config_dir(&self) -> PathBuf {
    self.lib_dir().join("pkgconfig")
  }

  /// CPPFLAGS for a project: the toolchain's own flags, the install prefix
  /// include path, then the project's additions. Additions never replace
  /// the defaults.
  pub fn cppflags_with(&self, extra: Option<&str>) -> String {
    let include = format!("-isystem {}", self.include_dir().display());
    join_flags([self.cppflags.as_str(), include.as_str(), extra.unwrap_or("")])
  }

  /// LDFLAGS including the install prefix library path.
  pub fn ldflags_full(&self) -> String {
    let lib = format!("-L{}", self.lib_dir().display());
    join_flags([self.ldflags.as_str(), lib.as_str()])
  }

  /// Path to `relative` inside the install prefix.
  pub fn installed(&self, relative: &Path) -> PathBuf {
    self.install_prefix.join(relative)
  }

  /// Whether `relative` is present in the install prefix as a non-empty file.
  pub fn has_installed(&self, relative: &Path) -> bool {
    std::fs::metadata(self.installed(relative)).is_ok_and(|m| m.is_file() && m.len() > 0)
  }

  /// The conventional autoconf-style environment for this toolchain.
  ///
  /// `PKG_CONFIG_LIBDIR` points only at the install prefix.
  pub fn env(&self, extra_cppflags: Option<&str>) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("CC".to_string(), self.cc.clone());
    env.insert("CXX".to_string(), self.cxx.clone());
    env.insert("AR".to_string(), self.ar.clone());
    env.insert("ARFLAGS".to_string(), self.arflags.clone());
    env.insert("RANLIB".to_string(), self.ranlib());
    env.insert("NM".to_string(), self.nm());
    env.insert("STRIP".to_string(), self.strip());
    env.insert("CFLAGS".to_string(), self.cflags.clone());
    env.insert("CXXFLAGS".to_string(), self.cxxflags.clone());
    env.insert("CPPFLAGS".to_string(), self.cppflags_with(extra_cppflags));
    env.insert("LDFLAGS".to_string(), self.ldflags_full());
    env.insert("LIBS".to_string(), self.libs.clone());
    env.insert(
      "PKG_CONFIG_LIBDIR".to_string(),
      self.pkg_config_dir().to_string_lossy().into_owned(),
    );
    env.insert("PKG_CONFIG_PATH".to_string(), String::new());
    if self.is_windows() {
      env.insert("WINDRES".to_string(), self.windres());
    }
    env
  }
}
