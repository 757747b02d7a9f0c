//! Shared fixtures for pipeline tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use xdeps_lib::backend::Backend;
use xdeps_lib::digest::{DigestAlgorithm, hash_bytes};
use xdeps_lib::orchestrator::WorkDirs;
use xdeps_lib::project::Project;
use xdeps_lib::runner::{Invocation, ProcessOutput, RunError, Runner};
use xdeps_lib::toolchain::ToolchainConfig;

type Hook = Box<dyn Fn(&Invocation) -> Result<ProcessOutput, RunError> + Send + Sync>;

/// Records invocations and answers them through a hook.
pub struct RecordingRunner {
  calls: Mutex<Vec<Invocation>>,
  hook: Hook,
}

impl RecordingRunner {
  pub fn new<F>(hook: F) -> Self
  where
    F: Fn(&Invocation) -> Result<ProcessOutput, RunError> + Send + Sync + 'static,
  {
    Self {
      calls: Mutex::new(Vec::new()),
      hook: Box::new(hook),
    }
  }

  /// Succeeds at everything and creates `lib/<project>.a` on `cmake --install`.
  pub fn installing(prefix: &Path) -> Self {
    let prefix = prefix.to_path_buf();
    Self::new(move |inv| {
      install_if_requested(&prefix, inv);
      Ok(ProcessOutput::default())
    })
  }

  pub fn calls(&self) -> Vec<Invocation> {
    self.calls.lock().unwrap().clone()
  }

  pub fn programs(&self) -> Vec<String> {
    self.calls().into_iter().map(|inv| inv.program).collect()
  }
}

impl Runner for RecordingRunner {
  async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunError> {
    self.calls.lock().unwrap().push(invocation.clone());
    (self.hook)(invocation)
  }
}

/// Name of the project a build-dir invocation belongs to: `build/liba-1.0` → `liba`.
pub fn project_of(inv: &Invocation) -> String {
  let dir = inv.cwd.file_name().unwrap().to_string_lossy();
  dir.strip_suffix("-1.0").unwrap_or(&dir).to_string()
}

pub fn is_configure(inv: &Invocation) -> bool {
  inv.program == "cmake" && inv.args.first().is_some_and(|a| a == "-S")
}

pub fn install_if_requested(prefix: &Path, inv: &Invocation) {
  if inv.program == "cmake" && inv.args.first().is_some_and(|a| a == "--install") {
    write_file(&prefix.join(format!("lib/{}.a", project_of(inv))), b"!<arch>\n");
  }
}

pub fn failed(inv: &Invocation, stderr: &str) -> RunError {
  RunError::Failed {
    command: inv.command_line(),
    code: Some(1),
    output: ProcessOutput {
      stdout: String::new(),
      stderr: stderr.to_string(),
    },
  }
}

pub struct TestEnv {
  pub temp: TempDir,
  pub toolchain: ToolchainConfig,
  pub dirs: WorkDirs,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let toolchain = ToolchainConfig::new("x86_64-w64-mingw32", temp.path().join("prefix"));
    let dirs = WorkDirs::new(temp.path().join("work"));
    Self { temp, toolchain, dirs }
  }

  pub fn artifact(&self, name: &str) -> PathBuf {
    self.toolchain.install_prefix.join(format!("lib/{name}.a"))
  }
}

/// A `<name>-1.0/` source archive and its SHA-256.
pub fn source_archive(name: &str) -> (Vec<u8>, String) {
  let bytes = tar_gz(&[
    (format!("{name}-1.0/CMakeLists.txt").as_str(), "project(x C)\n"),
    (format!("{name}-1.0/{name}.c").as_str(), "int x;\n"),
  ]);
  let digest = hash_bytes(DigestAlgorithm::Sha256, &bytes);
  (bytes, digest)
}

pub fn cmake_project(urls: &[String], digest: &str, name: &str) -> Project {
  let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
  Project::new(&urls, digest, &format!("lib/{name}.a"), Backend::Cmake).unwrap()
}

/// Put an archive straight into the download cache so no server is needed.
pub fn cached_project(env: &TestEnv, name: &str) -> Project {
  let (bytes, digest) = source_archive(name);
  write_file(&env.dirs.downloads.join(format!("{name}-1.0.tar.gz")), &bytes);
  cmake_project(&[format!("https://example.invalid/{name}-1.0.tar.gz")], &digest, name)
}

pub fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
  let encoder = GzEncoder::new(Vec::new(), Compression::fast());
  let mut builder = tar::Builder::new(encoder);
  for (path, contents) in entries {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, contents.as_bytes()).unwrap();
  }
  builder.into_inner().unwrap().finish().unwrap()
}

pub fn write_file(path: &Path, data: &[u8]) {
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  let mut file = std::fs::File::create(path).unwrap();
  file.write_all(data).unwrap();
}
