//! Test utilities for xdeps-lib.
//!
//! A recording [`Runner`] plus helpers for producing small source archives.

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::runner::{Invocation, ProcessOutput, RunError, Runner};

type Hook = Box<dyn Fn(&Invocation) -> Result<ProcessOutput, RunError> + Send + Sync>;

/// Records every invocation instead of spawning it.
///
/// By default every command succeeds with empty output. A hook can be
/// installed to simulate side effects (e.g. an install step creating the
/// artifact) or failures.
pub struct RecordingRunner {
  calls: Mutex<Vec<Invocation>>,
  hook: Option<Hook>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      hook: None,
    }
  }

  pub fn with_hook<F>(hook: F) -> Self
  where
    F: Fn(&Invocation) -> Result<ProcessOutput, RunError> + Send + Sync + 'static,
  {
    Self {
      calls: Mutex::new(Vec::new()),
      hook: Some(Box::new(hook)),
    }
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
    match &self.hook {
      Some(hook) => hook(invocation),
      None => Ok(ProcessOutput::default()),
    }
  }
}

/// A failed run carrying the given stderr, as a real tool would report it.
pub fn failed(invocation: &Invocation, stderr: &str) -> RunError {
  RunError::Failed {
    command: invocation.command_line(),
    code: Some(1),
    output: ProcessOutput {
      stdout: String::new(),
      stderr: stderr.to_string(),
    },
  }
}

/// Build a `.tar.gz` in memory whose entries are `(path, contents)` pairs.
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
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  let mut file = std::fs::File::create(path).unwrap();
  file.write_all(data).unwrap();
}
