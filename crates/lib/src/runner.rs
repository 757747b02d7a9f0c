//! External process execution.
//!
//! Every tool the pipeline drives (`curl`, `patch`, `meson`, `cmake`, `make`, ...)
//! is started through a [`Runner`]. The production implementation is
//! [`SystemRunner`]; tests substitute a recorder so command lines can be
//! asserted without spawning anything.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::consts::DIAGNOSTIC_TAIL_LINES;

/// A single external command: program, arguments, working directory and
/// environment additions.
///
/// The environment is layered on top of the inherited process environment.
/// Builds need the user's `PATH` to find compilers, so nothing is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
  pub env: BTreeMap<String, String>,
}

impl Invocation {
  pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.into(),
      env: BTreeMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
    self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
    self
  }

  /// The command line as a single display string.
  pub fn command_line(&self) -> String {
    let mut line = self.program.clone();
    for arg in &self.args {
      line.push(' ');
      if arg.is_empty() || arg.contains(char::is_whitespace) {
        line.push('\'');
        line.push_str(arg);
        line.push('\'');
      } else {
        line.push_str(arg);
      }
    }
    line
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command_line())
  }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  /// The tool's own diagnostics: all of stderr followed by the tail of stdout.
  pub fn diagnostics(&self) -> String {
    let mut report = String::new();
    let stderr = self.stderr.trim_end();
    if !stderr.is_empty() {
      report.push_str(stderr);
    }

    let lines: Vec<&str> = self.stdout.trim_end().lines().collect();
    if !lines.is_empty() {
      let skip = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
      if !report.is_empty() {
        report.push('\n');
      }
      if skip > 0 {
        report.push_str(&format!("[... {skip} earlier lines of stdout omitted]\n"));
      }
      report.push_str(&lines[skip..].join("\n"));
    }
    report
  }
}

#[derive(Debug, Error)]
pub enum RunError {
  /// The program could not be started at all.
  #[error("failed to start `{program}` in {}: {source}", .cwd.display())]
  Spawn {
    program: String,
    cwd: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("`{command}` failed with exit code {code:?}\n{}", .output.diagnostics())]
  Failed {
    command: String,
    code: Option<i32>,
    output: ProcessOutput,
  },
}

/// Starts external processes on behalf of the pipeline.
pub trait Runner: Sync {
  fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ProcessOutput, RunError>> + Send;
}

/// Runs commands as real child processes with captured output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
  async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunError> {
    debug!(cmd = %invocation, cwd = ?invocation.cwd, "spawning process");

    let output = Command::new(&invocation.program)
      .args(&invocation.args)
      .current_dir(&invocation.cwd)
      .envs(&invocation.env)
      .stdin(std::process::Stdio::null())
      .output()
      .await
      .map_err(|source| RunError::Spawn {
        program: invocation.program.clone(),
        cwd: invocation.cwd.clone(),
        source,
      })?;

    let captured = ProcessOutput {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !output.status.success() {
      if !captured.stderr.is_empty() {
        debug!(stderr = %captured.stderr, "command stderr");
      }
      return Err(RunError::Failed {
        command: invocation.command_line(),
        code: output.status.code(),
        output: captured,
      });
    }

    Ok(captured)
  }
}

/// Convenience for building paths into invocation arguments.
pub fn path_arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}
