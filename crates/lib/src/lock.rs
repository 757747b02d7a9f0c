//! Exclusive lock on the work directory.
//!
//! A run holds the lock until it finishes. The lock file records the holder
//! so a second run can say who it collided with.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::LOCK_FILENAME;

/// Who holds the lock, as written into the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
}

impl fmt::Display for Holder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "`{}` (PID {}, started at Unix timestamp {})",
      self.command, self.pid, self.started_at_unix
    )
  }
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error(
    "work directory is locked by {}\nIf no xdeps process is running, remove the lock file:\n  {}",
    .holder.as_ref().map_or_else(|| "another process".to_string(), Holder::to_string),
    .lock_path.display()
  )]
  Held { lock_path: PathBuf, holder: Option<Holder> },

  #[error("failed to lock {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Released when dropped.
#[derive(Debug)]
pub struct WorkLock {
  _file: File,
}

impl WorkLock {
  pub fn acquire(work_dir: &Path, command: &str) -> Result<Self, LockError> {
    let lock_path = work_dir.join(LOCK_FILENAME);
    let failed = |source: io::Error| LockError::Io {
      path: lock_path.clone(),
      source,
    };

    std::fs::create_dir_all(work_dir).map_err(failed)?;
    let mut file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(failed)?;

    match try_lock_exclusive(&file) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
        return Err(LockError::Held {
          lock_path: lock_path.clone(),
          holder: read_holder(&mut file),
        });
      }
      Err(e) => return Err(failed(e)),
    }

    let holder = Holder {
      pid: std::process::id(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
      command: command.to_string(),
    };
    file.set_len(0).map_err(failed)?;
    serde_json::to_writer(&file, &holder).map_err(|e| failed(io::Error::other(e)))?;

    Ok(WorkLock { _file: file })
  }
}

fn read_holder(file: &mut File) -> Option<Holder> {
  let mut text = String::new();
  file.read_to_string(&mut text).ok()?;
  serde_json::from_str(&text).ok()
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  // SAFETY: the handle is valid for the lifetime of `file` and a zeroed
  // OVERLAPPED is a valid argument.
  let locked = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      file.as_raw_handle() as HANDLE,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if locked == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
