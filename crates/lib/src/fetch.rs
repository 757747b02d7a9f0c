//! Source archive download with mirror fallback and digest verification.
//!
//! An archive is first streamed into a `.part` file next to its final
//! location and hashed while it is written. Only a download whose digest
//! matches is renamed into place, so a file at the final path is always a
//! verified archive.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::consts::{FETCH_CONNECT_TIMEOUT_SECS, FETCH_TIMEOUT_SECS, PARTIAL_DOWNLOAD_SUFFIX};
use crate::digest::{SourceDigest, StreamHasher, hash_file};
use crate::project::url_to_filename;
use crate::runner::{Invocation, Runner, path_arg};

/// Why one mirror did not produce the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
  pub url: String,
  pub reason: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("no mirror could provide {archive}:{}", format_attempts(.attempts))]
  MirrorsExhausted {
    archive: String,
    attempts: Vec<MirrorFailure>,
  },

  #[error("integrity check failed for {url}: expected {expected}, got {actual}")]
  Integrity {
    url: String,
    expected: SourceDigest,
    actual: String,
  },

  #[error("I/O error at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to set up HTTP client: {0}")]
  Client(#[source] reqwest::Error),
}

fn format_attempts(attempts: &[MirrorFailure]) -> String {
  attempts
    .iter()
    .map(|a| format!("\n  {}: {}", a.url, a.reason))
    .collect()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> FetchError + '_ {
  move |source| FetchError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Outcome of a single download attempt that did not succeed.
enum AttemptError {
  /// The mirror is unusable; the next one may still work.
  Mirror(String),
  /// A local failure that no other mirror can fix.
  Fatal(FetchError),
}

impl From<FetchError> for AttemptError {
  fn from(err: FetchError) -> Self {
    AttemptError::Fatal(err)
  }
}

/// Downloads source archives over HTTP(S), and FTP through `curl`.
#[derive(Debug, Clone)]
pub struct Fetcher {
  client: reqwest::Client,
}

impl Fetcher {
  pub fn new() -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("xdeps/", env!("CARGO_PKG_VERSION")))
      .connect_timeout(Duration::from_secs(FETCH_CONNECT_TIMEOUT_SECS))
      .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
      .build()
      .map_err(FetchError::Client)?;
    Ok(Self { client })
  }

  /// Resolve `urls` to a verified archive inside `dest_dir`.
  ///
  /// Mirrors are tried in order and a network failure moves on to the next
  /// one. A digest mismatch stops immediately.
  pub async fn fetch(
    &self,
    runner: &impl Runner,
    urls: &[String],
    digest: &SourceDigest,
    dest_dir: &Path,
  ) -> Result<PathBuf, FetchError> {
    let archive = urls.first().map(|u| url_to_filename(u)).unwrap_or_default();
    let dest = dest_dir.join(&archive);

    fs::create_dir_all(dest_dir).await.map_err(io_error(dest_dir))?;

    if fs::try_exists(&dest).await.unwrap_or(false) {
      let actual = hash_file(digest.algorithm, &dest).await.map_err(io_error(&dest))?;
      if digest.matches(&actual) {
        debug!(path = ?dest, "using cached archive");
        return Ok(dest);
      }
      warn!(path = ?dest, expected = %digest, %actual, "cached archive does not verify, downloading again");
      fs::remove_file(&dest).await.map_err(io_error(&dest))?;
    }

    let part = dest_dir.join(format!("{archive}{PARTIAL_DOWNLOAD_SUFFIX}"));
    let mut attempts = Vec::new();

    for url in urls {
      info!(%url, "fetching");
      remove_if_exists(&part).await?;

      let actual = match self.download(runner, url, digest, &part, dest_dir).await {
        Ok(actual) => actual,
        Err(AttemptError::Mirror(reason)) => {
          warn!(%url, %reason, "mirror failed");
          remove_if_exists(&part).await?;
          attempts.push(MirrorFailure {
            url: url.clone(),
            reason,
          });
          continue;
        }
        Err(AttemptError::Fatal(err)) => {
          remove_if_exists(&part).await?;
          return Err(err);
        }
      };

      if !digest.matches(&actual) {
        remove_if_exists(&part).await?;
        return Err(FetchError::Integrity {
          url: url.clone(),
          expected: digest.clone(),
          actual,
        });
      }

      fs::rename(&part, &dest).await.map_err(io_error(&part))?;
      info!(path = ?dest, "download verified");
      return Ok(dest);
    }

    Err(FetchError::MirrorsExhausted { archive, attempts })
  }

  async fn download(
    &self,
    runner: &impl Runner,
    url: &str,
    digest: &SourceDigest,
    part: &Path,
    dest_dir: &Path,
  ) -> Result<String, AttemptError> {
    let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
    match scheme.as_deref() {
      Some("http" | "https") => self.download_http(url, digest, part).await,
      Some("ftp") => {
        let invocation = Invocation::new("curl", dest_dir)
          .args(["-fsSL", "--connect-timeout"])
          .arg(FETCH_CONNECT_TIMEOUT_SECS.to_string())
          .arg("--max-time")
          .arg(FETCH_TIMEOUT_SECS.to_string())
          .arg("-o")
          .arg(path_arg(part))
          .arg(url);
        runner
          .run(&invocation)
          .await
          .map_err(|e| AttemptError::Mirror(e.to_string()))?;
        Ok(hash_file(digest.algorithm, part).await.map_err(io_error(part))?)
      }
      _ => Err(AttemptError::Mirror("unsupported URL scheme".to_string())),
    }
  }

  async fn download_http(&self, url: &str, digest: &SourceDigest, part: &Path) -> Result<String, AttemptError> {
    let mirror = |e: reqwest::Error| AttemptError::Mirror(e.to_string());

    let mut response = self
      .client
      .get(url)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(mirror)?;

    let mut file = fs::File::create(part).await.map_err(io_error(part))?;
    let mut hasher = StreamHasher::new(digest.algorithm);
    let mut size = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(mirror)? {
      hasher.update(&chunk);
      size += chunk.len() as u64;
      file.write_all(&chunk).await.map_err(io_error(part))?;
    }
    file.flush().await.map_err(io_error(part))?;

    debug!(%url, size, "download complete");
    Ok(hasher.finalize_hex())
  }
}

async fn remove_if_exists(path: &Path) -> Result<(), FetchError> {
  match fs::remove_file(path).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(io_error(path)(e)),
  }
}
