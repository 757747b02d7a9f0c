//! Pinned source digests.
//!
//! Most projects are pinned with SHA-256. A few legacy tarballs only ever
//! published MD5 sums, so MD5 is accepted as well. It is a pin, not a
//! security boundary.

use std::fmt;
use std::path::Path;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
  Md5,
  Sha256,
}

impl DigestAlgorithm {
  /// Length of the lowercase hex encoding.
  pub fn hex_len(self) -> usize {
    match self {
      DigestAlgorithm::Md5 => 32,
      DigestAlgorithm::Sha256 => 64,
    }
  }
}

impl fmt::Display for DigestAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DigestAlgorithm::Md5 => write!(f, "md5"),
      DigestAlgorithm::Sha256 => write!(f, "sha256"),
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
  #[error("digest '{0}' is not hex")]
  NotHex(String),

  #[error("digest '{0}' has length {1}, expected 32 (md5) or 64 (sha256)")]
  BadLength(String, usize),
}

/// An expected content digest: algorithm plus lowercase hex value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDigest {
  pub algorithm: DigestAlgorithm,
  pub hex: String,
}

impl SourceDigest {
  /// Parse a pinned hex digest, picking the algorithm from its length.
  pub fn from_hex(hex: &str) -> Result<Self, DigestError> {
    let hex = hex.trim().to_ascii_lowercase();
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(DigestError::NotHex(hex));
    }
    let algorithm = match hex.len() {
      32 => DigestAlgorithm::Md5,
      64 => DigestAlgorithm::Sha256,
      len => return Err(DigestError::BadLength(hex, len)),
    };
    Ok(Self { algorithm, hex })
  }

  pub fn matches(&self, actual_hex: &str) -> bool {
    self.hex.eq_ignore_ascii_case(actual_hex)
  }
}

impl fmt::Display for SourceDigest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.algorithm, self.hex)
  }
}

/// Incremental hasher for either supported algorithm.
pub enum StreamHasher {
  Md5(Md5),
  Sha256(Sha256),
}

impl StreamHasher {
  pub fn new(algorithm: DigestAlgorithm) -> Self {
    match algorithm {
      DigestAlgorithm::Md5 => StreamHasher::Md5(Md5::new()),
      DigestAlgorithm::Sha256 => StreamHasher::Sha256(Sha256::new()),
    }
  }

  pub fn update(&mut self, data: &[u8]) {
    match self {
      StreamHasher::Md5(h) => h.update(data),
      StreamHasher::Sha256(h) => h.update(data),
    }
  }

  pub fn finalize_hex(self) -> String {
    match self {
      StreamHasher::Md5(h) => hex::encode(h.finalize()),
      StreamHasher::Sha256(h) => hex::encode(h.finalize()),
    }
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
  let mut hasher = StreamHasher::new(algorithm);
  hasher.update(data);
  hasher.finalize_hex()
}

/// Hash a file's contents.
pub async fn hash_file(algorithm: DigestAlgorithm, path: &Path) -> std::io::Result<String> {
  let mut file = File::open(path).await?;
  let mut hasher = StreamHasher::new(algorithm);
  let mut buffer = vec![0u8; 64 * 1024];

  loop {
    let bytes_read = file.read(&mut buffer).await?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hasher.finalize_hex())
}
