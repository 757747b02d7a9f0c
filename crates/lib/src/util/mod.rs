//! Shared utilities.
//!
//! Filesystem helpers used by extraction and the specialized backends, plus test helpers.

pub mod fs;

#[cfg(test)]
pub mod testutil;
