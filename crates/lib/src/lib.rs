//! xdeps-lib: cross-building pinned native libraries from source
//!
//! This crate provides the build-project pipeline used by the `xdeps` CLI:
//! - `fetch`: mirror-aware source download with digest verification
//! - `extract`: archive unpacking into a stable per-project source tree
//! - `patch`: patch sets and programmatic edits applied once per extraction
//! - `backend`: the closed set of build systems (Meson, CMake, Autotools and friends)
//! - `orchestrator`: the per-project state machine and completion cache

pub mod backend;
pub mod config;
pub mod consts;
pub mod digest;
pub mod extract;
pub mod fetch;
pub mod libs;
pub mod lock;
pub mod manifest;
pub mod orchestrator;
pub mod patch;
pub mod platform;
pub mod project;
pub mod runner;
pub mod toolchain;
pub mod util;
