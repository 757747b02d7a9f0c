//! End-to-end pipeline tests.
//!
//! These drive the orchestrator against a local HTTP server and a recording
//! process runner, so no real build tools or network access are needed.

mod common;

mod cache_tests;
mod fetch_tests;
mod ordering_tests;
