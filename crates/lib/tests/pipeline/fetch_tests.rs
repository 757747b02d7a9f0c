//! Mirror fallback and integrity through the whole pipeline.

use xdeps_lib::manifest::Manifest;
use xdeps_lib::orchestrator::{Orchestrator, Outcome, Phase, PipelineError};

use super::common::*;

#[tokio::test]
async fn falls_back_to_second_mirror_and_builds() {
  let mut server = mockito::Server::new_async().await;
  let (bytes, digest) = source_archive("libpkg");
  let missing = server
    .mock("GET", "/primary/libpkg-1.0.tar.gz")
    .with_status(404)
    .expect(1)
    .create_async()
    .await;
  let mirror = server
    .mock("GET", "/mirror/libpkg-1.0.tar.gz")
    .with_status(200)
    .with_body(&bytes)
    .expect(1)
    .create_async()
    .await;

  let env = TestEnv::new();
  let urls = [
    format!("{}/primary/libpkg-1.0.tar.gz", server.url()),
    format!("{}/mirror/libpkg-1.0.tar.gz", server.url()),
  ];
  let manifest = Manifest::new(vec![cmake_project(&urls, &digest, "libpkg")]).unwrap();

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let orchestrator = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone()).unwrap();
  let report = orchestrator.run(&manifest).await.unwrap();

  assert!(report.is_success());
  assert_eq!(report.outcomes, vec![("libpkg".to_string(), Outcome::Built)]);
  assert!(env.artifact("libpkg").exists());
  assert!(env.dirs.sources().join("libpkg-1.0/libpkg.c").exists());
  assert_eq!(runner.programs(), ["cmake", "cmake", "cmake"]);

  // Second run: artifact present, so no fetch and no process.
  let second = RecordingRunner::installing(&env.toolchain.install_prefix);
  let orchestrator = Orchestrator::new(&second, &env.toolchain, env.dirs.clone()).unwrap();
  let report = orchestrator.run(&manifest).await.unwrap();

  assert_eq!(report.outcomes, vec![("libpkg".to_string(), Outcome::Cached)]);
  assert!(second.calls().is_empty());
  missing.assert_async().await;
  mirror.assert_async().await;
}

#[tokio::test]
async fn flipped_byte_fails_integrity_before_extraction() {
  let mut server = mockito::Server::new_async().await;
  let (mut bytes, digest) = source_archive("libpkg");
  let last = bytes.len() - 1;
  bytes[last] ^= 0x01;
  let _archive = server
    .mock("GET", "/libpkg-1.0.tar.gz")
    .with_status(200)
    .with_body(&bytes)
    .create_async()
    .await;

  let env = TestEnv::new();
  let urls = [format!("{}/libpkg-1.0.tar.gz", server.url())];
  let manifest = Manifest::new(vec![cmake_project(&urls, &digest, "libpkg")]).unwrap();

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let orchestrator = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone()).unwrap();
  let report = orchestrator.run(&manifest).await.unwrap();

  let failure = report.failure.unwrap();
  assert_eq!(failure.project, "libpkg");
  assert_eq!(failure.phase, Phase::Fetch);
  assert!(matches!(failure.error, PipelineError::Integrity(_)));
  assert!(!env.dirs.sources().join("libpkg-1.0").exists());
  assert!(!env.dirs.downloads.join("libpkg-1.0.tar.gz").exists());
  assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn all_mirrors_failing_names_each_attempt() {
  let mut server = mockito::Server::new_async().await;
  let _gone = server
    .mock("GET", mockito::Matcher::Any)
    .with_status(503)
    .create_async()
    .await;

  let env = TestEnv::new();
  let urls = [
    format!("{}/a/libpkg-1.0.tar.gz", server.url()),
    format!("{}/b/libpkg-1.0.tar.gz", server.url()),
  ];
  let manifest = Manifest::new(vec![cmake_project(&urls, &"0".repeat(64), "libpkg")]).unwrap();

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let orchestrator = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone()).unwrap();
  let report = orchestrator.run(&manifest).await.unwrap();

  let failure = report.failure.unwrap();
  assert!(matches!(failure.error, PipelineError::Fetch(_)));
  let message = failure.to_string();
  assert!(message.contains("/a/libpkg-1.0.tar.gz"));
  assert!(message.contains("/b/libpkg-1.0.tar.gz"));
}
