//! Completion cache and resumption after interrupted runs.

use std::fs;

use xdeps_lib::consts::SOURCE_READY_MARKER;
use xdeps_lib::manifest::Manifest;
use xdeps_lib::orchestrator::{Orchestrator, Outcome, Phase};
use xdeps_lib::runner::ProcessOutput;

use super::common::*;

#[tokio::test]
async fn second_run_does_no_work() {
  let env = TestEnv::new();
  let manifest = Manifest::new(vec![cached_project(&env, "liba"), cached_project(&env, "libb")]).unwrap();

  let first = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&first, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();
  assert_eq!(report.built(), 2);

  let second = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&second, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  assert_eq!(report.cached(), 2);
  assert_eq!(report.built(), 0);
  assert!(second.calls().is_empty());
}

#[tokio::test]
async fn existing_build_directory_is_not_a_cache_hit() {
  let env = TestEnv::new();
  let manifest = Manifest::new(vec![cached_project(&env, "liba")]).unwrap();
  write_file(&env.dirs.builds().join("liba-1.0/build.ninja"), b"");
  write_file(&env.dirs.sources().join("liba-1.0").join(SOURCE_READY_MARKER), b"{}");

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  assert_eq!(report.outcomes, vec![("liba".to_string(), Outcome::Built)]);
  assert_eq!(runner.programs().len(), 3);
}

#[tokio::test]
async fn patches_are_not_reapplied_after_a_failed_build() {
  let env = TestEnv::new();
  let patches = env.temp.path().join("patches/liba");
  write_file(&patches.join("0001-fix.patch"), b"--- a/liba.c\n+++ b/liba.c\n");
  let project = cached_project(&env, "liba").patch_dir(&patches);
  let manifest = Manifest::new(vec![project]).unwrap();

  let failing = RecordingRunner::new(|inv| {
    if inv.args.first().is_some_and(|a| a == "--build") {
      return Err(failed(inv, "liba.c:1: error: expected ';'"));
    }
    Ok(ProcessOutput::default())
  });
  let report = Orchestrator::new(&failing, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  let failure = report.failure.unwrap();
  assert_eq!(failure.phase, Phase::Compile);
  assert!(failure.to_string().contains("expected ';'"));
  assert_eq!(failing.programs().iter().filter(|p| *p == "patch").count(), 2);

  let retry = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&retry, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  assert!(report.is_success());
  assert!(!retry.programs().contains(&"patch".to_string()));
}

#[tokio::test]
async fn interrupted_extraction_is_redone() {
  let env = TestEnv::new();
  let manifest = Manifest::new(vec![cached_project(&env, "liba")]).unwrap();
  let source = env.dirs.sources().join("liba-1.0");
  write_file(&source.join("half-written.c"), b"int");

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  assert!(report.is_success());
  assert!(!source.join("half-written.c").exists());
  assert!(source.join("liba.c").exists());
  assert!(fs::read_to_string(source.join(SOURCE_READY_MARKER)).unwrap().contains("sha256:"));
}

#[tokio::test]
async fn empty_artifact_is_not_a_cache_hit() {
  let env = TestEnv::new();
  let manifest = Manifest::new(vec![cached_project(&env, "liba")]).unwrap();
  write_file(&env.artifact("liba"), b"");

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  assert_eq!(report.outcomes, vec![("liba".to_string(), Outcome::Built)]);
  assert_eq!(runner.programs(), ["cmake", "cmake", "cmake"]);
  assert!(fs::metadata(env.artifact("liba")).unwrap().len() > 0);
}

#[tokio::test]
async fn new_pin_under_same_archive_name_rebuilds_from_new_source() {
  let env = TestEnv::new();
  let first = Manifest::new(vec![cached_project(&env, "liba")]).unwrap();
  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&first)
    .await
    .unwrap();
  fs::remove_file(env.artifact("liba")).unwrap();

  let bytes = tar_gz(&[
    ("liba-1.0/CMakeLists.txt", "project(x C)\n"),
    ("liba-1.0/liba.c", "int y;\n"),
  ]);
  write_file(&env.dirs.downloads.join("liba-1.0.tar.gz"), &bytes);
  let digest = xdeps_lib::digest::hash_bytes(xdeps_lib::digest::DigestAlgorithm::Sha256, &bytes);
  let project = cmake_project(&["https://example.invalid/liba-1.0.tar.gz".to_string()], &digest, "liba");
  let second = Manifest::new(vec![project]).unwrap();

  let runner = RecordingRunner::installing(&env.toolchain.install_prefix);
  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&second)
    .await
    .unwrap();

  assert!(report.is_success());
  let source = env.dirs.sources().join("liba-1.0");
  assert_eq!(fs::read_to_string(source.join("liba.c")).unwrap(), "int y;\n");
  assert!(fs::read_to_string(source.join(SOURCE_READY_MARKER)).unwrap().contains(&digest));
}
