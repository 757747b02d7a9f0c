//! Manifest order is dependency order.

use xdeps_lib::manifest::Manifest;
use xdeps_lib::orchestrator::{Orchestrator, Phase, PipelineError};
use xdeps_lib::runner::ProcessOutput;

use super::common::*;

/// `libb` configures only when `liba` is installed, like a real
/// `find_library` check would.
fn dependent_runner(env: &TestEnv) -> RecordingRunner {
  let prefix = env.toolchain.install_prefix.clone();
  RecordingRunner::new(move |inv| {
    if is_configure(inv) && project_of(inv) == "libb" && !prefix.join("lib/liba.a").exists() {
      return Err(failed(inv, "CMake Error: Could NOT find liba (missing: LIBA_LIBRARY)"));
    }
    install_if_requested(&prefix, inv);
    Ok(ProcessOutput::default())
  })
}

fn manifest(env: &TestEnv) -> Manifest {
  Manifest::new(vec![
    cached_project(env, "liba"),
    cached_project(env, "libb").requires(&["liba"]),
  ])
  .unwrap()
}

#[tokio::test]
async fn full_list_builds_in_order() {
  let env = TestEnv::new();
  let runner = dependent_runner(&env);

  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest(&env))
    .await
    .unwrap();

  assert!(report.is_success());
  let names: Vec<_> = report.outcomes.iter().map(|(n, _)| n.as_str()).collect();
  assert_eq!(names, ["liba", "libb"]);
  assert!(env.artifact("libb").exists());
}

#[tokio::test]
async fn dependent_alone_fails_in_configure() {
  let env = TestEnv::new();
  let runner = dependent_runner(&env);
  let selected = manifest(&env).select(&["libb"]).unwrap();

  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&selected)
    .await
    .unwrap();

  let failure = report.failure.unwrap();
  assert_eq!(failure.project, "libb");
  assert_eq!(failure.phase, Phase::Configure);
  assert!(matches!(failure.error, PipelineError::Configure(_)));
  assert!(failure.to_string().contains("Could NOT find liba"));
  assert!(runner.calls().iter().all(|inv| !inv.args.iter().any(|a| a == "--build")));
}

#[tokio::test]
async fn failure_halts_remaining_projects() {
  let env = TestEnv::new();
  let manifest = Manifest::new(vec![
    cached_project(&env, "liba"),
    cached_project(&env, "libb"),
    cached_project(&env, "libc"),
  ])
  .unwrap();
  let prefix = env.toolchain.install_prefix.clone();
  let runner = RecordingRunner::new(move |inv| {
    if inv.args.first().is_some_and(|a| a == "--install") && project_of(inv) == "liba" {
      // installs nothing: the artifact check must catch it
      return Ok(ProcessOutput::default());
    }
    install_if_requested(&prefix, inv);
    Ok(ProcessOutput::default())
  });

  let report = Orchestrator::new(&runner, &env.toolchain, env.dirs.clone())
    .unwrap()
    .run(&manifest)
    .await
    .unwrap();

  let failure = report.failure.unwrap();
  assert_eq!(failure.project, "liba");
  assert_eq!(failure.phase, Phase::Install);
  assert!(report.outcomes.is_empty());
  assert!(!env.dirs.sources().join("libb-1.0").exists());
}
