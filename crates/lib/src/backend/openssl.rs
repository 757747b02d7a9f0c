//! OpenSSL's Perl `Configure` with a target name derived from the host triple.

use super::{BuildContext, BuildPlan, Step, StepError};
use crate::runner::Invocation;
use crate::toolchain::{TargetOs, ToolchainConfig};

const OPTIONS: &[&str] = &[
  "no-shared",
  "no-module",
  "no-engine",
  "no-static-engine",
  "no-async",
  "no-tests",
  "no-makedepend",
];

/// OpenSSL's configuration target for `tc`, if there is one.
pub fn target(tc: &ToolchainConfig) -> Option<&'static str> {
  let os = tc.target_os();
  let target = match (tc.cpu_family(), os) {
    ("arm", TargetOs::Linux | TargetOs::Android) => "linux-armv4",
    ("aarch64", TargetOs::Linux | TargetOs::Android) => "linux-aarch64",
    ("x86", TargetOs::Linux | TargetOs::Android) => "linux-elf",
    ("x86_64", TargetOs::Linux | TargetOs::Android) => "linux-x86_64",
    ("x86", TargetOs::Windows) => "mingw",
    ("x86_64", TargetOs::Windows) => "mingw64",
    ("x86_64", TargetOs::Darwin) => "darwin64-x86_64-cc",
    ("aarch64", TargetOs::Darwin) => "darwin64-arm64-cc",
    _ => return None,
  };
  Some(target)
}

pub fn plan(ctx: &BuildContext<'_>) -> Result<BuildPlan, StepError> {
  let tc = ctx.toolchain;
  let target = target(tc).ok_or_else(|| StepError::UnsupportedHost(tc.host_triple.clone()))?;
  let env = tc.env(ctx.project.cppflags.as_deref());
  let src = ctx.source_dir;

  let configure = Invocation::new("./Configure", src)
    .args(OPTIONS.iter().copied())
    .arg("--libdir=lib")
    .arg(format!("--prefix={}", tc.install_prefix.display()))
    .arg(target)
    .args(&ctx.project.configure_args)
    .envs(&env);

  Ok(BuildPlan {
    configure: vec![Step::Run(configure)],
    compile: vec![Step::Run(
      Invocation::new("make", src)
        .arg("-j")
        .arg(ctx.jobs())
        .arg("build_libs")
        .envs(&env),
    )],
    install: vec![Step::Run(
      Invocation::new("make", src).arg("install_dev").envs(&env),
    )],
  })
}
