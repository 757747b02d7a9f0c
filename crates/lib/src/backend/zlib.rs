//! zlib ships its own configure script and a separate MinGW makefile.

use super::{BuildContext, BuildPlan, Step};
use crate::runner::{Invocation, path_arg};

pub fn plan(ctx: &BuildContext<'_>) -> BuildPlan {
  let tc = ctx.toolchain;
  let src = ctx.source_dir;
  let env = tc.env(ctx.project.cppflags.as_deref());

  if tc.is_windows() {
    let make = || {
      Invocation::new("make", src)
        .arg("-f")
        .arg("win32/Makefile.gcc")
        .arg(format!("PREFIX={}-", tc.host_triple))
    };
    let cflags = format!("CFLAGS={} {}", tc.cflags, env["CPPFLAGS"]);

    return BuildPlan {
      configure: Vec::new(),
      compile: vec![Step::Run(make().arg(cflags).arg("-j").arg(ctx.jobs()))],
      install: vec![Step::Run(
        make()
          .arg(format!("INCLUDE_PATH={}", path_arg(&tc.include_dir())))
          .arg(format!("LIBRARY_PATH={}", path_arg(&tc.lib_dir())))
          .arg(format!("BINARY_PATH={}", path_arg(&tc.install_prefix.join("bin"))))
          .arg("install"),
      )],
    };
  }

  let configure = Invocation::new("./configure", src)
    .arg(format!("--prefix={}", tc.install_prefix.display()))
    .arg("--static")
    .args(&ctx.project.configure_args)
    .envs(&env)
    .env("CHOST", &tc.host_triple)
    .env("CFLAGS", format!("{} {}", tc.cflags, env["CPPFLAGS"]));

  BuildPlan {
    configure: vec![Step::Run(configure)],
    compile: vec![Step::Run(
      Invocation::new("make", src)
        .arg("-j")
        .arg(ctx.jobs())
        .arg("libz.a")
        .envs(&env),
    )],
    install: vec![Step::Run(Invocation::new("make", src).arg("install").envs(&env))],
  }
}
