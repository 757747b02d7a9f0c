//! FFmpeg's hand-written configure script.
//!
//! It ignores the usual `CC`/`CFLAGS` environment and wants every tool and
//! flag passed as an option instead.

use super::{BuildContext, BuildPlan, Step};
use crate::runner::Invocation;
use crate::toolchain::{TargetOs, ToolchainConfig};

fn target_os(tc: &ToolchainConfig) -> &'static str {
  match tc.target_os() {
    TargetOs::Windows => "mingw32",
    TargetOs::Android => "android",
    TargetOs::Darwin => "darwin",
    TargetOs::Linux => "linux",
  }
}

pub fn plan(ctx: &BuildContext<'_>) -> BuildPlan {
  let tc = ctx.toolchain;
  let cppflags = tc.cppflags_with(ctx.project.cppflags.as_deref());

  let mut configure = Invocation::new(ctx.source_dir.join("configure").to_string_lossy(), ctx.build_dir)
    .arg(format!("--cc={}", tc.cc))
    .arg(format!("--cxx={}", tc.cxx))
    .arg(format!("--nm={}", tc.nm()))
    .arg(format!("--ar={}", tc.ar))
    .arg(format!("--ranlib={}", tc.ranlib()))
    .arg(format!("--strip={}", tc.strip()))
    .arg(format!("--extra-cflags={} {}", tc.cflags, cppflags))
    .arg(format!("--extra-cxxflags={} {}", tc.cxxflags, cppflags))
    .arg(format!("--extra-ldflags={}", tc.ldflags_full()))
    .arg(format!("--extra-libs={}", tc.libs))
    .arg("--enable-cross-compile")
    .arg(format!("--arch={}", tc.cpu_family()))
    .arg(format!("--target-os={}", target_os(tc)))
    .arg(format!("--prefix={}", tc.install_prefix.display()));

  if tc.is_windows() {
    configure = configure.arg(format!("--windres={}", tc.windres()));
  }

  // The x86 assembly needs nasm and PIC tricks that cross builds rarely have.
  if tc.cpu_family() == "x86" {
    configure = configure.arg("--disable-asm");
  }

  let configure = configure
    .args(&ctx.project.configure_args)
    .env("PKG_CONFIG_LIBDIR", tc.pkg_config_dir().to_string_lossy());

  BuildPlan {
    configure: vec![Step::Run(configure)],
    compile: vec![Step::Run(
      Invocation::new("make", ctx.build_dir).arg("-j").arg(ctx.jobs()),
    )],
    install: vec![Step::Run(Invocation::new("make", ctx.build_dir).arg("install"))],
  }
}
