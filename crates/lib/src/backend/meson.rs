//! Meson backend.
//!
//! Meson takes all toolchain details from a cross file, so the configure
//! phase first writes one into the build directory.

use std::fmt::Write as _;

use super::{BuildContext, BuildPlan, Step};
use crate::runner::{Invocation, path_arg};
use crate::toolchain::{TargetOs, ToolchainConfig};

pub const CROSS_FILE_NAME: &str = "xdeps-cross.ini";

pub fn plan(ctx: &BuildContext<'_>) -> BuildPlan {
  let tc = ctx.toolchain;
  let cross_file = ctx.build_dir.join(CROSS_FILE_NAME);
  let cppflags = tc.cppflags_with(ctx.project.cppflags.as_deref());

  let setup = Invocation::new("meson", ctx.build_dir)
    .arg("setup")
    .arg(path_arg(ctx.build_dir))
    .arg(path_arg(ctx.source_dir))
    .arg(format!("--prefix={}", tc.install_prefix.display()))
    .arg(format!("--cross-file={}", cross_file.display()))
    .arg("--buildtype=plain")
    .arg("--default-library=static")
    .arg("-Db_ndebug=true")
    .arg("-Dwrap_mode=nofallback")
    .args(&ctx.project.configure_args)
    .env("PKG_CONFIG_LIBDIR", path_arg(&tc.pkg_config_dir()));

  BuildPlan {
    configure: vec![
      Step::WriteFile {
        path: cross_file,
        contents: cross_file_contents(tc, &cppflags),
      },
      Step::Run(setup),
    ],
    compile: vec![Step::Run(
      Invocation::new("ninja", ctx.build_dir).arg("-j").arg(ctx.jobs()),
    )],
    install: vec![Step::Run(Invocation::new("ninja", ctx.build_dir).arg("install"))],
  }
}

fn quote(value: &str) -> String {
  format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Meson array literal from a whitespace-separated command or flag string.
fn array(value: &str) -> String {
  let items: Vec<String> = value.split_whitespace().map(quote).collect();
  format!("[{}]", items.join(", "))
}

fn system(tc: &ToolchainConfig) -> &'static str {
  match tc.target_os() {
    TargetOs::Android => "android",
    TargetOs::Windows => "windows",
    TargetOs::Darwin => "darwin",
    TargetOs::Linux => "linux",
  }
}

/// Render the cross file for `tc`.
pub fn cross_file_contents(tc: &ToolchainConfig, cppflags: &str) -> String {
  let mut out = String::new();
  let c_args = format!("{} {}", cppflags, tc.cflags);
  let cpp_args = format!("{} {}", cppflags, tc.cxxflags);
  let link_args = format!("{} {}", tc.ldflags_full(), tc.libs);

  let _ = writeln!(out, "[binaries]");
  let _ = writeln!(out, "c = {}", array(&tc.cc));
  let _ = writeln!(out, "cpp = {}", array(&tc.cxx));
  let _ = writeln!(out, "ar = {}", quote(&tc.ar));
  let _ = writeln!(out, "strip = {}", quote(&tc.strip()));
  let _ = writeln!(out, "pkg-config = 'pkg-config'");
  if tc.is_windows() {
    let _ = writeln!(out, "windres = {}", quote(&tc.windres()));
  }

  let _ = writeln!(out);
  let _ = writeln!(out, "[properties]");
  if let Some(sysroot) = &tc.sysroot {
    let _ = writeln!(out, "sys_root = {}", quote(&sysroot.to_string_lossy()));
  }
  let _ = writeln!(out, "pkg_config_libdir = {}", quote(&tc.pkg_config_dir().to_string_lossy()));

  let _ = writeln!(out);
  let _ = writeln!(out, "[built-in options]");
  let _ = writeln!(out, "c_args = {}", array(&c_args));
  let _ = writeln!(out, "cpp_args = {}", array(&cpp_args));
  let _ = writeln!(out, "c_link_args = {}", array(&link_args));
  let _ = writeln!(out, "cpp_link_args = {}", array(&link_args));

  let _ = writeln!(out);
  let _ = writeln!(out, "[host_machine]");
  let _ = writeln!(out, "system = {}", quote(system(tc)));
  let _ = writeln!(out, "cpu_family = {}", quote(tc.cpu_family()));
  let _ = writeln!(out, "cpu = {}", quote(tc.arch()));
  let _ = writeln!(out, "endian = 'little'");
  out
}
