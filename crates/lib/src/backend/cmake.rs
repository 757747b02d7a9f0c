//! CMake backend, generating a toolchain file and building with Ninja.

use std::fmt::Write as _;

use super::{BuildContext, BuildPlan, Step};
use crate::runner::{Invocation, path_arg};
use crate::toolchain::{TargetOs, ToolchainConfig};

pub const TOOLCHAIN_FILE_NAME: &str = "xdeps-toolchain.cmake";

pub fn plan(ctx: &BuildContext<'_>) -> BuildPlan {
  let tc = ctx.toolchain;
  let toolchain_file = ctx.build_dir.join(TOOLCHAIN_FILE_NAME);
  let cppflags = tc.cppflags_with(ctx.project.cppflags.as_deref());

  let configure = Invocation::new("cmake", ctx.build_dir)
    .arg("-S")
    .arg(path_arg(ctx.source_dir))
    .arg("-B")
    .arg(path_arg(ctx.build_dir))
    .arg("-G")
    .arg("Ninja")
    .arg(format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain_file.display()))
    .arg(format!("-DCMAKE_INSTALL_PREFIX={}", tc.install_prefix.display()))
    .arg("-DCMAKE_BUILD_TYPE=Release")
    .arg("-DCMAKE_INSTALL_LIBDIR=lib")
    .args(&ctx.project.configure_args)
    .env("PKG_CONFIG_LIBDIR", path_arg(&tc.pkg_config_dir()));

  BuildPlan {
    configure: vec![
      Step::WriteFile {
        path: toolchain_file,
        contents: toolchain_file_contents(tc, &cppflags),
      },
      Step::Run(configure),
    ],
    compile: vec![Step::Run(
      Invocation::new("cmake", ctx.build_dir)
        .arg("--build")
        .arg(path_arg(ctx.build_dir))
        .arg("--parallel")
        .arg(ctx.jobs()),
    )],
    install: vec![Step::Run(
      Invocation::new("cmake", ctx.build_dir)
        .arg("--install")
        .arg(path_arg(ctx.build_dir)),
    )],
  }
}

fn system_name(tc: &ToolchainConfig) -> &'static str {
  match tc.target_os() {
    TargetOs::Windows => "Windows",
    TargetOs::Darwin => "Darwin",
    // Android's own CMake platform expects the NDK layout, plain Linux does not.
    TargetOs::Linux | TargetOs::Android => "Linux",
  }
}

/// `ccache clang` becomes compiler `clang` with launcher `ccache`.
fn write_compiler(out: &mut String, lang: &str, command: &str) {
  let words: Vec<&str> = command.split_whitespace().collect();
  let Some((compiler, launcher)) = words.split_last() else {
    return;
  };
  let _ = writeln!(out, "set(CMAKE_{lang}_COMPILER {compiler})");
  if !launcher.is_empty() {
    let _ = writeln!(out, "set(CMAKE_{lang}_COMPILER_LAUNCHER {})", launcher.join(";"));
  }
}

/// Render the toolchain file for `tc`.
pub fn toolchain_file_contents(tc: &ToolchainConfig, cppflags: &str) -> String {
  let mut out = String::new();
  let prefix = tc.install_prefix.to_string_lossy();

  let _ = writeln!(out, "set(CMAKE_SYSTEM_NAME {})", system_name(tc));
  let _ = writeln!(out, "set(CMAKE_SYSTEM_PROCESSOR {})", tc.cpu_family());
  write_compiler(&mut out, "C", &tc.cc);
  write_compiler(&mut out, "CXX", &tc.cxx);
  let _ = writeln!(out, "set(CMAKE_AR {} CACHE FILEPATH \"\")", tc.ar);
  let _ = writeln!(out, "set(CMAKE_RANLIB {} CACHE FILEPATH \"\")", tc.ranlib());
  if tc.is_windows() {
    let _ = writeln!(out, "set(CMAKE_RC_COMPILER {})", tc.windres());
  }
  if let Some(sysroot) = &tc.sysroot {
    let _ = writeln!(out, "set(CMAKE_SYSROOT \"{}\")", sysroot.display());
  }

  let _ = writeln!(out, "set(CMAKE_C_FLAGS_INIT \"{} {}\")", tc.cflags, cppflags);
  let _ = writeln!(out, "set(CMAKE_CXX_FLAGS_INIT \"{} {}\")", tc.cxxflags, cppflags);
  let ldflags = tc.ldflags_full();
  let _ = writeln!(out, "set(CMAKE_EXE_LINKER_FLAGS_INIT \"{ldflags}\")");
  let _ = writeln!(out, "set(CMAKE_SHARED_LINKER_FLAGS_INIT \"{ldflags}\")");

  let _ = writeln!(out, "set(CMAKE_FIND_ROOT_PATH \"{prefix}\")");
  let _ = writeln!(out, "set(CMAKE_FIND_ROOT_PATH_MODE_PROGRAM NEVER)");
  let _ = writeln!(out, "set(CMAKE_FIND_ROOT_PATH_MODE_LIBRARY ONLY)");
  let _ = writeln!(out, "set(CMAKE_FIND_ROOT_PATH_MODE_INCLUDE ONLY)");
  let _ = writeln!(out, "set(CMAKE_FIND_ROOT_PATH_MODE_PACKAGE ONLY)");
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::Backend;
  use crate::project::Project;
  use std::path::Path;

  fn libogg() -> Project {
    Project::new(
      &["http://downloads.xiph.org/releases/ogg/libogg-1.3.5.tar.xz"],
      "c4d91be36fc8e54deae7575241e03f4211eb102afb3fc0775fbbc1b740016705",
      "lib/libogg.a",
      Backend::Cmake,
    )
    .unwrap()
    .configure_args(["-DBUILD_SHARED_LIBS=OFF", "-DINSTALL_DOCS=OFF"])
  }

  #[test]
  fn configure_build_install() {
    let project = libogg();
    let tc = ToolchainConfig::new("x86_64-w64-mingw32", "/opt/prefix");
    let ctx = BuildContext {
      project: &project,
      source_dir: Path::new("/w/src/libogg-1.3.5"),
      build_dir: Path::new("/w/build/libogg-1.3.5"),
      toolchain: &tc,
    };

    let plan = plan(&ctx);
    let calls: Vec<_> = plan.invocations().collect();

    assert_eq!(calls.len(), 3);
    assert_eq!(
      calls[0].command_line(),
      "cmake -S /w/src/libogg-1.3.5 -B /w/build/libogg-1.3.5 -G Ninja \
       -DCMAKE_TOOLCHAIN_FILE=/w/build/libogg-1.3.5/xdeps-toolchain.cmake \
       -DCMAKE_INSTALL_PREFIX=/opt/prefix -DCMAKE_BUILD_TYPE=Release -DCMAKE_INSTALL_LIBDIR=lib \
       -DBUILD_SHARED_LIBS=OFF -DINSTALL_DOCS=OFF"
    );
    assert_eq!(calls[0].env["PKG_CONFIG_LIBDIR"], "/opt/prefix/lib/pkgconfig");
    assert_eq!(
      calls[1].command_line(),
      format!("cmake --build /w/build/libogg-1.3.5 --parallel {}", tc.jobs)
    );
    assert_eq!(calls[2].command_line(), "cmake --install /w/build/libogg-1.3.5");
  }

  #[test]
  fn toolchain_file_for_windows() {
    let tc = ToolchainConfig::new("i686-w64-mingw32", "/opt/prefix");
    let contents = toolchain_file_contents(&tc, "-isystem /opt/prefix/include");

    assert!(contents.contains("set(CMAKE_SYSTEM_NAME Windows)"));
    assert!(contents.contains("set(CMAKE_SYSTEM_PROCESSOR x86)"));
    assert!(contents.contains("set(CMAKE_RC_COMPILER i686-w64-mingw32-windres)"));
    assert!(contents.contains("set(CMAKE_C_FLAGS_INIT \"-O2 -isystem /opt/prefix/include\")"));
    assert!(contents.contains("set(CMAKE_FIND_ROOT_PATH \"/opt/prefix\")"));
  }

  #[test]
  fn compiler_launcher_is_split_off() {
    let mut tc = ToolchainConfig::new("aarch64-linux-android", "/opt/prefix");
    tc.cc = "ccache clang".to_string();
    tc.cxx = "clang++".to_string();

    let contents = toolchain_file_contents(&tc, "");

    assert!(contents.contains("set(CMAKE_C_COMPILER clang)\n"));
    assert!(contents.contains("set(CMAKE_C_COMPILER_LAUNCHER ccache)\n"));
    assert!(contents.contains("set(CMAKE_CXX_COMPILER clang++)\n"));
    assert!(!contents.contains("CMAKE_CXX_COMPILER_LAUNCHER"));
  }

  #[test]
  fn android_maps_to_linux() {
    let tc = ToolchainConfig::new("aarch64-linux-android", "/opt/prefix");
    let contents = toolchain_file_contents(&tc, "");
    assert!(contents.contains("set(CMAKE_SYSTEM_NAME Linux)"));
    assert!(!contents.contains("CMAKE_RC_COMPILER"));
  }
}
