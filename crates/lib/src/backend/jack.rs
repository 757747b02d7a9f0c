//! JACK is only needed for its headers; the library itself is loaded at
//! runtime. Install the public headers and a pkg-config file pointing at them.

use super::{BuildContext, BuildPlan, Step};

pub const HEADERS: &[&str] = &[
  "jack.h",
  "ringbuffer.h",
  "systemdeps.h",
  "transport.h",
  "types.h",
  "weakmacros.h",
];

pub fn plan(ctx: &BuildContext<'_>) -> BuildPlan {
  let tc = ctx.toolchain;
  let headers = ctx.source_dir.join("common").join("jack");
  let dest = tc.include_dir().join("jack");

  let mut install: Vec<Step> = HEADERS
    .iter()
    .map(|name| Step::CopyFile {
      from: headers.join(name),
      to: dest.join(name),
    })
    .collect();

  install.push(Step::WriteFile {
    path: tc.installed(&ctx.project.artifact),
    contents: pkg_config(ctx),
  });

  BuildPlan {
    configure: Vec::new(),
    compile: Vec::new(),
    install,
  }
}

fn pkg_config(ctx: &BuildContext<'_>) -> String {
  let version = ctx.project.version().unwrap_or_default();
  format!(
    "prefix={}\n\
     libdir=${{prefix}}/lib\n\
     includedir=${{prefix}}/include\n\
     \n\
     Name: jack\n\
     Description: JACK Audio Connection Kit (headers only)\n\
     Version: {version}\n\
     Libs:\n\
     Cflags: -I${{includedir}}\n",
    ctx.toolchain.install_prefix.display()
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::Backend;
  use crate::project::Project;
  use crate::toolchain::ToolchainConfig;
  use crate::util::testutil::{RecordingRunner, write_file};
  use tempfile::TempDir;

  #[tokio::test]
  async fn installs_headers_and_pkg_config() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src/jack2-1.9.17");
    for name in HEADERS {
      write_file(&source.join("common/jack").join(name), b"/* header */\n");
    }
    write_file(&source.join("common/jack/control.h"), b"/* private */\n");

    let project = Project::new(
      &["https://github.com/jackaudio/jack2/archive/v1.9.17.tar.gz"],
      "38f674bbc57852a8eb3d9faa1f96a0912d26f7d5df14c11005ad499c8ae352f2",
      "lib/pkgconfig/jack.pc",
      Backend::Jack,
    )
    .unwrap()
    .base("jack2-1.9.17");
    let tc = ToolchainConfig::new("x86_64-w64-mingw32", temp.path().join("prefix"));
    let build = temp.path().join("build/jack2-1.9.17");
    let ctx = BuildContext {
      project: &project,
      source_dir: &source,
      build_dir: &build,
      toolchain: &tc,
    };

    let artifact = project.backend.build(&ctx, &RecordingRunner::new()).await.unwrap();

    let pc = std::fs::read_to_string(&artifact).unwrap();
    assert!(pc.contains("Version: 1.9.17\n"));
    assert!(pc.contains("Cflags: -I${includedir}\n"));
    assert!(pc.starts_with(&format!("prefix={}\n", tc.install_prefix.display())));
    assert!(tc.include_dir().join("jack/ringbuffer.h").exists());
    assert!(!tc.include_dir().join("jack/control.h").exists());
  }
}
