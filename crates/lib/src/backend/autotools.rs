//! GNU Autotools backend.

use super::{BuildContext, BuildPlan, Step};
use crate::runner::Invocation;

/// Per-project Autotools switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutotoolsOptions {
  /// Regenerate the build system with libtoolize/aclocal/automake/autoconf.
  pub autogen: bool,
  /// Regenerate the build system with `autoreconf -vif`.
  pub autoreconf: bool,
  /// Build and install only these subdirectories of the build tree.
  pub subdirs: Vec<String>,
}

impl AutotoolsOptions {
  pub fn autogen() -> Self {
    Self {
      autogen: true,
      ..Self::default()
    }
  }

  pub fn autoreconf() -> Self {
    Self {
      autoreconf: true,
      ..Self::default()
    }
  }

  pub fn subdirs(subdirs: &[&str]) -> Self {
    Self {
      subdirs: subdirs.iter().map(|s| s.to_string()).collect(),
      ..Self::default()
    }
  }
}

fn libtoolize() -> &'static str {
  if cfg!(target_os = "macos") { "glibtoolize" } else { "libtoolize" }
}

pub fn plan(ctx: &BuildContext<'_>, options: &AutotoolsOptions) -> BuildPlan {
  let tc = ctx.toolchain;
  let src = ctx.source_dir;
  let mut configure = Vec::new();

  if options.autogen {
    configure.push(Step::Run(Invocation::new(libtoolize(), src).arg("--force")));
    configure.push(Step::Run(Invocation::new("aclocal", src)));
    configure.push(Step::Run(
      Invocation::new("automake", src).args(["--add-missing", "--force-missing", "--foreign"]),
    ));
    configure.push(Step::Run(Invocation::new("autoconf", src)));
  }
  if options.autoreconf {
    configure.push(Step::Run(Invocation::new("autoreconf", src).arg("-vif")));
  }

  let env = tc.env(ctx.project.cppflags.as_deref());
  configure.push(Step::Run(
    Invocation::new(src.join("configure").to_string_lossy(), ctx.build_dir)
      .arg(format!("--host={}", tc.host_triple))
      .arg(format!("--prefix={}", tc.install_prefix.display()))
      .arg("--disable-silent-rules")
      .args(&ctx.project.configure_args)
      .envs(&env),
  ));

  let make = |targets: &[&str], subdir: Option<&str>| {
    let mut inv = Invocation::new("make", ctx.build_dir).arg("--quiet");
    if let Some(subdir) = subdir {
      inv = inv.arg("-C").arg(subdir);
    }
    Step::Run(inv.args(targets.iter().copied()).envs(&env))
  };

  let jobs = format!("-j{}", ctx.jobs());
  let (compile, install) = if options.subdirs.is_empty() {
    (vec![make(&[jobs.as_str()], None)], vec![make(&["install"], None)])
  } else {
    (
      options
        .subdirs
        .iter()
        .map(|dir| make(&[jobs.as_str()], Some(dir.as_str())))
        .collect(),
      options
        .subdirs
        .iter()
        .map(|dir| make(&["install"], Some(dir.as_str())))
        .collect(),
    )
  };

  BuildPlan {
    configure,
    compile,
    install,
  }
}
