//! Boost is consumed header-only, so installing means copying `boost/`.
//! The previous `include/boost` is replaced as a whole, and `version.hpp`
//! only appears once the full tree is in place.

use super::{BuildContext, BuildPlan, Step};

pub fn plan(ctx: &BuildContext<'_>) -> BuildPlan {
  BuildPlan {
    configure: Vec::new(),
    compile: Vec::new(),
    install: vec![Step::ReplaceDir {
      from: ctx.source_dir.join("boost"),
      to: ctx.toolchain.include_dir().join("boost"),
    }],
  }
}
