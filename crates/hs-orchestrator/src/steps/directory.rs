//! Directory layout

use hs_core::{CommandSpec, Result, ValidationError};

use super::{input_with_stored, is_safe_abs_path, require};
use crate::context::StepContext;
use crate::registry::StepOutcome;

const DEFAULT_BASE: &str = "/srv/homestead";

/// Subdirectories created under the base directory
pub const SUBDIRS: &[&str] = &["config", "data", "stacks"];

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let user = require(ctx.store, "user.name", "user")?;
    let owner = match (ctx.store.get("user.uid"), ctx.store.get("user.gid")) {
        (Ok(uid), Ok(gid)) => format!("{}:{}", uid, gid),
        _ => user,
    };

    let base = input_with_stored(ctx, "Base directory", "directory.base", DEFAULT_BASE)?;
    let base = base.trim_end_matches('/').to_string();
    if base.is_empty() || !is_safe_abs_path(&base) {
        return Err(ValidationError::MissingField(format!("absolute base directory, got {:?}", base)).into());
    }

    let mut mkdir = CommandSpec::new("mkdir").arg("-p").arg(base.as_str());
    for sub in SUBDIRS {
        mkdir = mkdir.arg(format!("{}/{}", base, sub));
    }
    ctx.runner.run_checked(&mkdir)?;
    ctx.runner
        .run_checked(&CommandSpec::new("chown").args(["-R", owner.as_str(), base.as_str()]))?;
    tracing::info!("Prepared {} for {}", base, owner);

    ctx.store.set("directory.base", &base)?;
    Ok(StepOutcome::Completed)
}
