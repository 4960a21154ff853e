//! Preflight checks

use hs_core::traits::command_exists;
use hs_core::{CommandSpec, HsError, Result};

use crate::context::StepContext;
use crate::registry::StepOutcome;

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let missing: Vec<&str> = ctx
        .settings
        .preflight
        .required_commands
        .iter()
        .map(String::as_str)
        .filter(|name| !command_exists(ctx.runner, name))
        .collect();

    if !missing.is_empty() {
        return Err(HsError::Precondition(format!(
            "required commands not found: {}",
            missing.join(", ")
        )));
    }

    let kernel = ctx
        .runner
        .run_checked(&CommandSpec::new("uname").arg("-sr"))?
        .stdout_trimmed()
        .to_string();
    tracing::info!("Kernel: {}", kernel);

    let uid = ctx.runner.run_checked(&CommandSpec::new("id").arg("-u"))?;
    let root = uid.stdout_trimmed() == "0";
    if !root {
        tracing::warn!("Not running as root; later steps may need elevated privileges");
    }

    ctx.store.set("preflight.kernel", &kernel)?;
    ctx.store.set("preflight.root", if root { "true" } else { "false" })?;
    Ok(StepOutcome::Completed)
}
