//! Service user

use hs_core::{CommandSpec, HsError, Result, ValidationError};

use super::input_with_stored;
use crate::context::StepContext;
use crate::registry::StepOutcome;

/// POSIX-portable user name: `[a-z_][a-z0-9_-]*`, at most 32 characters
fn validate_user_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = name.len() <= 32
        && matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !valid {
        return Err(ValidationError::Name(name.to_string()).into());
    }
    Ok(())
}

fn numeric_id(ctx: &StepContext<'_>, flag: &str, name: &str) -> Result<String> {
    let output = ctx
        .runner
        .run_checked(&CommandSpec::new("id").args([flag, name]))?;
    let id = output.stdout_trimmed();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(HsError::Precondition(format!(
            "`id {} {}` returned {:?}",
            flag, name, id
        )));
    }
    Ok(id.to_string())
}

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let name = input_with_stored(ctx, "Service user", "user.name", &whoami::username())?;
    validate_user_name(&name)?;

    let exists = ctx
        .runner
        .run(&CommandSpec::new("getent").args(["passwd", name.as_str()]))?
        .success();

    if !exists {
        let create = ctx
            .prompter
            .confirm(&format!("User {} does not exist. Create it?", name), true)?;
        if !create {
            return Err(HsError::Precondition(format!("user {} does not exist", name)));
        }
        ctx.runner
            .run_checked(&CommandSpec::new("useradd").args(["--create-home", name.as_str()]))?;
        tracing::info!("Created user {}", name);
    }

    let uid = numeric_id(ctx, "-u", &name)?;
    let gid = numeric_id(ctx, "-g", &name)?;

    ctx.store.set("user.name", &name)?;
    ctx.store.set("user.uid", &uid)?;
    ctx.store.set("user.gid", &gid)?;
    Ok(StepOutcome::Completed)
}
