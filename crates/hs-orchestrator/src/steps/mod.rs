//! Built-in provisioning steps
//!
//! Each step is a plain function of the [`StepContext`]: it asks its
//! questions through the prompter and records the answers in the store.
//! A step reports whether it finished and the runner sets the completion
//! marker for it.

pub mod container;
pub mod deployment;
pub mod directory;
pub mod nfs;
pub mod preflight;
pub mod user;
pub mod wireguard;

use hs_core::{ConfigStore, HsError, Result};

use crate::context::StepContext;

/// Value recorded by an earlier step
fn require(store: &ConfigStore, key: &str, step: &str) -> Result<String> {
    match store.get(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) | Err(HsError::NotFound(_)) => Err(HsError::Precondition(format!(
            "{} is not set; run the {} step first",
            key, step
        ))),
        Err(e) => Err(e),
    }
}

/// Prompt for text, offering the stored value (or `fallback`) as default
fn input_with_stored(ctx: &StepContext<'_>, prompt: &str, key: &str, fallback: &str) -> Result<String> {
    let default = ctx.store.get_or_default(key, fallback);
    let answer = ctx.prompter.input(prompt, Some(&default))?;
    Ok(answer.trim().to_string())
}

/// Whether `path` is an absolute path free of control characters
fn is_safe_abs_path(path: &str) -> bool {
    path.starts_with('/') && !path.chars().any(char::is_control) && !path.split('/').any(|c| c == "..")
}
