//! Reset command implementation

use anyhow::Result;

use hs_core::{ConfigStore, Prompter};
use hs_orchestrator::{Orchestrator, StepRegistry};

use crate::output::{print_info, print_success};

/// Clear one step's completion markers, or all of them
///
/// Recorded answers in the store are kept, so a re-run offers them as
/// defaults.
pub fn reset_command(
    store: &ConfigStore,
    prompter: &dyn Prompter,
    step: Option<&str>,
    yes: bool,
) -> Result<()> {
    let mut orchestrator = Orchestrator::new(StepRegistry::standard(), store)?;

    let what = match step {
        Some(id) => orchestrator.step(id)?.name.to_string(),
        None => "every step".to_string(),
    };

    if !yes && !prompter.confirm(&format!("Reset {}?", what), false)? {
        print_info("Nothing reset");
        return Ok(());
    }

    match step {
        Some(id) => orchestrator.reset_step(store, id)?,
        None => orchestrator.reset_all(store)?,
    }
    print_success(&format!("Reset {}", what));
    Ok(())
}
