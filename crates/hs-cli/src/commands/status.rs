//! Status command implementation

use anyhow::Result;

use hs_core::ConfigStore;
use hs_orchestrator::{Orchestrator, StepRegistry, StepState};

use crate::output::{format_steps, print_info};

/// Execute the status command
pub fn status_command(store: &ConfigStore) -> Result<()> {
    let orchestrator = Orchestrator::new(StepRegistry::standard(), store)?;
    let status = orchestrator.status();

    println!("{}", format_steps(&status));

    let remaining = status
        .iter()
        .filter(|(step, state)| !step.optional && *state != StepState::Completed)
        .count();
    if remaining == 0 {
        print_info("All required steps are complete");
    } else {
        print_info(&format!(
            "{} required step(s) remaining; run `homestead run quick` to continue",
            remaining
        ));
    }

    Ok(())
}
