//! Run command implementation

use anyhow::Result;

use hs_orchestrator::{
    Orchestrator, RunSummary, StepContext, StepDescriptor, StepOutcome, StepRegistry,
};

use crate::output::{print_error, print_info, print_success};

/// What `homestead run` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    /// Every step, re-confirming completed ones
    All,
    /// Every non-optional step
    Quick,
    /// A single step by id
    Step(String),
}

impl RunTarget {
    pub fn parse(target: &str) -> Self {
        match target {
            "all" => RunTarget::All,
            "quick" => RunTarget::Quick,
            id => RunTarget::Step(id.to_string()),
        }
    }
}

/// Execute the run command
pub fn run_command(ctx: &mut StepContext<'_>, target: RunTarget) -> Result<()> {
    let mut orchestrator = Orchestrator::new(StepRegistry::standard(), ctx.store)?;
    let prompter = ctx.prompter;

    let result = match target {
        RunTarget::Step(id) => {
            let step = *orchestrator.step(&id)?;
            let complete = orchestrator.is_step_complete(ctx.store, step.marker)?;
            if complete
                && !prompter.confirm(&format!("{} is already complete. Run it again?", step.name), false)?
            {
                print_info(&format!("{} already complete", step.name));
                return Ok(());
            }
            orchestrator.run_step(ctx, step.id).map(|outcome| {
                let mut summary = RunSummary::default();
                match outcome {
                    StepOutcome::Completed => summary.ran.push(step.id),
                    StepOutcome::Deferred => summary.deferred.push(step.id),
                }
                summary
            })
        }
        RunTarget::All => run_sequence(&mut orchestrator, ctx, false),
        RunTarget::Quick => run_sequence(&mut orchestrator, ctx, true),
    };

    match result {
        Ok(summary) if summary.ran.is_empty() && summary.deferred.is_empty() => {
            print_info("Nothing to do; every step is complete");
            Ok(())
        }
        Ok(summary) => {
            for id in summary.ran {
                let step = orchestrator.step(id)?;
                print_success(&format!("{} complete", step.name));
            }
            for id in summary.deferred {
                let step = orchestrator.step(id)?;
                print_info(&format!("{} not finished; run it again to complete it", step.name));
            }
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            print_info("Fix the problem and run the same command again to resume");
            Err(e.into())
        }
    }
}

fn run_sequence(
    orchestrator: &mut Orchestrator,
    ctx: &mut StepContext<'_>,
    skip_optional: bool,
) -> hs_core::Result<RunSummary> {
    let prompter = ctx.prompter;
    let mut rerun = |step: &StepDescriptor| {
        prompter.confirm(&format!("{} is already complete. Run it again?", step.name), false)
    };
    let summary = orchestrator.run_all_with(ctx, skip_optional, &mut rerun)?;
    for id in &summary.skipped {
        tracing::debug!("Skipped {}", id);
    }
    Ok(summary)
}
