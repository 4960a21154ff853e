//! Step runner and state machine
//!
//! Each step moves `Pending -> Running -> Completed | Failed`. The initial
//! state comes from the completion markers, with legacy markers migrated on
//! the way, so a new process resumes where the last one stopped.

use std::collections::HashMap;
use std::fmt;

use hs_core::{migrate_marker, ConfigStore, HsError, Result};

use crate::context::StepContext;
use crate::registry::{StepDescriptor, StepOutcome, StepRegistry};

/// Where a step stands in this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Pending => write!(f, "pending"),
            StepState::Running => write!(f, "running"),
            StepState::Completed => write!(f, "completed"),
            StepState::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of [`Orchestrator::run_all`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed, in order
    pub ran: Vec<&'static str>,
    /// Steps skipped because they were complete or optional
    pub skipped: Vec<&'static str>,
    /// Steps that ran but reported [`StepOutcome::Deferred`]
    pub deferred: Vec<&'static str>,
}

/// Runs registered steps against a [`StepContext`]
pub struct Orchestrator {
    registry: StepRegistry,
    states: HashMap<&'static str, StepState>,
}

impl Orchestrator {
    /// Create an orchestrator, deriving step states from `store`
    pub fn new(registry: StepRegistry, store: &ConfigStore) -> Result<Self> {
        let mut states = HashMap::new();
        for step in registry.steps() {
            let state = if migrate_marker(store, step.marker, step.legacy_markers)? {
                StepState::Completed
            } else {
                StepState::Pending
            };
            states.insert(step.id, state);
        }
        Ok(Self { registry, states })
    }

    /// All steps in execution order
    pub fn steps(&self) -> &[StepDescriptor] {
        self.registry.steps()
    }

    /// Look up a step by id
    pub fn step(&self, id: &str) -> Result<&StepDescriptor> {
        self.registry.get(id)
    }

    /// Current state of a step
    pub fn state(&self, id: &str) -> StepState {
        self.states.get(id).copied().unwrap_or(StepState::Pending)
    }

    /// Every step with its state
    pub fn status(&self) -> Vec<(&StepDescriptor, StepState)> {
        self.steps().iter().map(|s| (s, self.state(s.id))).collect()
    }

    /// Whether the step owning `marker` has completed, migrating legacy markers
    pub fn is_step_complete(&self, store: &ConfigStore, marker: &str) -> Result<bool> {
        let legacy = self
            .steps()
            .iter()
            .find(|s| s.marker == marker)
            .map(|s| s.legacy_markers)
            .unwrap_or(&[]);
        migrate_marker(store, marker, legacy)
    }

    /// Run one step unconditionally
    ///
    /// The step's marker is set when the body reports
    /// [`StepOutcome::Completed`]; a deferred step goes back to pending.
    /// Failures come back as [`HsError::StepFailure`] carrying the step's
    /// display name.
    pub fn run_step(&mut self, ctx: &mut StepContext<'_>, id: &str) -> Result<StepOutcome> {
        let step = *self.registry.get(id)?;

        self.states.insert(step.id, StepState::Running);
        tracing::info!("Running step {}", step.name);

        let result = (step.run)(ctx).and_then(|outcome| match outcome {
            StepOutcome::Completed => ctx.store.mark_complete(step.marker).map(|()| outcome),
            StepOutcome::Deferred => Ok(outcome),
        });
        match result {
            Ok(StepOutcome::Completed) => {
                self.states.insert(step.id, StepState::Completed);
                tracing::info!("Step {} completed", step.name);
                Ok(StepOutcome::Completed)
            }
            Ok(StepOutcome::Deferred) => {
                self.states.insert(step.id, StepState::Pending);
                tracing::info!("Step {} left pending", step.name);
                Ok(StepOutcome::Deferred)
            }
            Err(e) => {
                self.states.insert(step.id, StepState::Failed);
                tracing::warn!("Step {} failed: {}", step.name, e);
                Err(HsError::step(step.name, e))
            }
        }
    }

    /// Run every incomplete step in order, stopping at the first failure
    pub fn run_all(&mut self, ctx: &mut StepContext<'_>, skip_optional: bool) -> Result<RunSummary> {
        self.run_all_with(ctx, skip_optional, &mut |_| Ok(false))
    }

    /// Like [`run_all`](Self::run_all), asking `rerun` about completed steps
    pub fn run_all_with(
        &mut self,
        ctx: &mut StepContext<'_>,
        skip_optional: bool,
        rerun: &mut dyn FnMut(&StepDescriptor) -> Result<bool>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let steps: Vec<StepDescriptor> = self.steps().to_vec();

        for step in &steps {
            if skip_optional && step.optional {
                tracing::debug!("Skipping optional step {}", step.name);
                summary.skipped.push(step.id);
                continue;
            }
            if self.state(step.id) == StepState::Completed && !rerun(step)? {
                tracing::debug!("Step {} already complete", step.name);
                summary.skipped.push(step.id);
                continue;
            }

            match self.run_step(ctx, step.id)? {
                StepOutcome::Completed => summary.ran.push(step.id),
                StepOutcome::Deferred => summary.deferred.push(step.id),
            }
        }

        Ok(summary)
    }

    /// Clear one step's markers, including legacy ones
    pub fn reset_step(&mut self, store: &ConfigStore, id: &str) -> Result<()> {
        let step = *self.registry.get(id)?;
        store.clear_marker(step.marker)?;
        for legacy in step.legacy_markers {
            store.clear_marker(legacy)?;
        }
        self.states.insert(step.id, StepState::Pending);
        tracing::info!("Reset step {}", step.name);
        Ok(())
    }

    /// Clear every marker
    pub fn reset_all(&mut self, store: &ConfigStore) -> Result<()> {
        store.clear_all_markers()?;
        for state in self.states.values_mut() {
            *state = StepState::Pending;
        }
        tracing::info!("Reset all steps");
        Ok(())
    }
}
