//! hs-orchestrator: Ordered setup steps for a homelab host
//!
//! Steps are registered in execution order. Each one records its progress
//! as a completion marker in the [`ConfigStore`](hs_core::ConfigStore), so an
//! interrupted run resumes where it stopped. Markers written by earlier
//! releases are migrated on first use.

pub mod context;
pub mod registry;
pub mod runner;
pub mod steps;

pub use context::StepContext;
pub use registry::{StepDescriptor, StepFn, StepOutcome, StepRegistry};
pub use runner::{Orchestrator, RunSummary, StepState};
