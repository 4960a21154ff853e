//! Step descriptors and the ordered registry

use std::fmt;

use hs_core::{Result, ValidationError};

use crate::context::StepContext;
use crate::steps;

/// What a step body reports when it returns without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step's work is done and its marker gets set
    Completed,
    /// The step ran but left its work unfinished; no marker is set
    Deferred,
}

/// A step body
pub type StepFn = fn(&mut StepContext<'_>) -> Result<StepOutcome>;

/// Immutable description of one setup step
#[derive(Clone, Copy)]
pub struct StepDescriptor {
    /// Short identifier used on the command line
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    pub description: &'static str,
    /// Completion marker
    pub marker: &'static str,
    /// Markers written by older releases for the same step
    pub legacy_markers: &'static [&'static str],
    /// Skipped by `run quick`
    pub optional: bool,
    pub run: StepFn,
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("marker", &self.marker)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Ordered list of steps; order is execution order
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// Registry with the given steps, in order
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        Self { steps }
    }

    /// The built-in provisioning sequence
    pub fn standard() -> Self {
        Self::new(vec![
            StepDescriptor {
                id: "preflight",
                name: "Preflight checks",
                description: "Verify required tools and record the host kernel",
                marker: "preflight-complete",
                legacy_markers: &["preflight-done"],
                optional: false,
                run: steps::preflight::run,
            },
            StepDescriptor {
                id: "user",
                name: "Service user",
                description: "Create or select the account that owns homelab data",
                marker: "user-complete",
                legacy_markers: &["user-setup", "user-created"],
                optional: false,
                run: steps::user::run,
            },
            StepDescriptor {
                id: "directory",
                name: "Directory layout",
                description: "Create the base, config, data and stacks directories",
                marker: "directory-complete",
                legacy_markers: &["directories-created"],
                optional: false,
                run: steps::directory::run,
            },
            StepDescriptor {
                id: "nfs",
                name: "NFS storage",
                description: "Record an NFS share for bulk storage",
                marker: "nfs-complete",
                legacy_markers: &["nfs-mounted", "nfs-setup"],
                optional: false,
                run: steps::nfs::run,
            },
            StepDescriptor {
                id: "container",
                name: "Container runtime",
                description: "Install or detect Docker or Podman",
                marker: "container-complete",
                legacy_markers: &["docker-installed"],
                optional: false,
                run: steps::container::run,
            },
            StepDescriptor {
                id: "wireguard",
                name: "WireGuard VPN",
                description: "Create the VPN interface and export the first peer",
                marker: hs_wireguard::WIREGUARD_MARKER,
                legacy_markers: &["wg-setup", "wireguard-setup"],
                optional: true,
                run: steps::wireguard::run,
            },
            StepDescriptor {
                id: "deployment",
                name: "Service deployment",
                description: "Pull the selected container images",
                marker: "deployment-complete",
                legacy_markers: &["services-deployed"],
                optional: false,
                run: steps::deployment::run,
            },
        ])
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    /// Look up a step by id
    pub fn get(&self, id: &str) -> Result<&StepDescriptor> {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ValidationError::UnknownStep(id.to_string()).into())
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.id)
    }
}
