//! Service deployment

use hs_core::{CommandSpec, Result};

use super::require;
use crate::context::StepContext;
use crate::registry::StepOutcome;

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let runtime = require(ctx.store, "container.runtime", "container")?;
    let base = require(ctx.store, "directory.base", "directory")?;

    let images = &ctx.settings.deployment.images;
    if images.is_empty() {
        tracing::info!("No images configured");
        ctx.store.set("deployment.images", "")?;
        return Ok(StepOutcome::Completed);
    }

    let defaults = vec![true; images.len()];
    let chosen = ctx
        .prompter
        .multi_select("Images to deploy", images, &defaults)?;

    let mut pulled = Vec::with_capacity(chosen.len());
    for index in chosen {
        let Some(image) = images.get(index) else {
            continue;
        };
        ctx.runner
            .run_checked(&CommandSpec::new(runtime.as_str()).args(["pull", image.as_str()]))?;
        tracing::info!("Pulled {}", image);
        pulled.push(image.as_str());
    }

    tracing::info!("Stacks live under {}/stacks", base);
    ctx.store.set("deployment.images", &pulled.join(","))?;
    Ok(StepOutcome::Completed)
}
