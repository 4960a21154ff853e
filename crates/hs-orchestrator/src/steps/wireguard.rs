//! WireGuard VPN
//!
//! Initialises the configured interface on first run, then optionally adds
//! a peer. Running the step again only offers to add another peer. The step
//! completes once the interface has at least one peer.

use hs_core::{HsError, Result};
use hs_wireguard::{
    add_peer, collect_interface_request, collect_peer_request, init_interface, load_interface,
    PeerPrompts, WireGuardContext,
};

use crate::context::StepContext;
use crate::registry::StepOutcome;

fn default_host() -> Option<String> {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|h| !h.is_empty())
}

pub fn run(ctx: &mut StepContext<'_>) -> Result<StepOutcome> {
    let settings = ctx.settings;

    let iface = match load_interface(ctx.store, &settings.wireguard.interface) {
        Ok(iface) => iface,
        Err(HsError::Precondition(_)) => {
            let host = default_host();
            let req = collect_interface_request(ctx.prompter, &settings.wireguard, host.as_deref())?;
            let mut wg = WireGuardContext::new(ctx.store, ctx.keys, settings.paths.wireguard_dir());
            let iface = init_interface(&mut wg, req)?;
            tracing::info!("Initialised {} at {}", iface.name, iface.address);
            iface
        }
        Err(e) => return Err(e),
    };

    if !ctx.prompter.confirm("Add a peer now?", true)? {
        if iface.peers.is_empty() {
            tracing::info!("No peers on {} yet; the step stays pending", iface.name);
            return Ok(StepOutcome::Deferred);
        }
        return Ok(StepOutcome::Completed);
    }

    let output_dir = settings.paths.peer_output_dir();
    let req = collect_peer_request(
        ctx.prompter,
        &iface,
        &settings.wireguard,
        &output_dir,
        &PeerPrompts::default(),
    )?;
    let mut wg = WireGuardContext::new(ctx.store, ctx.keys, settings.paths.wireguard_dir());
    let artifacts = add_peer(&mut wg, req)?;

    tracing::info!(
        "Peer {} is {}; client config written to {}",
        artifacts.peer.name,
        artifacts.peer.address,
        artifacts.client_path.display()
    );
    if let Some(qr) = &artifacts.qr {
        println!("{}", qr);
    }
    Ok(StepOutcome::Completed)
}
