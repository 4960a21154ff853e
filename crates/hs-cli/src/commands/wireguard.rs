//! WireGuard command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use hs_core::{ConfigStore, Prompter, Settings};
use hs_wireguard::{
    add_peer, collect_interface_request, collect_peer_request, init_interface, list_interfaces,
    load_interface, remove_peer, InterfaceRequest, KeyGenerator, PeerPrompts, PeerRequest,
    PskPolicy, WireGuardContext,
};

use crate::output::{format_interface, print_info, print_success, print_warning};

/// How `--psk` was given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PskMode {
    #[default]
    Generate,
    Supplied,
    None,
}

/// Flags of `wireguard init`
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub interface: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub endpoint_host: Option<String>,
    pub dns: Option<String>,
    pub non_interactive: bool,
}

/// Flags of `wireguard add-peer`
#[derive(Debug, Clone, Default)]
pub struct AddPeerOptions {
    pub interface: Option<String>,
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub dns: Option<String>,
    pub allowed_ips: Option<String>,
    pub route_all: bool,
    pub output_dir: Option<PathBuf>,
    pub keepalive: Option<u16>,
    pub psk: PskMode,
    pub psk_value: Option<String>,
    pub non_interactive: bool,
    pub qr: bool,
}

/// Everything the WireGuard commands share
pub struct WireGuardEnv<'a> {
    pub store: &'a mut ConfigStore,
    pub settings: &'a Settings,
    pub prompter: &'a dyn Prompter,
    pub keys: &'a dyn KeyGenerator,
}

impl WireGuardEnv<'_> {
    fn context(&mut self) -> WireGuardContext<'_> {
        WireGuardContext::new(self.store, self.keys, self.settings.paths.wireguard_dir())
    }
}

/// Create a WireGuard interface
pub fn init_command(env: &mut WireGuardEnv<'_>, opts: InitOptions) -> Result<()> {
    let defaults = &env.settings.wireguard;

    let req = if opts.non_interactive {
        InterfaceRequest {
            name: opts.interface.unwrap_or_else(|| defaults.interface.clone()),
            address: opts.address.unwrap_or_else(|| defaults.address.clone()),
            listen_port: opts.port.unwrap_or(defaults.listen_port),
            endpoint_host: opts.endpoint_host,
            dns: opts.dns.unwrap_or_else(|| defaults.dns.clone()),
        }
    } else {
        collect_interface_request(env.prompter, defaults, opts.endpoint_host.as_deref())?
    };

    let iface = init_interface(&mut env.context(), req).context("Failed to initialise interface")?;

    print_success(&format!("Initialised {} at {}", iface.name, iface.address));
    print_info(&format!("Public key: {}", iface.public_key.as_str()));
    Ok(())
}

fn non_interactive_request(
    env: &WireGuardEnv<'_>,
    opts: AddPeerOptions,
    interface: String,
) -> Result<PeerRequest> {
    let iface = load_interface(env.store, &interface)?;
    let name = opts
        .name
        .ok_or_else(|| anyhow::anyhow!("--name is required with --non-interactive"))?;
    let endpoint = opts
        .endpoint
        .or(iface.endpoint_host)
        .unwrap_or_default();
    let psk = match opts.psk {
        PskMode::Generate => PskPolicy::Generate,
        PskMode::None => PskPolicy::None,
        PskMode::Supplied => PskPolicy::Supplied(
            opts.psk_value
                .ok_or_else(|| anyhow::anyhow!("--psk supplied needs --psk-value"))?,
        ),
    };

    Ok(PeerRequest {
        interface,
        name,
        endpoint,
        dns: opts.dns,
        allowed_ips: opts.allowed_ips,
        route_all: opts.route_all,
        keepalive: Some(opts.keepalive.unwrap_or(env.settings.wireguard.keepalive)),
        psk,
        output_dir: opts
            .output_dir
            .unwrap_or_else(|| env.settings.paths.peer_output_dir()),
        qr: opts.qr,
    })
}

/// Flags given alongside an interactive `add-peer`, used as prompt defaults
fn known_answers(opts: &AddPeerOptions) -> PeerPrompts {
    PeerPrompts {
        name: opts.name.clone(),
        endpoint: opts.endpoint.clone(),
        dns: opts.dns.clone(),
        allowed_ips: opts.allowed_ips.clone(),
        route_all: opts.route_all,
        keepalive: opts.keepalive,
    }
}

/// Add a peer and export its client config
pub fn add_peer_command(env: &mut WireGuardEnv<'_>, opts: AddPeerOptions) -> Result<()> {
    let interface = opts
        .interface
        .clone()
        .unwrap_or_else(|| env.settings.wireguard.interface.clone());

    let req = if opts.non_interactive {
        non_interactive_request(env, opts, interface)?
    } else {
        let iface = load_interface(env.store, &interface)?;
        let output_dir = opts
            .output_dir
            .clone()
            .unwrap_or_else(|| env.settings.paths.peer_output_dir());
        let mut req = collect_peer_request(
            env.prompter,
            &iface,
            &env.settings.wireguard,
            &output_dir,
            &known_answers(&opts),
        )?;
        req.qr |= opts.qr;
        req
    };

    let artifacts = add_peer(&mut env.context(), req)?;

    print_success(&format!(
        "Added {} with address {}",
        artifacts.peer.name, artifacts.peer.address
    ));
    print_info(&format!("Client config: {}", artifacts.client_path.display()));
    print_info(&format!("Server config: {}", artifacts.server_path.display()));
    if artifacts.first_peer {
        print_info("WireGuard step marked complete");
    }
    if let Some(qr) = &artifacts.qr {
        println!("{}", qr);
    }
    Ok(())
}

/// Show interfaces and their peers
pub fn list_command(store: &ConfigStore, interface: Option<&str>) -> Result<()> {
    let names = match interface {
        Some(name) => vec![name.to_string()],
        None => list_interfaces(store)?,
    };

    if names.is_empty() {
        print_info("No WireGuard interfaces; run `homestead wireguard init`");
        return Ok(());
    }

    for name in names {
        let iface = load_interface(store, &name)?;
        println!("{}", format_interface(&iface));
    }
    Ok(())
}

/// Remove a peer from an interface
pub fn remove_peer_command(
    env: &mut WireGuardEnv<'_>,
    interface: Option<&str>,
    name: &str,
    yes: bool,
) -> Result<()> {
    let interface = interface
        .map(str::to_string)
        .unwrap_or_else(|| env.settings.wireguard.interface.clone());

    if !yes
        && !env
            .prompter
            .confirm(&format!("Remove peer {} from {}?", name, interface), false)?
    {
        print_info("Nothing removed");
        return Ok(());
    }

    let peer = remove_peer(&mut env.context(), &interface, name)?;
    print_success(&format!("Removed {} ({})", peer.name, peer.address));
    print_warning("Its exported client config was left in place; delete it by hand if needed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_carry_into_prompts() {
        let opts = AddPeerOptions {
            name: Some("tablet".into()),
            endpoint: Some("vpn.example.com:443".into()),
            dns: Some("9.9.9.9".into()),
            allowed_ips: Some("192.168.1.0/24".into()),
            keepalive: Some(0),
            ..Default::default()
        };
        let known = known_answers(&opts);

        assert_eq!(known.name.as_deref(), Some("tablet"));
        assert_eq!(known.endpoint.as_deref(), Some("vpn.example.com:443"));
        assert_eq!(known.dns.as_deref(), Some("9.9.9.9"));
        assert_eq!(known.allowed_ips.as_deref(), Some("192.168.1.0/24"));
        assert_eq!(known.keepalive, Some(0));
        assert!(!known.route_all);
    }
}
