//! Adding and removing peers

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use ipnet::Ipv4Net;

use hs_core::{HsError, Result, ValidationError};

use super::interface::{load_interface, server_config_path};
use super::{WireGuardContext, WIREGUARD_MARKER};
use crate::allocator::AddressAllocator;
use crate::export::{render_qr, write_client_config, write_secret_file};
use crate::keys::{Key, KeyPair};
use crate::model::{Peer, WireGuardInterface};
use crate::render::{render_client_config, render_server_config, ClientConfig};
use crate::sanitize::sanitize_name;
use crate::validate::{parse_address_list, parse_cidr_list, Endpoint};

/// How the peer's preshared key is obtained
#[derive(Clone, PartialEq, Eq, Default)]
pub enum PskPolicy {
    /// Generate a fresh key
    #[default]
    Generate,
    /// Use a key supplied by the operator
    Supplied(String),
    /// No preshared key
    None,
}

impl std::fmt::Debug for PskPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PskPolicy::Generate => f.write_str("Generate"),
            PskPolicy::Supplied(_) => f.write_str("Supplied([REDACTED])"),
            PskPolicy::None => f.write_str("None"),
        }
    }
}

/// A peer to add, as entered by the operator
///
/// Nothing here is trusted; [`add_peer`] validates every field.
#[derive(Debug, Clone, Default)]
pub struct PeerRequest {
    pub interface: String,
    pub name: String,
    /// `host[:port]`; the interface port is used when absent
    pub endpoint: String,
    /// Comma separated DNS servers; `None` uses the interface default
    pub dns: Option<String>,
    /// Comma separated CIDRs routed through the tunnel; `None` routes the
    /// interface subnet
    pub allowed_ips: Option<String>,
    /// Route all IPv4 traffic through the tunnel
    pub route_all: bool,
    /// Seconds; `None` or `Some(0)` disables keepalive
    pub keepalive: Option<u16>,
    pub psk: PskPolicy,
    /// Directory receiving the client config
    pub output_dir: PathBuf,
    /// Also render the client config as a QR code
    pub qr: bool,
}

/// Everything produced by a successful [`add_peer`]
pub struct PeerArtifacts {
    pub peer: Peer,
    /// Client config; contains the peer's private key
    pub client_config: String,
    pub client_path: PathBuf,
    pub server_path: PathBuf,
    pub qr: Option<String>,
    /// Whether this call completed the WireGuard step
    pub first_peer: bool,
}

/// Validated form of a [`PeerRequest`]
struct PeerPlan {
    name: String,
    endpoint: Endpoint,
    dns: Vec<Ipv4Addr>,
    allowed_ips: Vec<Ipv4Net>,
    keepalive: Option<u16>,
    psk: Option<Option<Key>>,
}

fn plan(iface: &WireGuardInterface, req: &PeerRequest) -> Result<PeerPlan> {
    let name = sanitize_name(&req.name);
    if name.is_empty() {
        return Err(ValidationError::Name(req.name.clone()).into());
    }
    if iface.peer(&name).is_some() {
        return Err(ValidationError::DuplicatePeer(name).into());
    }

    let endpoint = Endpoint::parse(req.endpoint.trim(), iface.listen_port)?;

    let dns = match &req.dns {
        Some(list) => parse_address_list(list)?,
        None => iface.dns.clone(),
    };

    let allowed_ips = if req.route_all {
        vec![Ipv4Net::default()]
    } else {
        match req.allowed_ips.as_deref().map(parse_cidr_list).transpose()? {
            Some(list) if !list.is_empty() => list,
            _ => vec![iface.subnet()],
        }
    };

    // Outer None: generate later
    let psk = match &req.psk {
        PskPolicy::Generate => None,
        PskPolicy::Supplied(text) => Some(Some(Key::parse(text)?)),
        PskPolicy::None => Some(None),
    };

    Ok(PeerPlan {
        name,
        endpoint,
        dns,
        allowed_ips,
        keepalive: req.keepalive.filter(|k| *k > 0),
        psk,
    })
}

/// Add a peer to an interface and export its config
///
/// Validation covers the whole request before any key is generated or
/// address allocated, so a rejected request leaves no trace. Everything is
/// rendered before the first write. The client export goes first, then the
/// server config, then the interface record and offset in one store write.
/// A failure part way through removes the export and restores the previous
/// server config. The WireGuard step marker is set only by the first
/// successful call.
pub fn add_peer(ctx: &mut WireGuardContext<'_>, req: PeerRequest) -> Result<PeerArtifacts> {
    let mut iface = load_interface(ctx.store, &req.interface)?;
    let plan = plan(&iface, &req)?;

    let keys = KeyPair::generate(ctx.keys)?;
    let preshared_key = match plan.psk {
        Some(choice) => choice,
        None => Some(ctx.keys.generate_preshared_key()?),
    };

    let mut allocator = AddressAllocator::load(ctx.store, &iface.name, iface.address)?
        .with_reserved(iface.peer_addresses());
    let address = allocator.allocate_next()?;

    let peer = Peer {
        name: plan.name,
        public_key: keys.public,
        preshared_key,
        address,
        allowed_ips: plan.allowed_ips,
        keepalive: plan.keepalive,
    };
    let previous_server = render_server_config(&iface);
    iface.peers.push(peer.clone());

    let client_config = render_client_config(&ClientConfig {
        peer_name: &peer.name,
        private_key: &keys.private,
        address,
        dns: &plan.dns,
        server_public_key: &iface.public_key,
        preshared_key: peer.preshared_key.as_ref(),
        endpoint: &plan.endpoint,
        allowed_ips: &peer.allowed_ips,
        keepalive: peer.keepalive,
    });
    let qr = if req.qr {
        Some(render_qr(&client_config)?)
    } else {
        None
    };

    let server_config = render_server_config(&iface);
    let server_path = server_config_path(ctx.config_dir(), &iface.name);
    let records = [iface.record()?, allocator.record(&iface.name)];

    let client_path = write_client_config(&req.output_dir, &iface.name, &peer.name, &client_config)?;
    if let Err(e) = write_secret_file(&server_path, &server_config) {
        discard_export(&client_path);
        return Err(e);
    }
    if let Err(e) = ctx.store.set_many(records) {
        discard_export(&client_path);
        if let Err(restore) = write_secret_file(&server_path, &previous_server) {
            tracing::warn!("Failed to restore {:?}: {}", server_path, restore);
        }
        return Err(e);
    }

    let first_peer = ctx.store.mark_complete_if_not_exists(WIREGUARD_MARKER)?;

    tracing::info!("Added peer {} at {} on {}", peer.name, address, iface.name);
    Ok(PeerArtifacts {
        peer,
        client_config,
        client_path,
        server_path,
        qr,
        first_peer,
    })
}

fn discard_export(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!("Failed to remove {:?}: {}", path, e);
    }
}

/// Remove a peer and rewrite the server config
///
/// The peer's address is not returned to the pool.
pub fn remove_peer(ctx: &mut WireGuardContext<'_>, interface: &str, name: &str) -> Result<Peer> {
    let mut iface = load_interface(ctx.store, interface)?;
    let index = iface
        .peers
        .iter()
        .position(|p| p.name == name)
        .ok_or_else(|| HsError::NotFound(format!("peer {} on {}", name, interface)))?;
    let peer = iface.peers.remove(index);

    write_secret_file(
        &server_config_path(ctx.config_dir(), &iface.name),
        &render_server_config(&iface),
    )?;
    iface.save(ctx.store)?;

    tracing::info!("Removed peer {} from {}", peer.name, iface.name);
    Ok(peer)
}
