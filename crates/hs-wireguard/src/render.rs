//! Config file rendering
//!
//! Only typed values reach the output: keys are validated base64, addresses
//! are parsed IPv4 values and names have been through
//! [`sanitize_name`](crate::sanitize::sanitize_name). Free text is run
//! through [`sanitize_value`] once more before it is written.

use std::fmt::Write as FmtWrite;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::keys::Key;
use crate::model::WireGuardInterface;
use crate::sanitize::sanitize_value;
use crate::validate::Endpoint;

const HEADER: &str = "# Generated by homestead. Local edits are overwritten.";

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Server side config, `<wireguard_dir>/<iface>.conf`
pub fn render_server_config(iface: &WireGuardInterface) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", HEADER);
    let _ = writeln!(out, "[Interface]");
    let _ = writeln!(out, "Address = {}", iface.address);
    let _ = writeln!(out, "ListenPort = {}", iface.listen_port);
    let _ = writeln!(out, "PrivateKey = {}", iface.private_key.as_str());

    for peer in &iface.peers {
        let _ = writeln!(out);
        let _ = writeln!(out, "# peer: {}", sanitize_value(&peer.name));
        let _ = writeln!(out, "[Peer]");
        let _ = writeln!(out, "PublicKey = {}", peer.public_key.as_str());
        if let Some(psk) = &peer.preshared_key {
            let _ = writeln!(out, "PresharedKey = {}", psk.as_str());
        }
        let _ = writeln!(out, "AllowedIPs = {}/32", peer.address);
        if let Some(keepalive) = peer.keepalive {
            let _ = writeln!(out, "PersistentKeepalive = {}", keepalive);
        }
    }

    out
}

/// Everything a client config needs
pub struct ClientConfig<'a> {
    pub peer_name: &'a str,
    pub private_key: &'a Key,
    pub address: Ipv4Addr,
    pub dns: &'a [Ipv4Addr],
    pub server_public_key: &'a Key,
    pub preshared_key: Option<&'a Key>,
    pub endpoint: &'a Endpoint,
    pub allowed_ips: &'a [Ipv4Net],
    pub keepalive: Option<u16>,
}

/// Client side config, importable by any WireGuard client
pub fn render_client_config(cfg: &ClientConfig<'_>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", HEADER);
    let _ = writeln!(out, "# peer: {}", sanitize_value(cfg.peer_name));
    let _ = writeln!(out, "[Interface]");
    let _ = writeln!(out, "PrivateKey = {}", cfg.private_key.as_str());
    let _ = writeln!(out, "Address = {}/32", cfg.address);
    if !cfg.dns.is_empty() {
        let _ = writeln!(out, "DNS = {}", join(cfg.dns));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[Peer]");
    let _ = writeln!(out, "PublicKey = {}", cfg.server_public_key.as_str());
    if let Some(psk) = cfg.preshared_key {
        let _ = writeln!(out, "PresharedKey = {}", psk.as_str());
    }
    let _ = writeln!(out, "Endpoint = {}", sanitize_value(&cfg.endpoint.to_string()));
    let _ = writeln!(out, "AllowedIPs = {}", join(cfg.allowed_ips));
    if let Some(keepalive) = cfg.keepalive {
        let _ = writeln!(out, "PersistentKeepalive = {}", keepalive);
    }

    out
}
