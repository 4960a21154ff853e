//! Interactive collection of workflow requests

use std::path::Path;

use hs_core::config::WireGuardSettings;
use hs_core::{Prompter, Result, ValidationError};

use super::interface::InterfaceRequest;
use super::peer::{PeerRequest, PskPolicy};
use crate::model::WireGuardInterface;
use crate::validate::parse_port;

/// Ask for the parameters of a new interface
pub fn collect_interface_request(
    prompter: &dyn Prompter,
    defaults: &WireGuardSettings,
    default_host: Option<&str>,
) -> Result<InterfaceRequest> {
    let name = prompter.input("Interface name", Some(&defaults.interface))?;
    let address = prompter.input("Server address (CIDR)", Some(&defaults.address))?;
    let port = prompter.input("Listen port", Some(&defaults.listen_port.to_string()))?;
    let endpoint = prompter.input("Public host name or address for peers", default_host)?;
    let dns = prompter.input("DNS servers for peers (comma separated)", Some(&defaults.dns))?;

    Ok(InterfaceRequest {
        name: name.trim().to_string(),
        address: address.trim().to_string(),
        listen_port: parse_port(port.trim())?,
        endpoint_host: Some(endpoint.trim().to_string()).filter(|s| !s.is_empty()),
        dns,
    })
}

/// Answers already known from the command line, offered as prompt defaults
#[derive(Debug, Clone, Default)]
pub struct PeerPrompts {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub dns: Option<String>,
    pub allowed_ips: Option<String>,
    pub route_all: bool,
    pub keepalive: Option<u16>,
}

/// Ask for everything needed to add a peer to `iface`
pub fn collect_peer_request(
    prompter: &dyn Prompter,
    iface: &WireGuardInterface,
    defaults: &WireGuardSettings,
    output_dir: &Path,
    known: &PeerPrompts,
) -> Result<PeerRequest> {
    let name = prompter.input("Peer name", known.name.as_deref())?;

    let endpoint_default = known.endpoint.as_deref().or(iface.endpoint_host.as_deref());
    let endpoint = prompter.input("Server endpoint (host[:port])", endpoint_default)?;

    let dns_default = match &known.dns {
        Some(dns) => dns.clone(),
        None => iface
            .dns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    };
    let dns = prompter.input("DNS servers (blank for none)", Some(&dns_default))?;

    let route_all = prompter.confirm("Route all traffic through the tunnel?", known.route_all)?;
    let allowed_ips = if route_all {
        None
    } else {
        let subnet = known
            .allowed_ips
            .clone()
            .unwrap_or_else(|| iface.subnet().to_string());
        Some(prompter.input("Allowed IPs (comma separated CIDRs)", Some(&subnet))?)
    };

    let keepalive_default = known.keepalive.unwrap_or(defaults.keepalive);
    let keepalive = prompter.input(
        "Persistent keepalive seconds (0 disables)",
        Some(&keepalive_default.to_string()),
    )?;
    let keepalive = keepalive
        .trim()
        .parse::<u16>()
        .map_err(|_| ValidationError::Keepalive(keepalive.clone()))?;

    let choices = vec![
        "Generate a preshared key".to_string(),
        "Enter an existing preshared key".to_string(),
        "No preshared key".to_string(),
    ];
    let psk = match prompter.select("Preshared key", &choices, 0)? {
        0 => PskPolicy::Generate,
        1 => PskPolicy::Supplied(prompter.password("Preshared key (base64)")?),
        _ => PskPolicy::None,
    };

    let output_dir = prompter.input(
        "Directory for the client config",
        Some(&output_dir.display().to_string()),
    )?;
    let qr = prompter.confirm("Show the client config as a QR code?", true)?;

    Ok(PeerRequest {
        interface: iface.name.clone(),
        name,
        endpoint,
        dns: Some(dns),
        allowed_ips,
        route_all,
        keepalive: Some(keepalive),
        psk,
        output_dir: output_dir.into(),
        qr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Key;
    use hs_core::testing::{Answer, ScriptedPrompter};

    fn iface() -> WireGuardInterface {
        let key = Key::parse("hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=").unwrap();
        WireGuardInterface {
            name: "wg0".into(),
            address: "10.253.0.1/24".parse().unwrap(),
            listen_port: 51820,
            private_key: key.clone(),
            public_key: key,
            endpoint_host: Some("vpn.example.com".into()),
            dns: vec!["1.1.1.1".parse().unwrap()],
            peers: vec![],
        }
    }

    #[test]
    fn test_peer_defaults() {
        let prompter = ScriptedPrompter::new().then_input("laptop");
        let req = collect_peer_request(
            &prompter,
            &iface(),
            &WireGuardSettings::default(),
            Path::new("/tmp/peers"),
            &PeerPrompts::default(),
        )
        .unwrap();

        assert_eq!(req.name, "laptop");
        assert_eq!(req.endpoint, "vpn.example.com");
        assert_eq!(req.dns.as_deref(), Some("1.1.1.1"));
        assert_eq!(req.allowed_ips.as_deref(), Some("10.253.0.0/24"));
        assert_eq!(req.keepalive, Some(25));
        assert_eq!(req.psk, PskPolicy::Generate);
        assert!(req.qr);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_peer_supplied_psk_and_route_all() {
        let prompter = ScriptedPrompter::new()
            .then_input("phone")
            .then_input("203.0.113.9:443")
            .then_input("")
            .then_confirm(true)
            .then_input("0")
            .then_select(1)
            .answer(Answer::Password("psk-text".into()))
            .then_input("/srv/peers")
            .then_confirm(false);

        let req = collect_peer_request(
            &prompter,
            &iface(),
            &WireGuardSettings::default(),
            Path::new("/tmp/peers"),
            &PeerPrompts::default(),
        )
        .unwrap();

        assert!(req.route_all);
        assert_eq!(req.allowed_ips, None);
        assert_eq!(req.keepalive, Some(0));
        assert_eq!(req.psk, PskPolicy::Supplied("psk-text".into()));
        assert_eq!(req.output_dir, Path::new("/srv/peers"));
        assert!(!req.qr);
    }

    #[test]
    fn test_known_answers_become_defaults() {
        let prompter = ScriptedPrompter::defaults();
        let known = PeerPrompts {
            name: Some("tablet".into()),
            endpoint: Some("203.0.113.9:443".into()),
            dns: Some("9.9.9.9".into()),
            allowed_ips: Some("192.168.1.0/24".into()),
            route_all: false,
            keepalive: Some(15),
        };
        let req = collect_peer_request(
            &prompter,
            &iface(),
            &WireGuardSettings::default(),
            Path::new("/tmp/peers"),
            &known,
        )
        .unwrap();

        assert_eq!(req.name, "tablet");
        assert_eq!(req.endpoint, "203.0.113.9:443");
        assert_eq!(req.dns.as_deref(), Some("9.9.9.9"));
        assert_eq!(req.allowed_ips.as_deref(), Some("192.168.1.0/24"));
        assert_eq!(req.keepalive, Some(15));

        let route_all = PeerPrompts {
            route_all: true,
            ..known
        };
        let req = collect_peer_request(
            &prompter,
            &iface(),
            &WireGuardSettings::default(),
            Path::new("/tmp/peers"),
            &route_all,
        )
        .unwrap();
        assert!(req.route_all);
        assert_eq!(req.allowed_ips, None);
    }

    #[test]
    fn test_interface_defaults() {
        let prompter = ScriptedPrompter::defaults();
        let req = collect_interface_request(&prompter, &WireGuardSettings::default(), Some("homelab"))
            .unwrap();
        assert_eq!(req.name, "wg0");
        assert_eq!(req.address, "10.253.0.1/24");
        assert_eq!(req.listen_port, 51820);
        assert_eq!(req.endpoint_host.as_deref(), Some("homelab"));
        assert_eq!(req.dns, "1.1.1.1");
    }
}
