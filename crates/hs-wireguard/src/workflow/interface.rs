//! Interface initialisation

use std::path::{Path, PathBuf};

use hs_core::{ConfigStore, HsError, Result, ValidationError};

use super::WireGuardContext;
use crate::export::write_secret_file;
use crate::keys::KeyPair;
use crate::model::{interface_key, WireGuardInterface};
use crate::render::render_server_config;
use crate::validate::{parse_address_list, parse_cidr, validate_host, validate_interface_name, validate_port};

/// Longest prefix that still leaves room for a peer
const MAX_PREFIX: u8 = 30;

/// Parameters for a new interface, as entered by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRequest {
    pub name: String,
    /// Server address in CIDR form, e.g. `10.253.0.1/24`
    pub address: String,
    pub listen_port: u16,
    /// Public host name or address peers connect to
    pub endpoint_host: Option<String>,
    /// Comma separated DNS servers offered to peers
    pub dns: String,
}

/// Path of the server config for `iface`
pub fn server_config_path(config_dir: &Path, iface: &str) -> PathBuf {
    config_dir.join(format!("{}.conf", iface))
}

/// Load an existing interface
///
/// A missing record is a [`HsError::Precondition`], naming the interface.
pub fn load_interface(store: &ConfigStore, name: &str) -> Result<WireGuardInterface> {
    validate_interface_name(name)?;
    WireGuardInterface::load(store, name).map_err(|e| match e {
        HsError::NotFound(_) => {
            HsError::Precondition(format!("WireGuard interface {} is not initialised", name))
        }
        other => other,
    })
}

/// Create an interface with fresh server keys and write its config
pub fn init_interface(ctx: &mut WireGuardContext<'_>, req: InterfaceRequest) -> Result<WireGuardInterface> {
    validate_interface_name(&req.name)?;
    let address = parse_cidr(&req.address)?;
    if address.prefix_len() > MAX_PREFIX
        || address.addr() == address.network()
        || address.addr() == address.broadcast()
    {
        return Err(ValidationError::Cidr(req.address.clone()).into());
    }
    let listen_port = validate_port(req.listen_port)?;
    let endpoint_host = match req.endpoint_host.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(host) => {
            validate_host(host)?;
            Some(host.to_string())
        }
    };
    let dns = parse_address_list(&req.dns)?;

    if ctx.store.exists(&interface_key(&req.name)) {
        return Err(HsError::Precondition(format!(
            "WireGuard interface {} already exists",
            req.name
        )));
    }

    let keys = KeyPair::generate(ctx.keys)?;
    let iface = WireGuardInterface {
        name: req.name,
        address,
        listen_port,
        private_key: keys.private,
        public_key: keys.public,
        endpoint_host,
        dns,
        peers: Vec::new(),
    };

    write_secret_file(
        &server_config_path(ctx.config_dir(), &iface.name),
        &render_server_config(&iface),
    )?;
    iface.save(ctx.store)?;

    tracing::info!("Initialised WireGuard interface {} at {}", iface.name, iface.address);
    Ok(iface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DeterministicKeys;
    use tempfile::TempDir;

    fn request(address: &str) -> InterfaceRequest {
        InterfaceRequest {
            name: "wg0".into(),
            address: address.into(),
            listen_port: 51820,
            endpoint_host: Some("vpn.example.com".into()),
            dns: "1.1.1.1".into(),
        }
    }

    #[test]
    fn test_init_writes_config_and_record() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let keys = DeterministicKeys::new();
        let mut ctx = WireGuardContext::new(&mut store, &keys, dir.path().join("wireguard"));

        let iface = init_interface(&mut ctx, request("10.253.0.1/24")).unwrap();
        assert_eq!(iface.server_address().to_string(), "10.253.0.1");

        let conf = std::fs::read_to_string(dir.path().join("wireguard/wg0.conf")).unwrap();
        assert!(conf.contains("Address = 10.253.0.1/24"));
        assert!(conf.contains(iface.private_key.as_str()));

        assert_eq!(load_interface(&store, "wg0").unwrap(), iface);
        // Initialising is not completing the step
        assert!(!store.is_complete(super::super::WIREGUARD_MARKER));
    }

    #[test]
    fn test_init_rejects_bad_input_before_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let keys = DeterministicKeys::new();
        let mut ctx = WireGuardContext::new(&mut store, &keys, dir.path().join("wireguard"));

        for address in ["10.253.0.0/24", "10.253.0.255/24", "10.0.0.1/31", "10.253.0.1", "bogus"] {
            assert!(init_interface(&mut ctx, request(address)).is_err(), "{address}");
        }
        let mut bad_name = request("10.253.0.1/24");
        bad_name.name = "wg 0".into();
        assert!(init_interface(&mut ctx, bad_name).is_err());

        let mut bad_port = request("10.253.0.1/24");
        bad_port.listen_port = 0;
        assert!(init_interface(&mut ctx, bad_port).is_err());

        let mut bad_dns = request("10.253.0.1/24");
        bad_dns.dns = "1.1.1.1\n[Peer]".into();
        assert!(init_interface(&mut ctx, bad_dns).is_err());

        assert_eq!(keys.calls(), 0);
        assert!(!dir.path().join("wireguard").exists());
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let keys = DeterministicKeys::new();
        let mut ctx = WireGuardContext::new(&mut store, &keys, dir.path().join("wireguard"));

        init_interface(&mut ctx, request("10.253.0.1/24")).unwrap();
        assert!(matches!(
            init_interface(&mut ctx, request("10.254.0.1/24")),
            Err(HsError::Precondition(_))
        ));
    }

    #[test]
    fn test_load_missing_interface() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        assert!(matches!(load_interface(&store, "wg0"), Err(HsError::Precondition(_))));
        assert!(load_interface(&store, "../x").is_err());
    }
}
