//! Interface and peer records
//!
//! A [`WireGuardInterface`] is persisted in the store as JSON under
//! `wireguard.<iface>.interface`. Peer private keys are never part of it.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use hs_core::{ConfigStore, HsError, Result};

use crate::keys::Key;

const KEY_PREFIX: &str = "wireguard.";
const KEY_SUFFIX: &str = ".interface";

/// Store key holding the interface record for `iface`
pub fn interface_key(iface: &str) -> String {
    format!("{}{}{}", KEY_PREFIX, iface, KEY_SUFFIX)
}

/// Server side of the tunnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGuardInterface {
    /// Interface name, e.g. `wg0`
    pub name: String,
    /// Server address with the subnet prefix
    pub address: Ipv4Net,
    /// UDP listen port
    pub listen_port: u16,
    pub private_key: Key,
    pub public_key: Key,
    /// Host clients connect to, offered as the default for new peers
    #[serde(default)]
    pub endpoint_host: Option<String>,
    /// DNS servers pushed to new peers by default
    #[serde(default)]
    pub dns: Vec<Ipv4Addr>,
    #[serde(default)]
    pub peers: Vec<Peer>,
}

/// One client of the tunnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Sanitized name
    pub name: String,
    pub public_key: Key,
    #[serde(default)]
    pub preshared_key: Option<Key>,
    /// Address allocated inside the interface subnet
    pub address: Ipv4Addr,
    /// Networks the client routes through the tunnel
    pub allowed_ips: Vec<Ipv4Net>,
    /// Persistent keepalive in seconds
    #[serde(default)]
    pub keepalive: Option<u16>,
}

impl WireGuardInterface {
    /// The server's own address
    pub fn server_address(&self) -> Ipv4Addr {
        self.address.addr()
    }

    /// The interface subnet
    pub fn subnet(&self) -> Ipv4Net {
        self.address.trunc()
    }

    /// Look up a peer by name
    pub fn peer(&self, name: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.name == name)
    }

    /// Addresses already held by peers
    pub fn peer_addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.peers.iter().map(|p| p.address)
    }

    /// Load the record for `name` from the store
    pub fn load(store: &ConfigStore, name: &str) -> Result<Self> {
        let raw = store.get(&interface_key(name))?;
        serde_json::from_str(&raw).map_err(|e| {
            HsError::Serialization(format!("interface {} record is corrupt: {}", name, e))
        })
    }

    /// Store key and JSON value of the record
    pub fn record(&self) -> Result<(String, String)> {
        let json = serde_json::to_string(self)
            .map_err(|e| HsError::Serialization(format!("interface {}: {}", self.name, e)))?;
        Ok((interface_key(&self.name), json))
    }

    /// Persist the record
    pub fn save(&self, store: &mut ConfigStore) -> Result<()> {
        let (key, json) = self.record()?;
        store.set(&key, &json)
    }
}

/// Names of all interfaces recorded in the store
pub fn list_interfaces(store: &ConfigStore) -> Result<Vec<String>> {
    Ok(store
        .keys()?
        .into_iter()
        .filter_map(|key| {
            key.strip_prefix(KEY_PREFIX)
                .and_then(|rest| rest.strip_suffix(KEY_SUFFIX))
                .map(str::to_string)
        })
        .collect())
}
