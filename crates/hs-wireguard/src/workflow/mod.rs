//! Interface and peer workflows
//!
//! Every workflow validates all of its input before generating keys or
//! touching the store, then commits in a fixed order: config files first,
//! store records second and the completion marker last. Store records of one
//! workflow go out in a single write.

mod interactive;
mod interface;
mod peer;

use std::path::{Path, PathBuf};

use hs_core::ConfigStore;

use crate::keys::KeyGenerator;

pub use interactive::{collect_interface_request, collect_peer_request, PeerPrompts};
pub use interface::{init_interface, load_interface, server_config_path, InterfaceRequest};
pub use peer::{add_peer, remove_peer, PeerArtifacts, PeerRequest, PskPolicy};

/// Marker set once the first peer has been exported
pub const WIREGUARD_MARKER: &str = "wireguard-complete";

/// State and capabilities the workflows operate on
pub struct WireGuardContext<'a> {
    pub store: &'a mut ConfigStore,
    pub keys: &'a dyn KeyGenerator,
    /// Directory receiving `<iface>.conf`
    pub config_dir: PathBuf,
}

impl<'a> WireGuardContext<'a> {
    pub fn new(store: &'a mut ConfigStore, keys: &'a dyn KeyGenerator, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            keys,
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}
