//! hs-wireguard: WireGuard configuration for Homestead
//!
//! Generates server and client configs for a point-to-point WireGuard
//! tunnel: key material through a [`KeyGenerator`], peer addresses through
//! an [`AddressAllocator`] and injection-safe rendering of every value that
//! reaches a config file.

pub mod allocator;
pub mod export;
pub mod keys;
pub mod model;
pub mod render;
pub mod sanitize;
pub mod testing;
pub mod validate;
pub mod workflow;

pub use allocator::AddressAllocator;
pub use keys::{select_key_generator, Key, KeyGenerator, KeyPair, NativeKeys, WgToolKeys};
pub use model::{list_interfaces, Peer, WireGuardInterface};
pub use sanitize::{sanitize_name, sanitize_value};
pub use validate::Endpoint;
pub use workflow::{
    add_peer, collect_interface_request, collect_peer_request, init_interface, load_interface,
    remove_peer, InterfaceRequest, PeerArtifacts, PeerPrompts, PeerRequest, PskPolicy,
    WireGuardContext, WIREGUARD_MARKER,
};
