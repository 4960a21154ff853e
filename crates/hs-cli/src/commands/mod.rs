//! CLI command implementations

mod config;
mod reset;
mod run;
mod status;
mod wireguard;

pub use config::{config_get, config_init, config_path, config_set, config_show, config_unset};
pub use reset::reset_command;
pub use run::{run_command, RunTarget};
pub use status::status_command;
pub use wireguard::{
    add_peer_command, init_command, list_command, remove_peer_command, AddPeerOptions, InitOptions,
    PskMode, WireGuardEnv,
};
