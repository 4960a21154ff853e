//! hs-core: State, configuration and capabilities for Homestead
//!
//! This crate provides the persistent configuration store, completion
//! markers, the settings file and the prompt/command capability traits
//! shared by the WireGuard generator, the orchestrator and the CLI.

pub mod config;
pub mod error;
pub mod exec;
pub mod fsutil;
pub mod markers;
pub mod migration;
pub mod store;
pub mod testing;
pub mod traits;

pub use config::Settings;
pub use error::{CommandError, ConfigError, HsError, Result, ValidationError};
pub use migration::migrate_marker;
pub use store::ConfigStore;
pub use traits::{CommandOutput, CommandRunner, CommandSpec, Prompter};
