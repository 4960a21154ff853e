//! Capability traits consumed by the core
//!
//! Interactive prompting and external program execution are provided by the
//! caller. Production implementations live in the CLI ([`Prompter`]) and in
//! [`crate::exec`] ([`CommandRunner`]); deterministic doubles live in
//! [`crate::testing`].

mod command;
mod prompt;

pub use command::{command_exists, CommandOutput, CommandRunner, CommandSpec};
pub use prompt::Prompter;
