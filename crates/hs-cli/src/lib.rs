//! homestead: Command-line front end
//!
//! Wires the terminal prompter, the system command runner and the key
//! backend into the step orchestrator and the WireGuard workflows.

pub mod commands;
pub mod output;
pub mod prompt;

pub use prompt::TerminalPrompter;
