//! System command runner
//!
//! Runs programs with [`std::process::Command`], capturing stdout and stderr.
//! Standard input is piped only when the invocation carries data for it.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{CommandError, Result};
use crate::traits::{CommandOutput, CommandRunner, CommandSpec};

/// [`CommandRunner`] backed by the host system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("Running {}", cmd.display());

        let spawn_error = |reason: String| CommandError {
            program: cmd.program.clone(),
            args: cmd.args.clone(),
            reason,
            stdout: String::new(),
            stderr: String::new(),
        };

        let mut child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(if cmd.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(format!("could not be started: {}", e)))?;

        if let Some(input) = &cmd.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(input.as_bytes())
                    .map_err(|e| spawn_error(format!("rejected its input: {}", e)))?;
                // Dropping closes the pipe so the program sees EOF
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| spawn_error(format!("could not be awaited: {}", e)))?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::trace!("{} exited with {:?}", cmd.program, result.status);
        Ok(result)
    }
}
