//! Command execution capability

use std::fmt;

use crate::error::{CommandError, Result};

/// An external program invocation
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Data written to the program's standard input
    pub stdin: Option<String>,
}

impl CommandSpec {
    /// Create a new invocation of `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `input` on standard input
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Program and arguments as a single line for logs
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

// stdin may carry key material
impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Captured result of a finished program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the program exited with status 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Trimmed standard output
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Convert a non-zero exit into a [`CommandError`]
    pub fn into_result(self, spec: &CommandSpec) -> std::result::Result<Self, CommandError> {
        if self.success() {
            return Ok(self);
        }
        let reason = match self.status {
            Some(code) => format!("exited with status {}", code),
            None => "was terminated by a signal".to_string(),
        };
        Err(CommandError {
            program: spec.program.clone(),
            args: spec.args.clone(),
            reason,
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

/// Runs external programs
pub trait CommandRunner {
    /// Run to completion and capture output
    ///
    /// Only a failure to start the program is an error here; a non-zero
    /// exit status is reported through [`CommandOutput::status`].
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;

    /// Run and turn a non-zero exit status into an error
    fn run_checked(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(cmd)?;
        Ok(output.into_result(cmd)?)
    }
}

/// Whether `name` resolves as a command in the shell's `PATH`
///
/// The name is passed as a positional parameter, never spliced into the
/// script.
pub fn command_exists(runner: &dyn CommandRunner, name: &str) -> bool {
    let cmd = CommandSpec::new("sh").args(["-c", "command -v \"$1\"", "sh", name]);
    match runner.run(&cmd) {
        Ok(output) => output.success(),
        Err(e) => {
            tracing::debug!("Could not probe for {}: {}", name, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder_and_display() {
        let spec = CommandSpec::new("wg").arg("pubkey").stdin("secret");
        assert_eq!(spec.display(), "wg pubkey");
        assert!(!format!("{:?}", spec).contains("secret"));
    }

    #[test]
    fn test_into_result() {
        let spec = CommandSpec::new("id").args(["-u", "nobody-here"]);
        assert!(CommandOutput::ok("0\n").into_result(&spec).is_ok());

        let err = CommandOutput::failed(1, "no such user")
            .into_result(&spec)
            .unwrap_err();
        assert_eq!(err.reason, "exited with status 1");
        assert_eq!(err.stderr, "no such user");
        assert_eq!(err.args, vec!["-u", "nobody-here"]);
    }
}
