//! Core error types for Homestead

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the Homestead crates
pub type Result<T> = std::result::Result<T, HsError>;

/// Top-level error type for the Homestead ecosystem
#[derive(Error, Debug)]
pub enum HsError {
    /// Bad user or caller input; never retried
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Filesystem failure, always tagged with the failing path
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration key absent from the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// No host addresses left in the interface subnet
    #[error("Address space exhausted in {subnet}; resize the subnet to add more peers")]
    AddressSpaceExhausted { subnet: String },

    /// An external program failed
    #[error("External command failed: {0}")]
    ExternalCommand(#[from] CommandError),

    /// A setup step failed
    #[error("Step '{step}' failed: {source}")]
    StepFailure {
        step: String,
        #[source]
        source: Box<HsError>,
    },

    /// A prerequisite from an earlier step is missing
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The interactive prompt could not be completed
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A persisted record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Settings file error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HsError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error with the name of the step it escaped from
    pub fn step(step: impl Into<String>, source: HsError) -> Self {
        HsError::StepFailure {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Whether the error is caller-correctable input
    pub fn is_validation(&self) -> bool {
        match self {
            HsError::Validation(_) => true,
            HsError::StepFailure { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Marker name would escape the marker directory
    #[error("Invalid marker name: {0:?}")]
    MarkerName(String),

    /// Store key cannot be represented in the key=value file
    #[error("Invalid config key: {0:?}")]
    ConfigKey(String),

    /// Store value cannot be represented in the key=value file
    #[error("Invalid config value for key {0:?}")]
    ConfigValue(String),

    /// Not a canonical IPv4 CIDR
    #[error("Invalid CIDR: {0:?}")]
    Cidr(String),

    /// Not a canonical IPv4 address
    #[error("Invalid IPv4 address: {0:?}")]
    Address(String),

    /// Not a usable host[:port] endpoint
    #[error("Invalid endpoint: {0:?}")]
    Endpoint(String),

    /// Port outside [1, 65535]
    #[error("Invalid port: {0}")]
    Port(String),

    /// Keepalive is not a number of seconds
    #[error("Invalid keepalive interval: {0:?}")]
    Keepalive(String),

    /// Not a base64-encoded 32 byte key
    #[error("Invalid key: {0}")]
    Key(String),

    /// Interface or peer name is unusable
    #[error("Invalid name: {0:?}")]
    Name(String),

    /// A required value was empty or not supplied
    #[error("Missing required value: {0}")]
    MissingField(String),

    /// Peer name already used on the interface
    #[error("Peer already exists: {0}")]
    DuplicatePeer(String),

    /// No registered step has this identifier
    #[error("Unknown step: {0}")]
    UnknownStep(String),
}

/// Failure of an external program invocation
#[derive(Error, Debug, Clone)]
#[error("`{program} {}` {reason}", .args.join(" "))]
pub struct CommandError {
    /// Program that was executed
    pub program: String,
    /// Arguments passed to it
    pub args: Vec<String>,
    /// Human readable failure reason (spawn failure or exit status)
    pub reason: String,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandError {
    /// Captured output for diagnostics, stderr first
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        match (stderr.is_empty(), stdout.is_empty()) {
            (false, false) => format!("{}\n{}", stderr, stdout),
            (false, true) => stderr.to_string(),
            (true, false) => stdout.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Settings-file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file not found
    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid settings
    #[error("Invalid settings: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
