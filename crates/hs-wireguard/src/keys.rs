//! WireGuard key material
//!
//! Keys are Curve25519 values exchanged as base64 text. Production code gets
//! them from a [`KeyGenerator`]: either the `wg` tool ([`WgToolKeys`]) or
//! x25519-dalek in process ([`NativeKeys`]).

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use hs_core::config::KeyBackend;
use hs_core::traits::command_exists;
use hs_core::{CommandRunner, CommandSpec, Result, ValidationError};

/// Raw key length in bytes
pub const KEY_LENGTH: usize = 32;

/// A base64-encoded 32 byte key
///
/// Construction always validates the encoding and length. `Debug` never
/// prints the value since the same type carries private keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Parse base64 text, ignoring surrounding whitespace
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| ValidationError::Key(format!("not valid base64: {}", e)))?;
        if bytes.len() != KEY_LENGTH {
            return Err(ValidationError::Key(format!(
                "expected {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            ))
            .into());
        }
        Ok(Self(text.to_string()))
    }

    /// Encode raw bytes
    pub fn from_bytes(bytes: &[u8; KEY_LENGTH]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Decode to raw bytes
    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        let mut out = [0u8; KEY_LENGTH];
        // Length was checked on construction
        if let Ok(bytes) = STANDARD.decode(&self.0) {
            out.copy_from_slice(&bytes[..KEY_LENGTH]);
        }
        out
    }

    /// Base64 text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

impl TryFrom<String> for Key {
    type Error = hs_core::HsError;

    fn try_from(value: String) -> Result<Self> {
        Key::parse(&value)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

/// Produces WireGuard keys
pub trait KeyGenerator {
    /// Fresh random private key
    fn generate_private_key(&self) -> Result<Key>;

    /// Public key belonging to `private`
    fn derive_public_key(&self, private: &Key) -> Result<Key>;

    /// Fresh random preshared key
    fn generate_preshared_key(&self) -> Result<Key> {
        self.generate_private_key()
    }
}

/// Private key plus its public half
#[derive(Clone)]
pub struct KeyPair {
    pub private: Key,
    pub public: Key,
}

impl KeyPair {
    /// Generate a pair through `keys`
    pub fn generate(keys: &dyn KeyGenerator) -> Result<Self> {
        let private = keys.generate_private_key()?;
        let public = keys.derive_public_key(&private)?;
        Ok(Self { private, public })
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public.as_str())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Keys from the `wg` command line tool
pub struct WgToolKeys<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> WgToolKeys<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn run(&self, cmd: CommandSpec) -> Result<Key> {
        let output = self.runner.run_checked(&cmd)?;
        Key::parse(output.stdout_trimmed())
    }
}

impl KeyGenerator for WgToolKeys<'_> {
    fn generate_private_key(&self) -> Result<Key> {
        self.run(CommandSpec::new("wg").arg("genkey"))
    }

    fn derive_public_key(&self, private: &Key) -> Result<Key> {
        self.run(
            CommandSpec::new("wg")
                .arg("pubkey")
                .stdin(format!("{}\n", private.as_str())),
        )
    }

    fn generate_preshared_key(&self) -> Result<Key> {
        self.run(CommandSpec::new("wg").arg("genpsk"))
    }
}

/// In-process Curve25519 keys
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeKeys;

impl KeyGenerator for NativeKeys {
    fn generate_private_key(&self) -> Result<Key> {
        let secret = StaticSecret::random_from_rng(OsRng);
        Ok(Key::from_bytes(&secret.to_bytes()))
    }

    fn derive_public_key(&self, private: &Key) -> Result<Key> {
        let secret = StaticSecret::from(private.to_bytes());
        let public = PublicKey::from(&secret);
        Ok(Key::from_bytes(public.as_bytes()))
    }

    fn generate_preshared_key(&self) -> Result<Key> {
        let mut bytes = [0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Ok(Key::from_bytes(&bytes))
    }
}

/// Pick the key generator for `backend`
///
/// `auto` uses `wg` when it is installed and falls back to native keys.
pub fn select_key_generator<'a>(
    backend: KeyBackend,
    runner: &'a dyn CommandRunner,
) -> Box<dyn KeyGenerator + 'a> {
    let use_tool = match backend {
        KeyBackend::Wg => true,
        KeyBackend::Native => false,
        KeyBackend::Auto => command_exists(runner, "wg"),
    };

    if use_tool {
        tracing::debug!("Using wg tool for key generation");
        Box::new(WgToolKeys::new(runner))
    } else {
        tracing::debug!("Using native key generation");
        Box::new(NativeKeys)
    }
}
