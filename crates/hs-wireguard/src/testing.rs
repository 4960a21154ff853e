//! Deterministic key generator for tests

use std::cell::Cell;

use sha2::{Digest, Sha256};

use hs_core::Result;

use crate::keys::{Key, KeyGenerator};

/// Key generator deriving every key from a counter with SHA-256
///
/// Keys are well formed but not real Curve25519 pairs. [`calls`](Self::calls)
/// counts every generate or derive request, which lets tests prove that a
/// workflow failed before touching key material.
#[derive(Debug, Default)]
pub struct DeterministicKeys {
    counter: Cell<u32>,
    calls: Cell<usize>,
}

impl DeterministicKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of key operations performed
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn digest(&self, parts: &[&[u8]]) -> Key {
        self.calls.set(self.calls.get() + 1);
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Key::from_bytes(&hasher.finalize().into())
    }

    fn next(&self) -> u32 {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        n
    }
}

impl KeyGenerator for DeterministicKeys {
    fn generate_private_key(&self) -> Result<Key> {
        let n = self.next();
        Ok(self.digest(&[b"homestead-test-private".as_slice(), &n.to_be_bytes()]))
    }

    fn derive_public_key(&self, private: &Key) -> Result<Key> {
        Ok(self.digest(&[b"homestead-test-public".as_slice(), private.as_str().as_bytes()]))
    }

    fn generate_preshared_key(&self) -> Result<Key> {
        let n = self.next();
        Ok(self.digest(&[b"homestead-test-psk".as_slice(), &n.to_be_bytes()]))
    }
}
