//! Opaque one-way credential transform.

use sha2::{Digest, Sha256};
use vendstack_core::CredentialHasher;

/// Hex-encoded SHA-256 digest of the plaintext.
///
/// Deterministic by construction — the registry relies on that to verify a
/// login by searching for `(username, digest)` equality.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }
}
