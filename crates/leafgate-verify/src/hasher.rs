use sha2::{Digest, Sha256};

use crate::Sha256Hex;

/// Incremental hash state driven by a [`DigestSink`](crate::DigestSink).
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Sha256Hex;
}

/// SHA-256 over the exact content bytes, the value stored as a leaf's `sha`.
#[derive(Clone, Default)]
pub struct Sha256Hasher(Sha256);

impl Sha256Hasher {
    pub fn new() -> Self { Self::default() }

    /// One-shot digest of an in-memory buffer.
    pub fn digest(data: &[u8]) -> Sha256Hex { to_hex_value(&Sha256::digest(data)) }
}

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }

    fn finalize(self) -> Sha256Hex { to_hex_value(&self.0.finalize()) }
}

fn to_hex_value(out: &[u8]) -> Sha256Hex {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(out);
    Sha256Hex::from(digest)
}
