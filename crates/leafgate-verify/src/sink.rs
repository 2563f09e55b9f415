use crate::{Hasher, Result, Sha256Hasher, Sha256Hex, VerificationError};

/// Push-based digest accumulator.
/// Chunks are hashed as they arrive; nothing is retained.
pub struct DigestSink<H = Sha256Hasher> {
    hasher: H,
    bytes:  u64,
}

impl DigestSink<Sha256Hasher> {
    pub fn sha256() -> Self { Self::new(Sha256Hasher::new()) }
}

impl<H: Hasher> DigestSink<H> {
    pub fn new(hasher: H) -> Self { Self { hasher, bytes: 0 } }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes += data.len() as u64;
    }

    pub fn bytes_processed(&self) -> u64 { self.bytes }

    /// Finalize the digest.
    ///
    /// With a declared value the computed digest must equal it, otherwise
    /// [`VerificationError::Mismatch`] is returned. Without one the computed
    /// digest is returned as the canonical value.
    pub fn finish(self, declared: Option<&Sha256Hex>) -> Result<Sha256Hex> {
        let computed = self.hasher.finalize();
        match declared {
            Some(expected) if *expected != computed => Err(VerificationError::Mismatch {
                expected: expected.to_string(),
                actual:   computed.to_string(),
            }),
            _ => Ok(computed),
        }
    }
}
