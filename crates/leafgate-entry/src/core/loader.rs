use std::sync::Arc;

use leafgate_sig::{DetachedSignature, Encoding, KeyRing, SignatureVerifier, classify_signature, read_key_ring};

use crate::error::MalformedInput;

/// A parsed key ring and detached signature, checked for structure but not
/// yet verified against content.
#[derive(Debug, Clone)]
pub struct SigningMaterial {
    key_ring:           Arc<KeyRing>,
    signature:          Arc<DetachedSignature>,
    signature_encoding: Encoding,
}

impl SigningMaterial {
    /// Classify and parse the submitted signature, then the public key.
    pub fn load(signature: &[u8], public_key: &[u8]) -> Result<Self, MalformedInput> {
        let (signature, signature_encoding) = classify_signature(signature).map_err(|e| {
            tracing::warn!(error = %e, "rejected signature");
            MalformedInput::InvalidSignature(e)
        })?;
        let (key_ring, key_encoding) = read_key_ring(public_key).map_err(|e| {
            tracing::warn!(error = %e, "rejected public key");
            MalformedInput::InvalidPublicKey(e)
        })?;

        tracing::debug!(
            signature = ?signature_encoding,
            key = ?key_encoding,
            keys = key_ring.keys().count(),
            hash = ?signature.hash_algorithm(),
            "signing material loaded"
        );
        Ok(Self {
            key_ring: Arc::new(key_ring),
            signature: Arc::new(signature),
            signature_encoding,
        })
    }

    pub fn key_ring(&self) -> &Arc<KeyRing> { &self.key_ring }

    pub fn signature(&self) -> &DetachedSignature { &self.signature }

    pub fn is_armored_signature(&self) -> bool { self.signature_encoding == Encoding::Armored }

    /// A fresh verifier for one pass over the content.
    pub fn verifier(&self) -> SignatureVerifier { SignatureVerifier::new(&self.key_ring, Arc::clone(&self.signature)) }
}
