use std::sync::Arc;

use ed25519_dalek::Verifier;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use sha2::digest::DynDigest;

use crate::error::{Error, Result};
use crate::key::{KeyMaterial, KeyRing, PublicKey, PublicKeyAlgorithm};
use crate::signature::{DetachedSignature, SignatureType};

const RSA_MAX_BITS: usize = 16384;

/// Checks one detached signature against content fed in arbitrary chunks.
///
/// The signing key is chosen from the ring when the verifier is built: the
/// first key matching an issuer in the signature. A signature that names no
/// issuer, or none present in the ring, is reported by
/// [`finish`](Self::finish) so callers can still drain their input.
pub struct SignatureVerifier {
    signature: Arc<DetachedSignature>,
    key:       Option<PublicKey>,
    hasher:    Box<dyn DynDigest + Send>,
    text:      Option<TextCanonicalizer>,
    consumed:  u64,
}

impl SignatureVerifier {
    pub fn new(ring: &KeyRing, signature: Arc<DetachedSignature>) -> Self {
        let key = select_key(ring, &signature).cloned();
        match &key {
            Some(key) => tracing::debug!(key_id = %key.key_id(), "selected signing key"),
            None => tracing::debug!(issuers = ?signature.issuers(), "no key matches signature issuer"),
        }
        Self {
            hasher: signature.hash_algorithm().hasher(),
            text: (signature.sig_type() == SignatureType::Text).then(TextCanonicalizer::default),
            signature,
            key,
            consumed: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.consumed += data.len() as u64;
        let hasher = &mut self.hasher;
        match self.text.as_mut() {
            Some(text) => text.feed(data, |segment| hasher.update(segment)),
            None => hasher.update(data),
        }
    }

    /// Content bytes seen so far, before any line ending conversion.
    pub fn bytes_consumed(&self) -> u64 { self.consumed }

    pub fn finish(self) -> Result<()> {
        let Some(key) = self.key else {
            if self.signature.issuers().is_empty() {
                return Err(Error::MissingIssuer);
            }
            let issuers: Vec<String> = self.signature.issuers().iter().map(ToString::to_string).collect();
            return Err(Error::UnknownIssuer(issuers.join(", ")));
        };
        check(&key, &self.signature, self.hasher)
    }
}

fn select_key<'r>(ring: &'r KeyRing, signature: &DetachedSignature) -> Option<&'r PublicKey> {
    signature.issuers().iter().find_map(|id| ring.find(id))
}

/// Check a key signature made by `signer` over the concatenation of
/// `preimage`.
pub(crate) fn verify_certification(
    signer: &PublicKey,
    signature: &DetachedSignature,
    preimage: &[&[u8]],
) -> Result<()> {
    let mut hasher = signature.hash_algorithm().hasher();
    for part in preimage {
        hasher.update(part);
    }
    check(signer, signature, hasher)
}

fn check(key: &PublicKey, signature: &DetachedSignature, mut hasher: Box<dyn DynDigest + Send>) -> Result<()> {
    hasher.update(signature.trailer());
    let digest = hasher.finalize();
    if digest[..2] != signature.left16() {
        return Err(Error::BadSignature);
    }
    verify_digest(key, signature, &digest)
}

fn verify_digest(key: &PublicKey, signature: &DetachedSignature, digest: &[u8]) -> Result<()> {
    match (&key.material, signature.algorithm()) {
        (KeyMaterial::Rsa { n, e }, PublicKeyAlgorithm::Rsa) => {
            let public = RsaPublicKey::new_with_max_size(
                BigUint::from_bytes_be(n),
                BigUint::from_bytes_be(e),
                RSA_MAX_BITS,
            )
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
            let value = left_pad(&signature.mpis()[0], public.size())?;
            public
                .verify(signature.hash_algorithm().pkcs1v15(), digest, &value)
                .map_err(|_| Error::BadSignature)
        }
        (KeyMaterial::Ed25519(point), PublicKeyAlgorithm::EdDsaLegacy) => {
            let [r, s] = signature.mpis() else {
                return Err(Error::Malformed("EdDSA signature needs two values"));
            };
            let mut raw = [0u8; 64];
            raw[..32].copy_from_slice(&left_pad(r, 32)?);
            raw[32..].copy_from_slice(&left_pad(s, 32)?);
            let public =
                ed25519_dalek::VerifyingKey::from_bytes(point).map_err(|e| Error::InvalidKey(e.to_string()))?;
            public
                .verify(digest, &ed25519_dalek::Signature::from_bytes(&raw))
                .map_err(|_| Error::BadSignature)
        }
        _ => Err(Error::UnsupportedAlgorithm(signature.algorithm().id())),
    }
}

/// MPIs drop leading zero octets; signature primitives want fixed widths.
fn left_pad(value: &[u8], width: usize) -> Result<Vec<u8>> {
    if value.len() > width {
        return Err(Error::BadSignature);
    }
    let mut out = vec![0u8; width - value.len()];
    out.extend_from_slice(value);
    Ok(out)
}

/// Rewrites bare `\n` to `\r\n` for text signatures, across chunk
/// boundaries.
#[derive(Debug, Default)]
struct TextCanonicalizer {
    after_cr: bool,
}

impl TextCanonicalizer {
    fn feed(&mut self, data: &[u8], mut out: impl FnMut(&[u8])) {
        let mut start = 0;
        for (i, &byte) in data.iter().enumerate() {
            if byte == b'\n' && !self.after_cr {
                out(&data[start..i]);
                out(b"\r\n");
                start = i + 1;
            }
            self.after_cr = byte == b'\r';
        }
        out(&data[start..]);
    }
}
