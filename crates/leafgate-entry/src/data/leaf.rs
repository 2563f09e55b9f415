use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use leafgate_sig::KeyRing;
use leafgate_verify::{Sha256Hasher, Sha256Hex};
use serde::Serialize;

use super::base64_bytes;

/// A verified record, ready for the log.
///
/// Only `sha`, `signature` and `public_key` are serialized; the parsed key
/// ring and signature encoding ride along for callers that want them.
#[derive(Clone, Serialize)]
pub struct Leaf {
    sha:                  Sha256Hex,
    #[serde(with = "base64_bytes")]
    signature:            Bytes,
    #[serde(with = "base64_bytes")]
    public_key:           Bytes,
    #[serde(skip)]
    key_ring:             Arc<KeyRing>,
    #[serde(skip)]
    is_armored_signature: bool,
    #[serde(skip)]
    content_len:          u64,
}

impl Leaf {
    pub(crate) fn new(
        sha: Sha256Hex,
        signature: Bytes,
        public_key: Bytes,
        key_ring: Arc<KeyRing>,
        is_armored_signature: bool,
        content_len: u64,
    ) -> Self {
        Self {
            sha,
            signature,
            public_key,
            key_ring,
            is_armored_signature,
            content_len,
        }
    }

    pub fn sha(&self) -> &Sha256Hex { &self.sha }

    pub fn signature(&self) -> &Bytes { &self.signature }

    pub fn public_key(&self) -> &Bytes { &self.public_key }

    pub fn key_ring(&self) -> &KeyRing { &self.key_ring }

    pub fn is_armored_signature(&self) -> bool { self.is_armored_signature }

    /// Content bytes covered by the digest and the signature.
    pub fn content_len(&self) -> u64 { self.content_len }

    /// The serialized form handed to the log.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> { serde_json::to_vec(self) }

    /// SHA-256 of [`canonical_bytes`](Self::canonical_bytes); identifies the
    /// leaf for de-duplication.
    pub fn leaf_hash(&self) -> serde_json::Result<Sha256Hex> {
        Ok(Sha256Hasher::digest(&self.canonical_bytes()?))
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("sha", &self.sha)
            .field("signature", &format_args!("{} bytes", self.signature.len()))
            .field("public_key", &format_args!("{} bytes", self.public_key.len()))
            .field("is_armored_signature", &self.is_armored_signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(signature: &'static [u8]) -> Leaf {
        let key = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/rsa.pub.asc"));
        let (ring, _) = leafgate_sig::read_key_ring(key).unwrap();
        Leaf::new(
            Sha256Hex::from([7u8; 32]),
            Bytes::from_static(signature),
            Bytes::from_static(b"key"),
            Arc::new(ring),
            true,
            5,
        )
    }

    #[test]
    fn canonical_form_has_only_persisted_fields() {
        let bytes = leaf(b"sig").canonical_bytes().unwrap();
        let expected = format!(r#"{{"sha":"{}","signature":"c2ln","public_key":"a2V5"}}"#, "07".repeat(32));
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn leaf_hash_tracks_canonical_bytes() {
        let hash = leaf(b"sig").leaf_hash().unwrap();
        assert_eq!(hash, leaf(b"sig").leaf_hash().unwrap());
        assert_eq!(hash, Sha256Hasher::digest(&leaf(b"sig").canonical_bytes().unwrap()));
        assert_ne!(hash, leaf(b"other").leaf_hash().unwrap());
    }
}
