//! OpenPGP detached signatures over streamed content.
//!
//! Covers the subset of RFC 4880 needed to check a detached signature
//! submitted next to its content:
//!
//! - [`armor`] - ASCII armor with declared block types and CRC-24
//! - [`packet`] - packet framing (old and new format headers)
//! - [`KeyRing`] - transferable public keys, admitted only with a
//!   self-certified user id and bound subkeys
//! - [`DetachedSignature`] - standard (v4) and legacy (v3) signature packets
//! - [`SignatureVerifier`] - incremental verification, fed chunk by chunk
//!
//! RSA and Ed25519 (legacy EdDSA) keys can verify. Subkeys of other
//! algorithms enter the ring when their binding verifies but never verify a
//! signature themselves.
//!
//! Submitted material is classified with [`classify_signature`] and
//! [`read_key_ring`], which accept both armored and binary input but refuse
//! armor that declares the wrong block type.

pub mod armor;
pub mod packet;

mod error;
mod key;
mod signature;
mod sniff;
mod verify;

pub use self::error::{ArmorError, Error, Result};
pub use self::key::{Entity, KeyId, KeyMaterial, KeyRing, PublicKey, PublicKeyAlgorithm};
pub use self::signature::{DetachedSignature, HashAlgorithm, SignatureType, SignatureVersion};
pub use self::sniff::{Encoding, classify_signature, read_key_ring};
pub use self::verify::SignatureVerifier;
