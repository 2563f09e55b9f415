use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, VerificationError};

/// A SHA-256 digest, rendered canonically as 64 lowercase hex characters.
///
/// Parsing accepts either case, so comparing two values is a
/// case-insensitive comparison of the hex they were parsed from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Hex([u8; 32]);

impl Sha256Hex {
    pub const HEX_LEN: usize = 64;

    pub fn from_hex(s: &str) -> Result<Self> { s.parse() }

    /// Wrap a raw digest. Fails unless `digest` is exactly 32 bytes.
    pub fn from_digest(digest: &[u8]) -> Result<Self> {
        <[u8; 32]>::try_from(digest)
            .map(Self)
            .map_err(|_| VerificationError::IllegalState("SHA-256 digest must be 32 bytes"))
    }

    pub fn to_hex(&self) -> String { hex::encode(self.0) }

    pub fn to_bytes(&self) -> [u8; 32] { self.0 }
}

impl FromStr for Sha256Hex {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::HEX_LEN {
            return Err(VerificationError::InvalidDigest(s.to_string()));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|_| VerificationError::InvalidDigest(s.to_string()))?;
        Ok(Self(out))
    }
}

impl TryFrom<String> for Sha256Hex {
    type Error = VerificationError;

    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<[u8; 32]> for Sha256Hex {
    fn from(digest: [u8; 32]) -> Self { Self(digest) }
}

impl From<Sha256Hex> for String {
    fn from(sha: Sha256Hex) -> Self { sha.to_hex() }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hex({})", self.to_hex())
    }
}
