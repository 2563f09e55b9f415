use std::borrow::Cow;

use crate::armor::{self, BlockType};
use crate::error::{ArmorError, Error, Result};
use crate::key::KeyRing;
use crate::signature::DetachedSignature;

/// How submitted material was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Armored,
    Binary,
}

/// Parse a detached signature given either armored or as raw packets.
///
/// Input without an armor header line is read as binary. Armor that
/// declares anything other than `PGP SIGNATURE` is refused rather than
/// retried as binary.
pub fn classify_signature(raw: &[u8]) -> Result<(DetachedSignature, Encoding)> {
    let (bytes, encoding) = unwrap_armor(raw, BlockType::Signature)?;
    Ok((DetachedSignature::from_bytes(&bytes)?, encoding))
}

/// Parse public keys given either armored or as raw packets.
pub fn read_key_ring(raw: &[u8]) -> Result<(KeyRing, Encoding)> {
    let (bytes, encoding) = unwrap_armor(raw, BlockType::PublicKey)?;
    Ok((KeyRing::from_bytes(&bytes)?, encoding))
}

fn unwrap_armor(raw: &[u8], expected: BlockType) -> Result<(Cow<'_, [u8]>, Encoding)> {
    match armor::decode(raw) {
        Ok(armored) if armored.block_type == expected => Ok((Cow::Owned(armored.data), Encoding::Armored)),
        Ok(armored) => Err(Error::WrongBlockType {
            expected,
            found: armored.block_type,
        }),
        Err(ArmorError::NotArmored) => {
            tracing::trace!("input is not armored, reading as binary");
            Ok((Cow::Borrowed(raw), Encoding::Binary))
        }
        Err(e) => Err(e.into()),
    }
}
