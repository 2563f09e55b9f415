use crate::armor::BlockType;
use crate::key::KeyId;

#[derive(Debug, thiserror::Error)]
pub enum ArmorError {
    #[error("no armor header line found")]
    NotArmored,

    #[error("malformed armor: {0}")]
    Malformed(&'static str),

    #[error("invalid base64 in armor: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("armor checksum mismatch: expected {expected:06X}, computed {actual:06X}")]
    Checksum { expected: u32, actual: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Armor(#[from] ArmorError),

    #[error("armor declares {found}, expected {expected}")]
    WrongBlockType { expected: BlockType, found: BlockType },

    #[error("truncated packet data")]
    Truncated,

    #[error("malformed packet: {0}")]
    Malformed(&'static str),

    #[error("expected a signature packet, found packet tag {0}")]
    NotASignature(u8),

    #[error("expected a public key packet, found packet tag {0}")]
    NotAPublicKey(u8),

    #[error("key ring contains no public keys")]
    EmptyKeyRing,

    #[error("unsupported signature version {0}")]
    UnsupportedSignatureVersion(u8),

    #[error("unsupported key version {0}")]
    UnsupportedKeyVersion(u8),

    #[error("unsupported signature type {0:#04x}: expected a binary or text document signature")]
    UnsupportedSignatureType(u8),

    #[error("unsupported hash algorithm {0}")]
    UnsupportedHash(u8),

    #[error("unsupported public key algorithm {0}")]
    UnsupportedAlgorithm(u8),

    #[error("no key in the ring matches signature issuer {0}")]
    UnknownIssuer(String),

    #[error("signature does not name its issuer")]
    MissingIssuer,

    #[error("key {0} has no self-signed user id")]
    MissingIdentity(KeyId),

    #[error("invalid self-signature on a user id of key {0}")]
    InvalidSelfSignature(KeyId),

    #[error("subkey {subkey} has no valid binding signature from {primary}")]
    UnboundSubkey { primary: KeyId, subkey: KeyId },

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signature does not match content")]
    BadSignature,
}

pub type Result<T> = std::result::Result<T, Error>;
