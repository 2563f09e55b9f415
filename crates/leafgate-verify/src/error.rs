#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("digest mismatch: declared {expected}, computed {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("invalid SHA-256 hex digest {0:?}: expected 64 hex characters")]
    InvalidDigest(String),

    #[error("illegal state: {0}")]
    IllegalState(&'static str),
}

pub type Result<T> = std::result::Result<T, VerificationError>;
