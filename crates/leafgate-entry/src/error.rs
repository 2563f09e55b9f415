use leafgate_fetch::FetchError;
use leafgate_sig::Error as SignatureError;
use leafgate_verify::VerificationError;

use crate::effects::LogError;

/// Structural problems with a submission, found before any content is read.
#[derive(Debug, thiserror::Error)]
pub enum MalformedInput {
    #[error("invalid sha: {0}")]
    InvalidSha(VerificationError),

    #[error("invalid signature: {0}")]
    InvalidSignature(SignatureError),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(SignatureError),

    #[error("one of data or url must be set")]
    MissingContent,

    #[error("only one of data or url may be set")]
    AmbiguousContent,

    #[error("sha must be specified if url is set")]
    UnpinnedUrl,

    #[error("undecodable submission: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),

    #[error("content fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    #[error("digest mismatch: declared {expected}, computed {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("signature invalid: {0}")]
    SignatureInvalid(SignatureError),

    /// A sibling task failed first. Never returned from a verification.
    #[error("cancelled by a failing sibling task")]
    Cancelled,

    #[error("log append failed: {0}")]
    LogAppend(#[from] LogError),
}

impl From<VerificationError> for Error {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Mismatch { expected, actual } => Error::DigestMismatch { expected, actual },
            other => Error::MalformedInput(MalformedInput::InvalidSha(other)),
        }
    }
}

impl Error {
    /// Failures that mean the submission was tampered with or mislabelled,
    /// as opposed to being unparsable or unreachable.
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, Error::DigestMismatch { .. } | Error::SignatureInvalid(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
