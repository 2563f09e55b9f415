//! Submission, entry and leaf types plus verification options.

mod entry;
mod leaf;
mod options;
mod submission;

pub use self::entry::{Entry, ResolvedEntry, ValidatedEntry};
pub use self::leaf::Leaf;
pub use self::options::{DEFAULT_BUFFER_CHUNKS, DEFAULT_CHUNK_SIZE, Phase, Progress, UrlHashPolicy, VerifyOptions};
pub use self::submission::Submission;

pub(crate) use self::submission::base64_bytes;
