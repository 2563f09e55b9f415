use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

/// Framing of inline content into chunks.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks each consumer may have queued before the producer waits.
pub const DEFAULT_BUFFER_CHUNKS: usize = 8;

/// What to do with a URL submission that declares no digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlHashPolicy {
    /// Reject it before fetching.
    #[default]
    RequirePinned,
    /// Fetch it and accept whatever digest the content produces.
    TrustFetched,
}

/// States an entry moves through on its way to becoming a leaf.
///
/// Created → StructurallyValidated → ContentResolved → Verified, with
/// Failed reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    StructurallyValidated,
    ContentResolved,
    Verified,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Created => write!(f, "Created"),
            Phase::StructurallyValidated => write!(f, "StructurallyValidated"),
            Phase::ContentResolved => write!(f, "ContentResolved"),
            Phase::Verified => write!(f, "Verified"),
            Phase::Failed => write!(f, "Failed"),
        }
    }
}

/// Passed to the progress callback on every state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: Phase,

    /// Content bytes digested so far (after decompression).
    pub content_bytes: u64,
}

impl Progress {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            content_bytes: 0,
        }
    }
}

/// Configuration for one verification.
///
/// # Examples
///
/// ```
/// use leafgate_entry::{UrlHashPolicy, VerifyOptions};
///
/// let options = VerifyOptions::default()
///     .chunk_size(16 * 1024)
///     .url_policy(UrlHashPolicy::TrustFetched)
///     .on_progress(|p| println!("{}", p.phase));
/// ```
#[derive(Clone)]
pub struct VerifyOptions {
    /// Size of the pieces inline content is cut into.
    ///
    /// Default: 64 KiB
    pub chunk_size: usize,

    /// Depth of each consumer's queue. A full queue stalls the producer.
    ///
    /// Default: 8
    pub buffer_chunks: usize,

    /// Default: [`UrlHashPolicy::RequirePinned`]
    pub url_policy: UrlHashPolicy,

    /// Invoked on each [`Phase`] transition, including failure.
    ///
    /// Default: None
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for VerifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOptions")
            .field("chunk_size", &self.chunk_size)
            .field("buffer_chunks", &self.buffer_chunks)
            .field("url_policy", &self.url_policy)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_chunks: DEFAULT_BUFFER_CHUNKS,
            url_policy: UrlHashPolicy::default(),
            on_progress: None,
        }
    }
}

impl VerifyOptions {
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn buffer_chunks(mut self, buffer_chunks: usize) -> Self {
        self.buffer_chunks = buffer_chunks.max(1);
        self
    }

    #[must_use]
    pub fn url_policy(mut self, url_policy: UrlHashPolicy) -> Self {
        self.url_policy = url_policy;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        tracing::debug!(phase = %progress.phase, content_bytes = progress.content_bytes, "entry transition");
        if let Some(callback) = &self.on_progress {
            callback(&progress);
        }
    }
}
