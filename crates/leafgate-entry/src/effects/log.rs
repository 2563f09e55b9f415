use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use leafgate_verify::{Sha256Hasher, Sha256Hex};
use tokio::sync::Mutex;

use crate::data::Leaf;

/// Result code of a log operation, following the gRPC status codes the log
/// service answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendStatus {
    Ok,
    NotFound,
    AlreadyExists,
    Unknown(i32),
}

impl AppendStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => AppendStatus::Ok,
            5 => AppendStatus::NotFound,
            6 => AppendStatus::AlreadyExists,
            other => AppendStatus::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            AppendStatus::Ok => 0,
            AppendStatus::NotFound => 5,
            AppendStatus::AlreadyExists => 6,
            AppendStatus::Unknown(code) => code,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AppendStatus::Ok => "OK",
            AppendStatus::NotFound => "Leaf not Found",
            AppendStatus::AlreadyExists => "Data Already Exists",
            AppendStatus::Unknown(_) => "Error. Unknown Code!",
        }
    }
}

impl fmt::Display for AppendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.message()) }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("log unavailable: {0}")]
    Unavailable(String),

    #[error("log rejected leaf: {0}")]
    Rejected(AppendStatus),

    #[error("leaf could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The append-only log that verified leaves are handed to.
///
/// Only [`Leaf`] values, which exist only after successful verification,
/// can be appended.
pub trait TransparencyLog: Send + Sync {
    fn append(&self, leaf: &Leaf) -> impl Future<Output = Result<AppendStatus, LogError>> + Send;

    fn lookup(&self, leaf: &Leaf) -> impl Future<Output = Result<AppendStatus, LogError>> + Send;
}

/// In-process log keyed by leaf hash, preserving append order.
#[derive(Debug, Default)]
pub struct MemoryLog {
    inner: Mutex<MemoryLogInner>,
}

#[derive(Debug, Default)]
struct MemoryLogInner {
    index:  HashMap<Sha256Hex, usize>,
    leaves: Vec<Vec<u8>>,
}

impl MemoryLog {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.inner.lock().await.leaves.len() }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }

    /// Canonical bytes of every appended leaf, oldest first.
    pub async fn leaves(&self) -> Vec<Vec<u8>> { self.inner.lock().await.leaves.clone() }
}

impl TransparencyLog for MemoryLog {
    async fn append(&self, leaf: &Leaf) -> Result<AppendStatus, LogError> {
        let bytes = leaf.canonical_bytes()?;
        let hash = Sha256Hasher::digest(&bytes);
        let mut inner = self.inner.lock().await;
        if inner.index.contains_key(&hash) {
            return Ok(AppendStatus::AlreadyExists);
        }
        let position = inner.leaves.len();
        inner.leaves.push(bytes);
        inner.index.insert(hash, position);
        tracing::debug!(%hash, position, "leaf appended");
        Ok(AppendStatus::Ok)
    }

    async fn lookup(&self, leaf: &Leaf) -> Result<AppendStatus, LogError> {
        let hash = leaf.leaf_hash()?;
        let inner = self.inner.lock().await;
        Ok(if inner.index.contains_key(&hash) {
            AppendStatus::Ok
        } else {
            AppendStatus::NotFound
        })
    }
}
