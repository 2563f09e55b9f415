//! Turns untrusted submissions into verified transparency log leaves.
//!
//! # Architecture
//!
//! This crate follows the layered pattern:
//! - [`data`] - Submission, entry states, leaves and options
//! - [`core`] - Parsing of signing material
//! - [`pipeline`] - The streaming dual verifier with its tee and task group
//! - [`effects`] - Orchestration and the log-append boundary
//!
//! # Flow
//!
//! An [`Entry`] is validated into a [`ValidatedEntry`] without any I/O,
//! resolved into a [`ResolvedEntry`] by opening its content, and verified
//! into a [`Leaf`] by reading that content exactly once. The
//! [`EntryAssembler`] runs the whole sequence and reports each transition.

pub mod core;
pub mod data;
pub mod effects;
mod error;
pub mod pipeline;

pub use self::core::SigningMaterial;
pub use self::data::{
    DEFAULT_BUFFER_CHUNKS, DEFAULT_CHUNK_SIZE, Entry, Leaf, Phase, Progress, ResolvedEntry, Submission, UrlHashPolicy,
    ValidatedEntry, VerifyOptions,
};
pub use self::effects::{AppendStatus, EntryAssembler, LogError, MemoryLog, TransparencyLog};
pub use self::error::{Error, MalformedInput, Result};
