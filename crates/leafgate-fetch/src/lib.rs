//! Content acquisition for submitted artifacts.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations (content sniffing, gzip decoding)
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Single reader**: a [`ContentStream`] is consumed once, end to end
//! - **Transparent gzip**: remote bodies are sniffed from their first 512
//!   bytes and decompressed on the fly; the peeked bytes are replayed
//! - **Bounded fetches**: [`ReqwestClient`] enforces connect and total timeouts

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{ContentKind, GzipDecoder, SNIFF_LEN, StreamTransform, sniff_content};
pub use self::data::Timeouts;
pub use self::effects::{BoxStream, ContentSource, ContentStream, HttpClient};

#[cfg(feature = "reqwest")]
pub use self::effects::ReqwestClient;

pub use self::error::{FetchError, Result};
