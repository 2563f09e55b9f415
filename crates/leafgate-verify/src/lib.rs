//! Content digest primitives for submitted artifacts.
//!
//! Provides incremental hashing and declared-digest checks without buffering
//! content. A [`DigestSink`] is fed chunks as they stream past and is finished
//! exactly once, either confirming a caller-declared [`Sha256Hex`] or producing
//! the canonical one.
//!
//! # Example
//!
//! ```
//! use leafgate_verify::{DigestSink, Sha256Hex};
//!
//! let mut sink = DigestSink::sha256();
//! sink.update(b"hel");
//! sink.update(b"lo");
//!
//! let sha = sink.finish(None).unwrap();
//! assert_eq!(
//!     sha.to_hex(),
//!     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
//! );
//! ```

pub use self::digest::Sha256Hex;
pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::sink::DigestSink;

mod digest;
mod error;
mod hasher;
mod sink;
