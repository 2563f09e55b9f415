//! Immutable configuration types for content acquisition.

mod options;

pub use options::Timeouts;
