//! I/O operations for content acquisition.
//!
//! Network access sits behind [`HttpClient`] so the verification pipeline can
//! be driven by the production [`ReqwestClient`] or by an in-memory client.

mod http;
mod source;

pub use http::{BoxStream, HttpClient};
pub use source::{ContentSource, ContentStream};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
