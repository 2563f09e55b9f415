//! Error types for leafgate-fetch.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("request timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decompress gzip content: {0}")]
    Decompress(#[source] io::Error),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return FetchError::Timeout;
        }
        if e.is_builder() {
            return FetchError::InvalidUrl(e.to_string());
        }
        match e.status() {
            Some(status) => FetchError::Status {
                url:    e.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            },
            None => FetchError::Network(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
