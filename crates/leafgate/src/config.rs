use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use leafgate_entry::{DEFAULT_BUFFER_CHUNKS, DEFAULT_CHUNK_SIZE, UrlHashPolicy, VerifyOptions};
use leafgate_fetch::Timeouts;
use serde::Deserialize;

/// File configuration. Every key is optional.
///
/// ```toml
/// [fetch]
/// connect_timeout_ms = 5000
/// timeout_ms = 30000
///
/// [verify]
/// chunk_size = 65536
/// buffer_chunks = 8
/// url_policy = "require-pinned"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub fetch:  FetchConfig,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub connect_timeout_ms: u64,
    pub timeout_ms:         u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            connect_timeout_ms: timeouts.connect.as_millis() as u64,
            timeout_ms:         timeouts.total.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    pub chunk_size:    usize,
    pub buffer_chunks: usize,
    pub url_policy:    UrlHashPolicy,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            chunk_size:    DEFAULT_CHUNK_SIZE,
            buffer_chunks: DEFAULT_BUFFER_CHUNKS,
            url_policy:    UrlHashPolicy::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> { toml::from_str(text) }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts::default()
            .connect(Duration::from_millis(self.fetch.connect_timeout_ms))
            .total(Duration::from_millis(self.fetch.timeout_ms))
    }

    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions::default()
            .chunk_size(self.verify.chunk_size)
            .buffer_chunks(self.verify.buffer_chunks)
            .url_policy(self.verify.url_policy)
    }
}
