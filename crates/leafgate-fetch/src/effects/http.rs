use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::Result;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed to resolve a content
/// reference. Implementations handle their own redirect following and
/// timeout configuration, and must report non-success statuses as
/// [`FetchError::Status`](crate::FetchError::Status) rather than yielding the
/// error page as content.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Issue a GET and return the response body as a stream of chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (DNS failure, connection error,
    /// timeout, non-success HTTP status).
    fn stream(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes>>>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::{BoxStream, Bytes, HttpClient, Result};
    use crate::data::Timeouts;
    use crate::error::FetchError;

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client with the default [`Timeouts`].
        pub fn new() -> Result<Self> { Self::with_timeouts(Timeouts::default()) }

        /// Wrap an already configured client, e.g. one with custom proxy or
        /// TLS settings. Its timeouts are used as-is.
        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }

        pub fn with_timeouts(timeouts: Timeouts) -> Result<Self> {
            let client = reqwest::Client::builder()
                .connect_timeout(timeouts.connect)
                .timeout(timeouts.total)
                .build()?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        async fn stream(&self, url: &str) -> Result<BoxStream<'static, Result<Bytes>>> {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url:    url.to_string(),
                    status: status.as_u16(),
                });
            }
            tracing::debug!(url, status = status.as_u16(), "content fetch started");

            let stream = response.bytes_stream().map(|chunk| chunk.map_err(FetchError::from));
            Ok(Box::pin(stream))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
