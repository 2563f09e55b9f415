use bytes::{Bytes, BytesMut};
use futures_util::{StreamExt, stream};

use crate::core::{ContentKind, GzipDecoder, SNIFF_LEN, StreamTransform, sniff_content};
use crate::effects::http::{BoxStream, HttpClient};
use crate::error::Result;

/// Where the content of a submission comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Bytes carried in the submission itself.
    Inline(Bytes),
    /// A URL fetched with a single GET.
    Remote(String),
}

impl ContentSource {
    /// Resolve the source into a readable stream.
    ///
    /// Inline content performs no I/O and is framed into `chunk_size` pieces.
    /// Remote content is requested immediately so that a failing fetch is
    /// reported before any verification work starts; its body is then
    /// sniffed for gzip, and decoded output is framed into `chunk_size`
    /// pieces.
    pub async fn open<C: HttpClient>(self, client: &C, chunk_size: usize) -> Result<ContentStream> {
        match self {
            ContentSource::Inline(data) => Ok(ContentStream::inline(data, chunk_size)),
            ContentSource::Remote(url) => {
                let body = client.stream(&url).await?;
                ContentStream::sniffed(body, chunk_size).await
            }
        }
    }
}

/// A once-readable stream of content chunks.
///
/// Chunks come out in source order. Gzip-compressed bodies are decoded
/// transparently; the bytes peeked for classification are replayed first so
/// nothing is lost.
pub struct ContentStream {
    inner:     BoxStream<'static, Result<Bytes>>,
    head:      Option<Bytes>,
    transform: Option<Box<dyn StreamTransform>>,
    kind:      ContentKind,
    bytes_in:  u64,
    bytes_out: u64,
    done:      bool,
}

impl ContentStream {
    /// Stream an in-memory buffer without sniffing or decoding it.
    pub fn inline(data: Bytes, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunks: Vec<Result<Bytes>> = (0..data.len())
            .step_by(chunk_size)
            .map(|start| Ok(data.slice(start..data.len().min(start + chunk_size))))
            .collect();
        Self::raw(Box::pin(stream::iter(chunks)), ContentKind::Raw, None, None)
    }

    /// Wrap a body stream, classifying it from at most its first
    /// [`SNIFF_LEN`] bytes. Decompressed chunks are at most `chunk_size`
    /// bytes.
    pub async fn sniffed(mut body: BoxStream<'static, Result<Bytes>>, chunk_size: usize) -> Result<Self> {
        let mut head = BytesMut::new();
        while head.len() < SNIFF_LEN {
            match body.next().await {
                Some(chunk) => head.extend_from_slice(&chunk?),
                None => break,
            }
        }

        let kind = sniff_content(&head);
        tracing::debug!(kind = kind.mime(), peeked = head.len(), "content classified");

        let transform: Option<Box<dyn StreamTransform>> = match kind {
            ContentKind::Gzip => Some(Box::new(GzipDecoder::new(chunk_size))),
            ContentKind::Raw => None,
        };
        Ok(Self::raw(body, kind, Some(head.freeze()), transform))
    }

    fn raw(
        inner: BoxStream<'static, Result<Bytes>>,
        kind: ContentKind,
        head: Option<Bytes>,
        transform: Option<Box<dyn StreamTransform>>,
    ) -> Self {
        Self {
            inner,
            head,
            transform,
            kind,
            bytes_in: 0,
            bytes_out: 0,
            done: false,
        }
    }

    pub fn kind(&self) -> ContentKind { self.kind }

    /// Bytes taken from the source, before decoding.
    pub fn bytes_in(&self) -> u64 { self.bytes_in }

    /// Bytes handed out by [`next_chunk`](Self::next_chunk).
    pub fn bytes_out(&self) -> u64 { self.bytes_out }

    /// Next non-empty chunk of content, or `None` at the end.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(transform) = self.transform.as_mut() {
                if let Some(out) = transform.pull()? {
                    self.bytes_out += out.len() as u64;
                    return Ok(Some(out));
                }
            }
            if self.done {
                return Ok(None);
            }

            let raw = match self.head.take() {
                Some(head) => Some(head),
                None => self.inner.next().await.transpose()?,
            };

            match (raw, self.transform.as_mut()) {
                (Some(chunk), Some(transform)) => {
                    self.bytes_in += chunk.len() as u64;
                    transform.push(chunk)?;
                }
                (Some(chunk), None) => {
                    self.bytes_in += chunk.len() as u64;
                    if !chunk.is_empty() {
                        self.bytes_out += chunk.len() as u64;
                        return Ok(Some(chunk));
                    }
                }
                (None, Some(transform)) => {
                    self.done = true;
                    transform.close();
                }
                (None, None) => self.done = true,
            }
        }
    }
}
