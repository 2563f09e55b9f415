//! Stream decompression.
//!
//! Decoders are push/pull: compressed chunks are pushed as they arrive and
//! plain bytes are pulled back in pieces no larger than the configured chunk
//! size, so neither the body nor the expansion of a single network chunk is
//! ever buffered whole.

use std::io::{self, Write};

use bytes::{Buf, Bytes, BytesMut};
use flate2::write::MultiGzDecoder;

use crate::error::{FetchError, Result};

/// Incremental transform applied to a chunked byte stream.
pub trait StreamTransform: Send {
    /// Queue the next input chunk.
    fn push(&mut self, input: Bytes) -> Result<()>;

    /// Mark the input as exhausted.
    fn close(&mut self);

    /// Next piece of output. `None` means more input is needed, or after
    /// [`close`](Self::close), that the output is complete.
    fn pull(&mut self) -> Result<Option<Bytes>>;
}

/// Gzip decompressor. Concatenated members decode as one stream.
pub struct GzipDecoder {
    decoder:    MultiGzDecoder<Vec<u8>>,
    input:      Bytes,
    chunk_size: usize,
    closed:     bool,
    flushed:    bool,
}

impl GzipDecoder {
    /// Decoder whose pulled pieces are at most `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            decoder:    MultiGzDecoder::new(Vec::new()),
            input:      Bytes::new(),
            chunk_size: chunk_size.max(1),
            closed:     false,
            flushed:    false,
        }
    }
}

fn decompress_err(msg: &'static str) -> FetchError { FetchError::Decompress(io::Error::other(msg)) }

impl StreamTransform for GzipDecoder {
    fn push(&mut self, input: Bytes) -> Result<()> {
        if self.closed {
            return Err(decompress_err("gzip decoder already finished"));
        }
        if self.input.is_empty() {
            self.input = input;
        } else {
            let mut joined = BytesMut::with_capacity(self.input.len() + input.len());
            joined.extend_from_slice(&self.input);
            joined.extend_from_slice(&input);
            self.input = joined.freeze();
        }
        Ok(())
    }

    fn close(&mut self) { self.closed = true; }

    fn pull(&mut self) -> Result<Option<Bytes>> {
        // each write moves at most one internal window of output into the Vec
        while self.decoder.get_ref().len() < self.chunk_size && !self.input.is_empty() {
            let n = self.decoder.write(&self.input).map_err(FetchError::Decompress)?;
            if n == 0 {
                return Err(decompress_err("gzip decoder made no progress"));
            }
            self.input.advance(n);
        }

        if self.closed && self.input.is_empty() && !self.flushed {
            self.flushed = true;
            self.decoder.try_finish().map_err(FetchError::Decompress)?;
        }

        let buffered = self.decoder.get_mut();
        if buffered.is_empty() {
            return Ok(None);
        }
        let rest = buffered.split_off(buffered.len().min(self.chunk_size));
        Ok(Some(Bytes::from(std::mem::replace(buffered, rest))))
    }
}
