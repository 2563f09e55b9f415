//! One-to-N fan-out of a chunk stream over bounded channels.

use bytes::Bytes;
use tokio::sync::mpsc;

#[derive(Debug)]
enum Frame {
    Data(Bytes),
    End,
}

/// An output was dropped before the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tee output closed before end of stream")]
pub struct Closed;

/// The tee was dropped without signalling the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tee input dropped before end of stream")]
pub struct Aborted;

/// Create a tee with `N` outputs, each queueing at most `capacity` chunks.
pub fn tee<const N: usize>(capacity: usize) -> (Tee, [TeeReceiver; N]) {
    let mut outputs = Vec::with_capacity(N);
    let receivers = std::array::from_fn(|_| {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        outputs.push(tx);
        TeeReceiver { rx, ended: false }
    });
    (Tee { outputs }, receivers)
}

/// Writing half. Every chunk goes to every output, in order; a full output
/// holds the writer back until its reader catches up.
#[derive(Debug)]
pub struct Tee {
    outputs: Vec<mpsc::Sender<Frame>>,
}

impl Tee {
    pub async fn send(&self, chunk: Bytes) -> Result<(), Closed> {
        for output in &self.outputs {
            output.send(Frame::Data(chunk.clone())).await.map_err(|_| Closed)?;
        }
        Ok(())
    }

    /// Mark the end of the stream on every output.
    pub async fn finish(self) -> Result<(), Closed> {
        for output in &self.outputs {
            output.send(Frame::End).await.map_err(|_| Closed)?;
        }
        Ok(())
    }
}

/// Reading half owned by one consumer.
#[derive(Debug)]
pub struct TeeReceiver {
    rx:    mpsc::Receiver<Frame>,
    ended: bool,
}

impl TeeReceiver {
    /// Next chunk, `Ok(None)` once the writer finished, or [`Aborted`] if it
    /// went away without finishing.
    pub async fn recv(&mut self) -> Result<Option<Bytes>, Aborted> {
        if self.ended {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(Frame::Data(chunk)) => Ok(Some(chunk)),
            Some(Frame::End) => {
                self.ended = true;
                Ok(None)
            }
            None => Err(Aborted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_output_sees_every_chunk_in_order() {
        let (tee, [mut a, mut b]) = tee::<2>(4);
        for word in ["one", "two", "three"] {
            tee.send(Bytes::from(word)).await.unwrap();
        }
        tee.finish().await.unwrap();

        for rx in [&mut a, &mut b] {
            let mut seen = Vec::new();
            while let Some(chunk) = rx.recv().await.unwrap() {
                seen.push(chunk);
            }
            assert_eq!(seen, vec!["one", "two", "three"]);
            assert_eq!(rx.recv().await, Ok(None));
        }
    }

    #[tokio::test]
    async fn dropped_writer_aborts_readers() {
        let (tee, [mut rx]) = tee::<1>(2);
        tee.send(Bytes::from_static(b"x")).await.unwrap();
        drop(tee);
        assert_eq!(rx.recv().await, Ok(Some(Bytes::from_static(b"x"))));
        assert_eq!(rx.recv().await, Err(Aborted));
    }

    #[tokio::test]
    async fn dropped_reader_closes_writer() {
        let (tee, [a, _b]) = tee::<2>(2);
        drop(a);
        assert_eq!(tee.send(Bytes::from_static(b"x")).await, Err(Closed));
    }

    #[tokio::test]
    async fn full_output_applies_back_pressure() {
        let (tee, [mut slow]) = tee::<1>(1);
        tee.send(Bytes::from_static(b"1")).await.unwrap();

        let blocked = tokio::time::timeout(std::time::Duration::from_millis(50), tee.send(Bytes::from_static(b"2"))).await;
        assert!(blocked.is_err(), "second send should wait for the reader");

        assert_eq!(slow.recv().await, Ok(Some(Bytes::from_static(b"1"))));
        tee.send(Bytes::from_static(b"3")).await.unwrap();
        assert_eq!(slow.recv().await, Ok(Some(Bytes::from_static(b"3"))));
    }
}
