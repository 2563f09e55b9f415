//! The streaming dual verifier.
//!
//! One producer reads the content stream and pushes each chunk through a
//! [`Tee`] to two consumers running as sibling tasks in a [`TaskGroup`]:
//!
//! ```text
//!                      ┌──▶ digest consumer ──── sha ──▶ orchestrator
//! content ─▶ producer ─┤
//!                      └──▶ signature consumer
//! ```
//!
//! Consumers take frames already queued before they look at the
//! cancellation token, so a consumer that has its end-of-stream waiting
//! always reaches its own verdict.

mod group;
mod tee;

use bytes::Bytes;
use leafgate_fetch::ContentStream;
use leafgate_sig::SignatureVerifier;
use leafgate_verify::{DigestSink, Sha256Hex};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub use self::group::TaskGroup;
pub use self::tee::{Aborted, Closed, Tee, TeeReceiver, tee};
use crate::core::SigningMaterial;
use crate::error::{Error, Result};

/// What a successful pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutcome {
    pub sha:           Sha256Hex,
    pub content_bytes: u64,
}

/// Read `content` once, computing its SHA-256 and checking the detached
/// signature in `material` over the same bytes.
///
/// A declared digest must match the computed one. At most one error is
/// returned; errors from tasks cancelled by that failure are dropped.
pub async fn verify_stream(
    content: ContentStream,
    declared: Option<Sha256Hex>,
    material: &SigningMaterial,
    buffer_chunks: usize,
) -> Result<StreamOutcome> {
    let mut group = TaskGroup::new();
    let token = group.token();
    let (tee, [digest_rx, signature_rx]) = tee::<2>(buffer_chunks);
    let (sha_tx, sha_rx) = oneshot::channel();

    group.spawn(produce(content, tee, token.clone()));
    group.spawn(digest(digest_rx, declared, sha_tx, token.clone()));
    group.spawn(check_signature(signature_rx, material.verifier(), token));

    let outcome = sha_rx.await;
    group.wait().await?;
    outcome.map_err(|_| Error::Cancelled)
}

async fn produce(mut content: ContentStream, tee: Tee, token: CancellationToken) -> Result<()> {
    loop {
        let chunk = tokio::select! {
            _ = token.cancelled() => return Err(Error::Cancelled),
            chunk = content.next_chunk() => chunk?,
        };
        let Some(chunk) = chunk else { break };

        tokio::select! {
            _ = token.cancelled() => return Err(Error::Cancelled),
            sent = tee.send(chunk) => sent.map_err(|_| Error::Cancelled)?,
        }
    }

    tokio::select! {
        _ = token.cancelled() => return Err(Error::Cancelled),
        sent = tee.finish() => sent.map_err(|_| Error::Cancelled)?,
    }
    tracing::trace!(
        kind = content.kind().mime(),
        source_bytes = content.bytes_in(),
        content_bytes = content.bytes_out(),
        "content stream exhausted"
    );
    Ok(())
}

async fn digest(
    mut rx: TeeReceiver,
    declared: Option<Sha256Hex>,
    result: oneshot::Sender<StreamOutcome>,
    token: CancellationToken,
) -> Result<()> {
    let mut sink = DigestSink::sha256();
    while let Some(chunk) = next_frame(&mut rx, &token).await? {
        sink.update(&chunk);
    }

    let content_bytes = sink.bytes_processed();
    let sha = sink.finish(declared.as_ref()).inspect_err(|e| tracing::warn!(error = %e, "digest rejected"))?;
    tracing::debug!(%sha, content_bytes, "digest computed");
    // the orchestrator only drops the receiver when it is itself going away
    let _ = result.send(StreamOutcome { sha, content_bytes });
    Ok(())
}

async fn check_signature(mut rx: TeeReceiver, mut verifier: SignatureVerifier, token: CancellationToken) -> Result<()> {
    while let Some(chunk) = next_frame(&mut rx, &token).await? {
        verifier.update(&chunk);
    }
    verifier.finish().map_err(|e| {
        tracing::warn!(error = %e, "signature rejected");
        Error::SignatureInvalid(e)
    })
}

async fn next_frame(rx: &mut TeeReceiver, token: &CancellationToken) -> Result<Option<Bytes>> {
    tokio::select! {
        biased;
        frame = rx.recv() => frame.map_err(|_| Error::Cancelled),
        _ = token.cancelled() => Err(Error::Cancelled),
    }
}
