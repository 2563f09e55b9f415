use bytes::Bytes;
use leafgate_fetch::{ContentKind, ContentSource, ContentStream, HttpClient};
use leafgate_verify::Sha256Hex;

use super::{Leaf, Submission, UrlHashPolicy};
use crate::core::SigningMaterial;
use crate::error::{MalformedInput, Result};
use crate::pipeline;

/// A submission as received, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub data:       Bytes,
    pub url:        String,
    pub sha:        String,
    pub signature:  Bytes,
    pub public_key: Bytes,
}

impl From<Submission> for Entry {
    fn from(submission: Submission) -> Self {
        Self {
            data:       submission.data.into(),
            url:        submission.url,
            sha:        submission.sha,
            signature:  submission.signature.into(),
            public_key: submission.public_key.into(),
        }
    }
}

impl Entry {
    pub fn inline(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = sha.into();
        self
    }

    #[must_use]
    pub fn signature(mut self, signature: impl Into<Bytes>) -> Self {
        self.signature = signature.into();
        self
    }

    #[must_use]
    pub fn public_key(mut self, public_key: impl Into<Bytes>) -> Self {
        self.public_key = public_key.into();
        self
    }

    /// Check structure without touching the network: the declared digest,
    /// then the signature, then the key, then the content reference.
    pub fn validate(self, policy: UrlHashPolicy) -> Result<ValidatedEntry> {
        let declared = match self.sha.as_str() {
            "" => None,
            sha => Some(Sha256Hex::from_hex(sha).map_err(MalformedInput::InvalidSha)?),
        };
        let material = SigningMaterial::load(&self.signature, &self.public_key)?;

        let content = match (self.data.is_empty(), self.url.is_empty()) {
            (true, true) => return Err(MalformedInput::MissingContent.into()),
            (false, false) => return Err(MalformedInput::AmbiguousContent.into()),
            (false, true) => ContentSource::Inline(self.data),
            (true, false) => {
                if declared.is_none() && policy == UrlHashPolicy::RequirePinned {
                    return Err(MalformedInput::UnpinnedUrl.into());
                }
                ContentSource::Remote(self.url)
            }
        };

        Ok(ValidatedEntry {
            content,
            declared,
            material,
            signature: self.signature,
            public_key: self.public_key,
        })
    }
}

/// Structure checked, content not yet opened.
#[derive(Debug)]
pub struct ValidatedEntry {
    content:    ContentSource,
    declared:   Option<Sha256Hex>,
    material:   SigningMaterial,
    signature:  Bytes,
    public_key: Bytes,
}

impl ValidatedEntry {
    pub fn content(&self) -> &ContentSource { &self.content }

    pub fn declared_sha(&self) -> Option<&Sha256Hex> { self.declared.as_ref() }

    pub fn material(&self) -> &SigningMaterial { &self.material }

    /// Open the content. For a URL this issues the request, so a failing
    /// fetch surfaces here, before any digest or signature work.
    pub async fn resolve<C: HttpClient>(self, client: &C, chunk_size: usize) -> Result<ResolvedEntry> {
        let stream = self.content.open(client, chunk_size).await?;
        Ok(ResolvedEntry {
            stream,
            declared: self.declared,
            material: self.material,
            signature: self.signature,
            public_key: self.public_key,
        })
    }
}

/// Content opened and ready to be read once.
pub struct ResolvedEntry {
    stream:     ContentStream,
    declared:   Option<Sha256Hex>,
    material:   SigningMaterial,
    signature:  Bytes,
    public_key: Bytes,
}

impl ResolvedEntry {
    pub fn content_kind(&self) -> ContentKind { self.stream.kind() }

    /// Read the content once, digesting and checking the signature
    /// concurrently. `buffer_chunks` bounds each consumer's queue.
    pub async fn verify(self, buffer_chunks: usize) -> Result<Leaf> {
        let outcome = pipeline::verify_stream(self.stream, self.declared, &self.material, buffer_chunks).await?;
        Ok(Leaf::new(
            outcome.sha,
            self.signature,
            self.public_key,
            self.material.key_ring().clone(),
            self.material.is_armored_signature(),
            outcome.content_bytes,
        ))
    }
}
