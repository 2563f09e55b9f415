use leafgate_fetch::HttpClient;

use super::log::{AppendStatus, LogError, TransparencyLog};
use crate::data::{Entry, Leaf, Phase, Progress, VerifyOptions};
use crate::error::Result;

/// Drives an [`Entry`] through validation, content resolution and
/// verification, producing a [`Leaf`] or the first error met.
///
/// # Examples
///
/// ```no_run
/// use leafgate_entry::{Entry, EntryAssembler, VerifyOptions};
/// use leafgate_fetch::ReqwestClient;
///
/// # async fn example(signature: Vec<u8>, key: Vec<u8>) -> leafgate_entry::Result<()> {
/// let assembler = EntryAssembler::new(ReqwestClient::new()?, VerifyOptions::default());
/// let entry = Entry::inline(&b"hello"[..]).signature(signature).public_key(key);
/// let leaf = assembler.assemble(entry).await?;
/// println!("{}", leaf.sha());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EntryAssembler<C> {
    client:  C,
    options: VerifyOptions,
}

impl<C: HttpClient> EntryAssembler<C> {
    pub fn new(client: C, options: VerifyOptions) -> Self { Self { client, options } }

    pub fn client(&self) -> &C { &self.client }

    pub fn options(&self) -> &VerifyOptions { &self.options }

    pub async fn assemble(&self, entry: Entry) -> Result<Leaf> {
        self.options.report(Progress::new(Phase::Created));
        let result = self.run(entry).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "entry rejected");
            self.options.report(Progress::new(Phase::Failed));
        }
        result
    }

    async fn run(&self, entry: Entry) -> Result<Leaf> {
        let validated = entry.validate(self.options.url_policy)?;
        self.options.report(Progress::new(Phase::StructurallyValidated));

        let resolved = validated.resolve(&self.client, self.options.chunk_size).await?;
        tracing::debug!(kind = resolved.content_kind().mime(), "content resolved");
        self.options.report(Progress::new(Phase::ContentResolved));

        let leaf = resolved.verify(self.options.buffer_chunks).await?;
        self.options.report(Progress {
            phase:         Phase::Verified,
            content_bytes: leaf.content_len(),
        });
        tracing::info!(sha = %leaf.sha(), bytes = leaf.content_len(), "entry verified");
        Ok(leaf)
    }

    /// Assemble the entry and append the resulting leaf to `log`.
    ///
    /// Statuses other than OK and already-exists are reported as
    /// [`LogError::Rejected`].
    pub async fn submit<L: TransparencyLog>(&self, entry: Entry, log: &L) -> Result<(Leaf, AppendStatus)> {
        let leaf = self.assemble(entry).await?;
        let status = log.append(&leaf).await?;
        tracing::info!(%status, "log append");
        match status {
            AppendStatus::Ok | AppendStatus::AlreadyExists => Ok((leaf, status)),
            other => Err(LogError::Rejected(other).into()),
        }
    }
}
