//! Structured task group with first-error cancellation.

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Tasks spawned together and awaited together.
///
/// The first task to fail with anything but [`Error::Cancelled`] cancels
/// the shared token. [`wait`](Self::wait) settles every task and reports
/// the error of the earliest-spawned failing task, so the outcome does not
/// depend on which failure the scheduler saw first.
pub struct TaskGroup {
    tasks: JoinSet<(usize, Result<()>)>,
    token: CancellationToken,
    next:  usize,
}

impl Default for TaskGroup {
    fn default() -> Self { Self::new() }
}

impl TaskGroup {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            token: CancellationToken::new(),
            next:  0,
        }
    }

    /// Token cancelled when any task in the group fails.
    pub fn token(&self) -> CancellationToken { self.token.clone() }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let index = self.next;
        self.next += 1;
        let token = self.token.clone();
        self.tasks.spawn(async move {
            let result = task.await;
            match &result {
                Ok(()) | Err(Error::Cancelled) => {}
                Err(e) => {
                    tracing::debug!(task = index, error = %e, "task failed, cancelling group");
                    token.cancel();
                }
            }
            (index, result)
        });
    }

    /// Wait for every task to finish.
    pub async fn wait(mut self) -> Result<()> {
        let mut first: Option<(usize, Error)> = None;
        let mut cancelled = false;

        while let Some(joined) = self.tasks.join_next().await {
            let (index, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => {
                    cancelled = true;
                    continue;
                }
            };
            match result {
                Ok(()) => {}
                Err(Error::Cancelled) => cancelled = true,
                Err(e) => {
                    if first.as_ref().is_none_or(|(earliest, _)| index < *earliest) {
                        first = Some((index, e));
                    }
                }
            }
        }

        match first {
            Some((_, e)) => Err(e),
            None if cancelled => Err(Error::Cancelled),
            None => Ok(()),
        }
    }
}
