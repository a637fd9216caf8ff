use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::board::RunId;
use crate::checker::Verifier;
use crate::{Reference, Verification};

/// A resolved check, addressed by the reference's position in its run.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub run: RunId,
    pub index: usize,
    pub verification: Verification,
}

/// The tasks spawned by one [`dispatch`] call.
///
/// Dropping the handle does not cancel anything: dispatched checks always
/// run to completion.
pub struct RunHandle {
    run: RunId,
    tasks: Vec<JoinHandle<()>>,
}

impl RunHandle {
    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait until every task of the run has reported.
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(run = %self.run, error = %e, "verification task failed");
            }
        }
    }
}

/// Check every reference concurrently, one task per reference.
///
/// Returns as soon as the tasks are spawned. Each task calls `sink` exactly
/// once with its index when its check resolves; completions arrive in no
/// particular order. Must be called from within a tokio runtime.
pub fn dispatch(
    references: Vec<Reference>,
    verifier: Arc<Verifier>,
    run: RunId,
    sink: impl Fn(StatusUpdate) + Send + Sync + 'static,
) -> RunHandle {
    let sink = Arc::new(sink);
    let total = references.len();

    let tasks = references
        .into_iter()
        .enumerate()
        .map(|(index, reference)| {
            let verifier = Arc::clone(&verifier);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let verification = verifier.verify(&reference).await;
                tracing::info!(
                    %run,
                    index,
                    total,
                    title = reference.title().unwrap_or("-"),
                    strategy = %verification.strategy,
                    status = %verification.status,
                    "reference checked"
                );
                sink(StatusUpdate {
                    run,
                    index,
                    verification,
                });
            })
        })
        .collect();

    RunHandle { run, tasks }
}
