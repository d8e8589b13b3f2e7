use std::collections::HashMap;
use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinSet};

use crate::model::DocumentId;

/// Deferred cursor updates of one document, run one after another.
#[derive(Default)]
struct DocQueue {
    set: JoinSet<()>,
    /// Resolves once the most recently spawned task has finished or been aborted.
    tail: Option<oneshot::Receiver<()>>,
}

/// Deferred cursor updates still waiting to apply, grouped by document.
///
/// Tasks of one document start in spawn order, whatever order the runtime
/// polls them in. Dropping the collection aborts everything in it.
#[derive(Default)]
pub struct CursorTasks {
    per_doc: HashMap<DocumentId, DocQueue>,
    spawned_total: u64,
}

impl CursorTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, doc: DocumentId, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        let queue = self.per_doc.entry(doc).or_default();
        let (done, tail) = oneshot::channel::<()>();
        let previous = queue.tail.replace(tail);
        queue.set.spawn(async move {
            // Dropped when this task ends, which releases the next one.
            let _done = done;
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            task.await;
        });
        self.spawned_total += 1;
    }

    /// Collect finished tasks without waiting.
    pub fn reap(&mut self) {
        for queue in self.per_doc.values_mut() {
            while let Some(result) = queue.set.try_join_next() {
                log_join(result);
            }
        }
        self.per_doc.retain(|_, queue| !queue.set.is_empty());
    }

    pub fn pending(&self) -> usize {
        self.per_doc.values().map(|queue| queue.set.len()).sum()
    }

    pub fn pending_for(&self, doc: DocumentId) -> usize {
        self.per_doc.get(&doc).map_or(0, |queue| queue.set.len())
    }

    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// Wait for every pending update of `doc`.
    pub async fn join_document(&mut self, doc: DocumentId) {
        if let Some(mut queue) = self.per_doc.remove(&doc) {
            while let Some(result) = queue.set.join_next().await {
                log_join(result);
            }
        }
    }

    /// Wait for every pending update.
    pub async fn join_all(&mut self) {
        let queues: Vec<DocQueue> = self.per_doc.drain().map(|(_, queue)| queue).collect();
        for mut queue in queues {
            while let Some(result) = queue.set.join_next().await {
                log_join(result);
            }
        }
    }

    /// Abandon every pending update.
    pub fn abort_all(&mut self) {
        for queue in self.per_doc.values_mut() {
            queue.set.abort_all();
        }
        self.per_doc.clear();
    }
}

fn log_join(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(err) if err.is_cancelled() => {}
        Err(err) => tracing::error!("cursor update task panicked: {err}"),
    }
}
