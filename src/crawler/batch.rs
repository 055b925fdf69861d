//! Batch-and-join task execution
//!
//! Items are split into fixed-size batches. Every item of a batch runs as its
//! own tokio task; the next batch is only started once all tasks of the
//! current one have finished, successfully or not.

use std::future::Future;
use tokio::task::JoinError;

/// Runs tasks in sequential batches of concurrent tasks
#[derive(Debug, Clone, Copy)]
pub struct TaskGroup {
    batch_size: usize,
}

impl TaskGroup {
    /// Creates a task group; a batch size of zero is treated as one
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches needed for `items` items
    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }

    /// Spawns `task` for every item, batch by batch
    ///
    /// # Arguments
    ///
    /// * `items` - Work items, processed in order
    /// * `task` - Builds the future for one item
    ///
    /// # Returns
    ///
    /// One entry per item, in item order. A task that panicked or was
    /// cancelled yields its `JoinError` without affecting its siblings.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, mut task: F) -> Vec<Result<T, JoinError>>
    where
        F: FnMut(I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let total = self.batch_count(items.len());
        let mut results = Vec::with_capacity(items.len());
        let mut items = items.into_iter().peekable();
        let mut batch = 0;

        while items.peek().is_some() {
            batch += 1;
            let handles: Vec<_> = items
                .by_ref()
                .take(self.batch_size)
                .map(|item| tokio::spawn(task(item)))
                .collect();

            tracing::info!(batch, of = total, tasks = handles.len(), "Batch started");

            for handle in handles {
                results.push(handle.await);
            }

            tracing::debug!(batch, of = total, "Batch joined");
        }

        results
    }
}
