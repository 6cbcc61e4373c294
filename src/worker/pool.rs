use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

use crate::scheduler::{JobQueue, QueueItem, ResultSink};
use crate::worker::executor::JobExecutor;

/// A fixed set of workers draining one [`JobQueue`] into one [`ResultSink`].
///
/// Every worker exits after dequeuing exactly one terminator, so the pool
/// needs no shared "done" flag.
#[derive(Debug)]
pub struct WorkerPool {
    workers: JoinSet<usize>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers. Must be called from within a tokio runtime.
    pub fn spawn(
        worker_count: usize,
        queue: Arc<JobQueue>,
        sink: Arc<ResultSink>,
        executor: JobExecutor,
    ) -> Self {
        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let queue = queue.clone();
            let sink = sink.clone();
            let executor = executor.clone();
            workers.spawn(async move {
                Self::worker_loop(worker_id, queue, sink, executor).await;
                worker_id
            });
        }
        tracing::debug!(worker_count, "Worker pool started");
        Self { workers }
    }

    /// Dequeue and execute jobs until a terminator arrives.
    async fn worker_loop(
        worker_id: usize,
        queue: Arc<JobQueue>,
        sink: Arc<ResultSink>,
        executor: JobExecutor,
    ) {
        let mut processed = 0usize;
        loop {
            match queue.pop().await {
                QueueItem::Terminate => {
                    tracing::debug!(worker_id, processed, "Worker received terminator");
                    return;
                }
                QueueItem::Job(job) => {
                    let result = executor.execute(&job).await;
                    sink.record(job, &result);
                    processed += 1;
                }
            }
        }
    }

    /// Number of workers that have not exited yet.
    pub fn alive(&self) -> usize {
        self.workers.len()
    }

    pub fn is_finished(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for the next worker to exit, yielding its id.
    ///
    /// Returns `None` once every worker has exited. Cancel safe.
    pub async fn join_next(&mut self) -> Option<Result<usize, JoinError>> {
        self.workers.join_next().await
    }

    /// Wait for every remaining worker, logging any that panicked.
    pub async fn join_all(&mut self) {
        while let Some(joined) = self.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker terminated abnormally");
            }
        }
    }

    /// Stop tracking the workers without waiting for or aborting them.
    ///
    /// In-flight commands keep running as detached background work; nothing
    /// they record afterwards is read.
    pub fn abandon(mut self) {
        let alive = self.workers.len();
        self.workers.detach_all();
        tracing::debug!(alive, "Worker pool abandoned");
    }
}
