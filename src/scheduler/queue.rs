use tokio::sync::{mpsc, Mutex};

use crate::scheduler::job::{Job, QueueItem};

/// Unbounded FIFO shared by every worker of a run.
///
/// All jobs and terminators are pushed before the workers start, so the queue
/// never needs backpressure. Each pushed item is popped by exactly one caller.
#[derive(Debug)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    rx: Mutex<mpsc::UnboundedReceiver<QueueItem>>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Append an item to the back of the queue.
    pub fn push(&self, item: impl Into<QueueItem>) {
        // The receiver lives as long as `self`, so the channel cannot be closed here.
        if self.tx.send(item.into()).is_err() {
            tracing::error!("Job queue receiver closed, item dropped");
        }
    }

    /// Push every job followed by one terminator per worker.
    pub fn seed(&self, jobs: impl IntoIterator<Item = Job>, worker_count: usize) {
        for job in jobs {
            self.push(job);
        }
        for _ in 0..worker_count {
            self.push(QueueItem::Terminate);
        }
    }

    /// Remove the item at the front, waiting until one is available.
    pub async fn pop(&self) -> QueueItem {
        let mut rx = self.rx.lock().await;
        // `self.tx` keeps the channel open, so `None` is unreachable; treat it
        // as a terminator so a worker can never spin.
        rx.recv().await.unwrap_or(QueueItem::Terminate)
    }

    /// Remove the front item if one is queued right now.
    pub fn try_pop(&self) -> Option<QueueItem> {
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }
}
