pub mod job;
pub mod queue;
pub mod sink;

pub use job::{FailedJob, Job, JobStatus, QueueItem};
pub use queue::JobQueue;
pub use sink::ResultSink;
