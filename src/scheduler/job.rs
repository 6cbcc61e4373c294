use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Passed => write!(f, "passed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One validation unit: a corpus input and the exact command that checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input_id: String,
    pub command: String,
}

impl Job {
    pub fn new(input_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            input_id: input_id.into(),
            command: command.into(),
        }
    }
}

/// Entry in the job queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    Job(Job),
    /// Tells the worker that dequeues it to exit. One is queued per worker.
    Terminate,
}

impl From<Job> for QueueItem {
    fn from(job: Job) -> Self {
        QueueItem::Job(job)
    }
}

/// A job whose command exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    pub input_id: String,
    pub command: String,
    pub exit_code: Option<i32>,
    /// Captured stderr, or the exit status when the command printed nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
