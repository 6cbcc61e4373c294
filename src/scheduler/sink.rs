use parking_lot::Mutex;

use crate::console::Console;
use crate::scheduler::job::{FailedJob, Job, JobStatus};
use crate::worker::executor::ExecutionResult;

/// Completion and failure bookkeeping for one configuration run.
///
/// Workers append, the coordinator reads. The lists have their own locks;
/// the console lock is taken only to print a failure diagnostic.
#[derive(Debug)]
pub struct ResultSink {
    completed: Mutex<Vec<String>>,
    failed: Mutex<Vec<FailedJob>>,
    console: Console,
}

impl ResultSink {
    pub fn new(console: Console) -> Self {
        Self {
            completed: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
            console,
        }
    }

    /// Record the outcome of one job.
    ///
    /// A failure is appended (then printed) before the job counts as
    /// completed, so once `completed_count` reaches the job total every
    /// failure is already visible.
    pub fn record(&self, job: Job, result: &ExecutionResult) {
        if result.status == JobStatus::Failed {
            let failed = FailedJob {
                input_id: job.input_id.clone(),
                command: job.command,
                exit_code: result.exit_code,
                error: result.error.clone(),
            };
            self.failed.lock().push(failed.clone());
            self.report_failure(&failed);
        }
        self.completed.lock().push(job.input_id);
    }

    fn report_failure(&self, failed: &FailedJob) {
        if let Some(ref error) = failed.error {
            tracing::warn!(
                input_id = %failed.input_id,
                exit_code = ?failed.exit_code,
                error = %error.trim_end(),
                "Regression test failed"
            );
        }
        let header = format!(
            "Failed to run regression test for clip: {}",
            failed.input_id
        );
        if let Err(e) = self.console.lines(&[&header, &failed.command]) {
            tracing::warn!(input_id = %failed.input_id, error = %e, "Failed to print failure diagnostic");
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed.lock().len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.lock().len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.lock().is_empty()
    }

    /// Input ids of every finished job, in completion order.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    pub fn failed(&self) -> Vec<FailedJob> {
        self.failed.lock().clone()
    }
}
