use std::process::Stdio;
use tokio::process::Command;

use crate::config::ExecutorConfig;
use crate::scheduler::{Job, JobStatus};

/// Result of job execution
#[derive(Debug)]
pub struct ExecutionResult {
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    /// Set on failure: captured stderr, or the exit status.
    pub error: Option<String>,
}

/// Runs job commands through the platform shell and reports their exit status.
#[derive(Debug, Clone, Default)]
pub struct JobExecutor {
    config: ExecutorConfig,
}

impl JobExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Execute a job's command, waiting for the process to exit
    pub async fn execute(&self, job: &Job) -> ExecutionResult {
        tracing::debug!(input_id = %job.input_id, command = %job.command, "Executing job");

        let mut cmd = shell_command(&job.command);

        if self.config.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            let result = cmd.output().await;
            Self::process_output(job, result)
        } else {
            let result = cmd.status().await;
            Self::process_status(job, result)
        }
    }

    fn process_output(
        job: &Job,
        result: Result<std::process::Output, std::io::Error>,
    ) -> ExecutionResult {
        match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let exit_code = output.status.code();

                let (status, error) = if output.status.success() {
                    (JobStatus::Passed, None)
                } else {
                    (
                        JobStatus::Failed,
                        Some(if stderr.is_empty() {
                            format!("Exit code: {:?}", exit_code)
                        } else {
                            stderr.into_owned()
                        }),
                    )
                };

                if !stdout.is_empty() {
                    tracing::debug!(input_id = %job.input_id, output = %stdout.trim_end(), "Job output");
                }
                Self::log_outcome(job, status, exit_code);

                ExecutionResult {
                    status,
                    exit_code,
                    error,
                }
            }
            Err(e) => Self::spawn_failure(job, e),
        }
    }

    fn process_status(
        job: &Job,
        result: Result<std::process::ExitStatus, std::io::Error>,
    ) -> ExecutionResult {
        match result {
            Ok(exit) => {
                let exit_code = exit.code();
                let (status, error) = if exit.success() {
                    (JobStatus::Passed, None)
                } else {
                    (
                        JobStatus::Failed,
                        Some(format!("Exit code: {:?}", exit_code)),
                    )
                };
                Self::log_outcome(job, status, exit_code);
                ExecutionResult {
                    status,
                    exit_code,
                    error,
                }
            }
            Err(e) => Self::spawn_failure(job, e),
        }
    }

    fn log_outcome(job: &Job, status: JobStatus, exit_code: Option<i32>) {
        match status {
            JobStatus::Passed => {
                tracing::debug!(input_id = %job.input_id, status = %status, "Job completed");
            }
            JobStatus::Failed => {
                tracing::warn!(
                    input_id = %job.input_id,
                    status = %status,
                    exit_code = ?exit_code,
                    "Job completed"
                );
            }
        }
    }

    fn spawn_failure(job: &Job, e: std::io::Error) -> ExecutionResult {
        tracing::error!(input_id = %job.input_id, error = %e, "Job execution failed");
        ExecutionResult {
            status: JobStatus::Failed,
            exit_code: None,
            error: Some(e.to_string()),
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
