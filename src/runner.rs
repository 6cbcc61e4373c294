//! Regression run coordinator.
//!
//! For each configuration the coordinator walks through four states:
//!
//! 1. **Preparing**: build one [`Job`] per corpus clip
//! 2. **Dispatching**: seed a fresh [`JobQueue`] with the jobs plus one
//!    terminator per worker, then spawn the [`WorkerPool`]
//! 3. **Running**: redraw progress on a fixed cadence until every worker has
//!    exited, or abort on cancellation
//! 4. **Verdict**: turn the [`ResultSink`] into a [`RunReport`]
//!
//! Configurations run strictly one after another, each with its own queue
//! and sink, and a failing configuration never stops the ones after it.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::RegressionConfig;
use crate::console::Console;
use crate::corpus::Corpus;
use crate::error::{RegressError, Result};
use crate::progress::ProgressReporter;
use crate::scheduler::{FailedJob, Job, JobQueue, ResultSink};
use crate::worker::{JobExecutor, WorkerPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail => write!(f, "fail"),
        }
    }
}

/// Outcome of running one configuration over the whole corpus.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub config_id: String,
    pub total: usize,
    pub completed: Vec<String>,
    pub failed: Vec<FailedJob>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl RunReport {
    /// Pass iff nothing failed and every submitted job was recorded.
    pub fn verdict(&self) -> Verdict {
        if self.failed.is_empty() && self.completed.len() == self.total {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Submitted jobs that were never recorded (a worker died mid-job).
    pub fn missing(&self) -> usize {
        self.total.saturating_sub(self.completed.len())
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Reports for every configuration of a regression run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegressionSummary {
    pub reports: Vec<RunReport>,
}

impl RegressionSummary {
    pub fn passed(&self) -> bool {
        self.reports.iter().all(|r| r.verdict() == Verdict::Pass)
    }

    pub fn failed_configs(&self) -> impl Iterator<Item = &RunReport> {
        self.reports.iter().filter(|r| r.verdict() == Verdict::Fail)
    }

    /// Process exit status for this summary.
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Format as `HHh MMm SS.SSs`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0).floor();
    let rem = total - hours * 3600.0;
    let minutes = (rem / 60.0).floor();
    let seconds = rem - minutes * 60.0;
    format!("{:0>2}h {:0>2}m {:05.2}s", hours as u64, minutes as u64, seconds)
}

/// File name of a configuration path, for console output.
pub fn display_name(config_id: &str) -> String {
    Path::new(config_id)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config_id.to_string())
}

/// Drives regression runs over a corpus.
#[derive(Debug, Clone)]
pub struct RegressionRunner {
    config: RegressionConfig,
    executor: JobExecutor,
    console: Console,
}

impl RegressionRunner {
    pub fn new(config: RegressionConfig, console: Console) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor: JobExecutor::new(config.executor.clone()),
            config,
            console,
        })
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Fail fast on anything that would make every job fail.
    pub fn check_environment(&self, corpus: &Corpus) -> Result<()> {
        if corpus.clips.is_empty() {
            return Err(RegressError::NoClips("corpus".to_string()));
        }
        if corpus.configs.is_empty() {
            return Err(RegressError::NoConfigs("corpus".to_string()));
        }
        let compressor = &self.config.command.compressor;
        if !compressor.exists() {
            return Err(RegressError::CompressorNotFound(compressor.clone()));
        }
        Ok(())
    }

    /// One job per clip under `config_id`, in corpus order.
    pub fn build_jobs(&self, clips: &[String], config_id: &str) -> Vec<Job> {
        clips
            .iter()
            .map(|clip| Job::new(clip.clone(), self.config.command.render(clip, config_id)))
            .collect()
    }

    /// Run every configuration in turn and collect their reports.
    ///
    /// Returns an error only for environment problems (before any worker
    /// starts) and for cancellation; failing jobs show up in the summary.
    pub async fn run(
        &self,
        corpus: &Corpus,
        cancel: &CancellationToken,
    ) -> Result<RegressionSummary> {
        self.check_environment(corpus)?;
        if cancel.is_cancelled() {
            return Err(RegressError::Cancelled);
        }
        self.say("Running regression tests ...");

        let mut summary = RegressionSummary::default();
        for config_id in &corpus.configs {
            let report = self
                .run_configuration(&corpus.clips, config_id, cancel)
                .await?;
            summary.reports.push(report);
        }

        tracing::info!(
            configs = summary.reports.len(),
            failed_configs = summary.failed_configs().count(),
            "Regression run finished"
        );
        Ok(summary)
    }

    /// Run the whole corpus under one configuration.
    pub async fn run_configuration(
        &self,
        clips: &[String],
        config_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        // Nothing is spawned for a run cancelled before it started.
        if cancel.is_cancelled() {
            return Err(RegressError::Cancelled);
        }
        let run_id = Uuid::new_v4();
        let worker_count = self.config.worker_count;
        self.say(&format!(
            "Performing regression tests for configuration: {}",
            display_name(config_id)
        ));
        tracing::info!(
            run_id = %run_id,
            config = config_id,
            clips = clips.len(),
            worker_count,
            "Configuration run started"
        );

        let started_at = Utc::now();
        let start = Instant::now();

        // Preparing
        let jobs = self.build_jobs(clips, config_id);
        let total = jobs.len();

        // Dispatching
        let queue = Arc::new(JobQueue::new());
        let sink = Arc::new(ResultSink::new(self.console.clone()));
        queue.seed(jobs, worker_count);
        let mut pool = WorkerPool::spawn(
            worker_count,
            queue.clone(),
            sink.clone(),
            self.executor.clone(),
        );

        // Running
        let mut reporter =
            ProgressReporter::new(self.console.clone(), self.config.progress.clone(), total);
        self.draw(&mut reporter, 0);

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; the initial line is already drawn.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::warn!(
                        run_id = %run_id,
                        alive = pool.alive(),
                        "Cancellation requested, abandoning workers"
                    );
                    if let Err(e) = self.console.end_line() {
                        tracing::debug!(error = %e, "Failed to close progress line");
                    }
                    pool.abandon();
                    return Err(RegressError::Cancelled);
                }

                joined = pool.join_next() => match joined {
                    Some(Ok(worker_id)) => {
                        tracing::debug!(
                            run_id = %run_id,
                            worker_id,
                            alive = pool.alive(),
                            "Worker exited"
                        );
                    }
                    Some(Err(e)) => {
                        tracing::error!(run_id = %run_id, error = %e, "Worker terminated abnormally");
                    }
                    None => break,
                },

                _ = ticker.tick() => {
                    self.draw(&mut reporter, sink.completed_count());
                }
            }
        }

        if let Err(e) = reporter.finish(sink.completed_count()) {
            tracing::warn!(error = %e, "Failed to write progress");
        }
        if let Some(item) = queue.try_pop() {
            tracing::warn!(run_id = %run_id, ?item, "Items left in queue after all workers exited");
        }

        // Verdict
        let elapsed = start.elapsed();
        let report = RunReport {
            run_id,
            config_id: config_id.to_string(),
            total,
            completed: sink.completed(),
            failed: sink.failed(),
            started_at,
            elapsed,
        };
        self.say(&format!("Done in {}", format_elapsed(elapsed)));

        tracing::info!(
            run_id = %run_id,
            config = config_id,
            verdict = %report.verdict(),
            completed = report.completed.len(),
            failed = report.failed.len(),
            missing = report.missing(),
            "Configuration run finished"
        );
        Ok(report)
    }

    fn draw(&self, reporter: &mut ProgressReporter, processed: usize) {
        if let Err(e) = reporter.update(processed) {
            tracing::warn!(error = %e, "Failed to write progress");
        }
    }

    fn say(&self, text: &str) {
        if let Err(e) = self.console.line(text) {
            tracing::warn!(error = %e, "Failed to write to console");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(total: usize, completed: &[&str], failed: &[&str]) -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            config_id: "cfg".to_string(),
            total,
            completed: completed.iter().map(|s| s.to_string()).collect(),
            failed: failed
                .iter()
                .map(|s| FailedJob {
                    input_id: s.to_string(),
                    command: format!("cmd {}", s),
                    exit_code: Some(1),
                    error: None,
                })
                .collect(),
            started_at: Utc::now(),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn format_elapsed_pads_fields() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "00h 00m 01.50s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "01h 02m 05.00s");
        assert_eq!(format_elapsed(Duration::ZERO), "00h 00m 00.00s");
    }

    #[test]
    fn verdict_pass_requires_all_completed_and_no_failures() {
        assert_eq!(report(2, &["a", "b"], &[]).verdict(), Verdict::Pass);
        assert_eq!(report(2, &["a", "b"], &["b"]).verdict(), Verdict::Fail);

        let short = report(3, &["a", "b"], &[]);
        assert_eq!(short.verdict(), Verdict::Fail);
        assert_eq!(short.missing(), 1);
    }

    #[test]
    fn summary_exit_code() {
        let mut summary = RegressionSummary::default();
        assert!(summary.passed());
        assert_eq!(summary.exit_code(), 0);

        summary.reports.push(report(1, &["a"], &[]));
        assert_eq!(summary.exit_code(), 0);

        summary.reports.push(report(1, &["a"], &["a"]));
        assert!(!summary.passed());
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.failed_configs().count(), 1);
    }

    #[test]
    fn report_serializes_elapsed_as_millis() {
        let json = serde_json::to_value(report(1, &["a"], &[])).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["total"], 1);
        assert!(json.get("elapsed").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name("/data/configs/high.config.sjson"), "high.config.sjson");
        assert_eq!(display_name("cfg1"), "cfg1");
    }
}
