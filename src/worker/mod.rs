//! Worker execution engine for running validation jobs.
//!
//! - **Job execution**: spawns the job's command through the platform shell
//!   and observes its exit status
//! - **Worker pool**: a fixed number of workers that drain a shared
//!   [`JobQueue`](crate::scheduler::JobQueue) until each receives a terminator
//!
//! # Execution Flow
//!
//! 1. A worker pops the next item from the queue
//! 2. A terminator ends the worker
//! 3. Otherwise [`JobExecutor::execute`] runs `sh -c <command>` (`cmd /C` on Windows)
//! 4. The outcome is recorded in the [`ResultSink`](crate::scheduler::ResultSink)
//!
//! There is no per-job timeout: a hung command holds its worker until the
//! run is cancelled.

pub mod executor;
pub mod pool;

pub use executor::{ExecutionResult, JobExecutor};
pub use pool::WorkerPool;
