//! Bounded asynchronous job execution for the history importer.
//!
//! Import services hand each mapped page to a [`JobExecutor`] as an
//! [`ImportJob`]. The executor decouples transform from persistence:
//!
//! - **Backpressure**: `submit` waits while the bounded queue is full
//! - **Ordering**: one worker per executor persists jobs in FIFO order
//! - **Liveness**: every job's completion callback runs exactly once,
//!   whether persistence succeeded, failed, or the executor was closed
//! - **Drain**: `shutdown` stops intake and persists what is queued
//!
//! # Example
//!
//! ```ignore
//! use history_jobs::{ExecutorConfig, ImportJob, JobExecutor};
//!
//! let executor = JobExecutor::spawn("tenant", &ExecutorConfig::default(), writer);
//! executor.submit(ImportJob::new(docs, Box::new(|| println!("page done")))).await?;
//! executor.shutdown().await?;
//! ```

mod config;
mod error;
mod executor;
mod job;
mod stats;
mod writer;

pub use config::ExecutorConfig;
pub use error::{JobError, PersistError};
pub use executor::JobExecutor;
pub use job::{ImportJob, OnComplete};
pub use stats::ExecutorStats;
pub use writer::DocumentWriter;
