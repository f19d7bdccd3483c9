//! Error types for the job executor.

use thiserror::Error;

/// Errors reported by a [`crate::DocumentWriter`].
///
/// Neither variant stops the worker; the distinction only drives the
/// log level.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The store may accept the batch on a later attempt
    #[error("Recoverable persistence error: {0}")]
    Recoverable(String),

    /// The batch will never be accepted as-is
    #[error("Unrecoverable persistence error: {0}")]
    Unrecoverable(String),
}

impl PersistError {
    /// Whether a retry could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PersistError::Recoverable(_))
    }
}

/// Errors from executor lifecycle operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// Submitted after shutdown; the job's callback has already run
    #[error("Executor {0} is closed")]
    Closed(String),

    /// The worker task panicked before draining its queue
    #[error("Executor {0} worker panicked")]
    WorkerPanicked(String),
}
