//! Persistence seam.

use async_trait::async_trait;

use crate::error::PersistError;

/// Writes one batch of documents to the store.
///
/// Called once per job by the executor's worker. Implementations own
/// their I/O timeouts; an error here is logged and the job is still
/// completed.
#[async_trait]
pub trait DocumentWriter<T>: Send + Sync {
    /// Persist a batch.
    async fn persist(&self, batch: &[T]) -> Result<(), PersistError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "document-writer"
    }
}
