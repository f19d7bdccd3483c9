//! File-backed pipeline collaborators.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use history_import::ImportCursor;
use history_jobs::{DocumentWriter, PersistError};
use history_types::EntityType;

/// Appends each persisted document as one JSON line.
pub struct JsonLinesWriter<T> {
    path: PathBuf,
    name: String,
    _documents: PhantomData<fn(&T)>,
}

impl<T> JsonLinesWriter<T> {
    /// Writer for `{dir}/{entity_type}.jsonl`.
    pub fn for_entity(dir: &Path, entity_type: EntityType) -> Self {
        Self {
            path: dir.join(format!("{entity_type}.jsonl")),
            name: format!("jsonl:{entity_type}"),
            _documents: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T: Serialize + Send + Sync> DocumentWriter<T> for JsonLinesWriter<T> {
    async fn persist(&self, batch: &[T]) -> Result<(), PersistError> {
        let mut buffer = Vec::new();
        for document in batch {
            serde_json::to_writer(&mut buffer, document)
                .map_err(|e| PersistError::Unrecoverable(e.to_string()))?;
            buffer.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PersistError::Recoverable(format!("{}: {e}", self.path.display())))?;
        file.write_all(&buffer)
            .await
            .map_err(|e| PersistError::Recoverable(format!("{}: {e}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|e| PersistError::Recoverable(format!("{}: {e}", self.path.display())))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cursor handle that records reset requests.
///
/// A one-shot file import has no cursor to rewind; a reset means the
/// running process instances would have to be imported again.
#[derive(Debug, Default)]
pub struct LoggingCursor {
    resets: AtomicUsize,
}

impl LoggingCursor {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ImportCursor for LoggingCursor {
    fn reset(&self) {
        let resets = self.resets.fetch_add(1, Ordering::SeqCst) + 1;
        info!(resets, "Running process instance import reset requested");
    }

    fn name(&self) -> &str {
        "running-process-instances"
    }
}
