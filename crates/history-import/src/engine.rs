//! Collaborator seams towards the engine and the import scheduler.

use async_trait::async_trait;

use history_types::{DefinitionDescriptor, DefinitionKind, HistoricProcessInstance};

use crate::error::EngineError;

/// Direct lookups against the engine's history API.
///
/// Only used on cache misses and as a last resort when a record lacks
/// the identity needed to resolve its definition.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Fetch one process or decision definition by id.
    async fn fetch_definition(
        &self,
        kind: DefinitionKind,
        id: &str,
    ) -> Result<DefinitionDescriptor, EngineError>;

    /// Fetch one historic process instance by id.
    async fn fetch_process_instance(&self, id: &str)
        -> Result<HistoricProcessInstance, EngineError>;
}

/// Handle on an import cursor owned by the scheduler.
pub trait ImportCursor: Send + Sync {
    /// Restart the import from the beginning.
    fn reset(&self);

    /// Name used in logs.
    fn name(&self) -> &str {
        "import-cursor"
    }
}
