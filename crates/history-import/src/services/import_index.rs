//! Import cursor positions persisted as store documents.

use async_trait::async_trait;

use history_types::{EntityType, ImportIndexDocument, ImportIndexSnapshot};

use crate::context::EngineContext;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

pub struct ImportIndexImport {
    context: EngineContext,
}

impl ImportIndexImport {
    pub fn new(context: EngineContext) -> Self {
        Self { context }
    }

    /// Document id of a cursor: one per engine and entity type.
    pub fn document_id(&self, entity_type: EntityType) -> String {
        format!("{}-{}", self.context.alias(), entity_type)
    }
}

#[async_trait]
impl ImportStrategy for ImportIndexImport {
    type Record = ImportIndexSnapshot;
    type Document = ImportIndexDocument;

    fn entity_type(&self) -> EntityType {
        EntityType::ImportIndex
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<ImportIndexSnapshot>,
        _stats: &mut PageStats,
    ) -> Vec<ImportIndexDocument> {
        page.into_iter()
            .map(|snapshot| ImportIndexDocument {
                id: self.document_id(snapshot.entity_type),
                entity_type: snapshot.entity_type,
                timestamp_of_last_entity: snapshot.timestamp_of_last_entity,
                position: snapshot.position,
                engine: self.context.alias().to_string(),
            })
            .collect()
    }
}
