//! Process and decision definitions.

use std::sync::Arc;

use async_trait::async_trait;

use history_types::{
    DefinitionDescriptor, DefinitionDocument, DefinitionKind, EngineDefinition, EntityType,
};

use crate::context::EngineContext;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

/// 1:1 definition import.
///
/// Imported definitions are also put into the resolver cache, so instance
/// pages imported afterwards resolve them without an engine round trip.
pub struct DefinitionImport {
    kind: DefinitionKind,
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
}

impl DefinitionImport {
    pub fn new(kind: DefinitionKind, context: EngineContext, resolver: Arc<DefinitionResolver>) -> Self {
        Self {
            kind,
            context,
            resolver,
        }
    }
}

#[async_trait]
impl ImportStrategy for DefinitionImport {
    type Record = EngineDefinition;
    type Document = DefinitionDocument;

    fn entity_type(&self) -> EntityType {
        match self.kind {
            DefinitionKind::Process => EntityType::ProcessDefinition,
            DefinitionKind::Decision => EntityType::DecisionDefinition,
        }
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<EngineDefinition>,
        _stats: &mut PageStats,
    ) -> Vec<DefinitionDocument> {
        page.into_iter()
            .map(|definition| {
                let tenant_id = self.context.resolve_tenant(definition.tenant_id.as_deref());
                let version = definition.version.to_string();
                self.resolver.cache_definition(
                    self.kind,
                    DefinitionDescriptor {
                        id: definition.id.clone(),
                        key: definition.key.clone(),
                        version: version.clone(),
                        version_tag: definition.version_tag.clone(),
                        name: definition.name.clone(),
                        tenant_id: tenant_id.clone(),
                    },
                );
                DefinitionDocument {
                    kind: self.kind,
                    id: definition.id,
                    key: definition.key,
                    version,
                    version_tag: definition.version_tag,
                    name: definition.name,
                    deleted: definition.deleted,
                    engine: self.context.alias().to_string(),
                    tenant_id,
                }
            })
            .collect()
    }
}
