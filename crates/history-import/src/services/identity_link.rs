//! Identity link logs (assignee and candidate changes).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use history_types::{
    DefinitionKind, EntityType, HistoricIdentityLinkLog, IdentityLinkLogDocument,
};

use super::non_empty;
use crate::context::EngineContext;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

/// Link types that survive import.
pub const SUPPORTED_IDENTITY_LINK_TYPES: [&str; 2] = ["ASSIGNEE", "CANDIDATE"];

pub struct IdentityLinkLogImport {
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
}

impl IdentityLinkLogImport {
    pub fn new(context: EngineContext, resolver: Arc<DefinitionResolver>) -> Self {
        Self { context, resolver }
    }
}

fn normalized_link_type(link_type: &str) -> Option<&'static str> {
    SUPPORTED_IDENTITY_LINK_TYPES
        .into_iter()
        .find(|supported| supported.eq_ignore_ascii_case(link_type))
}

#[async_trait]
impl ImportStrategy for IdentityLinkLogImport {
    type Record = HistoricIdentityLinkLog;
    type Document = IdentityLinkLogDocument;

    fn entity_type(&self) -> EntityType {
        EntityType::IdentityLinkLog
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricIdentityLinkLog>,
        stats: &mut PageStats,
    ) -> Vec<IdentityLinkLogDocument> {
        let mut documents = Vec::with_capacity(page.len());
        for entry in page {
            let Some(link_type) = normalized_link_type(&entry.link_type) else {
                debug!(entry = %entry.id, link_type = %entry.link_type, "Unsupported identity link type, skipping");
                stats.record_drop();
                continue;
            };

            let entry = self
                .resolver
                .enrich_with_definition_key(
                    DefinitionKind::Process,
                    entry,
                    |r| r.process_definition_key.as_deref(),
                    |r| r.process_definition_id.as_deref(),
                    |r, key| r.process_definition_key = Some(key),
                )
                .await;
            let Some(key) = non_empty(entry.process_definition_key.clone()) else {
                debug!(entry = %entry.id, "Unresolvable definition key, skipping");
                stats.record_drop();
                continue;
            };

            documents.push(IdentityLinkLogDocument {
                tenant_id: self.context.resolve_tenant(entry.tenant_id.as_deref()),
                engine: self.context.alias().to_string(),
                id: entry.id,
                link_type: link_type.to_string(),
                operation_type: entry.operation_type,
                user_id: entry.user_id,
                group_id: entry.group_id,
                assigner_id: entry.assigner_id,
                task_id: entry.task_id,
                process_instance_id: entry.process_instance_id,
                process_definition_key: key,
                timestamp: entry.time,
            });
        }
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_type_allow_list() {
        assert_eq!(normalized_link_type("assignee"), Some("ASSIGNEE"));
        assert_eq!(normalized_link_type("CANDIDATE"), Some("CANDIDATE"));
        assert_eq!(normalized_link_type("owner"), None);
        assert_eq!(normalized_link_type("DELETE"), None);
    }
}
