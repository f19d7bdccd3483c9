//! Completed and running activity (flow node) instances.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use history_types::{
    DefinitionKind, EntityType, FlowNodeInstanceDocument, HistoricActivityInstance,
};

use super::{duration_millis, non_empty, InstanceScope};
use crate::context::EngineContext;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

pub struct ActivityInstanceImport {
    scope: InstanceScope,
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
}

impl ActivityInstanceImport {
    pub fn new(scope: InstanceScope, context: EngineContext, resolver: Arc<DefinitionResolver>) -> Self {
        Self {
            scope,
            context,
            resolver,
        }
    }
}

#[async_trait]
impl ImportStrategy for ActivityInstanceImport {
    type Record = HistoricActivityInstance;
    type Document = FlowNodeInstanceDocument;

    fn entity_type(&self) -> EntityType {
        match self.scope {
            InstanceScope::Completed => EntityType::CompletedActivityInstance,
            InstanceScope::Running => EntityType::RunningActivityInstance,
        }
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricActivityInstance>,
        stats: &mut PageStats,
    ) -> Vec<FlowNodeInstanceDocument> {
        let mut documents = Vec::with_capacity(page.len());
        for activity in page {
            // The definition version is needed, so a key alone is not enough
            let Some(definition) = self
                .resolver
                .resolve(DefinitionKind::Process, &activity.process_definition_id)
                .await
            else {
                debug!(activity = %activity.id, definition = %activity.process_definition_id, "Unresolvable definition, skipping");
                stats.record_drop();
                continue;
            };
            let Some(key) = non_empty(activity.process_definition_key.clone())
                .or_else(|| non_empty(Some(definition.key.clone())))
            else {
                stats.record_drop();
                continue;
            };

            let (end_date, total_duration_in_ms) = match self.scope {
                InstanceScope::Completed => {
                    let Some(end) = activity.end_time else {
                        warn!(activity = %activity.id, "Completed activity without end time, skipping");
                        stats.record_drop();
                        continue;
                    };
                    let duration = activity
                        .duration_in_millis
                        .unwrap_or_else(|| duration_millis(&activity.start_time, &end));
                    (Some(end), Some(duration))
                }
                InstanceScope::Running => (None, None),
            };

            documents.push(FlowNodeInstanceDocument {
                tenant_id: self.context.resolve_tenant(activity.tenant_id.as_deref()),
                engine: self.context.alias().to_string(),
                flow_node_instance_id: activity.id,
                flow_node_id: activity.activity_id,
                flow_node_type: activity.activity_type,
                flow_node_name: activity.activity_name,
                process_instance_id: activity.process_instance_id,
                definition_key: key,
                definition_version: definition.version,
                start_date: activity.start_time,
                end_date,
                total_duration_in_ms,
                canceled: activity.canceled,
                user_task_instance_id: activity.task_id,
            });
        }
        documents
    }
}
