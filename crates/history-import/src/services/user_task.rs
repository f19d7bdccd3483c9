//! Completed and running user task instances.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use history_types::{DefinitionKind, EntityType, HistoricUserTaskInstance, UserTaskDocument};

use super::{duration_millis, non_empty, InstanceScope};
use crate::context::EngineContext;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

/// User task import.
///
/// `completed` and `canceled` are always seeded as false; merging with
/// completed activity data happens elsewhere.
pub struct UserTaskImport {
    scope: InstanceScope,
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
}

impl UserTaskImport {
    pub fn new(scope: InstanceScope, context: EngineContext, resolver: Arc<DefinitionResolver>) -> Self {
        Self {
            scope,
            context,
            resolver,
        }
    }

    fn map_task(&self, task: HistoricUserTaskInstance, definition_key: String) -> UserTaskDocument {
        let (end_date, total_duration_in_ms) = match (self.scope, task.end_time) {
            (InstanceScope::Completed, Some(end)) => (
                Some(end),
                Some(
                    task.duration
                        .unwrap_or_else(|| duration_millis(&task.start_time, &end)),
                ),
            ),
            _ => (None, None),
        };

        UserTaskDocument {
            tenant_id: self.context.resolve_tenant(task.tenant_id.as_deref()),
            engine: self.context.alias().to_string(),
            user_task_instance_id: task.id,
            flow_node_id: task.task_definition_key,
            flow_node_instance_id: task.activity_instance_id,
            name: task.name,
            assignee: task.assignee,
            process_instance_id: task.process_instance_id,
            definition_key,
            start_date: task.start_time,
            end_date,
            due_date: task.due,
            total_duration_in_ms,
            delete_reason: task.delete_reason,
            completed: false,
            canceled: false,
        }
    }
}

#[async_trait]
impl ImportStrategy for UserTaskImport {
    type Record = HistoricUserTaskInstance;
    type Document = UserTaskDocument;

    fn entity_type(&self) -> EntityType {
        match self.scope {
            InstanceScope::Completed => EntityType::CompletedUserTask,
            InstanceScope::Running => EntityType::RunningUserTask,
        }
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricUserTaskInstance>,
        stats: &mut PageStats,
    ) -> Vec<UserTaskDocument> {
        let mut documents = Vec::with_capacity(page.len());
        for task in page {
            let task = self
                .resolver
                .enrich_with_definition_key(
                    DefinitionKind::Process,
                    task,
                    |r| r.process_definition_key.as_deref(),
                    |r| Some(r.process_definition_id.as_str()),
                    |r, key| r.process_definition_key = Some(key),
                )
                .await;

            let Some(key) = non_empty(task.process_definition_key.clone()) else {
                debug!(task = %task.id, definition = %task.process_definition_id, "Unresolvable definition key, skipping");
                stats.record_drop();
                continue;
            };
            documents.push(self.map_task(task, key));
        }
        documents
    }
}
