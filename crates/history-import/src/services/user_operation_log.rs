//! Suspension-related user operations.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use history_types::{
    DefinitionKind, EntityType, HistoricUserOperationLog, UserOperationLogDocument,
    UserOperationType,
};

use super::non_empty;
use crate::context::EngineContext;
use crate::engine::EngineClient;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;
use crate::suspension::SuspensionController;

/// Entry that survived filtering and key resolution.
struct ResolvedOperation {
    entry: HistoricUserOperationLog,
    operation: UserOperationType,
    definition_id: Option<String>,
    definition_key: String,
}

pub struct UserOperationLogImport {
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
    client: Arc<dyn EngineClient>,
    controller: SuspensionController,
}

impl UserOperationLogImport {
    pub fn new(
        context: EngineContext,
        resolver: Arc<DefinitionResolver>,
        client: Arc<dyn EngineClient>,
        controller: SuspensionController,
    ) -> Self {
        Self {
            context,
            resolver,
            client,
            controller,
        }
    }

    pub fn controller(&self) -> &SuspensionController {
        &self.controller
    }

    /// Find the definition key. Without one on the entry, the owning process
    /// instance is asked first, then the resolver for the instance's
    /// definition id and finally for the entry's own.
    async fn resolve_key(
        &self,
        entry: &HistoricUserOperationLog,
    ) -> (Option<String>, Option<String>) {
        let entry_definition_id = non_empty(entry.process_definition_id.clone());
        if let Some(key) = non_empty(entry.process_definition_key.clone()) {
            return (entry_definition_id, Some(key));
        }

        let mut instance_definition_id = None;
        if let Some(instance_id) = entry.process_instance_id.as_deref() {
            match self.client.fetch_process_instance(instance_id).await {
                Ok(instance) => {
                    let definition_id = non_empty(Some(instance.process_definition_id));
                    if let Some(key) = non_empty(instance.process_definition_key) {
                        return (definition_id.or(entry_definition_id), Some(key));
                    }
                    instance_definition_id = definition_id;
                }
                Err(e) => {
                    debug!(entry = %entry.id, instance = instance_id, error = %e, "Process instance lookup failed");
                }
            }
        }

        for id in [&instance_definition_id, &entry_definition_id]
            .into_iter()
            .flatten()
        {
            if let Some(definition) = self.resolver.resolve(DefinitionKind::Process, id).await {
                return (Some(id.clone()), Some(definition.key));
            }
        }
        (instance_definition_id.or(entry_definition_id), None)
    }
}

#[async_trait]
impl ImportStrategy for UserOperationLogImport {
    type Record = HistoricUserOperationLog;
    type Document = UserOperationLogDocument;

    fn entity_type(&self) -> EntityType {
        EntityType::UserOperationLog
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricUserOperationLog>,
        stats: &mut PageStats,
    ) -> Vec<UserOperationLogDocument> {
        let mut resolved = Vec::new();
        for entry in page {
            let Some(operation) = UserOperationType::classify(
                &entry.operation_type,
                &entry.entity_type,
                entry.process_instance_id.as_deref(),
            ) else {
                stats.record_drop();
                continue;
            };

            let (definition_id, key) = self.resolve_key(&entry).await;
            let Some(definition_key) = key else {
                info!(entry = %entry.id, operation = ?operation, "Suspension entry for unknown definition, skipping");
                stats.record_drop();
                continue;
            };

            resolved.push(ResolvedOperation {
                entry,
                operation,
                definition_id,
                definition_key,
            });
        }

        let batch_operations = resolved
            .iter()
            .filter(|r| r.operation.is_batch_operation())
            .count();
        if batch_operations > 0 {
            self.controller.request_reset(batch_operations);
            stats.record_drops(resolved.len());
            stats.reset_requested = true;
            return Vec::new();
        }
        self.controller.mark_normal();

        let mut seen = HashSet::new();
        let mut documents = Vec::with_capacity(resolved.len());
        for ResolvedOperation {
            entry,
            operation,
            definition_id,
            definition_key,
        } in resolved
        {
            // Instance-level operations always carry an instance id
            let Some(process_instance_id) = entry.process_instance_id else {
                stats.record_drop();
                continue;
            };
            let operation_key = entry.operation_id.clone().unwrap_or_else(|| entry.id.clone());
            if !seen.insert((operation_key, process_instance_id.clone())) {
                stats.record_drop();
                continue;
            }

            documents.push(UserOperationLogDocument {
                tenant_id: self.context.resolve_tenant(entry.tenant_id.as_deref()),
                engine: self.context.alias().to_string(),
                id: entry.id,
                operation_id: entry.operation_id,
                operation_type: operation,
                state: operation.resulting_state(),
                process_instance_id,
                process_definition_id: definition_id,
                process_definition_key: definition_key,
                timestamp: entry.timestamp,
            });
        }
        documents
    }
}
