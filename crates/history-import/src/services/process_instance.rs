//! Completed and running process instances.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use history_plugins::{AdapterChain, BusinessKey};
use history_types::{DefinitionKind, EntityType, HistoricProcessInstance, ProcessInstanceDocument};

use super::{duration_millis, non_empty, InstanceScope};
use crate::context::EngineContext;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

pub struct ProcessInstanceImport {
    scope: InstanceScope,
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
    business_keys: AdapterChain<BusinessKey>,
}

impl ProcessInstanceImport {
    pub fn new(
        scope: InstanceScope,
        context: EngineContext,
        resolver: Arc<DefinitionResolver>,
        business_keys: AdapterChain<BusinessKey>,
    ) -> Self {
        Self {
            scope,
            context,
            resolver,
            business_keys,
        }
    }

    fn map_instance(
        &self,
        instance: HistoricProcessInstance,
        definition_key: String,
    ) -> Option<ProcessInstanceDocument> {
        let (end_date, duration) = match self.scope {
            InstanceScope::Completed => {
                let Some(end) = instance.end_time else {
                    warn!(instance = %instance.id, "Completed process instance without end time, skipping");
                    return None;
                };
                (Some(end), Some(duration_millis(&instance.start_time, &end)))
            }
            InstanceScope::Running => (None, None),
        };

        let version = instance
            .process_definition_version
            .map(|v| v.to_string())
            .or_else(|| {
                self.resolver
                    .cached(DefinitionKind::Process, &instance.process_definition_id)
                    .map(|d| d.version)
            });

        let state = instance.state.clone().or_else(|| {
            Some(match self.scope {
                InstanceScope::Completed => "COMPLETED".to_string(),
                InstanceScope::Running => "ACTIVE".to_string(),
            })
        });

        Some(ProcessInstanceDocument {
            tenant_id: self.context.resolve_tenant(instance.tenant_id.as_deref()),
            engine: self.context.alias().to_string(),
            process_instance_id: instance.id,
            process_definition_id: instance.process_definition_id,
            process_definition_key: definition_key,
            process_definition_version: version,
            business_key: instance.business_key,
            start_date: instance.start_time,
            end_date,
            duration,
            state,
        })
    }

    /// Run the business-key chain and write its result back.
    ///
    /// An instance whose entry an adapter removed loses its business key.
    fn apply_business_key_adapters(&self, documents: &mut [ProcessInstanceDocument]) {
        if self.business_keys.is_empty() {
            return;
        }
        let keys = documents
            .iter()
            .map(|d| BusinessKey::new(d.process_instance_id.clone(), d.business_key.clone()))
            .collect();
        let adapted: HashMap<String, Option<String>> = self
            .business_keys
            .apply(keys)
            .into_iter()
            .map(|k| (k.process_instance_id, k.business_key))
            .collect();
        for document in documents.iter_mut() {
            document.business_key = adapted
                .get(&document.process_instance_id)
                .cloned()
                .flatten();
        }
    }
}

#[async_trait]
impl ImportStrategy for ProcessInstanceImport {
    type Record = HistoricProcessInstance;
    type Document = ProcessInstanceDocument;

    fn entity_type(&self) -> EntityType {
        match self.scope {
            InstanceScope::Completed => EntityType::CompletedProcessInstance,
            InstanceScope::Running => EntityType::RunningProcessInstance,
        }
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricProcessInstance>,
        stats: &mut PageStats,
    ) -> Vec<ProcessInstanceDocument> {
        let mut documents = Vec::with_capacity(page.len());
        for instance in page {
            let instance = self
                .resolver
                .enrich_with_definition_key(
                    DefinitionKind::Process,
                    instance,
                    |r| r.process_definition_key.as_deref(),
                    |r| Some(r.process_definition_id.as_str()),
                    |r, key| r.process_definition_key = Some(key),
                )
                .await;

            let Some(key) = non_empty(instance.process_definition_key.clone()) else {
                debug!(instance = %instance.id, definition = %instance.process_definition_id, "Unresolvable definition key, skipping");
                stats.record_drop();
                continue;
            };

            match self.map_instance(instance, key) {
                Some(document) => documents.push(document),
                None => stats.record_drop(),
            }
        }

        self.apply_business_key_adapters(&mut documents);
        documents
    }
}
