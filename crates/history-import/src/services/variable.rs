//! Variable updates, deduplicated, adapted, and flattened.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use history_plugins::{AdapterChain, PluginVariable};
use history_types::{
    DefinitionKind, EntityType, HistoricVariableUpdate, ProcessVariableDocument,
};

use super::non_empty;
use crate::context::EngineContext;
use crate::flatten::VariableFlattener;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

pub struct VariableUpdateImport {
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
    flattener: VariableFlattener,
    adapters: AdapterChain<PluginVariable>,
}

impl VariableUpdateImport {
    pub fn new(
        context: EngineContext,
        resolver: Arc<DefinitionResolver>,
        flattener: VariableFlattener,
        adapters: AdapterChain<PluginVariable>,
    ) -> Self {
        Self {
            context,
            resolver,
            flattener,
            adapters,
        }
    }
}

/// Keep only the highest sequence counter per variable instance.
///
/// Survivors keep the order in which their variable first appeared.
fn latest_per_variable(
    page: Vec<HistoricVariableUpdate>,
    stats: &mut PageStats,
) -> Vec<HistoricVariableUpdate> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<HistoricVariableUpdate> = Vec::with_capacity(page.len());
    for update in page {
        match slots.get(&update.variable_instance_id) {
            Some(&slot) => {
                stats.record_drop();
                if update.sequence_counter > latest[slot].sequence_counter {
                    latest[slot] = update;
                }
            }
            None => {
                slots.insert(update.variable_instance_id.clone(), latest.len());
                latest.push(update);
            }
        }
    }
    latest
}

#[async_trait]
impl ImportStrategy for VariableUpdateImport {
    type Record = HistoricVariableUpdate;
    type Document = ProcessVariableDocument;

    fn entity_type(&self) -> EntityType {
        EntityType::VariableUpdate
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricVariableUpdate>,
        stats: &mut PageStats,
    ) -> Vec<ProcessVariableDocument> {
        let mut variables = Vec::new();
        for update in latest_per_variable(page, stats) {
            let update = self
                .resolver
                .enrich_with_definition_key(
                    DefinitionKind::Process,
                    update,
                    |r| r.process_definition_key.as_deref(),
                    |r| Some(r.process_definition_id.as_str()),
                    |r, key| r.process_definition_key = Some(key),
                )
                .await;
            let Some(key) = non_empty(update.process_definition_key.clone()) else {
                debug!(variable = %update.variable_instance_id, definition = %update.process_definition_id, "Unresolvable definition key, skipping");
                stats.record_drop();
                continue;
            };

            variables.push(PluginVariable {
                tenant_id: self.context.resolve_tenant(update.tenant_id.as_deref()),
                engine_alias: self.context.alias().to_string(),
                id: update.variable_instance_id,
                name: update.variable_name,
                var_type: update.variable_type,
                value: update.value,
                value_info: update.value_info,
                process_definition_key: key,
                process_definition_id: update.process_definition_id,
                process_instance_id: update.process_instance_id,
                version: update.sequence_counter,
                timestamp: update.time,
            });
        }

        let mut documents = Vec::new();
        for variable in self.adapters.apply(variables) {
            if !variable.is_valid() {
                warn!(variable = %variable.id, name = %variable.name, "Adapter returned an invalid variable, skipping");
                continue;
            }

            let flattened = self.flattener.flatten(&variable.to_raw_variable());
            if flattened.is_empty() {
                debug!(variable = %variable.id, var_type = %variable.var_type, "Variable produced no importable values");
                continue;
            }

            let definition_version = self
                .resolver
                .resolve(DefinitionKind::Process, &variable.process_definition_id)
                .await
                .map(|d| d.version);

            documents.extend(flattened.into_iter().map(|flat| ProcessVariableDocument {
                variable: flat,
                version: variable.version,
                process_instance_id: variable.process_instance_id.clone(),
                process_definition_key: variable.process_definition_key.clone(),
                process_definition_version: definition_version.clone(),
                timestamp: variable.timestamp,
                engine: variable.engine_alias.clone(),
                tenant_id: variable.tenant_id.clone(),
            }));
        }
        documents
    }
}
