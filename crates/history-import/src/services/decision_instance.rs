//! Decision instances with their inputs and outputs.
//!
//! Inputs and outputs of the whole page go through their adapter chains
//! as two batches, then are regrouped under their owning instance.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use history_plugins::{PluginDecisionInput, PluginDecisionOutput, PluginRegistry};
use history_types::{
    DecisionInputDocument, DecisionInstanceDocument, DecisionOutputDocument, DefinitionKind,
    EntityType, HistoricDecisionInstance, VariableType,
};

use super::non_empty;
use crate::context::EngineContext;
use crate::flatten::value_as_string;
use crate::resolver::DefinitionResolver;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

pub struct DecisionInstanceImport {
    context: EngineContext,
    resolver: Arc<DefinitionResolver>,
    plugins: PluginRegistry,
}

impl DecisionInstanceImport {
    pub fn new(
        context: EngineContext,
        resolver: Arc<DefinitionResolver>,
        plugins: PluginRegistry,
    ) -> Self {
        Self {
            context,
            resolver,
            plugins,
        }
    }
}

fn supported_type(engine_type: &str, id: &str) -> Option<VariableType> {
    let var_type = VariableType::from_engine_type(engine_type);
    if var_type.is_none() {
        debug!(id, engine_type, "Unsupported decision value type, skipping");
    }
    var_type
}

#[async_trait]
impl ImportStrategy for DecisionInstanceImport {
    type Record = HistoricDecisionInstance;
    type Document = DecisionInstanceDocument;

    fn entity_type(&self) -> EntityType {
        EntityType::DecisionInstance
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(
        &self,
        page: Vec<HistoricDecisionInstance>,
        stats: &mut PageStats,
    ) -> Vec<DecisionInstanceDocument> {
        let mut documents: Vec<DecisionInstanceDocument> = Vec::with_capacity(page.len());
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for instance in page {
            let Some(definition) = self
                .resolver
                .resolve(DefinitionKind::Decision, &instance.decision_definition_id)
                .await
            else {
                debug!(instance = %instance.id, definition = %instance.decision_definition_id, "Decision definition not found, skipping");
                stats.record_drop();
                continue;
            };
            let key = non_empty(instance.decision_definition_key.clone())
                .unwrap_or_else(|| definition.key.clone());
            let tenant_id = self.context.resolve_tenant(instance.tenant_id.as_deref());

            inputs.extend(instance.inputs.into_iter().map(|input| PluginDecisionInput {
                id: input.id,
                clause_id: input.clause_id,
                clause_name: input.clause_name,
                value_type: input.value_type,
                value: input.value,
                decision_instance_id: instance.id.clone(),
                decision_definition_key: key.clone(),
                decision_definition_version: definition.version.clone(),
                engine_alias: self.context.alias().to_string(),
                tenant_id: tenant_id.clone(),
            }));
            outputs.extend(instance.outputs.into_iter().map(|output| PluginDecisionOutput {
                id: output.id,
                clause_id: output.clause_id,
                clause_name: output.clause_name,
                rule_id: output.rule_id,
                rule_order: output.rule_order,
                variable_name: output.variable_name,
                value_type: output.value_type,
                value: output.value,
                decision_instance_id: instance.id.clone(),
                decision_definition_key: key.clone(),
                decision_definition_version: definition.version.clone(),
                engine_alias: self.context.alias().to_string(),
                tenant_id: tenant_id.clone(),
            }));

            documents.push(DecisionInstanceDocument {
                decision_instance_id: instance.id,
                decision_definition_id: instance.decision_definition_id,
                decision_definition_key: key,
                decision_definition_version: definition.version,
                process_definition_id: instance.process_definition_id,
                process_definition_key: instance.process_definition_key,
                process_instance_id: instance.process_instance_id,
                root_process_instance_id: instance.root_process_instance_id,
                root_decision_instance_id: instance.root_decision_instance_id,
                activity_id: instance.activity_id,
                evaluation_date_time: instance.evaluation_time,
                collect_result_value: instance.collect_result_value,
                inputs: Vec::new(),
                outputs: Vec::new(),
                matched_rules: Vec::new(),
                engine: self.context.alias().to_string(),
                tenant_id,
            });
        }

        let index: HashMap<String, usize> = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.decision_instance_id.clone(), i))
            .collect();

        for input in self.plugins.decision_inputs().apply(inputs) {
            let Some(&slot) = index.get(&input.decision_instance_id) else {
                warn!(input = %input.id, instance = %input.decision_instance_id, "Adapted decision input has no owning instance, skipping");
                continue;
            };
            let Some(value_type) = supported_type(&input.value_type, &input.id) else {
                continue;
            };
            documents[slot].inputs.push(DecisionInputDocument {
                value: input.value.as_ref().and_then(value_as_string),
                id: input.id,
                clause_id: input.clause_id,
                clause_name: input.clause_name,
                value_type,
            });
        }

        let mut matched_rules: Vec<BTreeSet<String>> = vec![BTreeSet::new(); documents.len()];
        for output in self.plugins.decision_outputs().apply(outputs) {
            let Some(&slot) = index.get(&output.decision_instance_id) else {
                warn!(output = %output.id, instance = %output.decision_instance_id, "Adapted decision output has no owning instance, skipping");
                continue;
            };
            let Some(value_type) = supported_type(&output.value_type, &output.id) else {
                continue;
            };
            matched_rules[slot].insert(output.rule_id.clone());
            documents[slot].outputs.push(DecisionOutputDocument {
                value: output.value.as_ref().and_then(value_as_string),
                id: output.id,
                clause_id: output.clause_id,
                clause_name: output.clause_name,
                rule_id: output.rule_id,
                rule_order: output.rule_order,
                variable_name: output.variable_name,
                value_type,
            });
        }

        for (document, rules) in documents.iter_mut().zip(matched_rules) {
            document.matched_rules = rules.into_iter().collect();
        }
        documents
    }
}
