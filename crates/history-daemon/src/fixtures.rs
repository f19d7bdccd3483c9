//! File-backed engine data.
//!
//! An input directory holds one JSON array per entity type, named as in
//! [`FixtureSet::load`]. Missing files count as empty.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use history_import::{EngineClient, EngineError};
use history_types::{
    DefinitionDescriptor, DefinitionKind, EngineDefinition, EngineTenant,
    HistoricActivityInstance, HistoricDecisionInstance, HistoricIdentityLinkLog,
    HistoricProcessInstance, HistoricUserOperationLog, HistoricUserTaskInstance,
    HistoricVariableUpdate,
};

/// All records found in an input directory.
#[derive(Debug, Default)]
pub struct FixtureSet {
    pub tenants: Vec<EngineTenant>,
    pub process_definitions: Vec<EngineDefinition>,
    pub decision_definitions: Vec<EngineDefinition>,
    pub process_instances: Vec<HistoricProcessInstance>,
    pub activity_instances: Vec<HistoricActivityInstance>,
    pub user_tasks: Vec<HistoricUserTaskInstance>,
    pub decision_instances: Vec<HistoricDecisionInstance>,
    pub identity_link_logs: Vec<HistoricIdentityLinkLog>,
    pub user_operation_logs: Vec<HistoricUserOperationLog>,
    pub variable_updates: Vec<HistoricVariableUpdate>,
}

impl FixtureSet {
    /// Read every known fixture file from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Input directory {} does not exist", dir.display());
        }
        Ok(Self {
            tenants: read_records(dir, "tenants.json")?,
            process_definitions: read_records(dir, "process_definitions.json")?,
            decision_definitions: read_records(dir, "decision_definitions.json")?,
            process_instances: read_records(dir, "process_instances.json")?,
            activity_instances: read_records(dir, "activity_instances.json")?,
            user_tasks: read_records(dir, "user_tasks.json")?,
            decision_instances: read_records(dir, "decision_instances.json")?,
            identity_link_logs: read_records(dir, "identity_link_logs.json")?,
            user_operation_logs: read_records(dir, "user_operation_logs.json")?,
            variable_updates: read_records(dir, "variable_updates.json")?,
        })
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.tenants.len()
            + self.process_definitions.len()
            + self.decision_definitions.len()
            + self.process_instances.len()
            + self.activity_instances.len()
            + self.user_tasks.len()
            + self.decision_instances.len()
            + self.identity_link_logs.len()
            + self.user_operation_logs.len()
            + self.variable_updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_records<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Vec<T>> {
    let path = dir.join(file_name);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let values: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    // One bad record must not hide the rest of the file
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(file = file_name, index, error = %e, "Skipping malformed record");
            }
        }
    }
    Ok(records)
}

/// Engine client answering from fixture data.
#[derive(Debug, Default)]
pub struct FixtureEngineClient {
    process_definitions: HashMap<String, DefinitionDescriptor>,
    decision_definitions: HashMap<String, DefinitionDescriptor>,
    process_instances: HashMap<String, HistoricProcessInstance>,
}

impl FixtureEngineClient {
    pub fn from_fixtures(fixtures: &FixtureSet) -> Self {
        Self {
            process_definitions: index_definitions(&fixtures.process_definitions),
            decision_definitions: index_definitions(&fixtures.decision_definitions),
            process_instances: fixtures
                .process_instances
                .iter()
                .map(|p| (p.id.clone(), p.clone()))
                .collect(),
        }
    }
}

fn index_definitions(definitions: &[EngineDefinition]) -> HashMap<String, DefinitionDescriptor> {
    definitions
        .iter()
        .map(|d| {
            let descriptor = DefinitionDescriptor {
                id: d.id.clone(),
                key: d.key.clone(),
                version: d.version.to_string(),
                version_tag: d.version_tag.clone(),
                name: d.name.clone(),
                tenant_id: d.tenant_id.clone(),
            };
            (d.id.clone(), descriptor)
        })
        .collect()
}

#[async_trait]
impl EngineClient for FixtureEngineClient {
    async fn fetch_definition(
        &self,
        kind: DefinitionKind,
        id: &str,
    ) -> Result<DefinitionDescriptor, EngineError> {
        let definitions = match kind {
            DefinitionKind::Process => &self.process_definitions,
            DefinitionKind::Decision => &self.decision_definitions,
        };
        definitions
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("definition", id))
    }

    async fn fetch_process_instance(
        &self,
        id: &str,
    ) -> Result<HistoricProcessInstance, EngineError> {
        self.process_instances
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("process instance", id))
    }
}
