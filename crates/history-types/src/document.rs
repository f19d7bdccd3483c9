//! Documents persisted to the search store.
//!
//! One document type per imported entity type. Documents are built by the
//! import services' mapping functions and never mutated after a job has
//! been submitted.

use serde::{Deserialize, Serialize};

use crate::date_format::{store_date, store_date_opt, EngineDateTime};
use crate::definition::DefinitionKind;
use crate::entity::EntityType;
use crate::variable::{FlattenedVariable, VariableType};

/// Process instance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstanceDocument {
    pub process_instance_id: String,
    pub process_definition_id: String,
    pub process_definition_key: String,
    pub process_definition_version: Option<String>,
    pub business_key: Option<String>,
    #[serde(with = "store_date")]
    pub start_date: EngineDateTime,
    #[serde(with = "store_date_opt")]
    pub end_date: Option<EngineDateTime>,
    /// Milliseconds between start and end, completed instances only
    pub duration: Option<i64>,
    pub state: Option<String>,
    /// Engine alias the record was imported from
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Flow node (activity) instance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNodeInstanceDocument {
    pub flow_node_instance_id: String,
    pub flow_node_id: String,
    pub flow_node_type: String,
    pub flow_node_name: Option<String>,
    pub process_instance_id: String,
    pub definition_key: String,
    pub definition_version: String,
    #[serde(with = "store_date")]
    pub start_date: EngineDateTime,
    #[serde(with = "store_date_opt")]
    pub end_date: Option<EngineDateTime>,
    pub total_duration_in_ms: Option<i64>,
    pub canceled: bool,
    pub user_task_instance_id: Option<String>,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// User task instance document.
///
/// `completed` and `canceled` are only seeded here; a later merge with
/// completed activity data may overwrite them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskDocument {
    pub user_task_instance_id: String,
    pub flow_node_id: String,
    pub flow_node_instance_id: Option<String>,
    pub name: Option<String>,
    pub assignee: Option<String>,
    pub process_instance_id: String,
    pub definition_key: String,
    #[serde(with = "store_date")]
    pub start_date: EngineDateTime,
    #[serde(with = "store_date_opt")]
    pub end_date: Option<EngineDateTime>,
    #[serde(with = "store_date_opt")]
    pub due_date: Option<EngineDateTime>,
    pub total_duration_in_ms: Option<i64>,
    pub delete_reason: Option<String>,
    pub completed: bool,
    pub canceled: bool,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Decision input as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInputDocument {
    pub id: String,
    pub clause_id: String,
    pub clause_name: Option<String>,
    #[serde(rename = "type")]
    pub value_type: VariableType,
    pub value: Option<String>,
}

/// Decision output as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutputDocument {
    pub id: String,
    pub clause_id: String,
    pub clause_name: Option<String>,
    pub rule_id: String,
    pub rule_order: Option<i32>,
    pub variable_name: Option<String>,
    #[serde(rename = "type")]
    pub value_type: VariableType,
    pub value: Option<String>,
}

/// Decision instance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInstanceDocument {
    pub decision_instance_id: String,
    pub decision_definition_id: String,
    pub decision_definition_key: String,
    pub decision_definition_version: String,
    pub process_definition_id: Option<String>,
    pub process_definition_key: Option<String>,
    pub process_instance_id: Option<String>,
    pub root_process_instance_id: Option<String>,
    pub root_decision_instance_id: Option<String>,
    pub activity_id: Option<String>,
    #[serde(with = "store_date")]
    pub evaluation_date_time: EngineDateTime,
    pub collect_result_value: Option<f64>,
    pub inputs: Vec<DecisionInputDocument>,
    pub outputs: Vec<DecisionOutputDocument>,
    /// Distinct ids of all rules that matched, sorted
    pub matched_rules: Vec<String>,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Process or decision definition document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionDocument {
    pub kind: DefinitionKind,
    pub id: String,
    pub key: String,
    pub version: String,
    pub version_tag: Option<String>,
    pub name: Option<String>,
    pub deleted: bool,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Identity link log document (assignee and candidate changes only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityLinkLogDocument {
    pub id: String,
    /// Upper-case link type, `ASSIGNEE` or `CANDIDATE`
    pub link_type: String,
    pub operation_type: Option<String>,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub assigner_id: Option<String>,
    pub task_id: Option<String>,
    pub process_instance_id: Option<String>,
    pub process_definition_key: String,
    #[serde(with = "store_date")]
    pub timestamp: EngineDateTime,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Suspension-related user operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserOperationType {
    SuspendInstance,
    ActivateInstance,
    SuspendDefinition,
    ActivateDefinition,
    SuspendBatch,
    ActivateBatch,
}

impl UserOperationType {
    /// Classify an engine operation log entry.
    ///
    /// Returns `None` for operations unrelated to suspension. A
    /// suspend/activate against a process instance without an instance id
    /// was issued through a query and counts as a batch operation.
    pub fn classify(
        operation_type: &str,
        entity_type: &str,
        process_instance_id: Option<&str>,
    ) -> Option<Self> {
        let suspend = match operation_type {
            "Suspend" | "SuspendProcessDefinition" => true,
            "Activate" | "ActivateProcessDefinition" => false,
            _ => return None,
        };
        let definition_op = operation_type.ends_with("ProcessDefinition");
        let op = match (entity_type, definition_op) {
            (_, true) | ("ProcessDefinition", false) => {
                if suspend {
                    UserOperationType::SuspendDefinition
                } else {
                    UserOperationType::ActivateDefinition
                }
            }
            ("ProcessInstance", false) if process_instance_id.is_some() => {
                if suspend {
                    UserOperationType::SuspendInstance
                } else {
                    UserOperationType::ActivateInstance
                }
            }
            ("ProcessInstance", false) | ("Batch", false) => {
                if suspend {
                    UserOperationType::SuspendBatch
                } else {
                    UserOperationType::ActivateBatch
                }
            }
            _ => return None,
        };
        Some(op)
    }

    /// Whether the affected instance set cannot be derived from the entry.
    pub fn is_batch_operation(&self) -> bool {
        !matches!(
            self,
            UserOperationType::SuspendInstance | UserOperationType::ActivateInstance
        )
    }

    /// The instance state this operation leads to.
    pub fn resulting_state(&self) -> SuspensionState {
        match self {
            UserOperationType::SuspendInstance
            | UserOperationType::SuspendDefinition
            | UserOperationType::SuspendBatch => SuspensionState::Suspended,
            _ => SuspensionState::Active,
        }
    }
}

/// State of a process instance after a suspension operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuspensionState {
    Active,
    Suspended,
}

/// Instance-level suspension update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationLogDocument {
    pub id: String,
    pub operation_id: Option<String>,
    pub operation_type: UserOperationType,
    pub state: SuspensionState,
    pub process_instance_id: String,
    pub process_definition_id: Option<String>,
    pub process_definition_key: String,
    #[serde(with = "store_date")]
    pub timestamp: EngineDateTime,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Process variable document: one flattened variable plus its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVariableDocument {
    #[serde(flatten)]
    pub variable: FlattenedVariable,
    /// Sequence counter of the source update; last write wins by version
    pub version: i64,
    pub process_instance_id: String,
    pub process_definition_key: String,
    pub process_definition_version: Option<String>,
    #[serde(with = "store_date")]
    pub timestamp: EngineDateTime,
    pub engine: String,
    pub tenant_id: Option<String>,
}

/// Tenant document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDocument {
    pub id: String,
    pub name: Option<String>,
    pub engine: String,
}

/// Persisted import cursor position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportIndexDocument {
    /// `{engine}-{entity_type}`; one document per cursor
    pub id: String,
    pub entity_type: EntityType,
    #[serde(with = "store_date_opt")]
    pub timestamp_of_last_entity: Option<EngineDateTime>,
    pub position: i64,
    pub engine: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_instance_operations() {
        assert_eq!(
            UserOperationType::classify("Suspend", "ProcessInstance", Some("pi-1")),
            Some(UserOperationType::SuspendInstance)
        );
        assert_eq!(
            UserOperationType::classify("Activate", "ProcessInstance", Some("pi-1")),
            Some(UserOperationType::ActivateInstance)
        );
    }

    #[test]
    fn test_classify_batch_operations() {
        assert_eq!(
            UserOperationType::classify("SuspendProcessDefinition", "ProcessDefinition", None),
            Some(UserOperationType::SuspendDefinition)
        );
        assert_eq!(
            UserOperationType::classify("Activate", "ProcessDefinition", None),
            Some(UserOperationType::ActivateDefinition)
        );
        assert_eq!(
            UserOperationType::classify("Suspend", "ProcessInstance", None),
            Some(UserOperationType::SuspendBatch)
        );
        assert_eq!(
            UserOperationType::classify("Activate", "Batch", None),
            Some(UserOperationType::ActivateBatch)
        );
        assert!(UserOperationType::SuspendDefinition.is_batch_operation());
        assert!(UserOperationType::ActivateBatch.is_batch_operation());
        assert!(!UserOperationType::SuspendInstance.is_batch_operation());
    }

    #[test]
    fn test_classify_ignores_unrelated_operations() {
        assert_eq!(
            UserOperationType::classify("SetVariable", "ProcessInstance", Some("pi-1")),
            None
        );
        assert_eq!(UserOperationType::classify("Suspend", "Task", Some("pi-1")), None);
    }

    #[test]
    fn test_resulting_state() {
        assert_eq!(
            UserOperationType::SuspendBatch.resulting_state(),
            SuspensionState::Suspended
        );
        assert_eq!(
            UserOperationType::ActivateInstance.resulting_state(),
            SuspensionState::Active
        );
    }

    #[test]
    fn test_variable_document_flattens_variable() {
        let doc = ProcessVariableDocument {
            variable: FlattenedVariable::scalar("v1", "amount", VariableType::Long, "5"),
            version: 2,
            process_instance_id: "pi-1".into(),
            process_definition_key: "invoice".into(),
            process_definition_version: Some("1".into()),
            timestamp: crate::parse_date("2024-01-01T00:00:00Z").unwrap(),
            engine: "camunda-bpm".into(),
            tenant_id: None,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], "v1");
        assert_eq!(json["type"], "Long");
        assert_eq!(json["version"], 2);
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00.000+0000");
    }
}
