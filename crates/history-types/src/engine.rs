//! Historic records as produced by the engine's history API.
//!
//! These are read-only inputs to the pipeline. Field names follow the
//! engine's camelCase JSON; optional identity fields (definition keys,
//! tenants) are frequently absent and are resolved by the import services.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date_format::{store_date, store_date_opt, EngineDateTime};

/// Historic process instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricProcessInstance {
    pub id: String,
    #[serde(default)]
    pub business_key: Option<String>,
    pub process_definition_id: String,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    #[serde(default)]
    pub process_definition_version: Option<i32>,
    #[serde(with = "store_date")]
    pub start_time: EngineDateTime,
    #[serde(with = "store_date_opt", default)]
    pub end_time: Option<EngineDateTime>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Historic activity (flow node) instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricActivityInstance {
    pub id: String,
    pub activity_id: String,
    pub activity_type: String,
    #[serde(default)]
    pub activity_name: Option<String>,
    pub process_definition_id: String,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    pub process_instance_id: String,
    #[serde(with = "store_date")]
    pub start_time: EngineDateTime,
    #[serde(with = "store_date_opt", default)]
    pub end_time: Option<EngineDateTime>,
    #[serde(default)]
    pub duration_in_millis: Option<i64>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Historic user task instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricUserTaskInstance {
    pub id: String,
    pub task_definition_key: String,
    #[serde(default)]
    pub activity_instance_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    pub process_definition_id: String,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    pub process_instance_id: String,
    #[serde(with = "store_date")]
    pub start_time: EngineDateTime,
    #[serde(with = "store_date_opt", default)]
    pub end_time: Option<EngineDateTime>,
    #[serde(with = "store_date_opt", default)]
    pub due: Option<EngineDateTime>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub delete_reason: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// One evaluated input of a decision instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricDecisionInput {
    pub id: String,
    pub clause_id: String,
    #[serde(default)]
    pub clause_name: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// One produced output of a decision instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricDecisionOutput {
    pub id: String,
    pub clause_id: String,
    #[serde(default)]
    pub clause_name: Option<String>,
    pub rule_id: String,
    #[serde(default)]
    pub rule_order: Option<i32>,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Historic decision instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricDecisionInstance {
    pub id: String,
    pub decision_definition_id: String,
    #[serde(default)]
    pub decision_definition_key: Option<String>,
    #[serde(default)]
    pub process_definition_id: Option<String>,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(default)]
    pub root_process_instance_id: Option<String>,
    #[serde(default)]
    pub root_decision_instance_id: Option<String>,
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(with = "store_date")]
    pub evaluation_time: EngineDateTime,
    #[serde(default)]
    pub collect_result_value: Option<f64>,
    #[serde(default)]
    pub inputs: Vec<HistoricDecisionInput>,
    #[serde(default)]
    pub outputs: Vec<HistoricDecisionOutput>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Process or decision definition as listed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDefinition {
    pub id: String,
    pub key: String,
    pub version: i32,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

/// Historic identity link log entry (assignments, candidate groups, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricIdentityLinkLog {
    pub id: String,
    #[serde(rename = "type")]
    pub link_type: String,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub assigner_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub process_definition_id: Option<String>,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(with = "store_date")]
    pub time: EngineDateTime,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Historic user operation log entry.
///
/// The engine writes one entry per changed property, so a single
/// operation may surface as several entries sharing an `operation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricUserOperationLog {
    pub id: String,
    #[serde(default)]
    pub operation_id: Option<String>,
    pub operation_type: String,
    pub entity_type: String,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    #[serde(default)]
    pub process_definition_id: Option<String>,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(with = "store_date")]
    pub timestamp: EngineDateTime,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Serialization details attached to object variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueInfo {
    #[serde(default)]
    pub object_type_name: Option<String>,
    #[serde(default)]
    pub serialization_data_format: Option<String>,
}

/// Historic variable update (one detail entry per variable write).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricVariableUpdate {
    /// Detail id of this particular update
    pub id: String,
    /// Raw id of the variable instance, shared by all its updates
    pub variable_instance_id: String,
    pub variable_name: String,
    pub variable_type: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub value_info: ValueInfo,
    pub process_definition_id: String,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    pub process_instance_id: String,
    /// Monotonic per variable instance; the highest one wins
    pub sequence_counter: i64,
    #[serde(with = "store_date")]
    pub time: EngineDateTime,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Engine tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTenant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Position of one import cursor, persisted so imports resume after restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportIndexSnapshot {
    pub entity_type: crate::entity::EntityType,
    #[serde(with = "store_date_opt", default)]
    pub timestamp_of_last_entity: Option<EngineDateTime>,
    #[serde(default)]
    pub position: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_instance_from_engine_json() {
        let json = r#"{
            "id": "pi-1",
            "businessKey": "order-7",
            "processDefinitionId": "invoice:1:abc",
            "processDefinitionKey": "invoice",
            "startTime": "2024-01-01T10:00:00.000+0000",
            "endTime": "2024-01-01T10:00:05.000+0000",
            "state": "COMPLETED"
        }"#;
        let instance: HistoricProcessInstance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.process_definition_key.as_deref(), Some("invoice"));
        assert!(instance.tenant_id.is_none());
        let end = instance.end_time.unwrap();
        assert_eq!((end - instance.start_time).num_milliseconds(), 5000);
    }

    #[test]
    fn test_variable_update_defaults() {
        let json = r#"{
            "id": "detail-1",
            "variableInstanceId": "var-1",
            "variableName": "amount",
            "variableType": "Long",
            "value": 12,
            "processDefinitionId": "invoice:1:abc",
            "processInstanceId": "pi-1",
            "sequenceCounter": 3,
            "time": "2024-01-01T10:00:00Z"
        }"#;
        let update: HistoricVariableUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.value_info, ValueInfo::default());
        assert!(update.process_definition_key.is_none());
        assert_eq!(update.sequence_counter, 3);
    }

    #[test]
    fn test_decision_io_type_field() {
        let json = r#"{"id":"in-1","clauseId":"c1","type":"String","value":"gold"}"#;
        let input: HistoricDecisionInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.value_type, "String");
        assert_eq!(input.value, Some(Value::String("gold".into())));
    }
}
