//! Shapes handed to adapters.
//!
//! These are intentionally flat and owned so adapters can rewrite them
//! freely. Import services convert to and from their internal types
//! around each chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use history_types::{EngineDateTime, RawVariable, ValueInfo};

/// Business key of one process instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessKey {
    pub process_instance_id: String,
    pub business_key: Option<String>,
}

impl BusinessKey {
    /// Create a business key entry.
    pub fn new(process_instance_id: impl Into<String>, business_key: Option<String>) -> Self {
        Self {
            process_instance_id: process_instance_id.into(),
            business_key,
        }
    }
}

/// One variable update, deduplicated and resolved, before flattening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginVariable {
    pub id: String,
    pub name: String,
    /// Engine type name
    #[serde(rename = "type")]
    pub var_type: String,
    pub value: Option<Value>,
    #[serde(default)]
    pub value_info: ValueInfo,
    pub process_definition_key: String,
    pub process_definition_id: String,
    pub process_instance_id: String,
    pub version: i64,
    pub timestamp: EngineDateTime,
    pub engine_alias: String,
    pub tenant_id: Option<String>,
}

impl PluginVariable {
    /// Whether an adapter left this entry importable.
    pub fn is_valid(&self) -> bool {
        [
            &self.id,
            &self.name,
            &self.var_type,
            &self.process_instance_id,
            &self.process_definition_key,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    /// The flattener's view of this variable.
    pub fn to_raw_variable(&self) -> RawVariable {
        RawVariable {
            id: self.id.clone(),
            name: self.name.clone(),
            engine_type: self.var_type.clone(),
            value: self.value.clone(),
            value_info: self.value_info.clone(),
        }
    }
}

/// One decision input with its owning instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDecisionInput {
    pub id: String,
    pub clause_id: String,
    pub clause_name: Option<String>,
    /// Engine type name
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: Option<Value>,
    pub decision_instance_id: String,
    pub decision_definition_key: String,
    pub decision_definition_version: String,
    pub engine_alias: String,
    pub tenant_id: Option<String>,
}

/// One decision output with its owning instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDecisionOutput {
    pub id: String,
    pub clause_id: String,
    pub clause_name: Option<String>,
    pub rule_id: String,
    pub rule_order: Option<i32>,
    pub variable_name: Option<String>,
    /// Engine type name
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: Option<Value>,
    pub decision_instance_id: String,
    pub decision_definition_key: String,
    pub decision_definition_version: String,
    pub engine_alias: String,
    pub tenant_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable() -> PluginVariable {
        PluginVariable {
            id: "var-1".into(),
            name: "amount".into(),
            var_type: "Long".into(),
            value: Some(Value::from(5)),
            value_info: ValueInfo::default(),
            process_definition_key: "invoice".into(),
            process_definition_id: "invoice:1:abc".into(),
            process_instance_id: "pi-1".into(),
            version: 3,
            timestamp: history_types::parse_date("2024-01-01T00:00:00Z").unwrap(),
            engine_alias: "camunda-bpm".into(),
            tenant_id: None,
        }
    }

    #[test]
    fn test_variable_validity() {
        let mut var = variable();
        assert!(var.is_valid());

        var.name = "  ".into();
        assert!(!var.is_valid());

        let mut var = variable();
        var.var_type.clear();
        assert!(!var.is_valid());
    }

    #[test]
    fn test_to_raw_variable() {
        let raw = variable().to_raw_variable();
        assert_eq!(raw.id, "var-1");
        assert_eq!(raw.engine_type, "Long");
        assert_eq!(raw.value, Some(Value::from(5)));
    }
}
