//! Store variable types and flattened variables.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::ValueInfo;

/// Variable types the store's schema understands.
///
/// The serialized ids are part of the store schema and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    String,
    Date,
    Boolean,
    Double,
    Long,
    Object,
}

impl VariableType {
    /// Schema id of this type.
    pub fn id(&self) -> &'static str {
        match self {
            VariableType::String => "String",
            VariableType::Date => "Date",
            VariableType::Boolean => "Boolean",
            VariableType::Double => "Double",
            VariableType::Long => "Long",
            VariableType::Object => "Object",
        }
    }

    /// Map an engine primitive type name to a store type.
    ///
    /// Returns `None` for types the store cannot hold as a scalar
    /// (`Object`, `Json`, `Bytes`, `File`, `Null`, unknown names).
    pub fn from_engine_type(engine_type: &str) -> Option<Self> {
        match engine_type.to_ascii_lowercase().as_str() {
            "string" => Some(VariableType::String),
            "date" => Some(VariableType::Date),
            "boolean" => Some(VariableType::Boolean),
            "double" => Some(VariableType::Double),
            "long" | "integer" | "short" => Some(VariableType::Long),
            _ => None,
        }
    }
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A variable as it enters the flattener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariable {
    pub id: String,
    pub name: String,
    /// Engine type name, e.g. `String`, `Object`, `Json`
    pub engine_type: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub value_info: ValueInfo,
}

impl RawVariable {
    /// Create a raw variable without serialization info.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        engine_type: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            engine_type: engine_type.into(),
            value,
            value_info: ValueInfo::default(),
        }
    }

    /// Set the serialization data format.
    pub fn with_serialization_format(mut self, format: impl Into<String>) -> Self {
        self.value_info.serialization_data_format = Some(format.into());
        self
    }
}

/// One scalar variable derived from a source variable.
///
/// `value` is a list so homogeneous list variables keep every element;
/// scalar variables carry exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedVariable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub value: Vec<String>,
}

impl FlattenedVariable {
    /// Create a single-valued flattened variable.
    pub fn scalar(
        id: impl Into<String>,
        name: impl Into<String>,
        var_type: VariableType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            var_type,
            value: vec![value.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ids_are_schema_stable() {
        let json = serde_json::to_string(&VariableType::Long).unwrap();
        assert_eq!(json, "\"Long\"");
        assert_eq!(VariableType::Object.to_string(), "Object");
    }

    #[test]
    fn test_engine_type_mapping() {
        assert_eq!(
            VariableType::from_engine_type("Integer"),
            Some(VariableType::Long)
        );
        assert_eq!(
            VariableType::from_engine_type("short"),
            Some(VariableType::Long)
        );
        assert_eq!(
            VariableType::from_engine_type("Date"),
            Some(VariableType::Date)
        );
        assert_eq!(VariableType::from_engine_type("Object"), None);
        assert_eq!(VariableType::from_engine_type("Bytes"), None);
        assert_eq!(VariableType::from_engine_type("Json"), None);
    }

    #[test]
    fn test_flattened_variable_json() {
        let var = FlattenedVariable::scalar("v1_payload.a", "payload.a", VariableType::Long, "1");
        let json = serde_json::to_string(&var).unwrap();
        assert_eq!(
            json,
            r#"{"id":"v1_payload.a","name":"payload.a","type":"Long","value":["1"]}"#
        );
    }
}
