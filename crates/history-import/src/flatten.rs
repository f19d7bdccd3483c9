//! Object and JSON variable flattening.
//!
//! Turns one JSON-valued variable into flat scalar variables keyed by
//! JSON path, so the store can index and filter on nested fields. Arrays
//! are kept as leaves: each one becomes a `_listSize` entry instead of
//! being expanded element by element.
//!
//! Naming: the root path maps to the original variable name, any other
//! path to `{name}.{path}`. Ids are `{id}_{flattenedName}`, except for a
//! root scalar which keeps the original id. Both are pure functions of
//! the source variable, so re-importing overwrites in place.

use serde_json::Value;
use tracing::{debug, warn};

use history_types::{
    format_date, parse_date, FlattenedVariable, ImportSettings, RawVariable, VariableType,
};

/// The only serialization format object variables may use.
pub const JSON_DATA_FORMAT: &str = "application/json";

const LIST_SIZE_SUFFIX: &str = "_listSize";

/// How the variable entered the flattener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Engine `Object` type serialized as JSON
    Object,
    /// Engine native `Json` type
    NativeJson,
}

/// Stateless flattener configured from [`ImportSettings`].
#[derive(Debug, Clone)]
pub struct VariableFlattener {
    max_string_length: usize,
    include_object_value: bool,
}

impl Default for VariableFlattener {
    fn default() -> Self {
        Self::from_settings(&ImportSettings::default())
    }
}

impl VariableFlattener {
    pub fn new(max_string_length: usize, include_object_value: bool) -> Self {
        Self {
            max_string_length: max_string_length.max(1),
            include_object_value,
        }
    }

    pub fn from_settings(settings: &ImportSettings) -> Self {
        Self::new(
            settings.max_string_variable_length,
            settings.include_object_variable_value,
        )
    }

    /// Flatten one variable.
    ///
    /// Primitive variables pass through as a single entry. Object and
    /// JSON variables are flattened. Anything else yields nothing.
    pub fn flatten(&self, variable: &RawVariable) -> Vec<FlattenedVariable> {
        if let Some(var_type) = VariableType::from_engine_type(&variable.engine_type) {
            return passthrough(variable, var_type).into_iter().collect();
        }

        match variable.engine_type.to_ascii_lowercase().as_str() {
            "object" => self.flatten_object(variable),
            "json" => self.flatten_native_json(variable),
            other => {
                debug!(variable = %variable.name, engine_type = other, "Unsupported variable type, skipping");
                Vec::new()
            }
        }
    }

    fn flatten_object(&self, variable: &RawVariable) -> Vec<FlattenedVariable> {
        let format = variable
            .value_info
            .serialization_data_format
            .as_deref()
            .unwrap_or_default();
        if !format.eq_ignore_ascii_case(JSON_DATA_FORMAT) {
            warn!(
                variable = %variable.name,
                format,
                "Object variable is not serialized as JSON, skipping"
            );
            return Vec::new();
        }

        let Some(json) = parse_json_value(variable) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        self.walk(variable, "", &json, Mode::Object, &mut out);
        if !is_primitive_or_homogeneous_list(&json) {
            self.push_object_value(variable, &json, &mut out);
        }
        out
    }

    fn flatten_native_json(&self, variable: &RawVariable) -> Vec<FlattenedVariable> {
        let Some(json) = parse_json_value(variable) else {
            return Vec::new();
        };

        if is_primitive_or_homogeneous_list(&json) {
            // The unflattened value already suffices
            return self
                .unflattened(variable, &json)
                .into_iter()
                .collect();
        }

        let mut out = Vec::new();
        self.walk(variable, "", &json, Mode::NativeJson, &mut out);
        self.push_object_value(variable, &json, &mut out);
        out
    }

    fn walk(
        &self,
        variable: &RawVariable,
        path: &str,
        value: &Value,
        mode: Mode,
        out: &mut Vec<FlattenedVariable>,
    ) {
        let is_root = path.is_empty();
        let name = if is_root {
            variable.name.clone()
        } else {
            format!("{}.{}", variable.name, path)
        };

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = if is_root {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    self.walk(variable, &child_path, child, mode, out);
                }
            }
            Value::Array(items) => {
                let size_name = format!("{name}.{LIST_SIZE_SUFFIX}");
                out.push(FlattenedVariable::scalar(
                    format!("{}_{}", variable.id, size_name),
                    size_name,
                    VariableType::Long,
                    items.len().to_string(),
                ));
                // Only a top-level list in object mode gets a representative
                // entry; nested lists stay size-only.
                if is_root && mode == Mode::Object {
                    if let Some((var_type, values)) = self.homogeneous_values(variable, items) {
                        out.push(FlattenedVariable {
                            id: format!("{}_{}", variable.id, name),
                            name,
                            var_type,
                            value: values,
                        });
                    }
                }
            }
            Value::Null => {
                debug!(variable = %variable.name, path, "Null leaf, skipping");
            }
            scalar => {
                let id = if is_root {
                    variable.id.clone()
                } else {
                    format!("{}_{}", variable.id, name)
                };
                if let Some((var_type, text)) = self.infer_scalar(variable, scalar) {
                    out.push(FlattenedVariable::scalar(id, name, var_type, text));
                }
            }
        }
    }

    /// Single entry carrying a primitive or homogeneous list unflattened.
    fn unflattened(&self, variable: &RawVariable, json: &Value) -> Option<FlattenedVariable> {
        let (var_type, value) = match json {
            Value::Array(items) => self.homogeneous_values(variable, items)?,
            scalar => {
                let (var_type, text) = self.infer_scalar(variable, scalar)?;
                (var_type, vec![text])
            }
        };
        Some(FlattenedVariable {
            id: variable.id.clone(),
            name: variable.name.clone(),
            var_type,
            value,
        })
    }

    fn push_object_value(
        &self,
        variable: &RawVariable,
        json: &Value,
        out: &mut Vec<FlattenedVariable>,
    ) {
        if !self.include_object_value {
            return;
        }
        match serde_json::to_string(json) {
            Ok(serialized) => out.push(FlattenedVariable::scalar(
                variable.id.clone(),
                variable.name.clone(),
                VariableType::Object,
                serialized,
            )),
            Err(e) => warn!(variable = %variable.name, error = %e, "Could not serialize object value"),
        }
    }

    fn infer_scalar(&self, variable: &RawVariable, value: &Value) -> Option<(VariableType, String)> {
        match value {
            Value::String(text) => Some(match parse_date(text) {
                Some(date) => (VariableType::Date, format_date(&date)),
                None => (VariableType::String, self.truncate(variable, text)),
            }),
            Value::Bool(flag) => Some((VariableType::Boolean, flag.to_string())),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Some((VariableType::Long, number.to_string()))
            }
            Value::Number(number) => Some((VariableType::Double, number.to_string())),
            _ => {
                debug!(variable = %variable.name, "Unsupported leaf value, skipping");
                None
            }
        }
    }

    /// Type and string values of a homogeneous primitive list.
    fn homogeneous_values(
        &self,
        variable: &RawVariable,
        items: &[Value],
    ) -> Option<(VariableType, Vec<String>)> {
        if !is_homogeneous_list(items) {
            return None;
        }
        let result = match &items[0] {
            Value::String(_) => {
                let texts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                let dates: Option<Vec<_>> = texts.iter().map(|t| parse_date(t)).collect();
                match dates {
                    Some(dates) => (
                        VariableType::Date,
                        dates.iter().map(format_date).collect(),
                    ),
                    None => (
                        VariableType::String,
                        texts.iter().map(|t| self.truncate(variable, t)).collect(),
                    ),
                }
            }
            Value::Bool(_) => (
                VariableType::Boolean,
                items.iter().map(Value::to_string).collect(),
            ),
            _ => {
                let integral = items
                    .iter()
                    .all(|v| v.is_i64() || v.is_u64());
                let var_type = if integral {
                    VariableType::Long
                } else {
                    VariableType::Double
                };
                (var_type, items.iter().map(Value::to_string).collect())
            }
        };
        Some(result)
    }

    fn truncate(&self, variable: &RawVariable, text: &str) -> String {
        let truncated = truncate_chars(text, self.max_string_length);
        if truncated.len() < text.len() {
            warn!(
                variable = %variable.name,
                max_length = self.max_string_length,
                "String value exceeds the maximum length, truncating"
            );
        }
        truncated
    }
}

/// Primitive variable as a single entry with the original identity.
fn passthrough(variable: &RawVariable, var_type: VariableType) -> Option<FlattenedVariable> {
    let value = match variable.value.as_ref() {
        None | Some(Value::Null) => {
            debug!(variable = %variable.name, "Variable without value, skipping");
            return None;
        }
        Some(Value::String(text)) if var_type == VariableType::Date => parse_date(text)
            .map(|date| format_date(&date))
            .unwrap_or_else(|| text.clone()),
        Some(value) => value_as_string(value)?,
    };
    Some(FlattenedVariable::scalar(
        variable.id.clone(),
        variable.name.clone(),
        var_type,
        value,
    ))
}

/// Read the variable's JSON, which may be inline or a serialized string.
fn parse_json_value(variable: &RawVariable) -> Option<Value> {
    match variable.value.as_ref() {
        None | Some(Value::Null) => {
            debug!(variable = %variable.name, "Variable without value, skipping");
            None
        }
        Some(Value::String(serialized)) => match serde_json::from_str(serialized) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(variable = %variable.name, error = %e, "Variable value is not valid JSON, skipping");
                None
            }
        },
        Some(inline) => Some(inline.clone()),
    }
}

/// Whether a value is a bare primitive or a non-empty list of one
/// primitive kind.
pub fn is_primitive_or_homogeneous_list(value: &Value) -> bool {
    match value {
        Value::String(_) | Value::Bool(_) | Value::Number(_) => true,
        Value::Array(items) => is_homogeneous_list(items),
        _ => false,
    }
}

fn is_homogeneous_list(items: &[Value]) -> bool {
    let Some(first) = items.first() else {
        return false;
    };
    match first {
        Value::String(_) => items.iter().all(Value::is_string),
        Value::Bool(_) => items.iter().all(Value::is_boolean),
        Value::Number(_) => items.iter().all(Value::is_number),
        _ => false,
    }
}

/// String form of a scalar JSON value; `None` for null.
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
