use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Option ids are numbers for custom fields but strings for some built-in
/// ones (`visible_to`, `marketing_status`).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OptionId {
    Int(i64),
    Str(String),
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Int(id) => write!(f, "{}", id),
            OptionId::Str(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FieldOption {
    pub id: OptionId,
    pub label: String,
}

/// A Pipedrive object field as returned by `/personFields` and friends.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GetField {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub field_type: String,
    #[serde(default)]
    pub edit_flag: bool,
    pub options: Option<Vec<FieldOption>>,
}

impl GetField {
    fn label_for(&self, id: &str) -> Option<&str> {
        self.options
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|option| option.id.to_string() == id)
            .map(|option| option.label.as_str())
    }
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn translate(field: &GetField, value: Value) -> Value {
    match (field.field_type.as_str(), value) {
        (_, Value::Null) => Value::Null,
        ("enum", value) => field
            .label_for(&id_string(&value))
            .map(|label| Value::String(label.to_string()))
            .unwrap_or(Value::Null),
        ("set", value) => {
            let ids = id_string(&value);
            Value::Array(
                ids.split(',')
                    .filter_map(|id| field.label_for(id.trim()))
                    .map(|label| Value::String(label.to_string()))
                    .collect(),
            )
        }
        (_, value) => value,
    }
}

/// Rename custom field hashes in `data` to their display names, resolving
/// option ids to labels. Non-object data is returned unchanged. A field whose
/// name is already a key of the record stays under its hash.
pub fn transform_custom_fields(fields: &[GetField], data: Value) -> Value {
    let mut record: Map<String, Value> = match data {
        Value::Object(record) => record,
        other => return other,
    };
    for field in fields.iter().filter(|field| field.edit_flag) {
        if field.name != field.key && record.contains_key(&field.name) {
            continue;
        }
        if let Some(value) = record.remove(&field.key) {
            record.insert(field.name.clone(), translate(field, value));
        }
    }
    Value::Object(record)
}
