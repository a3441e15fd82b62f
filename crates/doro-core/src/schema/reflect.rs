use serde_json::{json, Map, Value};

use crate::domain::fields::{FieldSpec, Section, TOGGLE_DOMAIN, VISION_FIELDS};

pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";
pub const SCHEMA_TITLE: &str = "DoroBot Config";

/// Builds the JSON schema of a [`ConfigDocument`](crate::ConfigDocument).
///
/// Every known section is required.  Unknown top-level keys are allowed
/// because the store preserves them across load and save.
pub fn generate_schema() -> Value {
    let properties: Map<String, Value> = Section::ALL
        .into_iter()
        .map(|section| (section.name().to_string(), section_schema(section)))
        .collect();
    let required: Vec<&str> = Section::ALL.into_iter().map(Section::name).collect();

    json!({
        "$schema": SCHEMA_DIALECT,
        "title": SCHEMA_TITLE,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": true,
    })
}

fn section_schema(section: Section) -> Value {
    match section {
        Section::Meta => json!({
            "type": "object",
            "properties": { "version": { "type": "integer", "minimum": 1 } },
            "required": ["version"],
        }),
        Section::Vision => {
            let properties: Map<String, Value> = VISION_FIELDS
                .iter()
                .map(|field| (field.name.to_string(), field_schema(field)))
                .collect();
            let required: Vec<&str> = VISION_FIELDS.iter().map(|f| f.name).collect();
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            })
        }
        Section::Tasks => json!({
            "type": "object",
            "additionalProperties": { "type": "boolean" },
        }),
        Section::Toggles => json!({
            "type": "object",
            "additionalProperties": { "type": "integer", "enum": TOGGLE_DOMAIN },
        }),
        Section::NumericSettings => json!({
            "type": "object",
            "additionalProperties": { "type": ["integer", "number", "string"] },
        }),
    }
}

fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), json!(field.kind.json_type()));
    if let Some(min) = field.minimum {
        schema.insert("minimum".to_string(), bound(min));
    }
    if let Some(max) = field.maximum {
        schema.insert("maximum".to_string(), bound(max));
    }
    Value::Object(schema)
}

/// Writes integral bounds as JSON integers (`0`, not `0.0`).
fn bound(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
