use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as strict structured output.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// JSON schema suitable for `generationConfig.responseJsonSchema`:
    /// every object closed (`additionalProperties: false`), every property
    /// required, and all `$ref`s inlined.
    fn response_schema() -> Value {
        let mut value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions")
            }
            _ => None,
        };

        normalize(&mut value, definitions.as_ref());
        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn normalize(value: &mut Value, definitions: Option<&Value>) {
    match value {
        Value::Object(map) => {
            if let Some(replacement) = resolve_ref(map, definitions) {
                *value = replacement;
                normalize(value, definitions);
                return;
            }

            // schemars wraps documented nested types as a single-element allOf.
            let single = match map.get("allOf") {
                Some(Value::Array(all_of)) if all_of.len() == 1 => Some(all_of[0].clone()),
                _ => None,
            };
            if let Some(inner) = single {
                *value = inner;
                normalize(value, definitions);
                return;
            }

            close_object(map);

            for (_, v) in map.iter_mut() {
                normalize(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize(item, definitions);
            }
        }
        _ => {}
    }
}

fn resolve_ref(map: &Map<String, Value>, definitions: Option<&Value>) -> Option<Value> {
    let path = map.get("$ref")?.as_str()?;
    let name = path.strip_prefix("#/definitions/")?;
    definitions?.get(name).cloned()
}

fn close_object(map: &mut Map<String, Value>) {
    if map.get("type").and_then(Value::as_str) != Some("object") {
        return;
    }
    map.insert("additionalProperties".to_string(), Value::Bool(false));

    let required: Option<Vec<Value>> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect());
    if let Some(required) = required {
        map.insert("required".to_string(), Value::Array(required));
    }
}
