use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::{AttributeDescriptor, ProxyValue};

/// Errors produced while reading shorthand JSON.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("value json: {0}")]
    Value(#[from] serde_json::Error),
    #[error("unsupported value shorthand: {0}")]
    Unsupported(String),
}

/// Normalize shorthand proxy-value JSON into the canonical `{ "type": ..., "data": ... }`
/// representation understood by the serde derives on [`ProxyValue`]. Accepts
/// shorthand objects such as `{ "int": 3 }` or `{ "flags": ["A"] }` and primitive
/// aliases: numbers become floats, booleans bools, strings enum identifiers and
/// arrays of strings flag sets.
pub fn normalize_value_json(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => json!({ "type": "float", "data": n }),
        JsonValue::Bool(b) => json!({ "type": "bool", "data": b }),
        JsonValue::String(s) => json!({ "type": "enum", "data": s }),
        JsonValue::Array(arr) if arr.iter().all(|x| x.is_string()) => {
            json!({ "type": "enum_flags", "data": arr })
        }
        JsonValue::Object(obj) => {
            if obj.contains_key("type") && obj.contains_key("data") {
                return JsonValue::Object(obj);
            }
            if let Some(f) = obj.get("float").and_then(|x| x.as_f64()) {
                return json!({ "type": "float", "data": f });
            }
            if let Some(i) = obj.get("int").and_then(|x| x.as_i64()) {
                return json!({ "type": "int", "data": i });
            }
            if let Some(b) = obj.get("bool").and_then(|x| x.as_bool()) {
                return json!({ "type": "bool", "data": b });
            }
            if let Some(s) = obj.get("enum").and_then(|x| x.as_str()) {
                return json!({ "type": "enum", "data": s });
            }
            if let Some(arr) = obj.get("flags").and_then(|x| x.as_array()) {
                return json!({ "type": "enum_flags", "data": arr });
            }
            JsonValue::Object(obj)
        }
        other => other,
    }
}

/// Normalize then deserialize into the strongly typed [`ProxyValue`].
pub fn parse_value(value: JsonValue) -> Result<ProxyValue, JsonError> {
    let normalized = normalize_value_json(value);
    Ok(serde_json::from_value(normalized)?)
}

/// Parse a list of shorthand values (array attribute contents).
pub fn parse_values(value: JsonValue) -> Result<Vec<ProxyValue>, JsonError> {
    match value {
        JsonValue::Array(items) => items.into_iter().map(parse_value).collect(),
        other => Err(JsonError::Unsupported(other.to_string())),
    }
}

/// Parse an attribute descriptor, accepting the `"range": [min, max]` shorthand
/// for setting hard and soft ranges together.
pub fn parse_descriptor(value: JsonValue) -> Result<AttributeDescriptor, JsonError> {
    let mut value = value;
    let range = value.as_object_mut().and_then(|obj| {
        let is_pair = matches!(obj.get("range"), Some(JsonValue::Array(pair)) if pair.len() == 2);
        if is_pair {
            obj.remove("range")
        } else {
            None
        }
    });
    let descriptor: AttributeDescriptor = serde_json::from_value(value)?;
    match range {
        Some(JsonValue::Array(pair)) => {
            let min = pair[0]
                .as_f64()
                .ok_or_else(|| JsonError::Unsupported(pair[0].to_string()))?;
            let max = pair[1]
                .as_f64()
                .ok_or_else(|| JsonError::Unsupported(pair[1].to_string()))?;
            Ok(descriptor.with_range(min, max))
        }
        _ => Ok(descriptor),
    }
}

/// Convert a [`ProxyValue`] into the shorthand JSON form.
pub fn value_to_shorthand_json(value: &ProxyValue) -> JsonValue {
    match value {
        ProxyValue::Float(f) => json!({ "float": *f }),
        ProxyValue::Int(i) => json!({ "int": *i }),
        ProxyValue::Bool(b) => json!({ "bool": *b }),
        ProxyValue::Enum(s) => json!({ "enum": s }),
        ProxyValue::EnumFlags(ids) => json!({ "flags": ids }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeKind;

    #[test]
    fn primitive_aliases() {
        assert_eq!(parse_value(json!(1.5)).unwrap(), ProxyValue::Float(1.5));
        assert_eq!(parse_value(json!(true)).unwrap(), ProxyValue::Bool(true));
        assert_eq!(
            parse_value(json!("XYZ")).unwrap(),
            ProxyValue::enum_item("XYZ")
        );
        assert_eq!(
            parse_value(json!(["A", "B"])).unwrap(),
            ProxyValue::EnumFlags(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn shorthand_objects_roundtrip() {
        for v in [
            ProxyValue::Int(-4),
            ProxyValue::Float(0.25),
            ProxyValue::Bool(false),
            ProxyValue::enum_item("QUATERNION"),
        ] {
            let parsed = parse_value(value_to_shorthand_json(&v)).expect("parse value");
            assert_eq!(parsed, v);
        }
    }

    #[test]
    fn parse_values_rejects_non_arrays() {
        assert_eq!(parse_values(json!([1.0, 2.0])).unwrap().len(), 2);
        assert!(matches!(
            parse_values(json!(1.0)),
            Err(JsonError::Unsupported(_))
        ));
    }

    #[test]
    fn descriptor_range_shorthand() {
        let d = parse_descriptor(json!({
            "identifier": "size",
            "kind": "float",
            "range": [0.0, 10.0],
            "flags": { "animatable": true }
        }))
        .unwrap();
        assert_eq!(d.kind, AttributeKind::Float);
        assert_eq!((d.range.hard_min, d.range.hard_max), (0.0, 10.0));
        assert_eq!((d.range.soft_min, d.range.soft_max), (0.0, 10.0));
        assert!(d.flags.animatable);
    }
}
