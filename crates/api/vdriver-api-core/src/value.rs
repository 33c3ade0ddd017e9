//! ProxyValue: the scalar payload a virtual driver carries.
//! Numeric payloads use f32/i32 like the host's float and int attributes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse kind of a proxy value. Only these kinds can be driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Enum,
}

impl ValueKind {
    /// Upper-case tag matching the host's property type names.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "BOOLEAN",
            ValueKind::Int => "INT",
            ValueKind::Float => "FLOAT",
            ValueKind::Enum => "ENUM",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ProxyValue {
    /// Boolean toggle
    Bool(bool),

    /// Integer attribute
    Int(i32),

    /// Float attribute
    Float(f32),

    /// Single-choice enum, stored by item identifier
    Enum(String),

    /// Flag enum: every enabled item identifier
    #[serde(rename = "enum_flags")]
    EnumFlags(Vec<String>),
}

impl ProxyValue {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            ProxyValue::Bool(_) => ValueKind::Bool,
            ProxyValue::Int(_) => ValueKind::Int,
            ProxyValue::Float(_) => ValueKind::Float,
            ProxyValue::Enum(_) | ProxyValue::EnumFlags(_) => ValueKind::Enum,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        ProxyValue::Float(v)
    }

    pub fn i(v: i32) -> Self {
        ProxyValue::Int(v)
    }

    pub fn enum_item(identifier: impl Into<String>) -> Self {
        ProxyValue::Enum(identifier.into())
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            ProxyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ProxyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ProxyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyValue::Bool(b) => write!(f, "{b}"),
            ProxyValue::Int(i) => write!(f, "{i}"),
            ProxyValue::Float(v) => write!(f, "{v}"),
            ProxyValue::Enum(id) => write!(f, "'{id}'"),
            ProxyValue::EnumFlags(ids) => write!(f, "{{{}}}", ids.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(ProxyValue::f(1.0).kind(), ValueKind::Float);
        assert_eq!(ProxyValue::i(1).kind(), ValueKind::Int);
        assert_eq!(ProxyValue::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(ProxyValue::enum_item("A").kind(), ValueKind::Enum);
        assert_eq!(ProxyValue::EnumFlags(vec![]).kind(), ValueKind::Enum);
    }

    #[test]
    fn serde_uses_type_and_data_tags() {
        let s = serde_json::to_string(&ProxyValue::f(0.5)).unwrap();
        assert_eq!(s, r#"{"type":"float","data":0.5}"#);
        let flags: ProxyValue =
            serde_json::from_str(r#"{"type":"enum_flags","data":["X","Y"]}"#).unwrap();
        assert_eq!(flags, ProxyValue::EnumFlags(vec!["X".into(), "Y".into()]));
    }
}
