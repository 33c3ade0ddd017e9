//! Coercion helpers between proxy value kinds.
//! Scalar kinds convert freely (bool <-> int <-> float); enums only convert to
//! enums since an identifier cannot be synthesized from a number here.

use crate::{ProxyValue, ValueKind};

/// Attempt to coerce a ProxyValue into a scalar f32.
/// Rules:
/// - Float -> its value
/// - Int -> as f32
/// - Bool -> 1.0 / 0.0
/// - Enum / EnumFlags -> 0.0
pub fn to_float(v: &ProxyValue) -> f32 {
    match v {
        ProxyValue::Float(f) => *f,
        ProxyValue::Int(i) => *i as f32,
        ProxyValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        ProxyValue::Enum(_) | ProxyValue::EnumFlags(_) => 0.0,
    }
}

/// Coerce into i32. Floats round to nearest and saturate at the i32 range;
/// NaN maps to 0.
pub fn to_int(v: &ProxyValue) -> i32 {
    match v {
        ProxyValue::Int(i) => *i,
        ProxyValue::Float(f) => f.round() as i32,
        ProxyValue::Bool(b) => i32::from(*b),
        ProxyValue::Enum(_) | ProxyValue::EnumFlags(_) => 0,
    }
}

/// Coerce into bool: non-zero numbers and non-empty flag sets are true.
pub fn to_bool(v: &ProxyValue) -> bool {
    match v {
        ProxyValue::Bool(b) => *b,
        ProxyValue::Int(i) => *i != 0,
        ProxyValue::Float(f) => *f != 0.0,
        ProxyValue::Enum(id) => !id.is_empty(),
        ProxyValue::EnumFlags(ids) => !ids.is_empty(),
    }
}

/// Convert a value into the requested kind. Returns `None` when no sensible
/// conversion exists (numbers into enums, enums into numbers).
pub fn coerce(v: &ProxyValue, kind: ValueKind) -> Option<ProxyValue> {
    match (kind, v) {
        (ValueKind::Enum, ProxyValue::Enum(_) | ProxyValue::EnumFlags(_)) => Some(v.clone()),
        (ValueKind::Enum, _) => None,
        (_, ProxyValue::Enum(_) | ProxyValue::EnumFlags(_)) => None,
        (ValueKind::Float, _) => Some(ProxyValue::Float(to_float(v))),
        (ValueKind::Int, _) => Some(ProxyValue::Int(to_int(v))),
        (ValueKind::Bool, _) => Some(ProxyValue::Bool(to_bool(v))),
    }
}
