//! Write operations produced by an evaluation pass to describe back-writes of
//! proxy values onto real host attributes.
//!
//! WriteOp serializes to JSON as:
//!   { "root": "<uuid>", "path": "nested.items", "array_index": 2, "value": { "type": "float", "data": 1.5 } }
//!
//! WriteBatch is a simple Vec<WriteOp> with helpers.

use crate::{DataPath, ObjectId, ProxyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOp {
    pub root: ObjectId,
    pub path: DataPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
    pub value: ProxyValue,
}

impl WriteOp {
    pub fn new(root: ObjectId, path: DataPath, value: ProxyValue) -> Self {
        Self::new_indexed(root, path, None, value)
    }

    pub fn new_indexed(
        root: ObjectId,
        path: DataPath,
        array_index: Option<usize>,
        value: ProxyValue,
    ) -> Self {
        Self {
            root,
            path,
            array_index,
            value,
        }
    }
}

/// A batch of write operations. An evaluation pass emits one WriteBatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch(pub Vec<WriteOp>);

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch(Vec::new())
    }

    pub fn push(&mut self, op: WriteOp) {
        self.0.push(op);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = WriteOp>) {
        self.0.extend(other);
    }

    pub fn into_vec(self) -> Vec<WriteOp> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteOp> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge another batch in-place (append).
    pub fn append(&mut self, mut other: WriteBatch) {
        self.0.append(&mut other.0)
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.array_index {
            Some(i) => write!(f, "{{ {}: {}[{}] = {} }}", self.root, self.path, i, self.value),
            None => write!(f, "{{ {}: {} = {} }}", self.root, self.path, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writeop_roundtrip_json() {
        let op = WriteOp::new_indexed(
            ObjectId::new(),
            DataPath::parse("nested.items").unwrap(),
            Some(2),
            ProxyValue::Float(1.5),
        );
        let s = serde_json::to_string(&op).unwrap();
        assert!(s.contains(r#""path":"nested.items""#));
        let parsed: WriteOp = serde_json::from_str(&s).unwrap();
        assert_eq!(op, parsed);
    }

    #[test]
    fn unindexed_op_omits_array_index() {
        let root = ObjectId::new();
        let mut b = WriteBatch::new();
        b.push(WriteOp::new(
            root,
            DataPath::parse("size").unwrap(),
            ProxyValue::Int(3),
        ));
        let s = serde_json::to_string(&b).unwrap();
        assert!(!s.contains("array_index"));
        let parsed: WriteBatch = serde_json::from_str(&s).unwrap();
        assert_eq!(b, parsed);
        assert_eq!(parsed.len(), 1);
        assert_eq!(b.0[0].to_string(), format!("{{ {root}: size = 3 }}"));
    }
}
