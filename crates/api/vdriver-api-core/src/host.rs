//! Host contracts: the scene graph's reflective attribute system and its
//! animation-curve storage. The driver core only talks to the host through
//! these traits; adapters (or the test fixtures) implement them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AttributeDescriptor, CurveId, ObjectId, ProxyValue, ValueKind};

/// Snapshot of a resolved value as seen through the host's reflection layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum HostValue {
    /// Nested struct (has fields)
    Struct { type_name: String },
    /// Collection of structs (subscriptable by index or by name key)
    Collection { len: usize },
    /// Fixed-size array of scalars
    Array(Vec<ProxyValue>),
    Scalar(ProxyValue),
    Text(String),
    Pointer(Option<ObjectId>),
}

impl HostValue {
    pub fn as_scalar(&self) -> Option<&ProxyValue> {
        match self {
            HostValue::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("object {0} no longer exists")]
    MissingObject(ObjectId),
    #[error("'{path}' does not resolve: {reason}")]
    Unresolved { path: String, reason: String },
    #[error("'{path}' is read-only")]
    ReadOnly { path: String },
    #[error("'{path}' cannot hold a {kind} value")]
    TypeMismatch { path: String, kind: ValueKind },
    #[error("index {index} out of range for '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Reflective access to the host scene graph.
pub trait SceneHost {
    /// Whether the handle still refers to a live object.
    fn contains(&self, id: ObjectId) -> bool;

    /// Evaluate a textual data path against a root object. The empty path
    /// resolves to the root itself.
    fn resolve_path(&self, root: ObjectId, path: &str) -> Result<HostValue, HostError>;

    /// Descriptor of `field` on the struct found at `container_path`
    /// (empty path = the root itself). `None` when the container is not a
    /// struct or has no such field.
    fn descriptor(
        &self,
        root: ObjectId,
        container_path: &str,
        field: &str,
    ) -> Option<AttributeDescriptor>;

    /// Assign `value` to the attribute at `path`, or to one slot of it when
    /// `array_index` is given.
    fn write_attribute(
        &mut self,
        root: ObjectId,
        path: &str,
        array_index: Option<usize>,
        value: &ProxyValue,
    ) -> Result<(), HostError>;
}

/// One curve binding inside an owner's animation data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveBinding {
    pub id: CurveId,
    pub data_path: String,
    pub array_index: usize,
}

/// Animation-curve storage per owner object.
pub trait CurveStore {
    /// All curve bindings on `owner`, or `None` if it has no animation data at all.
    fn bindings(&self, owner: ObjectId) -> Option<Vec<CurveBinding>>;

    fn remove_curve(&mut self, owner: ObjectId, curve: CurveId) -> bool;

    /// Duplicate a curve on the same owner, returning the copy.
    fn clone_curve(&mut self, owner: ObjectId, curve: CurveId) -> Option<CurveId>;

    /// Rebind a curve to another target path.
    fn set_curve_target(
        &mut self,
        owner: ObjectId,
        curve: CurveId,
        path: &str,
        array_index: usize,
    ) -> bool;

    /// Curves bound exactly to `(path, array_index)`.
    fn curves_bound_to(&self, owner: ObjectId, path: &str, array_index: usize) -> Vec<CurveId> {
        self.bindings(owner)
            .unwrap_or_default()
            .into_iter()
            .filter(|b| b.data_path == path && b.array_index == array_index)
            .map(|b| b.id)
            .collect()
    }
}
