//! Trace blocks: the live editor block and the persisted list entries share
//! the same field set, addressed generically through [`DriverField`].

use serde::{Deserialize, Serialize};

use vdriver_api_core::{ObjectId, ProxySchema, ProxyValue, ValueKind};

use crate::IdType;

/// Addressable fields of a trace block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverField {
    Name,
    Index,
    IsValid,
    IdType,
    Root,
    DataPath,
    Mute,
    Proxy,
    HasCurve,
    PropKind,
}

impl DriverField {
    pub const ALL: [DriverField; 10] = [
        DriverField::Name,
        DriverField::Index,
        DriverField::IsValid,
        DriverField::IdType,
        DriverField::Root,
        DriverField::DataPath,
        DriverField::Mute,
        DriverField::Proxy,
        DriverField::HasCurve,
        DriverField::PropKind,
    ];

    /// Copied entry -> live when the selection changes, in this order.
    pub const SELECTION: [DriverField; 7] = [
        DriverField::Name,
        DriverField::Index,
        DriverField::IdType,
        DriverField::Root,
        DriverField::DataPath,
        DriverField::Proxy,
        DriverField::Mute,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            DriverField::Name => "name",
            DriverField::Index => "index",
            DriverField::IsValid => "is_valid",
            DriverField::IdType => "id_type",
            DriverField::Root => "id",
            DriverField::DataPath => "data_path",
            DriverField::Mute => "mute",
            DriverField::Proxy => "prop",
            DriverField::HasCurve => "fcurve",
            DriverField::PropKind => "prop_type",
        }
    }
}

/// A value for one [`DriverField`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Name(String),
    Index(usize),
    IsValid(bool),
    IdType(IdType),
    Root(Option<ObjectId>),
    DataPath(String),
    Mute(bool),
    Proxy(Option<ProxyValue>),
    HasCurve(bool),
    PropKind(Option<ValueKind>),
}

impl FieldValue {
    pub fn field(&self) -> DriverField {
        match self {
            FieldValue::Name(_) => DriverField::Name,
            FieldValue::Index(_) => DriverField::Index,
            FieldValue::IsValid(_) => DriverField::IsValid,
            FieldValue::IdType(_) => DriverField::IdType,
            FieldValue::Root(_) => DriverField::Root,
            FieldValue::DataPath(_) => DriverField::DataPath,
            FieldValue::Mute(_) => DriverField::Mute,
            FieldValue::Proxy(_) => DriverField::Proxy,
            FieldValue::HasCurve(_) => DriverField::HasCurve,
            FieldValue::PropKind(_) => DriverField::PropKind,
        }
    }
}

/// Field set shared by the live block and persisted entries.
///
/// Fields are public for reading; writes that must propagate go through
/// [`crate::Drivers`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceBlock {
    pub name: String,
    /// Position of the entry this block mirrors.
    pub index: usize,
    pub is_valid: bool,
    pub id_type: IdType,
    /// Non-owning handle to the target's root object.
    pub root: Option<ObjectId>,
    pub data_path: String,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub proxy: Option<ProxyValue>,
    #[serde(default)]
    pub has_curve: bool,
    #[serde(default)]
    pub prop_kind: Option<ValueKind>,
    /// Schema the proxy conforms to, copied from the target attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ProxySchema>,
}

pub type LiveBlock = TraceBlock;
pub type PersistedEntry = TraceBlock;

impl Default for TraceBlock {
    fn default() -> Self {
        Self::new(String::new(), 0, IdType::default())
    }
}

impl TraceBlock {
    pub fn new(name: impl Into<String>, index: usize, id_type: IdType) -> Self {
        Self {
            name: name.into(),
            index,
            is_valid: false,
            id_type,
            root: None,
            data_path: String::new(),
            mute: false,
            proxy: None,
            has_curve: false,
            prop_kind: None,
            schema: None,
        }
    }

    pub fn get(&self, field: DriverField) -> FieldValue {
        match field {
            DriverField::Name => FieldValue::Name(self.name.clone()),
            DriverField::Index => FieldValue::Index(self.index),
            DriverField::IsValid => FieldValue::IsValid(self.is_valid),
            DriverField::IdType => FieldValue::IdType(self.id_type),
            DriverField::Root => FieldValue::Root(self.root),
            DriverField::DataPath => FieldValue::DataPath(self.data_path.clone()),
            DriverField::Mute => FieldValue::Mute(self.mute),
            DriverField::Proxy => FieldValue::Proxy(self.proxy.clone()),
            DriverField::HasCurve => FieldValue::HasCurve(self.has_curve),
            DriverField::PropKind => FieldValue::PropKind(self.prop_kind),
        }
    }

    /// Store `value`; returns whether the field changed.
    pub fn set(&mut self, value: FieldValue) -> bool {
        fn assign<T: PartialEq>(slot: &mut T, v: T) -> bool {
            if *slot == v {
                false
            } else {
                *slot = v;
                true
            }
        }
        match value {
            FieldValue::Name(v) => assign(&mut self.name, v),
            FieldValue::Index(v) => assign(&mut self.index, v),
            FieldValue::IsValid(v) => assign(&mut self.is_valid, v),
            FieldValue::IdType(v) => assign(&mut self.id_type, v),
            FieldValue::Root(v) => assign(&mut self.root, v),
            FieldValue::DataPath(v) => assign(&mut self.data_path, v),
            FieldValue::Mute(v) => assign(&mut self.mute, v),
            FieldValue::Proxy(v) => assign(&mut self.proxy, v),
            FieldValue::HasCurve(v) => assign(&mut self.has_curve, v),
            FieldValue::PropKind(v) => assign(&mut self.prop_kind, v),
        }
    }
}

/// Addresses one block of a [`DriverContext`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Live,
    Entry(usize),
}

/// Driver state hanging off one owner object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverContext {
    pub live: LiveBlock,
    pub entries: Vec<PersistedEntry>,
    pub active_index: Option<usize>,
}

impl DriverContext {
    pub fn new(id_type: IdType) -> Self {
        Self {
            live: TraceBlock::new(String::new(), 0, id_type),
            entries: Vec::new(),
            active_index: None,
        }
    }

    /// Selected entry position, if it points into the list.
    pub fn selected(&self) -> Option<usize> {
        self.active_index.filter(|i| *i < self.entries.len())
    }

    pub fn entry(&self, index: usize) -> Option<&PersistedEntry> {
        self.entries.get(index)
    }

    pub fn block(&self, block: Block) -> Option<&TraceBlock> {
        match block {
            Block::Live => Some(&self.live),
            Block::Entry(i) => self.entries.get(i),
        }
    }

    pub fn block_mut(&mut self, block: Block) -> Option<&mut TraceBlock> {
        match block {
            Block::Live => Some(&mut self.live),
            Block::Entry(i) => self.entries.get_mut(i),
        }
    }
}
