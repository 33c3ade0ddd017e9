//! Read-only attribute metadata as exposed by the host's reflection layer.
//!
//! The driver core never mutates a descriptor; it only inspects it (to decide
//! whether an attribute can be driven) and copies it into a [`crate::ProxySchema`].

use serde::{Deserialize, Serialize};

use crate::ValueKind;

/// Kind of a host attribute. Only the first four can be driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Boolean,
    Int,
    Float,
    Enum,
    String,
    Pointer,
    Collection,
    Other,
}

impl AttributeKind {
    /// Proxy kind for drivable attribute kinds, `None` for everything else.
    pub fn value_kind(self) -> Option<ValueKind> {
        match self {
            AttributeKind::Boolean => Some(ValueKind::Bool),
            AttributeKind::Int => Some(ValueKind::Int),
            AttributeKind::Float => Some(ValueKind::Float),
            AttributeKind::Enum => Some(ValueKind::Enum),
            _ => None,
        }
    }
}

/// One option of an enum attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub value: i32,
}

impl EnumItem {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>, value: i32) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            value,
        }
    }
}

/// Numeric facets shared by int and float attributes. Stored as f64 so that
/// both i32 and f32 ranges fit without loss.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub hard_min: f64,
    pub hard_max: f64,
    pub soft_min: f64,
    pub soft_max: f64,
    pub step: f64,
    pub precision: u32,
}

impl Default for NumericRange {
    fn default() -> Self {
        Self {
            hard_min: f32::MIN as f64,
            hard_max: f32::MAX as f64,
            soft_min: f32::MIN as f64,
            soft_max: f32::MAX as f64,
            step: 1.0,
            precision: 3,
        }
    }
}

/// Boolean flags carried by every attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFlags {
    #[serde(default)]
    pub animatable: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub skip_save: bool,
    #[serde(default)]
    pub library_editable: bool,
    #[serde(default)]
    pub overridable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Field name on the container (what appears in a data path)
    pub identifier: String,
    /// Human readable label
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: AttributeKind,
    /// Fixed array length; 0 for non-array attributes
    #[serde(default)]
    pub array_length: usize,
    #[serde(default)]
    pub range: NumericRange,
    #[serde(default)]
    pub enum_items: Vec<EnumItem>,
    #[serde(default)]
    pub is_enum_flag: bool,
    #[serde(default)]
    pub flags: AttributeFlags,
}

impl AttributeDescriptor {
    /// Animatable, writable attribute of the given kind with default facets.
    pub fn new(identifier: impl Into<String>, kind: AttributeKind) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            description: String::new(),
            kind,
            array_length: 0,
            range: NumericRange::default(),
            enum_items: Vec::new(),
            is_enum_flag: false,
            flags: AttributeFlags {
                animatable: true,
                ..AttributeFlags::default()
            },
        }
    }

    pub fn float(identifier: impl Into<String>) -> Self {
        Self::new(identifier, AttributeKind::Float)
    }

    pub fn int(identifier: impl Into<String>) -> Self {
        Self::new(identifier, AttributeKind::Int)
    }

    pub fn boolean(identifier: impl Into<String>) -> Self {
        Self::new(identifier, AttributeKind::Boolean)
    }

    pub fn enumeration(identifier: impl Into<String>, items: Vec<EnumItem>) -> Self {
        let mut d = Self::new(identifier, AttributeKind::Enum);
        d.enum_items = items;
        d
    }

    /// Non-animatable container-ish attribute (pointer, collection, string...).
    pub fn structural(identifier: impl Into<String>, kind: AttributeKind) -> Self {
        let mut d = Self::new(identifier, kind);
        d.flags.animatable = false;
        d
    }

    /// Set both hard and soft range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range.hard_min = min;
        self.range.hard_max = max;
        self.range.soft_min = min;
        self.range.soft_max = max;
        self
    }

    pub fn with_soft_range(mut self, min: f64, max: f64) -> Self {
        self.range.soft_min = min;
        self.range.soft_max = max;
        self
    }

    pub fn with_step(mut self, step: f64, precision: u32) -> Self {
        self.range.step = step;
        self.range.precision = precision;
        self
    }

    pub fn array(mut self, len: usize) -> Self {
        self.array_length = len;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.flags.readonly = true;
        self
    }

    pub fn not_animatable(mut self) -> Self {
        self.flags.animatable = false;
        self
    }

    pub fn enum_flag(mut self) -> Self {
        self.is_enum_flag = true;
        self
    }

    pub fn labelled(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.array_length > 0
    }

    #[inline]
    pub fn is_animatable(&self) -> bool {
        self.flags.animatable
    }

    #[inline]
    pub fn is_readonly(&self) -> bool {
        self.flags.readonly
    }
}
