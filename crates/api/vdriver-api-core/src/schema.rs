//! ProxySchema: an independent copy of an attribute's schema, used to type and
//! bound the proxy value that stands in for that attribute.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::coercion;
use crate::{EnumItem, ProxyValue, ValueKind};

pub type ChangeFn = dyn Fn(&ProxyValue) + Send + Sync + 'static;

/// Callback fired whenever a holder of the schema's value is written.
/// Clones share the same callback.
#[derive(Clone, Default)]
pub struct ChangeHook(Option<Arc<ChangeFn>>);

impl ChangeHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ProxyValue) + Send + Sync + 'static,
    {
        ChangeHook(Some(Arc::new(f)))
    }

    pub fn none() -> Self {
        ChangeHook(None)
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn fire(&self, value: &ProxyValue) {
        if let Some(f) = &self.0 {
            f(value);
        }
    }
}

impl fmt::Debug for ChangeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            f.write_str("ChangeHook(set)")
        } else {
            f.write_str("ChangeHook(none)")
        }
    }
}

impl PartialEq for ChangeHook {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Option flags copied from the source attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOptions {
    pub hidden: bool,
    pub skip_save: bool,
    pub animatable: bool,
    pub library_editable: bool,
    pub enum_flag: bool,
}

/// Kind-specific facets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaFacets {
    Bool,
    Int {
        hard_min: i32,
        hard_max: i32,
        soft_min: i32,
        soft_max: i32,
        step: i32,
    },
    Float {
        hard_min: f32,
        hard_max: f32,
        soft_min: f32,
        soft_max: f32,
        step: f32,
        precision: u32,
    },
    Enum {
        items: Vec<EnumItem>,
    },
}

impl SchemaFacets {
    pub fn kind(&self) -> ValueKind {
        match self {
            SchemaFacets::Bool => ValueKind::Bool,
            SchemaFacets::Int { .. } => ValueKind::Int,
            SchemaFacets::Float { .. } => ValueKind::Float,
            SchemaFacets::Enum { .. } => ValueKind::Enum,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxySchema {
    pub name: String,
    pub description: String,
    pub options: SchemaOptions,
    pub overridable: bool,
    pub facets: SchemaFacets,
    pub default: ProxyValue,
    #[serde(skip)]
    pub on_change: ChangeHook,
}

impl ProxySchema {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.facets.kind()
    }

    /// Hard range for numeric schemas.
    pub fn hard_range(&self) -> Option<(f64, f64)> {
        match &self.facets {
            SchemaFacets::Int {
                hard_min, hard_max, ..
            } => Some((*hard_min as f64, *hard_max as f64)),
            SchemaFacets::Float {
                hard_min, hard_max, ..
            } => Some((*hard_min as f64, *hard_max as f64)),
            _ => None,
        }
    }

    /// Soft (UI) range for numeric schemas.
    pub fn soft_range(&self) -> Option<(f64, f64)> {
        match &self.facets {
            SchemaFacets::Int {
                soft_min, soft_max, ..
            } => Some((*soft_min as f64, *soft_max as f64)),
            SchemaFacets::Float {
                soft_min, soft_max, ..
            } => Some((*soft_min as f64, *soft_max as f64)),
            _ => None,
        }
    }

    /// Replace the hard range of a numeric schema. Returns false for other kinds.
    pub fn set_hard_range(&mut self, min: f64, max: f64) -> bool {
        match &mut self.facets {
            SchemaFacets::Int {
                hard_min, hard_max, ..
            } => {
                *hard_min = min as i32;
                *hard_max = max as i32;
                true
            }
            SchemaFacets::Float {
                hard_min, hard_max, ..
            } => {
                *hard_min = min as f32;
                *hard_max = max as f32;
                true
            }
            _ => false,
        }
    }

    pub fn enum_items(&self) -> &[EnumItem] {
        match &self.facets {
            SchemaFacets::Enum { items } => items,
            _ => &[],
        }
    }

    /// Bring a value into this schema: convert it to the schema kind and, when
    /// `clamp` is set, clamp numbers into the hard range. Enum identifiers must
    /// name an existing item. Returns `None` when the value cannot be expressed.
    pub fn conform(&self, value: &ProxyValue, clamp: bool) -> Option<ProxyValue> {
        match &self.facets {
            SchemaFacets::Bool => coercion::coerce(value, ValueKind::Bool),
            SchemaFacets::Int {
                hard_min, hard_max, ..
            } => {
                let v = coercion::to_int(coercion::coerce(value, ValueKind::Int).as_ref()?);
                Some(ProxyValue::Int(if clamp && hard_min <= hard_max {
                    v.clamp(*hard_min, *hard_max)
                } else {
                    v
                }))
            }
            SchemaFacets::Float {
                hard_min, hard_max, ..
            } => {
                let v = coercion::to_float(coercion::coerce(value, ValueKind::Float).as_ref()?);
                Some(ProxyValue::Float(if clamp && hard_min <= hard_max {
                    v.clamp(*hard_min, *hard_max)
                } else {
                    v
                }))
            }
            SchemaFacets::Enum { items } => {
                let known = |id: &String| items.iter().any(|item| &item.identifier == id);
                match value {
                    ProxyValue::Enum(id) if !self.options.enum_flag && known(id) => {
                        Some(value.clone())
                    }
                    ProxyValue::EnumFlags(ids) if self.options.enum_flag && ids.iter().all(known) => {
                        Some(value.clone())
                    }
                    _ => None,
                }
            }
        }
    }

    /// Fire the change hook for a freshly written value.
    pub fn notify(&self, value: &ProxyValue) {
        self.on_change.fire(value);
    }
}
