//! Driver lists described in JSON, with objects referenced by name.
//!
//! ```json
//! { "owner": "Scene",
//!   "entries": [ { "name": "Size", "object": "Cube", "data_path": "size", "proxy": 7.5 } ] }
//! ```
//!
//! Proxy values use the shorthand accepted by `vdriver_api_core::json`.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use vdriver_api_core::{json, ObjectId, ProxyValue};
use vdriver_core::IdType;

#[derive(Debug, Clone, Deserialize)]
pub struct DriverListSpec {
    pub owner: String,
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntrySpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub id_type: Option<IdType>,
    #[serde(default)]
    pub data_path: String,
    #[serde(default)]
    pub proxy: Option<JsonValue>,
    #[serde(default)]
    pub mute: bool,
}

/// A driver list whose names have been looked up in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverList {
    pub owner: ObjectId,
    pub entries: Vec<EntryInit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryInit {
    pub name: Option<String>,
    pub id_type: Option<IdType>,
    pub root: Option<ObjectId>,
    pub data_path: String,
    pub proxy: Option<ProxyValue>,
    pub mute: bool,
}

impl DriverListSpec {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse driver list")
    }

    /// Look up every object name and parse proxy values.
    pub fn resolve(self, lookup: impl Fn(&str) -> Option<ObjectId>) -> Result<DriverList> {
        let owner =
            lookup(&self.owner).ok_or_else(|| anyhow!("unknown owner object '{}'", self.owner))?;
        let entries = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(i, spec)| -> Result<EntryInit> {
                let root = match &spec.object {
                    Some(name) => Some(
                        lookup(name)
                            .ok_or_else(|| anyhow!("entry {i}: unknown object '{name}'"))?,
                    ),
                    None => None,
                };
                let proxy = spec
                    .proxy
                    .map(json::parse_value)
                    .transpose()
                    .with_context(|| format!("entry {i}: invalid proxy value"))?;
                Ok(EntryInit {
                    name: spec.name,
                    id_type: spec.id_type,
                    root,
                    data_path: spec.data_path,
                    proxy,
                    mute: spec.mute,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DriverList { owner, entries })
    }
}
