//! Driver configuration.

use serde::{Deserialize, Serialize};

use crate::{Block, IdType};

/// Identifiers under which the driver blocks hang off their owner object, and
/// proxy value policies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Live (editor-facing) block.
    pub live_identifier: String,
    /// Persisted entry list.
    pub entries_identifier: String,
    /// Selected entry index.
    pub index_identifier: String,
    /// Attribute holding the proxy value on both block kinds.
    pub proxy_attribute: String,

    /// New entries are named `prefix + list length`.
    pub entry_name_prefix: String,
    pub default_id_type: IdType,

    /// Clamp proxy writes into the copied hard range.
    pub clamp_proxy_to_hard_range: bool,
    /// Seed the live proxy with the target's current value when the target changes.
    pub seed_proxy_from_target: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            live_identifier: "virtual_driver".into(),
            entries_identifier: "internal_virtual_driver".into(),
            index_identifier: "active_virtual_driver_index".into(),
            proxy_attribute: "prop".into(),
            entry_name_prefix: "Property ".into(),
            default_id_type: IdType::Object,
            clamp_proxy_to_hard_range: true,
            seed_proxy_from_target: true,
        }
    }
}

impl Config {
    /// Owner-relative path of the live proxy (`virtual_driver.prop`).
    pub fn live_proxy_path(&self) -> String {
        format!("{}.{}", self.live_identifier, self.proxy_attribute)
    }

    /// Owner-relative path of entry `index`'s proxy (`internal_virtual_driver[2].prop`).
    pub fn entry_proxy_path(&self, index: usize) -> String {
        format!(
            "{}[{}].{}",
            self.entries_identifier, index, self.proxy_attribute
        )
    }

    pub fn proxy_path(&self, block: Block) -> String {
        match block {
            Block::Live => self.live_proxy_path(),
            Block::Entry(i) => self.entry_proxy_path(i),
        }
    }

    pub fn entry_name(&self, len: usize) -> String {
        format!("{}{}", self.entry_name_prefix, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_paths() {
        let cfg = Config::default();
        assert_eq!(cfg.live_proxy_path(), "virtual_driver.prop");
        assert_eq!(cfg.entry_proxy_path(3), "internal_virtual_driver[3].prop");
        assert_eq!(cfg.entry_name(1), "Property 1");
        assert_eq!(cfg.proxy_path(Block::Entry(0)), "internal_virtual_driver[0].prop");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "proxy_attribute": "value" }"#).unwrap();
        assert_eq!(cfg.live_proxy_path(), "virtual_driver.value");
        assert!(cfg.clamp_proxy_to_hard_range);
    }
}
