use serde::{Deserialize, Serialize};

use vdriver_api_core::ObjectId;

/// Controls per-entry diagnostic records on evaluation frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    pub enabled: bool,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg { enabled: true }
    }
}

/// Position of an entry in its owner's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryRef {
    pub owner: ObjectId,
    pub index: usize,
}

/// What a pass did with one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    Written,
    SkippedInvalid,
    SkippedMuted,
    NoProxy,
    /// Target no longer classifies; the entry was marked invalid.
    Invalidated,
    /// Target classified but the host refused the value.
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub entry: EntryRef,
    pub name: String,
    pub outcome: EntryOutcome,
}
