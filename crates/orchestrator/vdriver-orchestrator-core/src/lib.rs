//! vdriver-orchestrator
//!
//! Drives evaluation passes for virtual drivers: when the host reports changed
//! objects, the persisted entries of every changed owner are classified again
//! and their proxy values written back onto the real attributes.

pub mod diagnostics;
pub mod loader;
pub mod lock;
pub mod scheduler;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vdriver_api_core::{ObjectId, WriteBatch};
use vdriver_core::{Config, Drivers, FieldValue, Host};

pub use crate::diagnostics::{DiagnosticsCfg, EntryOutcome, EntryRecord, EntryRef};
pub use crate::loader::{DriverList, DriverListSpec, EntryInit, EntrySpec};
pub use crate::lock::{UpdateGuard, UpdateLock};

/// A write the host refused (or a proxy that no longer fits its target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteFailure {
    pub entry: EntryRef,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationFrame {
    pub pass: u64,
    /// Back-writes in owner order, then entry order.
    pub writes: WriteBatch,
    /// Entries whose target stopped resolving during this pass.
    pub invalidated: Vec<EntryRef>,
    pub failures: Vec<WriteFailure>,
    /// One record per visited entry; empty when diagnostics are disabled.
    pub records: Vec<EntryRecord>,
}

#[derive(Debug)]
pub struct Orchestrator {
    pub drivers: Drivers,
    pub lock: UpdateLock,
    /// Number of passes that ran.
    pub pass: u64,
    pub diagnostics: DiagnosticsCfg,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            drivers: Drivers::new(config),
            lock: UpdateLock::new(),
            pass: 0,
            diagnostics: DiagnosticsCfg::default(),
        }
    }

    pub fn with_diagnostics(mut self, cfg: DiagnosticsCfg) -> Self {
        self.diagnostics = cfg;
        self
    }

    /// Host evaluation callback. `None` when nothing ran (nested call, or no
    /// changed object owns drivers).
    pub fn evaluate<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        changed: &[ObjectId],
    ) -> Option<EvaluationFrame> {
        crate::scheduler::run_pass(self, host, changed)
    }

    /// Create the entries of `list` through the ordinary editing surface, so
    /// each one is validated and schema-bound like an edit made by hand.
    pub fn install<H: Host + ?Sized>(&mut self, host: &mut H, list: &DriverList) -> Result<()> {
        let owner = list.owner;
        self.drivers.attach(owner);
        for init in &list.entries {
            let index = self.drivers.add_entry(host, owner)?;
            let mut fields = Vec::with_capacity(6);
            if let Some(id_type) = init.id_type {
                fields.push(FieldValue::IdType(id_type));
            }
            if let Some(name) = &init.name {
                fields.push(FieldValue::Name(name.clone()));
            }
            fields.push(FieldValue::Root(init.root));
            fields.push(FieldValue::DataPath(init.data_path.clone()));
            if let Some(proxy) = &init.proxy {
                fields.push(FieldValue::Proxy(Some(proxy.clone())));
            }
            fields.push(FieldValue::Mute(init.mute));

            for value in fields {
                let field = value.field();
                self.drivers
                    .set_live_field(host, owner, value)
                    .with_context(|| format!("entry {index}: setting {}", field.identifier()))?;
            }
        }
        Ok(())
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
