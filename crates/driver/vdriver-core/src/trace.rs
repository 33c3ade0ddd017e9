//! Trace mode: which direction a sync is currently propagating in.
//!
//! A sync from the live block into an entry runs in `Panel` mode, a sync from
//! an entry into the live block in `Direct` mode. The callbacks of the other
//! direction see the mode and stand down, so a mirrored write never bounces
//! back.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TraceMode {
    #[default]
    None,
    /// Entry -> live.
    Direct,
    /// Live -> entry.
    Panel,
}

/// Shared handle on the current trace mode. Clones observe the same mode.
#[derive(Clone, Debug, Default)]
pub struct TraceModeCell(Rc<Cell<TraceMode>>);

impl TraceModeCell {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> TraceMode {
        self.0.get()
    }

    /// Switch to `mode` until the returned scope is dropped.
    pub fn enter(&self, mode: TraceMode) -> TraceScope {
        let previous = self.0.replace(mode);
        TraceScope {
            cell: Rc::clone(&self.0),
            previous,
        }
    }
}

/// Restores the mode that was active on entry (`None` at top level) when
/// dropped, on every exit path.
#[must_use = "the trace mode resets as soon as the scope is dropped"]
#[derive(Debug)]
pub struct TraceScope {
    cell: Rc<Cell<TraceMode>>,
    previous: TraceMode,
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        self.cell.set(self.previous);
    }
}
