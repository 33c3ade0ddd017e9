//! Opaque handles for host-owned objects and curves.
//!
//! Handles never own anything: every use goes back through the host, which may
//! report the object as gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable handle to an object in the host scene graph.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Allocate a fresh random handle.
    pub fn new() -> Self {
        ObjectId(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an animation curve inside an owner's curve store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CurveId(pub u32);

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "curve#{}", self.0)
    }
}
