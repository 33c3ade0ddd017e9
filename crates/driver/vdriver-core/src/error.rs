use thiserror::Error;

use vdriver_api_core::{ObjectId, ValueKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DriverError {
    #[error("object {0} owns no driver context")]
    UnknownContext(ObjectId),
    #[error("entry {index} out of range (list has {len})")]
    EntryOutOfRange { index: usize, len: usize },
    #[error("proxy rejects a {found} value (expects {expected})")]
    ProxyRejected { expected: ValueKind, found: ValueKind },
    #[error("{count} curves bound to '{path}'[{array_index}] on {owner}; refusing to pick one")]
    DuplicateCurve {
        owner: ObjectId,
        path: String,
        array_index: usize,
        count: usize,
    },
}
