//! vdriver-core: attribute-path resolution, animatable classification, schema
//! copying and live/persisted trace synchronization (engine-agnostic)

pub mod classify;
pub mod config;
pub mod curve;
pub mod drivers;
pub mod entries;
pub mod error;
pub mod id_type;
pub mod resolve;
pub mod schema_copy;
pub mod trace;

pub use classify::{classify, AnimatableInfo};
pub use config::Config;
pub use curve::{CurveEnd, CurveState, CurveSync};
pub use drivers::Drivers;
pub use entries::{
    Block, DriverContext, DriverField, FieldValue, LiveBlock, PersistedEntry, TraceBlock,
};
pub use error::DriverError;
pub use id_type::{IdType, UnknownIdType};
pub use resolve::{
    reassemble, resolve, resolve_str, Reassembly, ResolutionGraph, ResolutionStep, ResolveError,
    StepKind,
};
pub use schema_copy::copy_schema;
pub use trace::{TraceMode, TraceModeCell, TraceScope};

use vdriver_api_core::{CurveStore, SceneHost};

/// Everything the drivers need from the host: reflection plus curve storage.
pub trait Host: SceneHost + CurveStore {}

impl<T: SceneHost + CurveStore + ?Sized> Host for T {}
