//! vdriver-api-core: values, schemas, data paths and host contracts (engine-agnostic)

pub mod coercion;
pub mod data_path;
pub mod descriptor;
pub mod host;
pub mod ids;
pub mod json;
pub mod schema;
pub mod value;
pub mod write_ops;

pub use data_path::{DataPath, PathError, PathToken};
pub use descriptor::{AttributeDescriptor, AttributeFlags, AttributeKind, EnumItem, NumericRange};
pub use host::{CurveBinding, CurveStore, HostError, HostValue, SceneHost};
pub use ids::{CurveId, ObjectId};
pub use schema::{ChangeHook, ProxySchema, SchemaFacets, SchemaOptions};
pub use value::{ProxyValue, ValueKind};
pub use write_ops::{WriteBatch, WriteOp};
