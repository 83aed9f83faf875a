//! Read-only scene archive: a tree of objects carrying time-sampled
//! transforms and polygon meshes.

pub mod archive;
pub mod metadata;
pub mod object;
pub mod sample;
pub mod time_sampling;

pub use archive::{Archive, ArchiveError};
pub use metadata::{CAMERA_SCHEMA, MetaData, NodeKind, POLY_MESH_SCHEMA, SCHEMA_KEY, XFORM_SCHEMA};
pub use object::Object;
pub use sample::{MeshSample, SampleError, SampleSelector, SelectionPolicy, XformSample};
pub use time_sampling::TimeSampling;
