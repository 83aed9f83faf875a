//! Flattens a time-sampled archive hierarchy into one world-space triangle
//! list per frame.

pub mod buffers;
pub mod error;
pub mod flatten;

pub use buffers::{BufferKind, BufferLimits, FlatBuffers, Overflow, OverflowPolicy};
pub use error::{FlattenError, FlattenReport, MeshRecord};
pub use flatten::{FlattenOptions, Flattener, QuadSplit};
