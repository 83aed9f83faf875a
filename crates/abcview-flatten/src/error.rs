use crate::buffers::BufferKind;
use abcview_scene::SampleError;
use thiserror::Error;

/// A node-local problem met during a flatten pass. None of these stop the
/// pass; they are collected in a [`FlattenReport`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlattenError {
    #[error("no sample for `{node}` at time {time}: {source}")]
    SampleUnavailable {
        node: String,
        time: f64,
        #[source]
        source: SampleError,
    },
    #[error("`{node}` face {face} has {vertex_count} vertices, only triangles and quads are supported")]
    UnsupportedFaceTopology {
        node: String,
        face: usize,
        vertex_count: i32,
    },
    #[error("`{node}` face {face} refers to vertices outside the sample")]
    InvalidFaceIndices { node: String, face: usize },
    #[error("`{node}` needs {required} {buffer} slots, capacity is {capacity}")]
    BufferOverflow {
        node: String,
        buffer: BufferKind,
        required: usize,
        capacity: usize,
    },
}

impl FlattenError {
    pub fn node(&self) -> &str {
        match self {
            FlattenError::SampleUnavailable { node, .. }
            | FlattenError::UnsupportedFaceTopology { node, .. }
            | FlattenError::InvalidFaceIndices { node, .. }
            | FlattenError::BufferOverflow { node, .. } => node,
        }
    }
}

/// Where one mesh landed in the flat buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshRecord {
    pub node: String,
    pub index_offset: u32,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Outcome of one flatten pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlattenReport {
    pub meshes: Vec<MeshRecord>,
    pub conditions: Vec<FlattenError>,
}

impl FlattenReport {
    pub fn is_clean(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count).sum()
    }

    pub(crate) fn record(&mut self, condition: FlattenError) {
        log::debug!("{condition}");
        self.conditions.push(condition);
    }
}
