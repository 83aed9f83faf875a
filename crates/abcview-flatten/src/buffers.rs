use serde::{Deserialize, Serialize};
use std::fmt;

/// Vertex capacity of the fixed buffers the viewer has always used:
/// 65536 floats, three per position.
pub const DEFAULT_MAX_VERTICES: usize = 65536 / 3;
pub const DEFAULT_MAX_INDICES: usize = 98304;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Writes that would exceed a limit are refused.
    #[default]
    Reject,
    /// Limits are ignored and the buffers grow as needed.
    Grow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLimits {
    pub max_vertices: usize,
    pub max_indices: usize,
    pub overflow: OverflowPolicy,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            max_indices: DEFAULT_MAX_INDICES,
            overflow: OverflowPolicy::Reject,
        }
    }
}

impl BufferLimits {
    pub fn growable() -> Self {
        Self {
            overflow: OverflowPolicy::Grow,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Vertex => f.write_str("vertex"),
            BufferKind::Index => f.write_str("index"),
        }
    }
}

/// Capacity a write would need versus what the limits allow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overflow {
    pub buffer: BufferKind,
    pub required: usize,
    pub capacity: usize,
}

/// One frame's worth of world-space positions and triangle indices.
///
/// Owned by the render loop and reset before every flatten pass.
#[derive(Clone, Debug)]
pub struct FlatBuffers {
    vertices: Vec<[f32; 3]>,
    indices: Vec<u32>,
    limits: BufferLimits,
}

impl Default for FlatBuffers {
    fn default() -> Self {
        Self::new(BufferLimits::default())
    }
}

impl FlatBuffers {
    pub fn new(limits: BufferLimits) -> Self {
        let (vertices, indices) = match limits.overflow {
            OverflowPolicy::Reject => (
                Vec::with_capacity(limits.max_vertices),
                Vec::with_capacity(limits.max_indices),
            ),
            OverflowPolicy::Grow => (Vec::new(), Vec::new()),
        };
        Self {
            vertices,
            indices,
            limits,
        }
    }

    /// Empties both buffers, keeping their allocations.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Checks that `additional` more elements fit in `buffer`.
    ///
    /// Vertices are also capped at what a `u32` index can address, whatever
    /// the policy.
    pub fn check(&self, buffer: BufferKind, additional: usize) -> Result<(), Overflow> {
        let grow = self.limits.overflow == OverflowPolicy::Grow;
        let (len, capacity) = match buffer {
            BufferKind::Vertex => {
                let limit = if grow { usize::MAX } else { self.limits.max_vertices };
                (self.vertices.len(), limit.min(addressable_vertices()))
            }
            BufferKind::Index => {
                let limit = if grow { usize::MAX } else { self.limits.max_indices };
                (self.indices.len(), limit)
            }
        };
        let required = len.saturating_add(additional);
        if required > capacity {
            Err(Overflow {
                buffer,
                required,
                capacity,
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn push_vertex(&mut self, position: [f32; 3]) {
        self.vertices.push(position);
    }

    pub(crate) fn push_triangle(&mut self, triangle: [u32; 3]) {
        self.indices.extend_from_slice(&triangle);
    }
}

/// Number of vertices a `u32` index buffer can reference.
fn addressable_vertices() -> usize {
    usize::try_from(u32::MAX).map_or(usize::MAX, |max| max.saturating_add(1))
}
