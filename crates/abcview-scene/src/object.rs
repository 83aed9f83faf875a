use crate::metadata::{CAMERA_SCHEMA, MetaData, NodeKind, POLY_MESH_SCHEMA, XFORM_SCHEMA};
use crate::sample::{MeshSample, XformSample};
use serde::Deserialize;

/// A node in the archive hierarchy. Its kind is fixed when it is built.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "ObjectDesc")]
pub struct Object {
    name: String,
    metadata: MetaData,
    kind: NodeKind,
    time_sampling: usize,
    xform: Vec<XformSample>,
    mesh: Vec<MeshSample>,
    children: Vec<Object>,
}

#[derive(Deserialize)]
struct ObjectDesc {
    name: String,
    #[serde(default)]
    metadata: MetaData,
    #[serde(default)]
    time_sampling: usize,
    #[serde(default)]
    xform: Vec<XformSample>,
    #[serde(default)]
    mesh: Vec<MeshSample>,
    #[serde(default)]
    children: Vec<Object>,
}

impl From<ObjectDesc> for Object {
    fn from(desc: ObjectDesc) -> Self {
        Self {
            kind: NodeKind::classify(&desc.metadata),
            name: desc.name,
            metadata: desc.metadata,
            time_sampling: desc.time_sampling,
            xform: desc.xform,
            mesh: desc.mesh,
            children: desc.children,
        }
    }
}

impl Object {
    pub fn new(name: impl Into<String>, metadata: MetaData) -> Self {
        Self {
            kind: NodeKind::classify(&metadata),
            name: name.into(),
            metadata,
            time_sampling: 0,
            xform: Vec::new(),
            mesh: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An object with no schema, used for the archive top and plain groups.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, MetaData::new())
    }

    pub fn xform(name: impl Into<String>, samples: Vec<XformSample>) -> Self {
        let mut obj = Self::new(name, MetaData::with_schema(XFORM_SCHEMA));
        obj.xform = samples;
        obj
    }

    pub fn camera(name: impl Into<String>) -> Self {
        Self::new(name, MetaData::with_schema(CAMERA_SCHEMA))
    }

    pub fn poly_mesh(name: impl Into<String>, samples: Vec<MeshSample>) -> Self {
        let mut obj = Self::new(name, MetaData::with_schema(POLY_MESH_SCHEMA));
        obj.mesh = samples;
        obj
    }

    pub fn with_time_sampling(mut self, index: usize) -> Self {
        self.time_sampling = index;
        self
    }

    pub fn with_child(mut self, child: Object) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn time_sampling_index(&self) -> usize {
        self.time_sampling
    }

    pub fn xform_samples(&self) -> &[XformSample] {
        &self.xform
    }

    pub fn mesh_samples(&self) -> &[MeshSample] {
        &self.mesh
    }

    /// Sample count of whatever this object's schema carries.
    pub fn num_samples(&self) -> usize {
        match self.kind {
            NodeKind::Transform => self.xform.len(),
            NodeKind::PolyMesh => self.mesh.len(),
            NodeKind::Camera | NodeKind::Other => 0,
        }
    }

    pub fn children(&self) -> &[Object] {
        &self.children
    }

    /// Visits this object and every descendant in pre-order.
    pub fn visit<F: FnMut(&Object, usize)>(&self, f: &mut F) {
        self.visit_at(0, f);
    }

    fn visit_at<F: FnMut(&Object, usize)>(&self, depth: usize, f: &mut F) {
        f(self, depth);
        for child in &self.children {
            child.visit_at(depth + 1, f);
        }
    }
}
