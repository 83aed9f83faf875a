use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_KEY: &str = "schema";

pub const XFORM_SCHEMA: &str = "AbcGeom_Xform_v3";
pub const CAMERA_SCHEMA: &str = "AbcGeom_Camera_v1";
pub const POLY_MESH_SCHEMA: &str = "AbcGeom_PolyMesh_v1";

/// String key/value pairs attached to an object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaData(BTreeMap<String, String>);

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: &str) -> Self {
        let mut md = Self::new();
        md.set(SCHEMA_KEY, schema);
        md
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn schema(&self) -> Option<&str> {
        self.get(SCHEMA_KEY)
    }

    pub fn matches(&self, signature: &str) -> bool {
        self.schema() == Some(signature)
    }
}

/// What an object is, decided once from its metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Transform,
    Camera,
    PolyMesh,
    Other,
}

impl NodeKind {
    /// Signatures are probed in a fixed order: transform, camera, mesh.
    pub fn classify(metadata: &MetaData) -> Self {
        if metadata.matches(XFORM_SCHEMA) {
            NodeKind::Transform
        } else if metadata.matches(CAMERA_SCHEMA) {
            NodeKind::Camera
        } else if metadata.matches(POLY_MESH_SCHEMA) {
            NodeKind::PolyMesh
        } else {
            NodeKind::Other
        }
    }

    /// Label used by the tree outline, `None` for unknown schemas.
    pub fn schema_label(self) -> Option<&'static str> {
        match self {
            NodeKind::Transform => Some("IXformSchema"),
            NodeKind::Camera => Some("ICameraSchema"),
            NodeKind::PolyMesh => Some("IPolyMeshSchema"),
            NodeKind::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_schemas() {
        assert_eq!(
            NodeKind::classify(&MetaData::with_schema(XFORM_SCHEMA)),
            NodeKind::Transform
        );
        assert_eq!(
            NodeKind::classify(&MetaData::with_schema(CAMERA_SCHEMA)),
            NodeKind::Camera
        );
        assert_eq!(
            NodeKind::classify(&MetaData::with_schema(POLY_MESH_SCHEMA)),
            NodeKind::PolyMesh
        );
    }

    #[test]
    fn unknown_or_missing_schema_is_other() {
        assert_eq!(NodeKind::classify(&MetaData::new()), NodeKind::Other);
        assert_eq!(
            NodeKind::classify(&MetaData::with_schema("AbcGeom_Points_v1")),
            NodeKind::Other
        );
    }

    #[test]
    fn schema_must_match_exactly() {
        let mut md = MetaData::new();
        md.set("schemaObjTitle", XFORM_SCHEMA);
        assert_eq!(NodeKind::classify(&md), NodeKind::Other);
    }
}
