use crate::buffers::{BufferKind, FlatBuffers, Overflow};
use crate::error::{FlattenError, FlattenReport, MeshRecord};
use abcview_scene::{Archive, NodeKind, Object, SampleSelector, SelectionPolicy};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Which diagonal a quad is cut along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuadSplit {
    /// `(0, 1, 2)` and `(0, 2, 3)`.
    #[default]
    Diagonal02,
    /// `(0, 1, 3)` and `(1, 2, 3)`.
    Diagonal13,
}

impl QuadSplit {
    pub fn split(self, q: [u32; 4]) -> [[u32; 3]; 2] {
        match self {
            QuadSplit::Diagonal02 => [[q[0], q[1], q[2]], [q[0], q[2], q[3]]],
            QuadSplit::Diagonal13 => [[q[0], q[1], q[3]], [q[1], q[2], q[3]]],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    pub selection: SelectionPolicy,
    pub quad_split: QuadSplit,
}

/// Walks an archive depth-first and writes every mesh it meets, in world
/// space, into a [`FlatBuffers`].
///
/// Transforms compose with column vectors: a node's world matrix is
/// `parent × local`, and positions are transformed as `world × (x, y, z, 1)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flattener {
    options: FlattenOptions,
}

impl Flattener {
    pub fn new(options: FlattenOptions) -> Self {
        Self { options }
    }

    /// Resets `buffers` and flattens the whole archive at `time`.
    pub fn flatten(&self, archive: &Archive, time: f64, buffers: &mut FlatBuffers) -> FlattenReport {
        buffers.reset();
        let mut report = FlattenReport::default();
        self.traverse(archive, archive.top(), time, Mat4::IDENTITY, buffers, &mut report);
        report
    }

    /// Pre-order walk of `node` and its descendants.
    ///
    /// A node whose sample cannot be fetched contributes nothing, but its
    /// children are still visited with the inherited transform.
    pub fn traverse(
        &self,
        archive: &Archive,
        node: &Object,
        time: f64,
        inherited: Mat4,
        buffers: &mut FlatBuffers,
        report: &mut FlattenReport,
    ) {
        let transform = match node.kind() {
            NodeKind::Transform => match self.sample_transform(archive, node, time, inherited) {
                Ok(composed) => composed,
                Err(condition) => {
                    report.record(condition);
                    inherited
                }
            },
            NodeKind::PolyMesh => {
                self.emit_mesh(archive, node, time, inherited, buffers, report);
                inherited
            }
            // Cameras never contribute geometry.
            NodeKind::Camera | NodeKind::Other => inherited,
        };

        for child in node.children() {
            self.traverse(archive, child, time, transform, buffers, report);
        }
    }

    /// `inherited × local`, or `local` alone when the sample does not
    /// inherit its parent's transform.
    pub fn sample_transform(
        &self,
        archive: &Archive,
        node: &Object,
        time: f64,
        inherited: Mat4,
    ) -> Result<Mat4, FlattenError> {
        let selector = SampleSelector::with_policy(time, self.options.selection);
        let sample = archive
            .xform_sample(node, selector)
            .map_err(|source| FlattenError::SampleUnavailable {
                node: node.name().to_string(),
                time,
                source,
            })?;

        let local = sample.matrix().as_mat4();
        if sample.inherits {
            Ok(inherited * local)
        } else {
            Ok(local)
        }
    }

    /// Appends the mesh sample at `time`, transformed by `transform`, and
    /// its triangulated faces.
    ///
    /// Vertices go in first and are never rolled back; a face that cannot be
    /// emitted is skipped and the face cursor still advances past it.
    pub fn emit_mesh(
        &self,
        archive: &Archive,
        node: &Object,
        time: f64,
        transform: Mat4,
        buffers: &mut FlatBuffers,
        report: &mut FlattenReport,
    ) {
        let selector = SampleSelector::with_policy(time, self.options.selection);
        let sample = match archive.mesh_sample(node, selector) {
            Ok(sample) => sample,
            Err(source) => {
                report.record(FlattenError::SampleUnavailable {
                    node: node.name().to_string(),
                    time,
                    source,
                });
                return;
            }
        };

        if let Err(overflow) = buffers.check(BufferKind::Vertex, sample.positions.len()) {
            report.record(overflow_condition(node, overflow));
            return;
        }

        let Ok(index_offset) = u32::try_from(buffers.vertex_count()) else {
            report.record(FlattenError::BufferOverflow {
                node: node.name().to_string(),
                buffer: BufferKind::Vertex,
                required: buffers.vertex_count(),
                capacity: u32::MAX as usize,
            });
            return;
        };
        for &p in &sample.positions {
            let world = transform.transform_point3(Vec3::from_array(p));
            buffers.push_vertex(world.to_array());
        }

        let vertex_count = sample.positions.len();
        let mut triangle_count = 0;
        let mut cursor = 0usize;

        for (face, &count) in sample.face_counts.iter().enumerate() {
            let start = cursor;
            let n = usize::try_from(count).unwrap_or(0);
            cursor += n;

            if n != 3 && n != 4 {
                report.record(FlattenError::UnsupportedFaceTopology {
                    node: node.name().to_string(),
                    face,
                    vertex_count: count,
                });
                continue;
            }

            let Some(ids) = sample
                .face_indices
                .get(start..start + n)
                .and_then(|local| offset_indices(local, vertex_count, index_offset))
            else {
                report.record(FlattenError::InvalidFaceIndices {
                    node: node.name().to_string(),
                    face,
                });
                continue;
            };

            let mut split = [[0u32; 3]; 2];
            let emitted = if n == 3 {
                split[0] = [ids[0], ids[1], ids[2]];
                1
            } else {
                split = self.options.quad_split.split(ids);
                2
            };
            let triangles = &split[..emitted];

            if let Err(overflow) = buffers.check(BufferKind::Index, triangles.len() * 3) {
                report.record(overflow_condition(node, overflow));
                continue;
            }
            for &tri in triangles {
                buffers.push_triangle(tri);
            }
            triangle_count += triangles.len();
        }

        report.meshes.push(MeshRecord {
            node: node.name().to_string(),
            index_offset,
            vertex_count,
            triangle_count,
        });
    }
}

/// Offsets up to four sample-local indices, rejecting any that fall outside
/// the sample's vertices.
fn offset_indices(local: &[i32], vertex_count: usize, index_offset: u32) -> Option<[u32; 4]> {
    let mut ids = [0u32; 4];
    for (slot, &i) in ids.iter_mut().zip(local) {
        let i = usize::try_from(i).ok().filter(|&i| i < vertex_count)?;
        *slot = index_offset.checked_add(u32::try_from(i).ok()?)?;
    }
    Some(ids)
}

fn overflow_condition(node: &Object, overflow: Overflow) -> FlattenError {
    FlattenError::BufferOverflow {
        node: node.name().to_string(),
        buffer: overflow.buffer,
        required: overflow.required,
        capacity: overflow.capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abcview_scene::{MeshSample, XformSample};
    use glam::DMat4;

    fn triangle_mesh(name: &str) -> Object {
        Object::poly_mesh(
            name,
            vec![MeshSample::new(
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![3],
                vec![0, 1, 2],
            )],
        )
    }

    fn archive(top: Object) -> Archive {
        Archive::new(vec![], top).unwrap()
    }

    #[test]
    fn offset_indices_refuses_to_wrap() {
        assert_eq!(
            offset_indices(&[0, 1, 2], 3, 10),
            Some([10, 11, 12, 0])
        );
        assert_eq!(offset_indices(&[0, 1, 2], 3, u32::MAX - 1), None);
        assert_eq!(offset_indices(&[0, 3, 1], 3, 0), None);
    }

    #[test]
    fn quad_split_diagonals() {
        assert_eq!(
            QuadSplit::Diagonal02.split([10, 11, 12, 13]),
            [[10, 11, 12], [10, 12, 13]]
        );
        assert_eq!(
            QuadSplit::Diagonal13.split([10, 11, 12, 13]),
            [[10, 11, 13], [11, 12, 13]]
        );
    }

    #[test]
    fn nested_transforms_compose_parent_first() {
        // Parent rotates 90 degrees about Z, child translates along X: the
        // child's origin must end up on +Y.
        let rot = XformSample::from_matrix(DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2));
        let top = Object::group("top").with_child(
            Object::xform("parent", vec![rot]).with_child(
                Object::xform("child", vec![XformSample::translation(1.0, 0.0, 0.0)])
                    .with_child(triangle_mesh("mesh")),
            ),
        );
        let archive = archive(top);
        let mut buffers = FlatBuffers::default();
        let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert!(report.is_clean());
        let origin = Vec3::from_array(buffers.vertices()[0]);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn non_inheriting_transform_discards_parent() {
        let mut local = XformSample::translation(0.0, 0.0, 5.0);
        local.inherits = false;
        let top = Object::group("top").with_child(
            Object::xform("parent", vec![XformSample::translation(100.0, 0.0, 0.0)]).with_child(
                Object::xform("child", vec![local]).with_child(triangle_mesh("mesh")),
            ),
        );
        let archive = archive(top);
        let mut buffers = FlatBuffers::default();
        Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert_eq!(buffers.vertices()[0], [0.0, 0.0, 5.0]);
    }

    #[test]
    fn camera_passes_transform_through() {
        let top = Object::group("top").with_child(
            Object::xform("xf", vec![XformSample::translation(0.0, 2.0, 0.0)])
                .with_child(Object::camera("cam").with_child(triangle_mesh("mesh"))),
        );
        let archive = archive(top);
        let mut buffers = FlatBuffers::default();
        let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert!(report.is_clean());
        assert_eq!(buffers.vertices()[0], [0.0, 2.0, 0.0]);
    }

    #[test]
    fn failed_transform_sample_keeps_inherited_for_children() {
        let top = Object::group("top").with_child(
            Object::xform("xf", vec![XformSample::translation(0.0, 2.0, 0.0)]).with_child(
                Object::xform("broken", vec![]).with_child(triangle_mesh("mesh")),
            ),
        );
        let archive = archive(top);
        let mut buffers = FlatBuffers::default();
        let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert_eq!(report.conditions.len(), 1);
        assert!(matches!(
            &report.conditions[0],
            FlattenError::SampleUnavailable { node, .. } if node == "broken"
        ));
        assert_eq!(buffers.vertex_count(), 3);
        assert_eq!(buffers.vertices()[0], [0.0, 2.0, 0.0]);
    }

    #[test]
    fn mesh_without_samples_writes_nothing() {
        let top = Object::group("top")
            .with_child(Object::poly_mesh("empty", vec![]))
            .with_child(triangle_mesh("mesh"));
        let archive = archive(top);
        let mut buffers = FlatBuffers::default();
        let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert_eq!(report.conditions.len(), 1);
        assert_eq!(report.meshes.len(), 1);
        assert_eq!(buffers.indices(), &[0, 1, 2]);
    }

    #[test]
    fn out_of_range_face_index_skips_face() {
        let mesh = Object::poly_mesh(
            "bad",
            vec![MeshSample::new(
                vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![3, 3],
                vec![0, 1, 7, 2, 1, 0],
            )],
        );
        let archive = archive(Object::group("top").with_child(mesh));
        let mut buffers = FlatBuffers::default();
        let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert_eq!(
            report.conditions,
            vec![FlattenError::InvalidFaceIndices {
                node: "bad".to_string(),
                face: 0,
            }]
        );
        assert_eq!(buffers.indices(), &[2, 1, 0]);
    }

    #[test]
    fn truncated_index_list_skips_face() {
        let mesh = Object::poly_mesh(
            "short",
            vec![MeshSample::new(
                vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
                vec![3, 4],
                vec![0, 1, 2, 0, 1],
            )],
        );
        let archive = archive(Object::group("top").with_child(mesh));
        let mut buffers = FlatBuffers::default();
        let report = Flattener::default().flatten(&archive, 0.0, &mut buffers);

        assert_eq!(report.conditions.len(), 1);
        assert_eq!(buffers.indices(), &[0, 1, 2]);
    }
}
