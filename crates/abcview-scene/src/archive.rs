use crate::metadata::NodeKind;
use crate::object::Object;
use crate::sample::{MeshSample, SampleError, SampleSelector, XformSample};
use crate::time_sampling::TimeSampling;
use serde::Deserialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("failed to read archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse archive: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("time sampling {index} is invalid: {reason}")]
    InvalidTimeSampling { index: usize, reason: &'static str },
    #[error("object `{object}` refers to missing time sampling {index}")]
    MissingTimeSampling { object: String, index: usize },
}

#[derive(Deserialize)]
#[serde(rename = "Archive")]
struct ArchiveDesc {
    #[serde(default)]
    time_samplings: Vec<TimeSampling>,
    top: Object,
}

/// A loaded scene archive. Read-only once built.
///
/// Time sampling 0 is always the identity sampling; the samplings listed in
/// the file start at index 1.
#[derive(Debug)]
pub struct Archive {
    path: Option<PathBuf>,
    time_samplings: Vec<TimeSampling>,
    top: Object,
}

impl Archive {
    pub fn new(time_samplings: Vec<TimeSampling>, top: Object) -> Result<Self, ArchiveError> {
        let mut all = Vec::with_capacity(time_samplings.len() + 1);
        all.push(TimeSampling::Identity);
        all.extend(time_samplings);

        for (index, ts) in all.iter().enumerate() {
            ts.validate()
                .map_err(|reason| ArchiveError::InvalidTimeSampling { index, reason })?;
        }

        let mut missing = None;
        top.visit(&mut |obj, _| {
            if missing.is_none() && obj.time_sampling_index() >= all.len() {
                missing = Some((obj.name().to_string(), obj.time_sampling_index()));
            }
        });
        if let Some((object, index)) = missing {
            return Err(ArchiveError::MissingTimeSampling { object, index });
        }

        Ok(Self {
            path: None,
            time_samplings: all,
            top,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = Self::from_ron_str(&text)?;
        archive.path = Some(path.to_path_buf());
        log::info!(
            "opened archive {} ({} objects)",
            path.display(),
            archive.object_count()
        );
        Ok(archive)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ArchiveError> {
        let desc: ArchiveDesc = ron::from_str(text)?;
        Self::new(desc.time_samplings, desc.top)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn top(&self) -> &Object {
        &self.top
    }

    pub fn time_sampling(&self, index: usize) -> Option<&TimeSampling> {
        self.time_samplings.get(index)
    }

    pub fn time_samplings(&self) -> &[TimeSampling] {
        &self.time_samplings
    }

    pub fn object_count(&self) -> usize {
        let mut count = 0;
        self.top.visit(&mut |_, _| count += 1);
        count
    }

    /// Earliest and latest sample times over every animated object.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        self.top.visit(&mut |obj, _| {
            let n = obj.num_samples();
            if n < 2 {
                return;
            }
            let Some((start, end)) = self
                .time_sampling(obj.time_sampling_index())
                .and_then(|ts| ts.time_range(n))
            else {
                return;
            };
            range = Some(match range {
                Some((lo, hi)) => (lo.min(start), hi.max(end)),
                None => (start, end),
            });
        });
        range
    }

    pub fn xform_sample<'a>(
        &self,
        object: &'a Object,
        selector: SampleSelector,
    ) -> Result<&'a XformSample, SampleError> {
        if object.kind() != NodeKind::Transform {
            return Err(SampleError::WrongSchema {
                object: object.name().to_string(),
                expected: "transform",
            });
        }
        let index = self.select(object, object.xform_samples().len(), selector)?;
        Ok(&object.xform_samples()[index])
    }

    pub fn mesh_sample<'a>(
        &self,
        object: &'a Object,
        selector: SampleSelector,
    ) -> Result<&'a MeshSample, SampleError> {
        if object.kind() != NodeKind::PolyMesh {
            return Err(SampleError::WrongSchema {
                object: object.name().to_string(),
                expected: "poly mesh",
            });
        }
        let index = self.select(object, object.mesh_samples().len(), selector)?;
        Ok(&object.mesh_samples()[index])
    }

    fn select(
        &self,
        object: &Object,
        num_samples: usize,
        selector: SampleSelector,
    ) -> Result<usize, SampleError> {
        let sampling = self.time_sampling(object.time_sampling_index()).ok_or_else(|| {
            SampleError::MissingTimeSampling {
                object: object.name().to_string(),
                index: object.time_sampling_index(),
            }
        })?;
        selector
            .index(sampling, num_samples)
            .ok_or_else(|| SampleError::NoSamples {
                object: object.name().to_string(),
            })
    }

    /// One line per object, indented by depth with tabs, followed by the
    /// schema label when the object has a known schema.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.top.visit(&mut |obj, depth| {
            for _ in 0..depth {
                out.push('\t');
            }
            out.push_str(obj.name());
            if let Some(label) = obj.kind().schema_label() {
                let _ = write!(out, " ({label})");
            }
            out.push('\n');
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SelectionPolicy;

    const SAMPLE: &str = r#"
        Archive(
            time_samplings: [Uniform(start: 0.0, time_per_cycle: 0.5)],
            top: (
                name: "ABC",
                children: [
                    (
                        name: "box",
                        metadata: {"schema": "AbcGeom_Xform_v3"},
                        time_sampling: 1,
                        xform: [
                            (matrix: (1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0)),
                            (matrix: (1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0)),
                        ],
                        children: [
                            (
                                name: "boxShape",
                                metadata: {"schema": "AbcGeom_PolyMesh_v1"},
                                mesh: [(
                                    positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0)],
                                    face_counts: [3],
                                    face_indices: [0, 1, 2],
                                )],
                            ),
                        ],
                    ),
                    (name: "cam", metadata: {"schema": "AbcGeom_Camera_v1"}),
                ],
            ),
        )
    "#;

    #[test]
    fn parses_ron_archive() {
        let archive = Archive::from_ron_str(SAMPLE).unwrap();
        assert_eq!(archive.object_count(), 4);
        assert_eq!(archive.time_samplings().len(), 2);
        assert_eq!(archive.top().children()[0].kind(), NodeKind::Transform);
        assert_eq!(archive.top().children()[1].kind(), NodeKind::Camera);
    }

    #[test]
    fn time_range_covers_animated_objects() {
        let archive = Archive::from_ron_str(SAMPLE).unwrap();
        assert_eq!(archive.time_range(), Some((0.0, 0.5)));
    }

    #[test]
    fn xform_sample_follows_selector() {
        let archive = Archive::from_ron_str(SAMPLE).unwrap();
        let xf = &archive.top().children()[0];

        let s = archive.xform_sample(xf, SampleSelector::new(0.4)).unwrap();
        assert_eq!(s.matrix[12], 2.0);

        let s = archive
            .xform_sample(xf, SampleSelector::with_policy(0.4, SelectionPolicy::Floor))
            .unwrap();
        assert_eq!(s.matrix[12], 0.0);
    }

    #[test]
    fn sampling_with_wrong_schema_fails() {
        let archive = Archive::from_ron_str(SAMPLE).unwrap();
        let cam = &archive.top().children()[1];
        assert!(matches!(
            archive.xform_sample(cam, SampleSelector::new(0.0)),
            Err(SampleError::WrongSchema { .. })
        ));
    }

    #[test]
    fn transform_without_samples_is_unavailable() {
        let top = Object::group("top").with_child(Object::xform("empty", vec![]));
        let archive = Archive::new(vec![], top).unwrap();
        let xf = &archive.top().children()[0];
        assert!(matches!(
            archive.xform_sample(xf, SampleSelector::new(0.0)),
            Err(SampleError::NoSamples { .. })
        ));
    }

    #[test]
    fn samples_borrow_from_the_object_not_the_archive() {
        let mover = Object::xform("mover", vec![XformSample::translation(1.0, 2.0, 3.0)]);
        let shape = Object::poly_mesh(
            "shape",
            vec![MeshSample::new(vec![[0.0; 3]; 3], vec![3], vec![0, 1, 2])],
        );

        let (xform, mesh) = {
            let archive = Archive::new(vec![], Object::group("top")).unwrap();
            (
                archive.xform_sample(&mover, SampleSelector::new(0.0)).unwrap(),
                archive.mesh_sample(&shape, SampleSelector::new(0.0)).unwrap(),
            )
        };
        assert_eq!(xform.matrix[13], 2.0);
        assert_eq!(mesh.face_counts, vec![3]);
    }

    #[test]
    fn rejects_unknown_time_sampling_index() {
        let top = Object::group("top").with_child(Object::camera("cam").with_time_sampling(3));
        let err = Archive::new(vec![], top).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingTimeSampling { index: 3, .. }));
    }

    #[test]
    fn rejects_invalid_time_sampling() {
        let err = Archive::new(
            vec![TimeSampling::Uniform {
                start: 0.0,
                time_per_cycle: -1.0,
            }],
            Object::group("top"),
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidTimeSampling { index: 1, .. }));
    }

    #[test]
    fn outline_lists_names_and_schemas() {
        let archive = Archive::from_ron_str(SAMPLE).unwrap();
        assert_eq!(
            archive.outline(),
            "ABC\n\tbox (IXformSchema)\n\t\tboxShape (IPolyMeshSchema)\n\tcam (ICameraSchema)\n"
        );
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ron");
        std::fs::write(&path, SAMPLE).unwrap();

        let archive = Archive::open(&path).unwrap();
        assert_eq!(archive.path(), Some(path.as_path()));
        assert_eq!(archive.object_count(), 4);
    }

    #[test]
    fn open_reports_missing_file() {
        let err = Archive::open("/nonexistent/scene.ron").unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
    }
}
