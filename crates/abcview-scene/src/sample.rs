use crate::time_sampling::TimeSampling;
use glam::DMat4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a requested time resolves to a stored sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    Floor,
    Ceil,
    #[default]
    Near,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleSelector {
    pub time: f64,
    pub policy: SelectionPolicy,
}

impl SampleSelector {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(time: f64, policy: SelectionPolicy) -> Self {
        Self { time, policy }
    }

    pub fn index(&self, sampling: &TimeSampling, num_samples: usize) -> Option<usize> {
        match self.policy {
            SelectionPolicy::Floor => sampling.floor_index(self.time, num_samples),
            SelectionPolicy::Ceil => sampling.ceil_index(self.time, num_samples),
            SelectionPolicy::Near => sampling.near_index(self.time, num_samples),
        }
    }
}

/// One transform sample.
///
/// `matrix` is stored row-major for row vectors (translation in elements
/// 12..14). Read column-major, the same sixteen values give the equivalent
/// column-vector matrix, which is what [`XformSample::matrix`] returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XformSample {
    pub matrix: [f64; 16],
    #[serde(default = "inherits_default")]
    pub inherits: bool,
}

fn inherits_default() -> bool {
    true
}

impl XformSample {
    pub fn identity() -> Self {
        Self::from_matrix(DMat4::IDENTITY)
    }

    pub fn from_matrix(m: DMat4) -> Self {
        Self {
            matrix: m.to_cols_array(),
            inherits: true,
        }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self::from_matrix(DMat4::from_translation(glam::DVec3::new(x, y, z)))
    }

    pub fn matrix(&self) -> DMat4 {
        DMat4::from_cols_array(&self.matrix)
    }
}

/// Positions plus face topology for one mesh sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSample {
    pub positions: Vec<[f32; 3]>,
    pub face_counts: Vec<i32>,
    pub face_indices: Vec<i32>,
}

impl MeshSample {
    pub fn new(positions: Vec<[f32; 3]>, face_counts: Vec<i32>, face_indices: Vec<i32>) -> Self {
        Self {
            positions,
            face_counts,
            face_indices,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("object `{object}` does not carry the {expected} schema")]
    WrongSchema {
        object: String,
        expected: &'static str,
    },
    #[error("object `{object}` has no samples")]
    NoSamples { object: String },
    #[error("object `{object}` refers to missing time sampling {index}")]
    MissingTimeSampling { object: String, index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_lands_in_row_vector_slots() {
        let s = XformSample::translation(1.0, 2.0, 3.0);
        assert_eq!(&s.matrix[12..15], &[1.0, 2.0, 3.0]);
        let p = s.matrix().transform_point3(glam::DVec3::ZERO);
        assert_eq!(p, glam::DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn selector_follows_policy() {
        let ts = TimeSampling::Identity;
        assert_eq!(SampleSelector::new(0.7).index(&ts, 3), Some(1));
        assert_eq!(
            SampleSelector::with_policy(0.7, SelectionPolicy::Floor).index(&ts, 3),
            Some(0)
        );
        assert_eq!(
            SampleSelector::with_policy(0.2, SelectionPolicy::Ceil).index(&ts, 3),
            Some(1)
        );
    }
}
