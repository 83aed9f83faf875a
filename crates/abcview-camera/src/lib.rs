use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use wgpu::{Buffer, Queue};

/// A fixed camera looking at a model that spins about +Y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurntableCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per second.
    pub spin_speed: f32,
}

impl Default for TurntableCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 6.0, 8.0),
            target: Vec3::ZERO,
            fov_y_degrees: 45.0,
            near: 0.01,
            far: 100.0,
            spin_speed: 0.6,
        }
    }
}

impl TurntableCamera {
    pub fn world(&self, elapsed: f32) -> Mat4 {
        Mat4::from_rotation_y(self.spin_speed * elapsed)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = (width.max(1) as f32) / (height.max(1) as f32);
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// `projection × view × world`.
    pub fn world_view_projection(&self, elapsed: f32, width: u32, height: u32) -> Mat4 {
        self.projection(width, height) * self.view() * self.world(elapsed)
    }
}

pub fn update_camera_buffer(
    queue: &Queue,
    camera_buf: &Buffer,
    camera: &TurntableCamera,
    elapsed: f32,
    width: u32,
    height: u32,
) {
    let wvp = camera
        .world_view_projection(elapsed, width, height)
        .to_cols_array();
    queue.write_buffer(camera_buf, 0, bytemuck::cast_slice(&[wvp]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn target_projects_to_screen_centre() {
        let cam = TurntableCamera::default();
        let clip = cam.world_view_projection(0.0, 800, 600) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn world_spins_about_y() {
        let cam = TurntableCamera::default();
        let quarter_turn = std::f32::consts::FRAC_PI_2 / cam.spin_speed;
        let p = cam.world(quarter_turn).transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn zero_sized_viewport_does_not_produce_nan() {
        let cam = TurntableCamera::default();
        let m = cam.projection(0, 0);
        assert!(m.is_finite());
    }
}
