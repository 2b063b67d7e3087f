// src/engine_lib/camera.rs

use glam::Mat4;

/// Lens parameters for the real camera. The virtual cameras behind portals reuse the same
/// projection, so this is the only place the field of view lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub fov_y_rad: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(fov_y_deg: f32, znear: f32, zfar: f32) -> Self {
        Self {
            fov_y_rad: fov_y_deg.to_radians(),
            znear,
            zfar,
        }
    }

    pub fn aspect_ratio(width: u32, height: u32) -> f32 {
        width.max(1) as f32 / height.max(1) as f32
    }

    // wgpu clip space: depth in [0, 1].
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, Self::aspect_ratio(width, height), self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4Swizzles};

    use super::Camera;

    #[test]
    fn new_converts_degrees() {
        let camera = Camera::new(90.0, 0.1, 100.0);
        assert!((camera.fov_y_rad - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn zero_sized_viewport_does_not_divide_by_zero() {
        assert_eq!(Camera::aspect_ratio(0, 0), 1.0);
        assert_eq!(Camera::aspect_ratio(1280, 0), 1280.0);
    }

    #[test]
    fn near_and_far_planes_map_to_depth_range() {
        let camera = Camera::new(45.0, 0.1, 100.0);
        let proj = camera.projection_matrix(1280, 720);

        let near = proj * Vec3::new(0.0, 0.0, -0.1).extend(1.0);
        let far = proj * Vec3::new(0.0, 0.0, -100.0).extend(1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);

        let centre = proj * Vec3::new(0.0, 0.0, -5.0).extend(1.0);
        assert!(centre.xy().length() < 1e-6);
    }
}
