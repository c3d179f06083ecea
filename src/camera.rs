use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::geometry::Ray;

/// Orthographic camera looking down -Z from `position`.
///
/// The half extents are `frustum_size * aspect` horizontally and `frustum_size`
/// vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    pub position: Vec3,
    pub frustum_size: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from(config.position),
            frustum_size: config.frustum_size,
            aspect: sanitize_aspect(aspect),
            near: config.near,
            far: config.far,
        }
    }

    /// Only the projection changes; the position is kept as is.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = sanitize_aspect(width as f32 / height.max(1) as f32);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(-self.position)
    }

    pub fn projection(&self) -> Mat4 {
        let half_w = self.frustum_size * self.aspect;
        let half_h = self.frustum_size;
        Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::NEG_Z
    }

    /// Ray through `ndc`, from the near plane towards the far plane.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(ndc.extend(-1.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(near, (far - near).normalize_or_zero())
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrthoCamera {
        OrthoCamera::new(&CameraConfig::default(), 2.0)
    }

    #[test]
    fn center_ray_starts_at_camera_xy() {
        let cam = camera();
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!((ray.origin.x - cam.position.x).abs() < 1e-3);
        assert!((ray.origin.y - cam.position.y).abs() < 1e-3);
        assert!((ray.origin.z - (cam.position.z - cam.near)).abs() < 1e-2);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn edge_ray_offset_by_frustum_extent() {
        let cam = camera();
        let ray = cam.ray_from_ndc(Vec2::new(1.0, -1.0));
        let half_w = cam.frustum_size * cam.aspect;
        assert!((ray.origin.x - (cam.position.x + half_w)).abs() < 1e-2);
        assert!((ray.origin.y - (cam.position.y - cam.frustum_size)).abs() < 1e-2);
    }

    #[test]
    fn resize_keeps_position() {
        let mut cam = camera();
        let before = cam.position;
        cam.set_viewport(1080, 1920);
        assert_eq!(cam.position, before);
        assert!((cam.aspect - 0.5625).abs() < 1e-6);
        cam.set_viewport(100, 0);
        assert!(cam.aspect.is_finite());
    }
}
