//! Pointer picking against the scene's planes.

use backdrop_common::Viewport;
use glam::{Mat4, Vec2, Vec3};

/// Pointer position in normalized device coordinates with Y pointing down,
/// each axis in `[-1, 1]`.
pub fn pointer_ndc(x: f32, y: f32, viewport: Viewport) -> Vec2 {
    Vec2::new(
        x / viewport.width.max(1) as f32 * 2.0 - 1.0,
        y / viewport.height.max(1) as f32 * 2.0 - 1.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray through a pointer at `ndc` (Y down) for a camera with the given
    /// view-projection matrix. Depth runs 0..1 in clip space.
    pub fn from_pointer(ndc: Vec2, view_projection: Mat4) -> Self {
        let inverse = view_projection.inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, -ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, -ndc.y, 1.0));
        Self {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    /// Where the ray crosses the local z = 0 plane of an object placed by
    /// `world_from_local`, in that object's local coordinates.
    pub fn hit_local_plane(&self, world_from_local: Mat4) -> Option<Vec3> {
        let local_from_world = world_from_local.inverse();
        let origin = local_from_world.transform_point3(self.origin);
        let direction = local_from_world.transform_vector3(self.direction);
        if direction.z.abs() < 1e-6 {
            return None;
        }
        let t = -origin.z / direction.z;
        (t >= 0.0).then(|| origin + direction * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Mat4 {
        let proj = Mat4::perspective_rh(50f32.to_radians(), 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    #[test]
    fn ndc_corners() {
        let vp = Viewport::new(200, 100);
        assert_eq!(pointer_ndc(0.0, 0.0, vp), Vec2::new(-1.0, -1.0));
        assert_eq!(pointer_ndc(100.0, 50.0, vp), Vec2::ZERO);
        assert_eq!(pointer_ndc(200.0, 100.0, vp), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn center_ray_hits_origin() {
        let ray = Ray::from_pointer(Vec2::ZERO, camera());
        let hit = ray.hit_local_plane(Mat4::IDENTITY).unwrap();
        assert!(hit.length() < 1e-4, "{hit}");
    }

    #[test]
    fn pointer_below_center_hits_below_origin() {
        let ray = Ray::from_pointer(Vec2::new(0.5, 0.5), camera());
        let hit = ray.hit_local_plane(Mat4::IDENTITY).unwrap();
        assert!(hit.x > 0.0 && hit.y < 0.0, "{hit}");
    }

    #[test]
    fn hit_is_in_local_space() {
        let ray = Ray::from_pointer(Vec2::ZERO, camera());
        let placed = Mat4::from_translation(Vec3::new(0.25, 0.0, 0.01));
        let hit = ray.hit_local_plane(placed).unwrap();
        assert!((hit.x + 0.25).abs() < 1e-4 && hit.z.abs() < 1e-6);
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 1.0),
            direction: Vec3::X,
        };
        assert!(ray.hit_local_plane(Mat4::IDENTITY).is_none());
    }
}
