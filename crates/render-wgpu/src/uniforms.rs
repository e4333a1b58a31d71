//! GPU-side uniform blocks, packed from a material's [`UniformSet`].
//!
//! Layouts follow WGSL uniform rules: every block is a multiple of 16 bytes
//! and vec3 members share their 16-byte slot with a trailing f32.

use backdrop_scene::{MaterialKind, UniformSet};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct VideoUniform {
    pub model: [[f32; 4]; 4],
    pub resolution: [f32; 4],
}

impl VideoUniform {
    pub fn pack(set: &UniformSet, model: Mat4) -> Self {
        debug_assert_eq!(set.material(), MaterialKind::Video);
        Self {
            model: model.to_cols_array_2d(),
            resolution: set.vec4("resolution").to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SquaresUniform {
    pub model: [[f32; 4]; 4],
    pub mouse: [f32; 3],
    pub time: f32,
    pub size: [f32; 2],
    pub _pad: [f32; 2],
}

impl SquaresUniform {
    pub fn pack(set: &UniformSet, model: Mat4) -> Self {
        debug_assert_eq!(set.material(), MaterialKind::Squares);
        Self {
            model: model.to_cols_array_2d(),
            mouse: set.vec3("mouse").to_array(),
            time: set.float("time"),
            size: set.vec2("size").to_array(),
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ParticlesUniform {
    pub model: [[f32; 4]; 4],
    pub time: f32,
    pub point_size: f32,
    pub _pad: [f32; 2],
}

impl ParticlesUniform {
    pub fn pack(set: &UniformSet, model: Mat4) -> Self {
        debug_assert_eq!(set.material(), MaterialKind::Particles);
        Self {
            model: model.to_cols_array_2d(),
            time: set.float("time"),
            point_size: set.float("pointSize"),
            _pad: [0.0; 2],
        }
    }
}

/// `color.w` carries the opacity.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LinesUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl LinesUniform {
    pub fn pack(set: &UniformSet, model: Mat4) -> Self {
        debug_assert_eq!(set.material(), MaterialKind::Lines);
        Self {
            model: model.to_cols_array_2d(),
            color: set.vec3("color").extend(set.float("opacity")).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3, Vec4};
    use std::mem::size_of;

    #[test]
    fn block_sizes_match_wgsl_layout() {
        assert_eq!(size_of::<CameraUniform>(), 64);
        assert_eq!(size_of::<VideoUniform>(), 80);
        assert_eq!(size_of::<SquaresUniform>(), 96);
        assert_eq!(size_of::<ParticlesUniform>(), 80);
        assert_eq!(size_of::<LinesUniform>(), 80);
    }

    #[test]
    fn squares_pack_places_mouse_before_time() {
        let mut set = UniformSet::new(MaterialKind::Squares);
        set.set("mouse", Vec3::new(0.1, 0.2, 0.3)).unwrap();
        set.set("time", 4.5).unwrap();
        set.set("size", Vec2::splat(0.08)).unwrap();
        let packed = SquaresUniform::pack(&set, Mat4::IDENTITY);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&packed));
        assert_eq!(&floats[16..20], &[0.1, 0.2, 0.3, 4.5]);
        assert_eq!(&floats[20..22], &[0.08, 0.08]);
    }

    #[test]
    fn lines_pack_folds_opacity_into_alpha() {
        let mut set = UniformSet::new(MaterialKind::Lines);
        set.set("opacity", 0.4).unwrap();
        let packed = LinesUniform::pack(&set, Mat4::IDENTITY);
        assert_eq!(packed.color, [1.0, 1.0, 1.0, 0.4]);
    }

    #[test]
    fn particles_pack_uses_default_point_size() {
        let set = UniformSet::new(MaterialKind::Particles);
        let packed = ParticlesUniform::pack(&set, Mat4::from_translation(Vec3::Z));
        assert_eq!(packed.point_size, 0.012);
        assert_eq!(packed.model[3], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn video_pack_copies_fit_factors() {
        let mut set = UniformSet::new(MaterialKind::Video);
        set.set("resolution", Vec4::new(800.0, 600.0, 1.0, 0.75))
            .unwrap();
        let packed = VideoUniform::pack(&set, Mat4::IDENTITY);
        assert_eq!(packed.resolution, [800.0, 600.0, 1.0, 0.75]);
    }

    #[test]
    fn camera_uniform_is_column_major() {
        let vp = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(CameraUniform::new(vp).view_proj[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
