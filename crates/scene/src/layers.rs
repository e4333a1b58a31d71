//! Visual layers. Each owns its geometry and its material's uniforms; the
//! scene only places them.

use crate::error::SceneError;
use crate::fit::{CoverFit, cover_fit, plane_scale};
use crate::layout::{GridLayout, SplitMix64};
use crate::material::{MaterialKind, UniformSet, UniformValue};
use backdrop_common::{VideoInfo, Viewport};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Full-screen plane showing the video, cover-fitted to the viewport.
#[derive(Debug, Clone)]
pub struct VideoLayer {
    uniforms: UniformSet,
    scale: Vec2,
    fit: Option<CoverFit>,
    fitted_for: Option<(Viewport, u32, u32)>,
}

impl VideoLayer {
    pub fn new() -> Self {
        Self {
            uniforms: UniformSet::new(MaterialKind::Video),
            scale: Vec2::ONE,
            fit: None,
            fitted_for: None,
        }
    }

    /// Rescale the plane for a new width/height aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.scale = plane_scale(aspect);
    }

    /// Recompute the cover fit for `viewport` once the video is fully
    /// available. A video that is not (or no longer) available drops any
    /// earlier fit and unbinds the image. Returns whether the uniforms changed.
    pub fn refit(&mut self, viewport: Viewport, video: &VideoInfo) -> Result<bool, SceneError> {
        if !video.is_fully_available() {
            return self.clear();
        }
        let key = (viewport, video.width, video.height);
        if self.fitted_for == Some(key) {
            return Ok(false);
        }
        let Some(fit) = cover_fit(viewport.width, viewport.height, video.width, video.height) else {
            return Ok(false);
        };
        self.uniforms.set(
            "resolution",
            Vec4::new(viewport.width as f32, viewport.height as f32, fit.a1, fit.a2),
        )?;
        self.uniforms.set("image", UniformValue::Texture(true))?;
        self.fit = Some(fit);
        self.fitted_for = Some(key);
        tracing::debug!(a1 = fit.a1, a2 = fit.a2, "video cover fit updated");
        Ok(true)
    }

    fn clear(&mut self) -> Result<bool, SceneError> {
        if self.fitted_for.is_none() {
            return Ok(false);
        }
        self.uniforms.set("image", UniformValue::Texture(false))?;
        self.fit = None;
        self.fitted_for = None;
        tracing::debug!("video unavailable, cover fit cleared");
        Ok(true)
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn fit(&self) -> Option<CoverFit> {
        self.fit
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale.extend(1.0))
    }
}

impl Default for VideoLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// One square of the instanced grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareInstance {
    pub row: usize,
    pub col: usize,
    pub position: Vec3,
    /// Random value in `[0, 1)` fixed at layout time.
    pub scale_seed: f32,
}

/// Instanced grid of small planes animated by `time` and `mouse`.
#[derive(Debug, Clone)]
pub struct SquaresLayer {
    layout: GridLayout,
    instances: Vec<SquareInstance>,
    uniforms: UniformSet,
}

impl SquaresLayer {
    pub const Z: f32 = 0.01;

    pub fn new(layout: GridLayout, seed: u64) -> Result<Self, SceneError> {
        let mut rng = SplitMix64::new(seed);
        let instances: Vec<SquareInstance> = layout
            .cells()
            .map(|(row, col)| SquareInstance {
                row,
                col,
                position: layout.cell_center(row, col),
                scale_seed: rng.next_f32(),
            })
            .collect();

        let mut uniforms = UniformSet::new(MaterialKind::Squares);
        uniforms.set("size", Vec2::splat(layout.cell_size()))?;
        tracing::debug!(instances = instances.len(), "squares laid out");
        Ok(Self {
            layout,
            instances,
            uniforms,
        })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn instances(&self) -> &[SquareInstance] {
        &self.instances
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn set_time(&mut self, time: f32) -> Result<(), SceneError> {
        self.uniforms.set("time", time)
    }

    pub fn set_mouse(&mut self, point: Vec3) -> Result<(), SceneError> {
        self.uniforms.set("mouse", point)
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, Self::Z))
    }
}

/// One particle per cell corner, animated by `time`.
#[derive(Debug, Clone)]
pub struct PointsLayer {
    positions: Vec<Vec3>,
    uniforms: UniformSet,
}

impl PointsLayer {
    pub const Z: f32 = 0.008;

    pub fn new(layout: &GridLayout) -> Self {
        Self {
            positions: layout
                .cells()
                .map(|(row, col)| layout.cell_corner(row, col))
                .collect(),
            uniforms: UniformSet::new(MaterialKind::Particles),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn set_time(&mut self, time: f32) -> Result<(), SceneError> {
        self.uniforms.set("time", time)
    }

    pub fn set_point_size(&mut self, size: f32) -> Result<(), SceneError> {
        self.uniforms.set("pointSize", size)
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, Self::Z))
    }
}

/// Static grid lines on the cell edges.
#[derive(Debug, Clone)]
pub struct LinesLayer {
    segments: Vec<[Vec3; 2]>,
    uniforms: UniformSet,
}

impl LinesLayer {
    pub const Z: f32 = 0.009;

    pub fn new(layout: &GridLayout) -> Self {
        Self {
            segments: layout.line_segments(),
            uniforms: UniformSet::new(MaterialKind::Lines),
        }
    }

    pub fn segments(&self) -> &[[Vec3; 2]] {
        &self.segments
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn set_opacity(&mut self, opacity: f32) -> Result<(), SceneError> {
        self.uniforms.set("opacity", opacity)
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, Self::Z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_common::ReadyState;

    fn ready(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            ready_state: ReadyState::HaveEnoughData,
            width,
            height,
        }
    }

    #[test]
    fn video_waits_for_enough_data() {
        let mut layer = VideoLayer::new();
        let viewport = Viewport::new(1920, 1080);
        let loading = VideoInfo {
            ready_state: ReadyState::HaveFutureData,
            width: 1280,
            height: 720,
        };
        assert!(!layer.refit(viewport, &loading).unwrap());
        assert_eq!(layer.uniforms().vec4("resolution"), Vec4::ZERO);
        assert_eq!(layer.uniforms().get("image"), Some(UniformValue::Texture(false)));

        assert!(layer.refit(viewport, &ready(1280, 720)).unwrap());
        assert_eq!(
            layer.uniforms().vec4("resolution"),
            Vec4::new(1920.0, 1080.0, 1.0, 1.0)
        );
        assert_eq!(layer.uniforms().get("image"), Some(UniformValue::Texture(true)));
    }

    #[test]
    fn video_losing_readiness_clears_fit_and_image() {
        let mut layer = VideoLayer::new();
        let viewport = Viewport::new(1280, 720);
        assert!(layer.refit(viewport, &ready(1280, 720)).unwrap());

        let reloading = VideoInfo {
            ready_state: ReadyState::HaveNothing,
            width: 0,
            height: 0,
        };
        assert!(layer.refit(viewport, &reloading).unwrap());
        assert!(layer.fit().is_none());
        assert_eq!(layer.uniforms().get("image"), Some(UniformValue::Texture(false)));
        assert!(!layer.refit(viewport, &reloading).unwrap());

        // Same size as before, so only the cleared key forces the refit.
        assert!(layer.refit(viewport, &ready(1280, 720)).unwrap());
        assert_eq!(layer.uniforms().get("image"), Some(UniformValue::Texture(true)));
    }

    #[test]
    fn video_refits_only_when_inputs_change() {
        let mut layer = VideoLayer::new();
        let info = ready(1280, 720);
        assert!(layer.refit(Viewport::new(800, 800), &info).unwrap());
        assert!(!layer.refit(Viewport::new(800, 800), &info).unwrap());
        assert!(layer.refit(Viewport::new(800, 400), &info).unwrap());
        let fit = layer.fit().unwrap();
        assert!(fit.a1 == 1.0 || fit.a2 == 1.0);
    }

    #[test]
    fn video_plane_scale_tracks_aspect() {
        let mut layer = VideoLayer::new();
        layer.set_aspect(2.0);
        assert_eq!(layer.scale(), Vec2::new(2.0, 1.0));
        layer.set_aspect(0.5);
        assert_eq!(layer.scale(), Vec2::new(1.0, 2.0));
        assert_eq!(layer.local_matrix().col(1).y, 2.0);
    }

    #[test]
    fn squares_layout_is_seeded_and_sized() {
        let layout = GridLayout::default();
        let a = SquaresLayer::new(layout, 7).unwrap();
        let b = SquaresLayer::new(layout, 7).unwrap();
        assert_eq!(a.instances().len(), 1600);
        assert_eq!(a.instances(), b.instances());
        assert_eq!(a.uniforms().vec2("size"), Vec2::splat(0.08));
        assert!(a.instances().iter().all(|i| (0.0..1.0).contains(&i.scale_seed)));

        let c = SquaresLayer::new(layout, 8).unwrap();
        assert_ne!(a.instances()[0].scale_seed, c.instances()[0].scale_seed);
    }

    #[test]
    fn overlays_sit_between_video_and_squares() {
        let depths = [0.0, PointsLayer::Z, LinesLayer::Z, SquaresLayer::Z];
        assert!(depths.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn overlay_geometry_counts() {
        let layout = GridLayout::new(10, 0.1);
        assert_eq!(PointsLayer::new(&layout).positions().len(), 100);
        assert_eq!(LinesLayer::new(&layout).segments().len(), 20);
    }
}
