use crate::camera::{CameraRig, OrbitControls};
use crate::config::{SceneConfig, Variant};
use crate::error::SceneError;
use crate::layers::{LinesLayer, PointsLayer, SquaresLayer, VideoLayer};
use crate::material::{MaterialKind, MaterialRegistry};
use crate::pointer::{Ray, pointer_ndc};
use crate::settings;
use backdrop_common::{VideoInfo, Viewport};
use backdrop_panel::{SettingChange, SettingValue};
use glam::{EulerRot, Mat4, Vec2, Vec3};

/// The composed background: camera, layers and the state that ties them to
/// the viewport, the pointer, the clock and the debug settings.
///
/// Hosts drive it with [`Scene::resize`], [`Scene::observe_video`],
/// [`Scene::pointer_move`], [`Scene::apply_setting`] and one
/// [`Scene::update`] per frame, then read layers and matrices to draw.
#[derive(Debug, Clone)]
pub struct Scene {
    variant: Variant,
    viewport: Option<Viewport>,
    rig: CameraRig,
    orbit: OrbitControls,
    /// Euler X/Y rotation of the whole scene, driven by parallax.
    rotation: Vec2,
    parallax: f32,
    time_scale: f32,
    time: f32,
    clear_color: [f32; 3],
    video_info: VideoInfo,
    video: VideoLayer,
    squares: SquaresLayer,
    points: Option<PointsLayer>,
    lines: Option<LinesLayer>,
}

impl Scene {
    /// Materials a variant draws with.
    pub fn required_materials(variant: Variant) -> Vec<MaterialKind> {
        let mut kinds = vec![MaterialKind::Video, MaterialKind::Squares];
        if variant.has_overlays() {
            kinds.extend([MaterialKind::Particles, MaterialKind::Lines]);
        }
        kinds
    }

    /// Build the layers for `config`. Fails if the config does not validate
    /// or `registry` lacks a program for any material the variant needs.
    pub fn new(config: &SceneConfig, registry: &MaterialRegistry) -> Result<Self, SceneError> {
        config
            .validate()
            .map_err(|e| SceneError::InvalidConfig(e.to_string()))?;
        for kind in Self::required_materials(config.variant) {
            registry.program(kind)?;
        }

        let layout = config.layout();
        let [x, y, z] = config.camera.position;
        let overlays = config.variant.has_overlays();
        let mut scene = Self {
            variant: config.variant,
            viewport: None,
            rig: CameraRig::new(config.virtual_height(), config.camera.fov),
            orbit: OrbitControls::new(Vec3::new(x, y, z), Vec3::ZERO),
            rotation: Vec2::ZERO,
            parallax: 0.1,
            time_scale: 1.0,
            time: 0.0,
            clear_color: [0.0; 3],
            video_info: VideoInfo::default(),
            video: VideoLayer::new(),
            squares: SquaresLayer::new(layout, config.seed)?,
            points: overlays.then(|| PointsLayer::new(&layout)),
            lines: overlays.then(|| LinesLayer::new(&layout)),
        };

        for (key, setting) in config.settings().iter() {
            scene.apply_setting(&SettingChange {
                key: key.to_string(),
                value: setting.value.clone(),
            })?;
        }

        tracing::info!(
            variant = ?scene.variant,
            squares = scene.squares.instances().len(),
            overlays,
            "scene built"
        );
        Ok(scene)
    }

    /// Lay the scene out for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
        let viewport = Viewport::new(width.max(1), height.max(1));
        self.viewport = Some(viewport);
        let aspect = viewport.aspect();
        self.rig.set_aspect(aspect, self.orbit.distance());
        self.video.set_aspect(aspect);
        self.video.refit(viewport, &self.video_info)?;
        Ok(())
    }

    /// Record the video's readiness and natural size.
    pub fn observe_video(&mut self, info: VideoInfo) -> Result<(), SceneError> {
        self.video_info = info;
        if let Some(viewport) = self.viewport {
            self.video.refit(viewport, &info)?;
        }
        Ok(())
    }

    /// Whether everything needed for a complete frame is available.
    pub fn is_ready(&self) -> bool {
        self.video_info.is_fully_available()
    }

    /// Pointer moved to pixel (`x`, `y`). If it is over a square, writes the
    /// world-space hit into the squares' `mouse` uniform, tilts the scene
    /// toward the pointer (full variant) and returns the hit.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Result<Option<Vec3>, SceneError> {
        let Some(viewport) = self.viewport else {
            return Ok(None);
        };
        let ndc = pointer_ndc(x, y, viewport);
        let ray = Ray::from_pointer(ndc, self.view_projection());
        let world_from_squares = self.squares_matrix();
        let Some(local) = ray.hit_local_plane(world_from_squares) else {
            return Ok(None);
        };
        if self.squares.layout().cell_at(local.truncate()).is_none() {
            return Ok(None);
        }

        let hit = world_from_squares.transform_point3(local);
        self.squares.set_mouse(hit)?;
        if self.variant.has_parallax() {
            self.rotation = Vec2::new(ndc.y * self.parallax, ndc.x * self.parallax);
        }
        Ok(Some(hit))
    }

    /// Advance the scene clock by `dt` seconds and push it to the shaders.
    pub fn update(&mut self, dt: f32) -> Result<(), SceneError> {
        self.time += dt.max(0.0) * self.time_scale;
        self.squares.set_time(self.time)?;
        if let Some(points) = &mut self.points {
            points.set_time(self.time)?;
        }
        Ok(())
    }

    /// Apply one debug-panel change. Returns whether the scene recognized it.
    pub fn apply_setting(&mut self, change: &SettingChange) -> Result<bool, SceneError> {
        let key = change.key.as_str();
        let applied = match (key, &change.value) {
            (settings::TIME_SCALE, SettingValue::Number(v)) => {
                self.time_scale = (*v as f32).max(0.0);
                true
            }
            (settings::PARALLAX, SettingValue::Number(v)) => {
                self.parallax = *v as f32;
                true
            }
            (settings::LINE_OPACITY, SettingValue::Number(v)) => {
                if let Some(lines) = &mut self.lines {
                    lines.set_opacity(*v as f32)?;
                }
                true
            }
            (settings::POINT_SIZE, SettingValue::Number(v)) => {
                if let Some(points) = &mut self.points {
                    points.set_point_size(*v as f32)?;
                }
                true
            }
            (settings::CLEAR_COLOR, value) => match value.as_color() {
                Some(rgb) => {
                    self.clear_color = rgb;
                    true
                }
                None => false,
            },
            _ => false,
        };
        if !applied {
            tracing::warn!(key, value = ?change.value, "ignoring unrecognized setting");
        }
        Ok(applied)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn parallax(&self) -> f32 {
        self.parallax
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn clear_color(&self) -> [f32; 3] {
        self.clear_color
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    pub fn video(&self) -> &VideoLayer {
        &self.video
    }

    pub fn squares(&self) -> &SquaresLayer {
        &self.squares
    }

    pub fn points(&self) -> Option<&PointsLayer> {
        self.points.as_ref()
    }

    pub fn lines(&self) -> Option<&LinesLayer> {
        self.lines.as_ref()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.rig.projection_matrix() * self.orbit.view_matrix()
    }

    /// Transform applied to every layer.
    pub fn root_matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0)
    }

    pub fn video_matrix(&self) -> Mat4 {
        self.root_matrix() * self.video.local_matrix()
    }

    pub fn squares_matrix(&self) -> Mat4 {
        self.root_matrix() * self.squares.local_matrix()
    }

    pub fn points_matrix(&self) -> Option<Mat4> {
        self.points
            .as_ref()
            .map(|p| self.root_matrix() * p.local_matrix())
    }

    pub fn lines_matrix(&self) -> Option<Mat4> {
        self.lines
            .as_ref()
            .map(|l| self.root_matrix() * l.local_matrix())
    }
}
