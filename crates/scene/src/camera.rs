use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Vertical field of view, in degrees, at which a slab `height` tall fills
/// the viewport from `distance` away.
pub fn fov_for(height: f32, distance: f32) -> f32 {
    (2.0 * (height / (2.0 * distance)).atan()).to_degrees()
}

/// Projection bookkeeping: refits the field of view whenever the viewport
/// aspect ratio changes, so a fixed virtual height always fills the screen.
#[derive(Debug, Clone)]
pub struct CameraRig {
    fov_degrees: f32,
    aspect: Option<f32>,
    virtual_height: f32,
    pub near: f32,
    pub far: f32,
    projection_dirty: bool,
}

impl CameraRig {
    pub fn new(virtual_height: f32, initial_fov_degrees: f32) -> Self {
        Self {
            fov_degrees: initial_fov_degrees,
            aspect: None,
            virtual_height,
            near: 0.1,
            far: 1000.0,
            projection_dirty: true,
        }
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Last aspect ratio seen; `None` before the first layout.
    pub fn aspect(&self) -> Option<f32> {
        self.aspect
    }

    pub fn virtual_height(&self) -> f32 {
        self.virtual_height
    }

    /// Record the viewport aspect ratio. On change, recompute the field of
    /// view from the camera's current `distance` and mark the projection
    /// dirty. Returns whether anything changed.
    pub fn set_aspect(&mut self, aspect: f32, distance: f32) -> bool {
        if self.aspect == Some(aspect) {
            return false;
        }
        self.aspect = Some(aspect);
        self.fov_degrees = fov_for(self.virtual_height, distance);
        self.projection_dirty = true;
        tracing::debug!(aspect, distance, fov = self.fov_degrees, "camera fov refit");
        true
    }

    /// Whether the projection changed since the last call.
    pub fn take_projection_dirty(&mut self) -> bool {
        std::mem::take(&mut self.projection_dirty)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect.unwrap_or(1.0),
            self.near,
            self.far,
        )
    }
}

/// Orbit controls: the camera circles a target on a sphere.
///
/// Angles follow the usual convention: `polar` is measured from +Y, and
/// `azimuth` around +Y starting at +Z.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    azimuth: f32,
    polar: f32,
    distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitControls {
    const POLAR_EPSILON: f32 = 1e-3;

    /// Controls for a camera at `position` looking at `target`.
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            target,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.5,
            max_distance: 20.0,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        let s = self.polar.sin();
        self.target
            + self.distance * Vec3::new(s * self.azimuth.sin(), self.polar.cos(), s * self.azimuth.cos())
    }

    /// Orbit by a pointer drag of (`dx`, `dy`) pixels on a viewport
    /// `viewport_height` pixels tall. A drag of the full height turns a full
    /// circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.azimuth -= TAU * dx / h * self.rotate_speed;
        self.polar -= TAU * dy / h * self.rotate_speed;
        self.polar = self
            .polar
            .clamp(Self::POLAR_EPSILON, PI - Self::POLAR_EPSILON);
    }

    /// Dolly in for positive `steps` (wheel notches), out for negative.
    pub fn dolly(&mut self, steps: f32) {
        let scale = 0.95f32.powf(self.zoom_speed * steps);
        self.distance = (self.distance * scale).clamp(self.min_distance, self.max_distance);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }
}
