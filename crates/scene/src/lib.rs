//! Scene model for the animated background.
//!
//! Everything here is renderer-agnostic: a [`Scene`] owns the camera rig,
//! orbit controls and the visual layers (video plane, instanced squares,
//! particles, grid lines) with their uniform sets. Renderers read it each
//! frame; hosts feed it viewport, pointer, clock, media and settings events.
//!
//! # Invariants
//! - The field of view is refit on every aspect change so the variant's
//!   virtual height fills the viewport.
//! - Layers own their uniforms; the scene places layers but never reaches into
//!   another layer's state.
//! - Material programs come from an explicit [`MaterialRegistry`].

pub mod camera;
pub mod config;
pub mod fit;
pub mod layers;
pub mod layout;
pub mod material;
pub mod pointer;
pub mod settings;

mod error;
mod scene;

pub use camera::{CameraRig, OrbitControls, fov_for};
pub use config::{ConfigError, SceneConfig, Variant};
pub use error::SceneError;
pub use fit::{CoverFit, cover_fit, plane_scale};
pub use layout::GridLayout;
pub use material::{MaterialKind, MaterialRegistry, ShaderProgram, UniformSet, UniformValue};
pub use scene::Scene;

pub fn crate_info() -> &'static str {
    "backdrop-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
