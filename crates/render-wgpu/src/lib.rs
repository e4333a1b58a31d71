//! wgpu render backend for the background scene.
//!
//! Draws the cover-fitted video plane, the instanced squares grid and, in the
//! full variant, particle sprites and grid lines. All state comes from a
//! [`backdrop_scene::Scene`]; this crate only packs it into GPU buffers.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - A layer whose program fails to build is skipped; others still draw.
//! - The video texture is re-uploaded only when the frame index changes.

mod gpu;
mod mesh;
mod shaders;
pub mod uniforms;

pub use gpu::{BackdropRenderer, RenderError};
pub use shaders::builtin_registry;

pub fn crate_info() -> &'static str {
    "backdrop-render-wgpu v0.1.0"
}
