//! Shared types for the backdrop workspace.
//!
//! Kept free of rendering and decoding dependencies so that the scene model,
//! media sources and renderers can agree on viewport and readiness state
//! without depending on each other.

mod types;

pub use types::{ReadyState, VideoInfo, Viewport};
