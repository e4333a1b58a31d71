//! Media: video sources that feed the background plane.
//!
//! Sources are polled once per frame on the render thread. Readiness climbs
//! through [`ReadyState`] levels and is announced once each via
//! [`MediaEvent::LoadedMetadata`] and [`MediaEvent::CanPlay`]. Playback is
//! always muted and looping; nothing plays until [`VideoSource::play`] is
//! called, which hosts do on `CanPlay`.
//!
//! # Invariants
//! - Natural dimensions are zero until metadata is loaded.
//! - `CanPlay` is emitted at most once per source.

mod pattern;
mod sequence;
mod source;

pub use backdrop_common::{ReadyState, VideoInfo};
pub use pattern::TestPattern;
pub use sequence::FrameSequence;
pub use source::{MediaEvent, Playback, VideoFrame, VideoSource};

use std::path::PathBuf;

/// Errors from opening or decoding media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no frames found in {0}")]
    EmptySequence(PathBuf),
    #[error("frame {path} is {got:?}, expected {expected:?}")]
    FrameSizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        got: (u32, u32),
    },
    #[error("fps must be positive, got {0}")]
    InvalidFps(f32),
}

pub fn crate_info() -> &'static str {
    "backdrop-media v0.1.0"
}
