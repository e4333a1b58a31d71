use serde::{Deserialize, Serialize};

/// Render surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Zero-sized dimensions are treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Media readiness, ordered from nothing known to fully playable.
///
/// Mirrors the five levels a browser media element reports, so
/// `ReadyState::HaveEnoughData as u8 == 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReadyState {
    #[default]
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

/// Snapshot of what a video source knows about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    pub ready_state: ReadyState,
    /// Natural frame width; zero until metadata is loaded.
    pub width: u32,
    /// Natural frame height; zero until metadata is loaded.
    pub height: u32,
}

impl VideoInfo {
    /// Whether natural dimensions can be trusted for layout.
    pub fn is_fully_available(&self) -> bool {
        self.ready_state == ReadyState::HaveEnoughData && self.width > 0 && self.height > 0
    }
}
