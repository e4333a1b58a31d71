use crate::MediaError;
use backdrop_common::VideoInfo;

/// One-shot readiness notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Natural dimensions are known.
    LoadedMetadata,
    /// Enough data is decoded to play through.
    CanPlay,
}

/// A decoded RGBA8 frame borrowed from its source.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    /// Changes whenever the pixels change; hosts re-upload on change only.
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

/// A muted, looping video.
pub trait VideoSource {
    /// Readiness and natural size.
    fn info(&self) -> VideoInfo;

    /// Make progress on loading. Called once per rendered frame.
    fn poll(&mut self) -> Result<Option<MediaEvent>, MediaError>;

    fn play(&mut self);

    fn is_playing(&self) -> bool;

    /// Advance the play position by `dt` seconds (no-op while paused).
    fn advance(&mut self, dt: f32);

    /// Play position in seconds, always within `[0, duration)`.
    fn position(&self) -> f32;

    /// The frame at the current play position, once one is decoded.
    fn current_frame(&self) -> Option<VideoFrame<'_>>;
}

/// Looping play clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    position: f32,
    duration: f32,
    playing: bool,
}

impl Playback {
    pub fn new(duration: f32) -> Self {
        Self {
            position: 0.0,
            duration,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.playing || self.duration <= 0.0 {
            return;
        }
        self.position = (self.position + dt.max(0.0)).rem_euclid(self.duration);
    }

    /// Frame index at the current position for a clip of `frame_count`
    /// frames at `fps`.
    pub fn frame_at(&self, fps: f32, frame_count: usize) -> usize {
        if frame_count == 0 {
            return 0;
        }
        ((self.position * fps).floor() as usize) % frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_playback_does_not_move() {
        let mut p = Playback::new(2.0);
        p.advance(0.5);
        assert_eq!(p.position(), 0.0);
        p.play();
        p.advance(0.5);
        assert_eq!(p.position(), 0.5);
        p.pause();
        p.advance(0.5);
        assert_eq!(p.position(), 0.5);
    }

    #[test]
    fn playback_loops() {
        let mut p = Playback::new(2.0);
        p.play();
        p.advance(1.5);
        p.advance(1.0);
        assert!((p.position() - 0.5).abs() < 1e-6);
        assert!(p.position() < p.duration());
    }

    #[test]
    fn frame_index_wraps() {
        let mut p = Playback::new(1.0);
        p.play();
        p.advance(0.55);
        assert_eq!(p.frame_at(10.0, 10), 5);
        assert_eq!(p.frame_at(10.0, 4), 1);
        assert_eq!(p.frame_at(10.0, 0), 0);
    }
}
