use crate::source::{MediaEvent, Playback, VideoFrame, VideoSource};
use crate::MediaError;
use backdrop_common::{ReadyState, VideoInfo};

/// Procedural stand-in used when no clip is configured.
///
/// Renders slow diagonal color bands at a fixed resolution. Metadata arrives
/// on the first poll and the source becomes playable on the second, which
/// exercises the same readiness path as a decoded clip.
pub struct TestPattern {
    width: u32,
    height: u32,
    fps: f32,
    ready_state: ReadyState,
    playback: Playback,
    pixels: Vec<u8>,
    rendered: Option<u64>,
}

impl TestPattern {
    pub const LOOP_SECONDS: f32 = 6.0;

    pub fn new(width: u32, height: u32, fps: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            fps: if fps > 0.0 { fps } else { 30.0 },
            ready_state: ReadyState::HaveNothing,
            playback: Playback::new(Self::LOOP_SECONDS),
            pixels: Vec::new(),
            rendered: None,
        }
    }

    fn frame_index(&self) -> u64 {
        let frames = (Self::LOOP_SECONDS * self.fps).round().max(1.0) as usize;
        self.playback.frame_at(self.fps, frames) as u64
    }

    fn render(&mut self) {
        let index = self.frame_index();
        if self.rendered == Some(index) {
            return;
        }
        let phase = index as f32 / self.fps / Self::LOOP_SECONDS;
        let (w, h) = (self.width as usize, self.height as usize);
        self.pixels.resize(w * h * 4, 0);
        for y in 0..h {
            for x in 0..w {
                let u = x as f32 / w as f32;
                let v = y as f32 / h as f32;
                let t = (u + v) * 0.5 + phase;
                let band = |offset: f32| {
                    let s = ((t + offset) * std::f32::consts::TAU).sin() * 0.5 + 0.5;
                    (s * 180.0 + 30.0) as u8
                };
                let i = (y * w + x) * 4;
                self.pixels[i] = band(0.0);
                self.pixels[i + 1] = band(0.33);
                self.pixels[i + 2] = band(0.66);
                self.pixels[i + 3] = 255;
            }
        }
        self.rendered = Some(index);
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new(640, 360, 30.0)
    }
}

impl VideoSource for TestPattern {
    fn info(&self) -> VideoInfo {
        let known = self.ready_state >= ReadyState::HaveMetadata;
        VideoInfo {
            ready_state: self.ready_state,
            width: if known { self.width } else { 0 },
            height: if known { self.height } else { 0 },
        }
    }

    fn poll(&mut self) -> Result<Option<MediaEvent>, MediaError> {
        match self.ready_state {
            ReadyState::HaveNothing => {
                self.ready_state = ReadyState::HaveMetadata;
                Ok(Some(MediaEvent::LoadedMetadata))
            }
            ReadyState::HaveEnoughData => Ok(None),
            _ => {
                self.render();
                self.ready_state = ReadyState::HaveEnoughData;
                tracing::info!(width = self.width, height = self.height, "test pattern can play");
                Ok(Some(MediaEvent::CanPlay))
            }
        }
    }

    fn play(&mut self) {
        self.playback.play();
    }

    fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    fn advance(&mut self, dt: f32) {
        self.playback.advance(dt);
        if self.ready_state == ReadyState::HaveEnoughData {
            self.render();
        }
    }

    fn position(&self) -> f32 {
        self.playback.position()
    }

    fn current_frame(&self) -> Option<VideoFrame<'_>> {
        let index = self.rendered?;
        Some(VideoFrame {
            index,
            width: self.width,
            height: self.height,
            rgba: &self.pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn becomes_playable_on_second_poll() {
        let mut p = TestPattern::new(16, 9, 30.0);
        assert_eq!(p.info().width, 0);
        assert_eq!(p.poll().unwrap(), Some(MediaEvent::LoadedMetadata));
        assert_eq!(p.info().width, 16);
        assert!(p.current_frame().is_none());
        assert_eq!(p.poll().unwrap(), Some(MediaEvent::CanPlay));
        assert_eq!(p.poll().unwrap(), None);
        assert!(p.info().is_fully_available());

        let frame = p.current_frame().unwrap();
        assert_eq!(frame.rgba.len(), 16 * 9 * 4);
        assert!(frame.rgba.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn frames_change_only_while_playing() {
        let mut p = TestPattern::new(4, 4, 10.0);
        p.poll().unwrap();
        p.poll().unwrap();
        let first = p.current_frame().unwrap().index;
        p.advance(0.5);
        assert_eq!(p.current_frame().unwrap().index, first);
        p.play();
        p.advance(0.5);
        assert_eq!(p.current_frame().unwrap().index, 5);
    }
}
