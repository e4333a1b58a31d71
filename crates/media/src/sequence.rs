use crate::source::{MediaEvent, Playback, VideoFrame, VideoSource};
use crate::MediaError;
use backdrop_common::{ReadyState, VideoInfo};
use image::{ImageReader, RgbaImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Frames kept decoded at once unless [`FrameSequence::with_decode_window`]
/// says otherwise.
pub const DEFAULT_DECODE_WINDOW: usize = 8;

struct DecodedFrame {
    index: usize,
    image: RgbaImage,
}

/// A video stored as a directory of numbered image frames.
///
/// At most a window of frames is resident. Loading decodes the first window
/// one frame per [`VideoSource::poll`], so it never stalls a rendered frame
/// for long, and the clip becomes playable once that window is in. From
/// then on each poll decodes the frame at the play position or the next
/// missing one ahead of it, evicting the frames furthest behind.
pub struct FrameSequence {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    window: usize,
    frames: VecDeque<DecodedFrame>,
    /// Last frame made current by a poll; shown while the wanted one decodes.
    current: Option<usize>,
    fps: f32,
    width: u32,
    height: u32,
    ready_state: ReadyState,
    playback: Playback,
    failed: bool,
}

impl FrameSequence {
    /// List the frames in `dir`. Nothing is decoded yet.
    pub fn open(dir: impl AsRef<Path>, fps: f32) -> Result<Self, MediaError> {
        if fps.is_nan() || fps <= 0.0 {
            return Err(MediaError::InvalidFps(fps));
        }
        let dir = dir.as_ref().to_path_buf();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_frame(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(MediaError::EmptySequence(dir));
        }

        tracing::info!(dir = %dir.display(), frames = paths.len(), fps, "opened frame sequence");
        let duration = paths.len() as f32 / fps;
        Ok(Self {
            dir,
            paths,
            window: DEFAULT_DECODE_WINDOW,
            frames: VecDeque::with_capacity(DEFAULT_DECODE_WINDOW + 1),
            current: None,
            fps,
            width: 0,
            height: 0,
            ready_state: ReadyState::HaveNothing,
            playback: Playback::new(duration),
            failed: false,
        })
    }

    /// Keep at most `frames` decoded frames resident (at least one).
    pub fn with_decode_window(mut self, frames: usize) -> Self {
        self.window = frames.max(1);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.paths.len()
    }

    /// Frames currently held in memory.
    pub fn decoded_count(&self) -> usize {
        self.frames.len()
    }

    pub fn duration(&self) -> f32 {
        self.playback.duration()
    }

    /// Frames that must be resident before the clip can play.
    fn preload_len(&self) -> usize {
        self.window.min(self.paths.len())
    }

    fn cached(&self, index: usize) -> Option<&DecodedFrame> {
        self.frames.iter().find(|f| f.index == index)
    }

    fn load_metadata(&mut self) -> Result<(), MediaError> {
        let first = &self.paths[0];
        let (width, height) = ImageReader::open(first)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|source| MediaError::Decode {
                path: first.clone(),
                source,
            })?;
        self.width = width;
        self.height = height;
        self.ready_state = ReadyState::HaveMetadata;
        tracing::debug!(width, height, "frame sequence metadata loaded");
        Ok(())
    }

    fn decode(&self, index: usize) -> Result<RgbaImage, MediaError> {
        let path = &self.paths[index];
        let frame = image::open(path)
            .map_err(|source| MediaError::Decode {
                path: path.clone(),
                source,
            })?
            .into_rgba8();
        if frame.dimensions() != (self.width, self.height) {
            return Err(MediaError::FrameSizeMismatch {
                path: path.clone(),
                expected: (self.width, self.height),
                got: frame.dimensions(),
            });
        }
        Ok(frame)
    }

    /// Decode the next frame of the initial window.
    fn preload_next(&mut self) -> Result<(), MediaError> {
        let index = self.frames.len();
        let image = self.decode(index)?;
        self.frames.push_back(DecodedFrame { index, image });
        self.current.get_or_insert(index);

        let decoded = self.frames.len();
        let needed = self.preload_len();
        self.ready_state = if decoded >= needed {
            ReadyState::HaveEnoughData
        } else if decoded * 2 >= needed {
            ReadyState::HaveFutureData
        } else {
            ReadyState::HaveCurrentData
        };
        Ok(())
    }

    /// Make the frame at the play position current, decoding at most one
    /// frame: the wanted one if missing, otherwise the next gap ahead of it.
    fn stream(&mut self) -> Result<(), MediaError> {
        let count = self.paths.len();
        let wanted = self.playback.frame_at(self.fps, count);
        let missing = (0..self.preload_len())
            .map(|ahead| (wanted + ahead) % count)
            .find(|&index| self.cached(index).is_none());
        if let Some(index) = missing {
            let image = self.decode(index)?;
            self.frames.push_back(DecodedFrame { index, image });
            self.evict(wanted);
        }
        if self.cached(wanted).is_some() {
            self.current = Some(wanted);
        }
        Ok(())
    }

    /// Drop the frames furthest behind `wanted` until the window fits.
    fn evict(&mut self, wanted: usize) {
        let count = self.paths.len();
        while self.frames.len() > self.window {
            let behind = |f: &DecodedFrame| (f.index + count - wanted) % count;
            let Some(oldest) = self
                .frames
                .iter()
                .enumerate()
                .max_by_key(|(_, f)| behind(f))
                .map(|(i, _)| i)
            else {
                return;
            };
            self.frames.remove(oldest);
        }
    }

    fn step(&mut self) -> Result<Option<MediaEvent>, MediaError> {
        match self.ready_state {
            ReadyState::HaveNothing => {
                self.load_metadata()?;
                Ok(Some(MediaEvent::LoadedMetadata))
            }
            ReadyState::HaveEnoughData => {
                self.stream()?;
                Ok(None)
            }
            _ => {
                self.preload_next()?;
                if self.ready_state == ReadyState::HaveEnoughData {
                    tracing::info!(dir = %self.dir.display(), "frame sequence can play");
                    Ok(Some(MediaEvent::CanPlay))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

impl VideoSource for FrameSequence {
    fn info(&self) -> VideoInfo {
        VideoInfo {
            ready_state: self.ready_state,
            width: self.width,
            height: self.height,
        }
    }

    fn poll(&mut self) -> Result<Option<MediaEvent>, MediaError> {
        if self.failed {
            return Ok(None);
        }
        self.step().inspect_err(|_| self.failed = true)
    }

    fn play(&mut self) {
        self.playback.play();
    }

    fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    fn advance(&mut self, dt: f32) {
        self.playback.advance(dt);
    }

    fn position(&self) -> f32 {
        self.playback.position()
    }

    fn current_frame(&self) -> Option<VideoFrame<'_>> {
        // Hold on the last current frame until the wanted one is resident.
        let wanted = self.playback.frame_at(self.fps, self.paths.len());
        let frame = self
            .cached(wanted)
            .or_else(|| self.current.and_then(|i| self.cached(i)))?;
        Some(VideoFrame {
            index: frame.index as u64,
            width: self.width,
            height: self.height,
            rgba: frame.image.as_raw(),
        })
    }
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FRAME_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_frames(dir: &Path, count: usize, size: (u32, u32)) {
        for i in 0..count {
            let img = RgbaImage::from_pixel(size.0, size.1, Rgba([i as u8 * 40, 0, 0, 255]));
            img.save(dir.join(format!("frame_{i:04}.png"))).unwrap();
        }
    }

    fn drain(seq: &mut FrameSequence) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        for _ in 0..(seq.frame_count() + 4) {
            if let Some(e) = seq.poll().unwrap() {
                events.push(e);
            }
        }
        events
    }

    #[test]
    fn readiness_climbs_and_announces_once() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3, (8, 4));
        let mut seq = FrameSequence::open(dir.path(), 30.0).unwrap();
        assert_eq!(seq.info().ready_state, ReadyState::HaveNothing);
        assert_eq!(seq.info().width, 0);
        assert!(seq.current_frame().is_none());

        assert_eq!(seq.poll().unwrap(), Some(MediaEvent::LoadedMetadata));
        assert_eq!(seq.info().ready_state, ReadyState::HaveMetadata);
        assert_eq!((seq.info().width, seq.info().height), (8, 4));

        assert_eq!(seq.poll().unwrap(), None);
        assert_eq!(seq.info().ready_state, ReadyState::HaveCurrentData);
        assert!(seq.current_frame().is_some());

        assert_eq!(seq.poll().unwrap(), None);
        assert_eq!(seq.poll().unwrap(), Some(MediaEvent::CanPlay));
        assert!(seq.info().is_fully_available());
        assert_eq!(seq.poll().unwrap(), None);
    }

    #[test]
    fn plays_in_order_and_loops() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 4, (2, 2));
        let mut seq = FrameSequence::open(dir.path(), 4.0).unwrap();
        assert_eq!(drain(&mut seq), vec![MediaEvent::LoadedMetadata, MediaEvent::CanPlay]);

        seq.advance(0.3);
        assert_eq!(seq.current_frame().unwrap().index, 0);
        seq.play();
        seq.advance(0.3);
        assert_eq!(seq.current_frame().unwrap().index, 1);
        seq.advance(0.8);
        assert_eq!(seq.current_frame().unwrap().index, 0);
        assert_eq!(seq.current_frame().unwrap().rgba.len(), 2 * 2 * 4);
    }

    #[test]
    fn long_clips_stay_within_the_decode_window() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 6, (2, 2));
        let mut seq = FrameSequence::open(dir.path(), 4.0)
            .unwrap()
            .with_decode_window(3);

        assert_eq!(seq.poll().unwrap(), Some(MediaEvent::LoadedMetadata));
        assert_eq!(seq.poll().unwrap(), None);
        assert_eq!(seq.poll().unwrap(), None);
        assert_eq!(seq.poll().unwrap(), Some(MediaEvent::CanPlay));
        assert_eq!(seq.decoded_count(), 3);

        seq.play();
        seq.advance(1.0);
        // Frame 4 is not resident yet; frame 0 stays on screen.
        assert_eq!(seq.current_frame().unwrap().index, 0);
        seq.poll().unwrap();
        let frame = seq.current_frame().unwrap();
        assert_eq!(frame.index, 4);
        assert_eq!(frame.rgba[0], 160);
        assert_eq!(seq.decoded_count(), 3);

        for _ in 0..20 {
            seq.advance(0.25);
            seq.poll().unwrap();
            assert!(seq.decoded_count() <= 3);
        }
        // Wrapped past the end: 1.0 + 20 * 0.25 = 6.0s, frame 24 % 6.
        assert_eq!(seq.current_frame().unwrap().index, 0);
    }

    #[test]
    fn ignores_non_frame_files() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 2, (2, 2));
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let seq = FrameSequence::open(dir.path(), 24.0).unwrap();
        assert_eq!(seq.frame_count(), 2);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FrameSequence::open(dir.path(), 24.0).err().unwrap();
        assert!(matches!(err, MediaError::EmptySequence(_)));
    }

    #[test]
    fn rejects_non_positive_fps() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FrameSequence::open(dir.path(), 0.0),
            Err(MediaError::InvalidFps(_))
        ));
    }

    #[test]
    fn mismatched_frame_fails_and_stays_unplayable() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 1, (4, 4));
        RgbaImage::new(2, 2).save(dir.path().join("frame_9999.png")).unwrap();
        let mut seq = FrameSequence::open(dir.path(), 24.0).unwrap();

        seq.poll().unwrap();
        seq.poll().unwrap();
        let err = seq.poll().unwrap_err();
        assert!(matches!(err, MediaError::FrameSizeMismatch { got: (2, 2), .. }));
        assert_eq!(seq.poll().unwrap(), None);
        assert!(!seq.info().is_fully_available());
    }
}
