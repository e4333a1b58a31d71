//! Aspect-ratio fitting for the background plane.

use glam::Vec2;

/// Per-axis UV scale that makes a video cover a viewport without distortion.
///
/// Both factors lie in `(0, 1]`; the axis that would overflow is shrunk and
/// the other stays at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub a1: f32,
    pub a2: f32,
}

impl CoverFit {
    pub const IDENTITY: Self = Self { a1: 1.0, a2: 1.0 };

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.a1, self.a2)
    }
}

/// Cover-fit factors for a `video_w`×`video_h` clip shown in a
/// `view_w`×`view_h` viewport. Returns `None` if any dimension is zero.
pub fn cover_fit(view_w: u32, view_h: u32, video_w: u32, video_h: u32) -> Option<CoverFit> {
    if view_w == 0 || view_h == 0 || video_w == 0 || video_h == 0 {
        return None;
    }
    let video_aspect = video_h as f32 / video_w as f32;
    let aspect = view_h as f32 / view_w as f32;
    let fit = if aspect > video_aspect {
        CoverFit {
            a1: video_aspect / aspect,
            a2: 1.0,
        }
    } else {
        CoverFit {
            a1: 1.0,
            a2: aspect / video_aspect,
        }
    };
    Some(fit)
}

/// Scale of the unit plane so it spans the frustum for width/height `aspect`.
pub fn plane_scale(aspect: f32) -> Vec2 {
    if aspect > 1.0 {
        Vec2::new(aspect, 1.0)
    } else {
        Vec2::new(1.0, 1.0 / aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_scale_wide_and_tall() {
        assert_eq!(plane_scale(2.0), Vec2::new(2.0, 1.0));
        assert_eq!(plane_scale(0.5), Vec2::new(1.0, 2.0));
        assert_eq!(plane_scale(1.0), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn plane_scale_rule_holds_across_aspects() {
        for i in 1..200 {
            let a = i as f32 * 0.025;
            let s = plane_scale(a);
            if a > 1.0 {
                assert_eq!((s.x, s.y), (a, 1.0));
            } else {
                assert_eq!((s.x, s.y), (1.0, 1.0 / a));
            }
        }
    }

    #[test]
    fn wide_viewport_crops_video_vertically() {
        // 16:9 video in a 21:9 window: the video is taller than the window.
        let fit = cover_fit(2100, 900, 1600, 900).unwrap();
        assert_eq!(fit.a1, 1.0);
        assert!(fit.a2 < 1.0);
        let expected = (900.0 / 2100.0) / (900.0 / 1600.0);
        assert!((fit.a2 - expected).abs() < 1e-6);
    }

    #[test]
    fn tall_viewport_crops_video_horizontally() {
        let fit = cover_fit(1080, 1920, 1920, 1080).unwrap();
        assert_eq!(fit.a2, 1.0);
        let expected = (1080.0 / 1920.0) / (1920.0 / 1080.0);
        assert!((fit.a1 - expected).abs() < 1e-6);
    }

    #[test]
    fn cover_fit_invariant_over_grid() {
        let sizes = [1u32, 90, 360, 640, 720, 1080, 1280, 1920, 2560, 4096];
        for &vw in &sizes {
            for &vh in &sizes {
                for &cw in &sizes {
                    for &ch in &sizes {
                        let fit = cover_fit(vw, vh, cw, ch).unwrap();
                        assert!(fit.a1 > 0.0 && fit.a1 <= 1.0, "{vw}x{vh} {cw}x{ch}: {fit:?}");
                        assert!(fit.a2 > 0.0 && fit.a2 <= 1.0, "{vw}x{vh} {cw}x{ch}: {fit:?}");
                        let ones = [fit.a1, fit.a2].iter().filter(|&&a| a == 1.0).count();
                        let same_aspect = (vh as u64 * cw as u64) == (ch as u64 * vw as u64);
                        if same_aspect {
                            assert!(ones >= 1);
                        } else {
                            assert_eq!(ones, 1, "{vw}x{vh} {cw}x{ch}: {fit:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(cover_fit(0, 100, 10, 10).is_none());
        assert!(cover_fit(100, 100, 10, 0).is_none());
    }
}
