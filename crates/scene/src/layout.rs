//! Fixed N×N grid shared by the squares, points and lines layers.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Square grid of `size`×`size` cells, `cell_size` world units apart,
/// centered on the origin with row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    size: usize,
    cell_size: f32,
}

impl GridLayout {
    /// # Panics
    ///
    /// On a zero `size` or a non-positive `cell_size`. Configs are checked
    /// by [`crate::SceneConfig::validate`] before they reach here.
    pub fn new(size: usize, cell_size: f32) -> Self {
        assert!(size > 0, "grid size must be positive");
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self { size, cell_size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn instance_count(&self) -> usize {
        self.size * self.size
    }

    /// Distance from the origin to the outermost cell centers.
    pub fn half_span(&self) -> f32 {
        0.5 * self.cell_size * (self.size as f32 - 1.0)
    }

    /// Distance from the origin to the outer cell edges.
    pub fn extent(&self) -> f32 {
        0.5 * self.cell_size * self.size as f32
    }

    /// All `(row, col)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let n = self.size;
        (0..n).flat_map(move |row| (0..n).map(move |col| (row, col)))
    }

    /// Center of a cell. Rows grow downward.
    pub fn cell_center(&self, row: usize, col: usize) -> Vec3 {
        let c = self.cell_size;
        let h = self.half_span();
        Vec3::new(c * col as f32 - h, -(c * row as f32 - h), 0.0)
    }

    /// Upper-left corner of a cell, where the particle for that cell sits.
    pub fn cell_corner(&self, row: usize, col: usize) -> Vec3 {
        let half = 0.5 * self.cell_size;
        self.cell_center(row, col) + Vec3::new(-half, half, 0.0)
    }

    /// Offsets of the overlay lines: one per row/column, on the cell edges.
    pub fn line_offsets(&self) -> impl Iterator<Item = f32> + use<> {
        let c = self.cell_size;
        let e = self.extent();
        (0..self.size).map(move |i| c * i as f32 - e)
    }

    /// Horizontal and vertical overlay segments, interleaved per offset.
    pub fn line_segments(&self) -> Vec<[Vec3; 2]> {
        let r = self.extent();
        let l = -r;
        let mut segments = Vec::with_capacity(self.size * 2);
        for d in self.line_offsets() {
            segments.push([Vec3::new(l, d, 0.0), Vec3::new(r, d, 0.0)]);
            segments.push([Vec3::new(d, l, 0.0), Vec3::new(d, r, 0.0)]);
        }
        segments
    }

    /// The cell containing a point in grid-local coordinates, if any.
    pub fn cell_at(&self, local: Vec2) -> Option<(usize, usize)> {
        let c = self.cell_size;
        let h = self.half_span();
        let col = ((local.x + h) / c).round();
        let row = ((h - local.y) / c).round();
        let n = self.size as f32;
        if !(0.0..n).contains(&col) || !(0.0..n).contains(&row) {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        let center = self.cell_center(row, col);
        let inside = (local.x - center.x).abs() <= 0.5 * c && (local.y - center.y).abs() <= 0.5 * c;
        inside.then_some((row, col))
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(40, 0.08)
    }
}

/// Deterministic splitmix64 stream.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn default_grid_spans_symmetric_extremes() {
        let g = GridLayout::default();
        assert_eq!(g.instance_count(), 1600);
        let first = g.cell_center(0, 0);
        let last = g.cell_center(39, 39);
        let bound = 40.0 * 0.08 * 0.5 - 0.5 * 0.08;
        assert!(close(bound, 1.56));
        assert!(close(first.x, -bound) && close(first.y, bound), "{first}");
        assert!(close(last.x, bound) && close(last.y, -bound), "{last}");
    }

    #[test]
    fn positions_sum_to_origin() {
        for (n, c) in [(40, 0.08), (7, 0.3), (1, 1.0), (2, 0.5)] {
            let g = GridLayout::new(n, c);
            let sum: Vec3 = g.cells().map(|(r, c)| g.cell_center(r, c)).sum();
            assert_eq!(g.cells().count(), n * n);
            assert!(sum.length() < 1e-3, "n={n}: {sum}");
        }
    }

    #[test]
    fn rows_grow_downward() {
        let g = GridLayout::new(4, 1.0);
        assert!(g.cell_center(1, 0).y < g.cell_center(0, 0).y);
        assert!(g.cell_center(0, 1).x > g.cell_center(0, 0).x);
    }

    #[test]
    fn corners_sit_half_a_cell_up_and_left() {
        let g = GridLayout::new(40, 0.08);
        let corner = g.cell_corner(0, 0);
        assert!(close(corner.x, -1.6) && close(corner.y, 1.6));
        let corner = g.cell_corner(39, 39);
        assert!(close(corner.x, 1.52) && close(corner.y, -1.52));
    }

    #[test]
    fn lines_cover_the_grid_box() {
        let g = GridLayout::new(40, 0.08);
        let segments = g.line_segments();
        assert_eq!(segments.len(), 80);
        let [a, b] = segments[0];
        assert!(close(a.x, -1.6) && close(b.x, 1.6));
        assert!(close(a.y, -1.6) && close(b.y, -1.6));
        let [a, b] = segments[1];
        assert!(close(a.x, -1.6) && close(a.y, -1.6) && close(b.y, 1.6));
    }

    #[test]
    fn cell_lookup_matches_centers() {
        let g = GridLayout::new(40, 0.08);
        for (r, c) in [(0, 0), (12, 31), (39, 39)] {
            let p = g.cell_center(r, c);
            assert_eq!(g.cell_at(p.truncate()), Some((r, c)));
            let nudged = p.truncate() + Vec2::new(0.03, -0.03);
            assert_eq!(g.cell_at(nudged), Some((r, c)));
        }
        assert_eq!(g.cell_at(Vec2::new(2.0, 0.0)), None);
        assert_eq!(g.cell_at(Vec2::new(0.0, -1.7)), None);
    }

    #[test]
    fn splitmix_is_deterministic_and_in_range() {
        let mut a = SplitMix64::new(42);
        let mut b = SplitMix64::new(42);
        for _ in 0..1000 {
            let x = a.next_f32();
            assert_eq!(x, b.next_f32());
            assert!((0.0..1.0).contains(&x));
        }
        assert_ne!(SplitMix64::new(1).next_u64(), SplitMix64::new(2).next_u64());
    }
}
