// @file map.rs
// @brief index <-> pixel maps (fill and fixed scale)

use serde::{Deserialize, Serialize};

pub const DEFAULT_FIXED_SCALE: f64 = 10.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    Fill,
    Fixed,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ScalePolicy {
    /// stretch the index range over all available pixels
    Fill,
    /// every index takes `scale` pixels, regardless of the available space
    Fixed { scale: f64 },
}

/// Maps the contiguous index range `[min_index, max_index]` onto pixels `[0, available_pixels)`.
///
/// A freshly created map has no range (`min_index == max_index == -1`) and no pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IndexPixelMap {
    policy: ScalePolicy,
    available_pixels: i32,
    min_index: i32,
    max_index: i32,
}

impl Default for IndexPixelMap {
    fn default() -> Self {
        IndexPixelMap::fixed(DEFAULT_FIXED_SCALE)
    }
}

impl IndexPixelMap {
    pub fn fill() -> IndexPixelMap {
        IndexPixelMap::with_policy(ScalePolicy::Fill)
    }

    pub fn fixed(scale: f64) -> IndexPixelMap {
        IndexPixelMap::with_policy(ScalePolicy::Fixed { scale })
    }

    pub fn with_kind(kind: MapKind, scale: f64) -> IndexPixelMap {
        match kind {
            MapKind::Fill => IndexPixelMap::fill(),
            MapKind::Fixed => IndexPixelMap::fixed(scale),
        }
    }

    fn with_policy(policy: ScalePolicy) -> IndexPixelMap {
        IndexPixelMap {
            policy,
            available_pixels: 0,
            min_index: -1,
            max_index: -1,
        }
    }

    pub fn kind(&self) -> MapKind {
        match self.policy {
            ScalePolicy::Fill => MapKind::Fill,
            ScalePolicy::Fixed { .. } => MapKind::Fixed,
        }
    }

    pub fn policy(&self) -> ScalePolicy {
        self.policy
    }

    pub fn set_index_range(&mut self, min_index: i32, max_index: i32) {
        self.min_index = min_index;
        self.max_index = max_index;
    }

    pub fn set_available_pixels(&mut self, pixels: i32) {
        self.available_pixels = pixels;
    }

    /// Only meaningful for fixed maps; a fill map derives its scale from the pixel count.
    pub fn set_scale(&mut self, scale: f64) {
        match &mut self.policy {
            ScalePolicy::Fixed { scale: s } => *s = scale,
            ScalePolicy::Fill => log::debug!("ignoring set_scale({scale}) on a fill map"),
        }
    }

    pub fn available_pixels(&self) -> i32 {
        self.available_pixels
    }

    pub fn min_index(&self) -> i32 {
        self.min_index
    }

    pub fn max_index(&self) -> i32 {
        self.max_index
    }

    pub fn has_range(&self) -> bool {
        self.min_index != -1
    }

    pub fn contains(&self, i: i32) -> bool {
        self.min_index <= i && i <= self.max_index
    }

    fn index_count(&self) -> i64 {
        self.max_index as i64 - self.min_index as i64 + 1
    }

    /// Average number of pixels per index.
    pub fn scale(&self) -> f64 {
        match self.policy {
            ScalePolicy::Fill => {
                let n = self.index_count();
                if n <= 0 { 0.0 } else { self.available_pixels as f64 / n as f64 }
            }
            ScalePolicy::Fixed { scale } => scale,
        }
    }

    pub fn get_index(&self, pixel: i32) -> i32 {
        match self.policy {
            ScalePolicy::Fill => {
                if self.available_pixels == 0 {
                    return 0;
                }
                let n = self.index_count();
                ((pixel as i64 * n).div_euclid(self.available_pixels as i64) + self.min_index as i64) as i32
            }
            ScalePolicy::Fixed { scale } => {
                let steps = pixel as f64 / scale;
                let index = steps + self.min_index as f64;
                let rounded = steps.round() + self.min_index as f64;

                // scale values with long fractions land just below the integer they should hit
                if rounded > 0.0 && index / rounded > 1.0 - 1e-6 {
                    return rounded as i32;
                }
                index.floor() as i32
            }
        }
    }

    /// First pixel of index `i`; `max_index + 1` gives the first pixel past the end.
    pub fn get_pixel(&self, i: i32) -> i32 {
        let offset = i as i64 - self.min_index as i64;
        match self.policy {
            ScalePolicy::Fill => {
                let n = self.index_count();
                if n <= 0 {
                    return 0;
                }
                (offset * self.available_pixels as i64).div_euclid(n) as i32
            }
            ScalePolicy::Fixed { scale } => (offset as f64 * scale).floor() as i32,
        }
    }

    /// Pixel for a fractional index. An integer index sits at the middle of its block and
    /// `i + 0.5` at the boundary with the next block, so `get_pixel(i) == get_pixel_frac(i - 0.5)`.
    pub fn get_pixel_frac(&self, index: f64) -> i32 {
        let base = index.round_ties_even();
        let residual = index - base + 0.5;
        let base = base as i32;
        let lo = self.get_pixel(base) as f64;
        let hi = self.get_pixel(base + 1) as f64;
        (lo * (1.0 - residual) + residual * hi) as i32
    }

    pub fn required_pixels(&self) -> i32 {
        (self.index_count() as f64 * self.scale()) as i32
    }

    /// Number of indexes that fit into the available pixels.
    pub fn viewable_indexes(&self) -> i32 {
        match self.policy {
            ScalePolicy::Fill => self.index_count().max(0) as i32,
            ScalePolicy::Fixed { scale } => (self.available_pixels as f64 / scale).round() as i32,
        }
    }

    /// How many of the available pixels are actually covered by indexes.
    pub fn used_pixels(&self) -> i32 {
        if !self.has_range() {
            return 0;
        }
        match self.policy {
            ScalePolicy::Fill => self.available_pixels,
            ScalePolicy::Fixed { scale } => {
                let required = (self.index_count() as f64 * scale).round() as i32;
                let steps = (self.available_pixels as f64 / scale).floor();
                let budget = ((steps * scale).floor() as i32).min(self.available_pixels);
                required.min(budget).max(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn fill(min: i32, max: i32, pixels: i32) -> IndexPixelMap {
        let mut map = IndexPixelMap::fill();
        map.set_index_range(min, max);
        map.set_available_pixels(pixels);
        map
    }

    fn fixed(min: i32, max: i32, pixels: i32, scale: f64) -> IndexPixelMap {
        let mut map = IndexPixelMap::fixed(scale);
        map.set_index_range(min, max);
        map.set_available_pixels(pixels);
        map
    }

    #[test]
    fn test_fill_basic() {
        let map = fill(0, 9, 100);
        assert_eq!(map.scale(), 10.0);
        assert_eq!(map.get_pixel(0), 0);
        assert_eq!(map.get_pixel(3), 30);
        assert_eq!(map.get_pixel(10), 100);
        assert_eq!(map.get_index(0), 0);
        assert_eq!(map.get_index(29), 2);
        assert_eq!(map.get_index(30), 3);
        assert_eq!(map.used_pixels(), 100);
    }

    #[test]
    fn test_fill_offset_range() {
        let map = fill(5, 14, 50);
        assert_eq!(map.get_pixel(5), 0);
        assert_eq!(map.get_pixel(6), 5);
        assert_eq!(map.get_index(7), 6);
        assert!(map.contains(5) && map.contains(14));
        assert!(!map.contains(4) && !map.contains(15));
    }

    #[test]
    fn test_fill_no_pixels() {
        let map = fill(0, 9, 0);
        assert_eq!(map.get_index(17), 0);
    }

    #[test]
    fn test_fill_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let min = rng.random_range(0..50);
            let max = min + rng.random_range(0..200);
            let n = max - min + 1;
            let pixels = n + rng.random_range(0..2000);
            let map = fill(min, max, pixels);
            for i in min..=max {
                let back = map.get_index(map.get_pixel(i));
                assert!((back - i).abs() <= 1, "min={min} max={max} pixels={pixels} i={i} back={back}");
            }
        }
    }

    #[test]
    fn test_fixed_basic() {
        let map = fixed(0, 99, 250, 10.0);
        assert_eq!(map.get_pixel(0), 0);
        assert_eq!(map.get_pixel(7), 70);
        assert_eq!(map.get_index(75), 7);
        assert_eq!(map.viewable_indexes(), 25);
        assert_eq!(map.used_pixels(), 250);
        assert_eq!(map.required_pixels(), 1000);
    }

    #[test]
    fn test_fixed_used_pixels_bounded() {
        // round(15 / 10) would allow 20 pixels
        let map = fixed(0, 9, 15, 10.0);
        assert_eq!(map.used_pixels(), 10);

        let map = fixed(0, 2, 500, 10.0);
        assert_eq!(map.used_pixels(), 30);

        let unset = IndexPixelMap::fixed(10.0);
        assert_eq!(unset.used_pixels(), 0);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let max = rng.random_range(0..300);
            let pixels = rng.random_range(0..1000);
            let scale = rng.random_range(0.1..40.0);
            let map = fixed(0, max, pixels, scale);
            assert!(map.used_pixels() <= pixels, "max={max} pixels={pixels} scale={scale}");
        }
    }

    #[test]
    fn test_fixed_index_snaps_near_integer() {
        // 3 pixels per index expressed with a truncated fraction
        let scale = 100.0 / 33.333_333_3;
        let map = fixed(0, 99, 300, scale);
        assert_eq!(map.get_index(map.get_pixel(33) + 1), 33);
        assert_eq!(map.get_index(300), 100);
    }

    #[test]
    fn test_fractional_pixel_block_boundary() {
        for map in [fill(0, 9, 100), fixed(0, 9, 100, 7.0), fill(0, 6, 50)] {
            for i in 1..9 {
                assert_eq!(map.get_pixel(i), map.get_pixel_frac(i as f64 - 0.5), "{map:?} i={i}");
            }
            // integer index sits in the middle of its block
            let mid = map.get_pixel_frac(3.0);
            assert!(mid >= map.get_pixel(3) && mid <= map.get_pixel(4));
        }
    }

    #[test]
    fn test_set_scale() {
        let mut map = fixed(0, 9, 100, 10.0);
        map.set_scale(4.0);
        assert_eq!(map.scale(), 4.0);
        assert_eq!(map.get_pixel(2), 8);

        let mut map = fill(0, 9, 100);
        map.set_scale(4.0);
        assert_eq!(map.scale(), 10.0);
    }
}
