// @file viewport.rs
// @brief scroll / zoom window over an IndexPixelMap

use crate::map::{IndexPixelMap, MapKind};
use crate::transform::LinearTransformation;

const ZOOM_INCREMENT: f64 = 0.05;
const ZOOM_INCREMENT_FAST: f64 = 0.15;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZoomSpeed {
    /// one index on each side
    Slow,
    Normal,
    Fast,
}

/// Visible window `[first_visible, first_visible + num_visible)` of the map's index range.
#[derive(Clone, Debug)]
pub struct Viewport {
    map: IndexPixelMap,
    first_visible: i32,
    num_visible: i32,
}

impl Viewport {
    pub fn new(map: IndexPixelMap) -> Viewport {
        let mut v = Viewport {
            map,
            first_visible: 0,
            num_visible: 0,
        };
        if map.has_range() {
            v.full_zoom_out();
        }
        v
    }

    pub fn map(&self) -> &IndexPixelMap {
        &self.map
    }

    pub fn set_available_pixels(&mut self, pixels: i32) {
        self.map.set_available_pixels(pixels);
    }

    pub fn available_pixels(&self) -> i32 {
        self.map.available_pixels()
    }

    /// Resets the window to the whole range; the bounds may come in either order.
    pub fn set_index_range(&mut self, min: i32, max: i32) {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        self.map.set_index_range(min, max);
        self.first_visible = min;
        self.num_visible = self.total_tiles();
    }

    pub fn total_tiles(&self) -> i32 {
        if !self.map.has_range() {
            return 0;
        }
        self.map.max_index() - self.map.min_index() + 1
    }

    pub fn first_visible(&self) -> i32 {
        self.first_visible
    }

    pub fn num_visible(&self) -> i32 {
        self.num_visible
    }

    pub fn last_visible(&self) -> i32 {
        self.first_visible + self.num_visible - 1
    }

    pub fn shows_all(&self) -> bool {
        self.num_visible == self.total_tiles()
    }

    pub fn is_visible(&self, i: i32) -> bool {
        self.first_visible <= i && i <= self.last_visible()
    }

    /// Pixels per index on screen.
    pub fn scale(&self) -> f64 {
        match self.map.kind() {
            MapKind::Fill if self.num_visible > 0 => self.map.available_pixels() as f64 / self.num_visible as f64,
            MapKind::Fill => 0.0,
            MapKind::Fixed => self.map.scale(),
        }
    }

    /// Pixels actually covered by the visible window.
    pub fn used_pixels(&self) -> i32 {
        let used = (self.num_visible as f64 * self.scale()).floor() as i32;
        used.min(self.map.available_pixels()).max(0)
    }

    /// Index -> pixel for the visible window, the window starting at pixel `dest_start`.
    pub fn index_transformation(&self, dest_start: i32) -> LinearTransformation {
        let scale = self.scale();
        LinearTransformation::new(scale, dest_start as f64 - self.first_visible as f64 * scale)
    }

    pub fn get_pixel(&self, i: i32) -> i32 {
        ((i - self.first_visible) as f64 * self.scale()).floor() as i32
    }

    pub fn get_index(&self, pixel: i32) -> i32 {
        let scale = self.scale();
        if scale <= 0.0 {
            return self.first_visible;
        }
        self.first_visible + (pixel as f64 / scale).floor() as i32
    }

    fn set_num_visible(&mut self, n: i32) {
        self.num_visible = n.clamp(1.min(self.total_tiles()), self.total_tiles());
    }

    /// Keeps `[first, first + num)` inside the index range.
    fn clamp_first(&mut self, first: i32) {
        let lo = self.map.min_index();
        let hi = (self.map.max_index() + 1 - self.num_visible).max(lo);
        self.first_visible = first.clamp(lo, hi);
    }

    fn update_scale(&mut self) {
        let available = self.map.available_pixels() as f64;
        if self.map.kind() != MapKind::Fixed || available <= 0.0 || self.num_visible <= 0 {
            return;
        }
        let min_scale = available / self.total_tiles() as f64;
        let scale = (available / self.num_visible as f64).clamp(min_scale, available);
        self.map.set_scale(scale);
    }

    pub fn scroll_to_first_index(&mut self, i: i32) {
        if !self.map.contains(i) {
            log::debug!("cannot scroll to first index {i}, outside {}..={}", self.map.min_index(), self.map.max_index());
            return;
        }
        self.clamp_first(i);
    }

    /// Centers the window on `i`.
    pub fn scroll_to_index(&mut self, i: i32) {
        self.clamp_first(i - self.num_visible / 2);
    }

    pub fn scroll_by(&mut self, delta: i32) {
        if self.shows_all() {
            return;
        }
        self.clamp_first(self.first_visible + delta);
    }

    fn zoom_step(&self, speed: ZoomSpeed) -> i32 {
        let step = match speed {
            ZoomSpeed::Slow => 2,
            ZoomSpeed::Normal => (ZOOM_INCREMENT * self.num_visible as f64).round() as i32,
            ZoomSpeed::Fast => (ZOOM_INCREMENT_FAST * self.num_visible as f64).round() as i32,
        };
        step.max(2)
    }

    /// Shows fewer indexes around the current center.
    pub fn zoom_in_center(&mut self, speed: ZoomSpeed) {
        let prev = self.num_visible;
        self.set_num_visible(prev - self.zoom_step(speed));
        // an even change keeps the center in place
        if (prev - self.num_visible) % 2 == 1 && self.num_visible > 1 {
            self.set_num_visible(self.num_visible - 1);
        }
        self.update_scale();
        self.clamp_first(self.first_visible + (prev - self.num_visible) / 2);
    }

    /// Shows more indexes around the current center.
    pub fn zoom_out_center(&mut self, speed: ZoomSpeed) {
        let prev = self.num_visible;
        self.set_num_visible(prev + self.zoom_step(speed));
        self.update_scale();
        self.clamp_first(self.first_visible - (self.num_visible - prev) / 2);
    }

    /// Shows exactly `[min, max]`.
    pub fn zoom_to_selected(&mut self, min: i32, max: i32) {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        self.set_num_visible(max - min + 1);
        self.update_scale();
        self.clamp_first(min);
    }

    pub fn full_zoom_out(&mut self) {
        self.zoom_to_selected(self.map.min_index(), self.map.max_index());
    }
}
