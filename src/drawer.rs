// @file drawer.rs
// @brief block-averaging rasterizer: matrix region -> ARGB pixel buffer

use crate::color::{ColorExtractor, ContrastColorExtractor};
use crate::matrix::{DataMatrix, EMPTY, NODATA, is_empty, is_nodata};
use crate::transform::Rect;

/// Row-major packed ARGB pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> PixelBuffer {
        PixelBuffer::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, argb: u32) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            pixels: vec![argb; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn set(&mut self, x: usize, y: usize, argb: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y * self.width + x] = argb;
        true
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Fills `[x0, x1) x [y0, y1)`; returns false (and writes nothing) if any corner is outside.
    fn fill_block(&mut self, x0: i32, x1: i32, y0: i32, y1: i32, argb: u32) -> bool {
        if !self.contains(x0, y0) || !self.contains(x1 - 1, y1 - 1) {
            return false;
        }
        for y in y0 as usize..y1 as usize {
            self.pixels[y * self.width + x0 as usize..y * self.width + x1 as usize].fill(argb);
        }
        true
    }
}

/// Splits `len` source cells over `dest_len` pixels starting at `dest_start`, returning
/// `(first_cell, last_cell, pixel_start, pixel_end)` per non-empty pixel block. Cells whose
/// block would be zero pixels wide are merged into the following block.
fn partition(len: i32, dest_start: i32, dest_len: i32) -> Vec<(i32, i32, i32, i32)> {
    let mut blocks = Vec::new();
    let mut next = dest_start;
    let mut first = 0;
    for k in 0..len {
        let start = next;
        next = dest_start + ((dest_len as i64 + k as i64 * dest_len as i64) / len as i64) as i32;
        if next == start {
            continue;
        }
        blocks.push((first, k, start, next));
        first = k + 1;
    }
    blocks
}

#[derive(Clone, Debug)]
pub struct DoubleArrayDrawer {
    matrix: DataMatrix,
    extractor: ContrastColorExtractor,
    changed: bool,
}

impl DoubleArrayDrawer {
    pub fn new(matrix: DataMatrix, extractor: ContrastColorExtractor) -> DoubleArrayDrawer {
        DoubleArrayDrawer {
            matrix,
            extractor,
            changed: true,
        }
    }

    pub fn matrix(&self) -> &DataMatrix {
        &self.matrix
    }

    pub fn set_matrix(&mut self, matrix: DataMatrix) {
        self.matrix = matrix;
        self.changed = true;
    }

    pub fn extractor(&self) -> &ContrastColorExtractor {
        &self.extractor
    }

    pub fn set_extractor(&mut self, extractor: ContrastColorExtractor) {
        self.extractor = extractor;
        self.changed = true;
    }

    pub fn set_contrast(&mut self, contrast: f64) {
        self.extractor.set_contrast(contrast);
        self.changed = true;
    }

    /// Sets the contrast to four times the mean absolute value of the valid cells.
    pub fn recalculate_contrast(&mut self) {
        match self.matrix.abs_mean() {
            Some(mean) if mean > 0.0 => {
                self.set_contrast(4.0 * mean);
                log::debug!("contrast set to {}", self.extractor.contrast());
            }
            _ => log::debug!("no valid cells, contrast stays at {}", self.extractor.contrast()),
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn n_row(&self) -> usize {
        self.matrix.n_row()
    }

    pub fn n_col(&self) -> usize {
        self.matrix.n_col()
    }

    /// Cell value at column `x`, row `y`; NODATA outside the matrix.
    pub fn value(&self, x: usize, y: usize) -> f64 {
        self.matrix.get(y, x).unwrap_or(NODATA)
    }

    pub fn is_missing(&self, x: usize, y: usize) -> bool {
        is_nodata(self.value(x, y))
    }

    pub fn is_empty(&self, x: usize, y: usize) -> bool {
        is_empty(self.value(x, y))
    }

    pub fn summary(&self, x: usize, y: usize) -> String {
        let v = self.value(x, y);
        if is_nodata(v) {
            "missing".to_string()
        } else if is_empty(v) {
            "empty".to_string()
        } else {
            format!("{v}")
        }
    }

    /// Average of the cells in rows `rows` and columns `cols` of `source`. Any EMPTY cell makes
    /// the block EMPTY; a block without valid cells is NODATA.
    fn block_value(&self, source: &Rect, rows: (i32, i32), cols: (i32, i32), row_order: Option<&[usize]>) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in rows.0..=rows.1 {
            let mut row = (source.y + i) as usize;
            if let Some(order) = row_order {
                row = *order.get(row)?;
            }
            for j in cols.0..=cols.1 {
                let v = self.matrix.get(row, (source.x + j) as usize)?;
                if is_empty(v) {
                    return Some(EMPTY);
                }
                if !is_nodata(v) {
                    sum += v;
                    count += 1;
                }
            }
        }
        Some(if count == 0 { NODATA } else { sum / count as f64 })
    }

    /// Rasterizes the `source` cell rectangle into the `dest` pixel rectangle of `pixels`,
    /// optionally reading rows through `row_order`. Clears the changed flag.
    pub fn paint(&mut self, pixels: &mut PixelBuffer, source: &Rect, dest: &Rect, row_order: Option<&[usize]>) {
        self.paint_with(&self.extractor, pixels, source, dest, row_order);
        self.changed = false;
    }

    /// Same as `paint`, coloring through `extractor` instead of the drawer's own.
    pub fn paint_with<E: ColorExtractor + ?Sized>(
        &self,
        extractor: &E,
        pixels: &mut PixelBuffer,
        source: &Rect,
        dest: &Rect,
        row_order: Option<&[usize]>,
    ) {
        if source.is_empty() || dest.is_empty() {
            log::debug!("nothing to paint: source {source:?}, dest {dest:?}");
            return;
        }
        let row_blocks = partition(source.height, dest.y, dest.height);
        let col_blocks = partition(source.width, dest.x, dest.width);

        let mut skipped = 0usize;
        for &(row_first, row_last, y0, y1) in &row_blocks {
            for &(col_first, col_last, x0, x1) in &col_blocks {
                let Some(value) = self.block_value(source, (row_first, row_last), (col_first, col_last), row_order) else {
                    log::warn!(
                        "cells rows {}..={} cols {}..={} are outside the matrix",
                        source.y + row_first,
                        source.y + row_last,
                        source.x + col_first,
                        source.x + col_last
                    );
                    skipped += 1;
                    continue;
                };
                if !pixels.fill_block(x0, x1, y0, y1, extractor.argb(value)) {
                    log::warn!("pixel block ({x0}, {y0})-({x1}, {y1}) is outside the buffer");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            log::debug!("{skipped} blocks skipped while painting {source:?} -> {dest:?}");
        }
    }
}
