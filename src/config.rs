// @file config.rs
// @brief YAML render configuration

use crate::color::{ColorSet, ContrastColorExtractor};
use crate::map::{DEFAULT_FIXED_SCALE, IndexPixelMap, MapKind};
use crate::tree::{Orientation, TreePainter};
use anyhow::{Context, Result};
use plotters::prelude::{RED, RGBColor};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How one matrix axis is mapped onto pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub kind: MapKind,
    /// pixels per index for fixed maps
    pub scale: f64,
    /// upper bound on the pixels spent on this axis (the full budget of a fill map)
    pub max_pixels: u32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        AxisConfig {
            kind: MapKind::Fixed,
            scale: DEFAULT_FIXED_SCALE,
            max_pixels: 2000,
        }
    }
}

impl AxisConfig {
    /// Pixels given to `n` indexes.
    pub fn available_pixels(&self, n: usize) -> u32 {
        match self.kind {
            MapKind::Fill => self.max_pixels,
            MapKind::Fixed => ((n as f64 * self.scale).round() as u32).min(self.max_pixels),
        }
    }

    pub fn to_map(&self, n: usize) -> IndexPixelMap {
        let mut map = IndexPixelMap::with_kind(self.kind, self.scale);
        map.set_index_range(0, n as i32 - 1);
        map.set_available_pixels(self.available_pixels(n) as i32);
        map
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogTransform {
    pub center: f64,
    pub base: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub colors: ColorSet,
    /// fixed contrast; derived from the data when absent
    pub contrast: Option<f64>,
    pub log_transform: Option<LogTransform>,
    pub rows: AxisConfig,
    pub columns: AxisConfig,
    #[serde(with = "crate::color::hex")]
    pub highlight: RGBColor,
    /// width of the row dendrogram panel
    pub row_tree_size: u32,
    /// height of the column dendrogram panel
    pub col_tree_size: u32,
    pub row_label_size: u32,
    pub col_label_size: u32,
    /// 0 disables labels and color bar text
    pub font_size: u32,
    pub color_bar: bool,
    pub margin: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            colors: ColorSet::default(),
            contrast: None,
            log_transform: None,
            rows: AxisConfig::default(),
            columns: AxisConfig::default(),
            highlight: RED,
            row_tree_size: 150,
            col_tree_size: 100,
            row_label_size: 150,
            col_label_size: 100,
            font_size: 12,
            color_bar: true,
            margin: 20,
        }
    }
}

impl RenderConfig {
    pub fn load(path: &Path) -> Result<RenderConfig> {
        let file = std::fs::File::open(path).with_context(|| format!("failed to open config {}", path.display()))?;
        let config = serde_yaml::from_reader(file).with_context(|| format!("failed to parse config {}", path.display()))?;
        log::debug!("config: {config:?}");
        Ok(config)
    }

    pub fn color_extractor(&self) -> ContrastColorExtractor {
        let mut ex = ContrastColorExtractor::new(self.colors.clone());
        if let Some(contrast) = self.contrast {
            ex.set_contrast(contrast);
        }
        if let Some(log) = &self.log_transform {
            ex.set_log_transform(log.center, log.base);
        }
        ex
    }

    pub fn tree_painter(&self, orientation: Orientation) -> TreePainter {
        TreePainter::new(orientation).with_highlight(self.highlight)
    }
}
