// @file color.rs
// @brief value -> color mapping for heatmap cells

use crate::matrix::{is_empty, is_nodata};
use anyhow::{Result, anyhow};
use hex_color::HexColor;
use plotters::prelude::RGBColor;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTRAST: f64 = 3.0;

/// Parses `#RRGGBB`, `#RGB` or `0xRRGGBB`.
pub fn parse_color(text: &str) -> Result<RGBColor> {
    let text = text.trim();
    let normalized = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(rest) => format!("#{rest}"),
        None if !text.starts_with('#') => format!("#{text}"),
        None => text.to_string(),
    };
    let c = HexColor::parse(&normalized).map_err(|e| anyhow!("invalid color {text:?}: {e}"))?;
    Ok(RGBColor(c.r, c.g, c.b))
}

pub fn encode_color(c: &RGBColor) -> String {
    format!("#{:02X}{:02X}{:02X}", c.0, c.1, c.2)
}

/// Opaque packed ARGB, the pixel format of `PixelBuffer`.
pub fn pack_argb(c: &RGBColor) -> u32 {
    0xFF00_0000 | (c.0 as u32) << 16 | (c.1 as u32) << 8 | c.2 as u32
}

pub fn unpack_argb(argb: u32) -> RGBColor {
    RGBColor((argb >> 16) as u8, (argb >> 8) as u8, argb as u8)
}

pub(crate) mod hex {
    use plotters::prelude::RGBColor;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(c: &RGBColor, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::encode_color(c))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<RGBColor, D::Error> {
        let text = String::deserialize(d)?;
        super::parse_color(&text).map_err(serde::de::Error::custom)
    }
}

/// Named palette for positive, zero and negative values plus the two sentinels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorSet {
    pub name: String,
    #[serde(with = "hex")]
    pub up: RGBColor,
    #[serde(with = "hex")]
    pub zero: RGBColor,
    #[serde(with = "hex")]
    pub down: RGBColor,
    #[serde(with = "hex")]
    pub missing: RGBColor,
    #[serde(with = "hex")]
    pub empty: RGBColor,
}

impl ColorSet {
    pub fn red_green() -> ColorSet {
        ColorSet {
            name: "RedGreen".to_string(),
            up: RGBColor(0xFF, 0x00, 0x00),
            zero: RGBColor(0x00, 0x00, 0x00),
            down: RGBColor(0x00, 0xFF, 0x00),
            missing: RGBColor(0x8E, 0x8E, 0x8E),
            empty: RGBColor(0xFF, 0xFF, 0xFF),
        }
    }

    pub fn yellow_blue() -> ColorSet {
        ColorSet {
            name: "YellowBlue".to_string(),
            up: RGBColor(0xFE, 0xFF, 0x00),
            zero: RGBColor(0x00, 0x00, 0x00),
            down: RGBColor(0x1B, 0xB7, 0xE5),
            missing: RGBColor(0x8E, 0x8E, 0x8E),
            empty: RGBColor(0xFF, 0xFF, 0xFF),
        }
    }

    pub fn preset(name: &str) -> Option<ColorSet> {
        [ColorSet::red_green(), ColorSet::yellow_blue()]
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

impl Default for ColorSet {
    fn default() -> Self {
        ColorSet::red_green()
    }
}

pub trait ColorExtractor {
    fn color(&self, value: f64) -> RGBColor;

    fn argb(&self, value: f64) -> u32 {
        pack_argb(&self.color(value))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct LogScale {
    center: f64,
    base_ln: f64,
}

/// Linear ramp `zero -> up` above `center` and `zero -> down` below it, saturating at
/// `center +- contrast`.
#[derive(Clone, Debug, PartialEq)]
pub struct ContrastColorExtractor {
    colors: ColorSet,
    contrast: f64,
    center: f64,
    log: Option<LogScale>,
}

impl Default for ContrastColorExtractor {
    fn default() -> Self {
        ContrastColorExtractor::new(ColorSet::default())
    }
}

impl ContrastColorExtractor {
    pub fn new(colors: ColorSet) -> ContrastColorExtractor {
        ContrastColorExtractor {
            colors,
            contrast: DEFAULT_CONTRAST,
            center: 0.0,
            log: None,
        }
    }

    pub fn colors(&self) -> &ColorSet {
        &self.colors
    }

    pub fn set_colors(&mut self, colors: ColorSet) {
        self.colors = colors;
    }

    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    pub fn set_contrast(&mut self, contrast: f64) {
        if contrast > 0.0 && contrast.is_finite() {
            self.contrast = contrast;
        } else {
            log::warn!("ignoring contrast {contrast}; it must be positive");
        }
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn set_center(&mut self, center: f64) {
        self.center = center;
    }

    /// Maps values through `log(v / center) / ln(base)` before coloring.
    pub fn set_log_transform(&mut self, center: f64, base: f64) {
        self.log = Some(LogScale {
            center,
            base_ln: base.ln(),
        });
    }

    pub fn clear_log_transform(&mut self) {
        self.log = None;
    }

    pub fn has_log_transform(&self) -> bool {
        self.log.is_some()
    }

    fn transform(&self, value: f64) -> f64 {
        match &self.log {
            Some(l) => (value / l.center).ln() / l.base_ln,
            None => value,
        }
    }

    /// Position of `value` on the ramp, in `[-1, 1]`.
    pub fn factor(&self, value: f64) -> f64 {
        ((self.transform(value) - self.center) / self.contrast).clamp(-1.0, 1.0)
    }

    /// Color at ramp position `factor`; -1 is `down`, 0 is `zero`, 1 is `up`.
    pub fn ramp(&self, factor: f64) -> RGBColor {
        let factor = factor.clamp(-1.0, 1.0);
        if factor >= 0.0 {
            blend(&self.colors.zero, &self.colors.up, factor)
        } else {
            blend(&self.colors.zero, &self.colors.down, -factor)
        }
    }
}

fn blend(from: &RGBColor, to: &RGBColor, t: f64) -> RGBColor {
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round().clamp(0.0, 255.0) as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

impl ColorExtractor for ContrastColorExtractor {
    fn color(&self, value: f64) -> RGBColor {
        if is_empty(value) {
            return self.colors.empty;
        }
        if is_nodata(value) {
            return self.colors.missing;
        }
        let factor = self.factor(value);
        if factor.is_nan() {
            // log of a non-positive value
            return self.colors.missing;
        }
        self.ramp(factor)
    }
}
