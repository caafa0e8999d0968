// @file layout.rs
// @brief panel layout tree and the drawing areas cut from it

use crate::transform::Rect;
use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// Panel ids of the standard heatmap layout.
pub mod panel {
    pub const COL_TREE: &str = "col_tree";
    pub const COL_LABELS: &str = "col_labels";
    pub const ROW_TREE: &str = "row_tree";
    pub const HEATMAP: &str = "heatmap";
    pub const ROW_LABELS: &str = "row_labels";
    pub const COLOR_BAR: &str = "color_bar";
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMargin {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl LayoutMargin {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> LayoutMargin {
        LayoutMargin { left, right, top, bottom }
    }

    pub fn uniform(margin: u32) -> LayoutMargin {
        LayoutMargin::new(margin, margin, margin, margin)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LayoutElem {
    #[serde(rename = "rect")]
    Rect { id: Option<String>, width: u32, height: u32 },

    #[serde(rename = "horizontal")]
    Horizontal(Vec<LayoutElem>),

    #[serde(rename = "vertical")]
    Vertical(Vec<LayoutElem>),

    #[serde(rename = "margined")]
    Margined { margin: LayoutMargin, center: Box<LayoutElem> },
}

impl LayoutElem {
    /// Anonymous spacer.
    pub fn rect(width: u32, height: u32) -> LayoutElem {
        LayoutElem::Rect { id: None, width, height }
    }

    pub fn rect_with_id(id: &str, width: u32, height: u32) -> LayoutElem {
        LayoutElem::Rect {
            id: Some(id.to_string()),
            width,
            height,
        }
    }

    pub fn get_dim(&self) -> (u32, u32) {
        match self {
            LayoutElem::Rect { width, height, .. } => (*width, *height),
            LayoutElem::Horizontal(inner) => inner
                .iter()
                .map(|x| x.get_dim())
                .fold((0, 0), |acc, (w, h)| (acc.0 + w, acc.1.max(h))),
            LayoutElem::Vertical(inner) => inner
                .iter()
                .map(|x| x.get_dim())
                .fold((0, 0), |acc, (w, h)| (acc.0.max(w), acc.1 + h)),
            LayoutElem::Margined { margin, center } => {
                let (w, h) = center.get_dim();
                (w + margin.left + margin.right, h + margin.top + margin.bottom)
            }
        }
    }

    pub fn get_id(&self) -> Option<&str> {
        match self {
            LayoutElem::Rect { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// Ids of all named rects, in depth-first order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        match self {
            LayoutElem::Rect { id, .. } => ids.extend(id.as_deref()),
            LayoutElem::Horizontal(inner) | LayoutElem::Vertical(inner) => inner.iter().for_each(|x| x.collect_ids(ids)),
            LayoutElem::Margined { center, .. } => center.collect_ids(ids),
        }
    }

    fn locate_at(&self, id: &str, origin: (i32, i32)) -> Option<Rect> {
        match self {
            LayoutElem::Rect { width, height, .. } => {
                if self.get_id() != Some(id) {
                    return None;
                }
                Some(Rect::new(origin.0, origin.1, *width as i32, *height as i32))
            }
            LayoutElem::Horizontal(inner) => {
                let mut x = origin.0;
                for elem in inner {
                    if let Some(rect) = elem.locate_at(id, (x, origin.1)) {
                        return Some(rect);
                    }
                    x += elem.get_dim().0 as i32;
                }
                None
            }
            LayoutElem::Vertical(inner) => {
                let mut y = origin.1;
                for elem in inner {
                    if let Some(rect) = elem.locate_at(id, (origin.0, y)) {
                        return Some(rect);
                    }
                    y += elem.get_dim().1 as i32;
                }
                None
            }
            LayoutElem::Margined { margin, center } => {
                center.locate_at(id, (origin.0 + margin.left as i32, origin.1 + margin.top as i32))
            }
        }
    }

    /// Position of the rect `id` relative to the top-left corner of `self`.
    pub fn locate(&self, id: &str) -> Option<Rect> {
        self.locate_at(id, (0, 0))
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut LayoutElem> {
        match self {
            LayoutElem::Rect { id: rect_id, .. } => {
                if rect_id.as_deref() == Some(id) {
                    Some(self)
                } else {
                    None
                }
            }
            LayoutElem::Horizontal(inner) | LayoutElem::Vertical(inner) => {
                inner.iter_mut().find_map(|inner| inner.get_node_mut(id))
            }
            LayoutElem::Margined { center, .. } => center.get_node_mut(id),
        }
    }

    pub fn set_dim(&mut self, dim: (u32, u32)) -> Result<()> {
        match self {
            LayoutElem::Rect { width, height, .. } => {
                *width = dim.0;
                *height = dim.1;
                Ok(())
            }
            _ => Err(anyhow!("set_dim is only supported for rects")),
        }
    }
}

/// Sizes of the panels around the heatmap; a zero size drops the panel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelSizes {
    pub heatmap: (u32, u32),
    /// width of the row dendrogram, left of the heatmap
    pub row_tree: u32,
    /// height of the column dendrogram, above the column labels
    pub col_tree: u32,
    pub row_labels: u32,
    pub col_labels: u32,
    pub color_bar: u32,
    pub margin: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout(#[serde(with = "serde_yaml::with::singleton_map_recursive")] pub LayoutElem);

impl Layout {
    /// Column tree on top, column labels below it, then the row tree, heatmap and row
    /// labels side by side, and the color bar at the bottom.
    pub fn heatmap(sizes: &PanelSizes) -> Layout {
        let (w, h) = sizes.heatmap;
        let left = sizes.row_tree;
        let rows = vec![
            LayoutElem::Horizontal(vec![
                LayoutElem::rect(left, sizes.col_tree),
                LayoutElem::rect_with_id(panel::COL_TREE, w, sizes.col_tree),
            ]),
            LayoutElem::Horizontal(vec![
                LayoutElem::rect(left, sizes.col_labels),
                LayoutElem::rect_with_id(panel::COL_LABELS, w, sizes.col_labels),
            ]),
            LayoutElem::Horizontal(vec![
                LayoutElem::rect_with_id(panel::ROW_TREE, left, h),
                LayoutElem::rect_with_id(panel::HEATMAP, w, h),
                LayoutElem::rect_with_id(panel::ROW_LABELS, sizes.row_labels, h),
            ]),
            LayoutElem::Horizontal(vec![
                LayoutElem::rect(left, sizes.color_bar),
                LayoutElem::rect_with_id(panel::COLOR_BAR, w, sizes.color_bar),
            ]),
        ];
        Layout(LayoutElem::Margined {
            margin: LayoutMargin::uniform(sizes.margin),
            center: Box::new(LayoutElem::Vertical(rows)),
        })
    }
}

impl Deref for Layout {
    type Target = LayoutElem;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Layout {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Bitmap canvas with one sub-area per named rect of a layout.
pub struct StructuredDrawingArea<'a> {
    root: DrawingArea<BitMapBackend<'a>, Shift>,
    index: HashMap<String, DrawingArea<BitMapBackend<'a>, Shift>>,
}

impl<'a> StructuredDrawingArea<'a> {
    fn from_root(layout: &Layout, root: DrawingArea<BitMapBackend<'a>, Shift>) -> Result<StructuredDrawingArea<'a>> {
        root.fill(&WHITE)?;
        let mut index = HashMap::new();
        for id in layout.ids() {
            if index.contains_key(id) {
                return Err(anyhow!("duplicate layout id: {id}"));
            }
            let Some(r) = layout.locate(id) else {
                continue;
            };
            log::debug!("area {id}: ({}, {}) {}x{}", r.x, r.y, r.width, r.height);
            let area = root.clone().shrink((r.x, r.y), (r.width as u32, r.height as u32));
            index.insert(id.to_string(), area);
        }
        Ok(StructuredDrawingArea { root, index })
    }

    /// Renders into an image file; the format follows the extension.
    pub fn from_layout(layout: &Layout, path: &'a Path) -> Result<StructuredDrawingArea<'a>> {
        let root = BitMapBackend::new(path, layout.get_dim()).into_drawing_area();
        Self::from_root(layout, root)
    }

    /// Renders into an RGB buffer of `width * height * 3` bytes.
    pub fn from_buffer(layout: &Layout, buffer: &'a mut [u8]) -> Result<StructuredDrawingArea<'a>> {
        let (w, h) = layout.get_dim();
        let expected = w as usize * h as usize * 3;
        if buffer.len() != expected {
            return Err(anyhow!("buffer holds {} bytes, layout needs {expected}", buffer.len()));
        }
        let root = BitMapBackend::with_buffer(buffer, (w, h)).into_drawing_area();
        Self::from_root(layout, root)
    }

    pub fn get_area(&self, id: &str) -> Option<&DrawingArea<BitMapBackend<'a>, Shift>> {
        self.index.get(id)
    }

    pub fn present(&self) -> Result<()> {
        self.root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> PanelSizes {
        PanelSizes {
            heatmap: (40, 60),
            row_tree: 30,
            col_tree: 20,
            row_labels: 25,
            col_labels: 15,
            color_bar: 10,
            margin: 5,
        }
    }

    #[test]
    fn test_heatmap_layout() {
        let layout = Layout::heatmap(&sizes());
        assert_eq!(layout.get_dim(), (5 + 30 + 40 + 25 + 5, 5 + 20 + 15 + 60 + 10 + 5));
        assert_eq!(layout.locate(panel::HEATMAP), Some(Rect::new(35, 40, 40, 60)));
        assert_eq!(layout.locate(panel::ROW_TREE), Some(Rect::new(5, 40, 30, 60)));
        assert_eq!(layout.locate(panel::ROW_LABELS), Some(Rect::new(75, 40, 25, 60)));
        assert_eq!(layout.locate(panel::COL_TREE), Some(Rect::new(35, 5, 40, 20)));
        assert_eq!(layout.locate(panel::COL_LABELS), Some(Rect::new(35, 25, 40, 15)));
        assert_eq!(layout.locate(panel::COLOR_BAR), Some(Rect::new(35, 100, 40, 10)));
        assert_eq!(layout.locate("missing"), None);
        assert_eq!(layout.ids().len(), 6);
    }

    #[test]
    fn test_dropped_panels() {
        let layout = Layout::heatmap(&PanelSizes {
            row_tree: 0,
            col_tree: 0,
            ..sizes()
        });
        assert_eq!(layout.locate(panel::HEATMAP), Some(Rect::new(5, 20, 40, 60)));
        assert!(layout.locate(panel::COL_TREE).is_some_and(|r| r.is_empty()));
    }

    #[test]
    fn test_set_dim() {
        let mut layout = Layout::heatmap(&sizes());
        layout.get_node_mut(panel::HEATMAP).unwrap().set_dim((100, 10)).unwrap();
        assert_eq!(layout.locate(panel::ROW_LABELS), Some(Rect::new(135, 40, 25, 10)));
        assert!(layout.set_dim((1, 1)).is_err());
    }

    #[test]
    fn test_yaml() {
        let yaml = "margined:\n  margin: {left: 1, right: 2, top: 3, bottom: 4}\n  center:\n    horizontal:\n    - rect: {id: a, width: 10, height: 5}\n    - rect: {id: null, width: 7, height: 9}\n";
        let layout: Layout = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(layout.get_dim(), (20, 16));
        assert_eq!(layout.locate("a"), Some(Rect::new(1, 3, 10, 5)));
        let back: Layout = serde_yaml::from_str(&serde_yaml::to_string(&layout).unwrap()).unwrap();
        assert_eq!(back, layout);
    }

    #[test]
    fn test_drawing_area() {
        let layout = Layout::heatmap(&sizes());
        let (w, h) = layout.get_dim();
        let mut buffer = vec![0u8; (w * h * 3) as usize];
        {
            let area = StructuredDrawingArea::from_buffer(&layout, &mut buffer).unwrap();
            let heatmap = area.get_area(panel::HEATMAP).unwrap();
            assert_eq!(heatmap.dim_in_pixel(), (40, 60));
            heatmap.fill(&BLACK).unwrap();
            area.present().unwrap();
        }
        let px = |x: u32, y: u32| &buffer[((y * w + x) * 3) as usize..((y * w + x) * 3 + 3) as usize];
        assert_eq!(px(35, 40), &[0, 0, 0]);
        assert_eq!(px(74, 99), &[0, 0, 0]);
        assert_eq!(px(34, 40), &[255, 255, 255]);
        assert_eq!(px(75, 99), &[255, 255, 255]);

        let mut short = vec![0u8; 3];
        assert!(StructuredDrawingArea::from_buffer(&layout, &mut short).is_err());
    }
}
