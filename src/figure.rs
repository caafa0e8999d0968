// @file figure.rs
// @brief heatmap + dendrograms + labels composed into one picture

use crate::cdt::CdtFile;
use crate::config::RenderConfig;
use crate::drawer::{DoubleArrayDrawer, PixelBuffer};
use crate::layout::{Layout, PanelSizes, StructuredDrawingArea, panel};
use crate::transform::{LinearTransformation, Rect};
use crate::tree::{Branch, NodeId, Orientation, Tree};
use crate::view::{ColorBar, DendrogramView, HeatmapView, LabelAxis, LabelView};
use crate::viewport::Viewport;
use anyhow::{Result, anyhow};
use regex::Regex;

const COLOR_BAR_HEIGHT: u32 = 12;

/// Which tree a selection lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Columns,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Selection {
    node: Option<NodeId>,
    /// selected index range, inclusive
    range: Option<(i32, i32)>,
}

pub struct Figure {
    config: RenderConfig,
    cdt: CdtFile,
    row_tree: Option<Tree>,
    col_tree: Option<Tree>,
    rows: Viewport,
    cols: Viewport,
    drawer: DoubleArrayDrawer,
    row_selection: Selection,
    col_selection: Selection,
}

impl Figure {
    pub fn new(cdt: CdtFile, config: RenderConfig) -> Figure {
        let rows = Viewport::new(config.rows.to_map(cdt.matrix.n_row()));
        let cols = Viewport::new(config.columns.to_map(cdt.matrix.n_col()));
        let mut drawer = DoubleArrayDrawer::new(cdt.matrix.clone(), config.color_extractor());
        if config.contrast.is_none() {
            drawer.recalculate_contrast();
        }
        log::info!(
            "contrast {:.3}, {} x {} pixels per cell",
            drawer.extractor().contrast(),
            cols.scale(),
            rows.scale()
        );
        Figure {
            config,
            cdt,
            row_tree: None,
            col_tree: None,
            rows,
            cols,
            drawer,
            row_selection: Selection::default(),
            col_selection: Selection::default(),
        }
    }

    pub fn with_row_tree(self, tree: Tree) -> Figure {
        if tree.leaf_count() != self.cdt.matrix.n_row() {
            log::warn!("row tree has {} leaves for {} rows", tree.leaf_count(), self.cdt.matrix.n_row());
        }
        Figure {
            row_tree: Some(tree),
            ..self
        }
    }

    pub fn with_col_tree(self, tree: Tree) -> Figure {
        if tree.leaf_count() != self.cdt.matrix.n_col() {
            log::warn!("column tree has {} leaves for {} columns", tree.leaf_count(), self.cdt.matrix.n_col());
        }
        Figure {
            col_tree: Some(tree),
            ..self
        }
    }

    pub fn rows(&self) -> &Viewport {
        &self.rows
    }

    pub fn cols(&self) -> &Viewport {
        &self.cols
    }

    pub fn row_tree(&self) -> Option<&Tree> {
        self.row_tree.as_ref()
    }

    pub fn col_tree(&self) -> Option<&Tree> {
        self.col_tree.as_ref()
    }

    pub fn drawer(&self) -> &DoubleArrayDrawer {
        &self.drawer
    }

    fn tree(&self, axis: Axis) -> Option<&Tree> {
        match axis {
            Axis::Rows => self.row_tree.as_ref(),
            Axis::Columns => self.col_tree.as_ref(),
        }
    }

    fn selection_mut(&mut self, axis: Axis) -> &mut Selection {
        match axis {
            Axis::Rows => &mut self.row_selection,
            Axis::Columns => &mut self.col_selection,
        }
    }

    pub fn selected_node(&self, axis: Axis) -> Option<NodeId> {
        match axis {
            Axis::Rows => self.row_selection.node,
            Axis::Columns => self.col_selection.node,
        }
    }

    pub fn selected_range(&self, axis: Axis) -> Option<(i32, i32)> {
        match axis {
            Axis::Rows => self.row_selection.range,
            Axis::Columns => self.col_selection.range,
        }
    }

    fn select_node_on(&mut self, axis: Axis, node: NodeId) {
        let Some(tree) = self.tree(axis) else {
            return;
        };
        let n = tree.node(node);
        let range = (n.min_index as i32, n.max_index as i32);
        log::info!("selected {} ({axis:?} {}..={})", n.id, range.0, range.1);
        *self.selection_mut(axis) = Selection {
            node: Some(node),
            range: Some(range),
        };
    }

    /// Selects the tree node `id`, looking in the row tree first.
    pub fn select_node(&mut self, id: &str) -> Result<Axis> {
        for axis in [Axis::Rows, Axis::Columns] {
            if let Some(node) = self.tree(axis).and_then(|t| t.find(id)) {
                self.select_node_on(axis, node);
                return Ok(axis);
            }
        }
        Err(anyhow!("no tree node named {id:?}"))
    }

    /// Selects the rows whose display label matches `re`: the smallest subtree spanning them
    /// when a row tree exists, the bare index range otherwise. Returns the number of matches.
    pub fn select_matching(&mut self, re: &Regex) -> usize {
        let Some(column) = self.cdt.row_labels.display_column() else {
            return 0;
        };
        let found = self.cdt.row_labels.find(re, column);
        let (Some(&min), Some(&max)) = (found.first(), found.last()) else {
            log::warn!("no row label matches {re}");
            return 0;
        };
        match self.row_tree.as_ref().and_then(|t| t.nearest_common_ancestor(min, max)) {
            Some(node) => self.select_node_on(Axis::Rows, node),
            None => {
                self.row_selection = Selection {
                    node: None,
                    range: Some((min as i32, max as i32)),
                }
            }
        }
        found.len()
    }

    /// Restricts both viewports to the current selections.
    pub fn zoom_to_selection(&mut self) {
        if let Some((min, max)) = self.row_selection.range {
            self.rows.zoom_to_selected(min, max);
        }
        if let Some((min, max)) = self.col_selection.range {
            self.cols.zoom_to_selected(min, max);
        }
    }

    pub fn panel_sizes(&self) -> PanelSizes {
        let config = &self.config;
        let text = config.font_size > 0;
        let bar = if config.color_bar {
            COLOR_BAR_HEIGHT + if text { config.font_size + 2 } else { 0 }
        } else {
            0
        };
        PanelSizes {
            heatmap: (self.cols.used_pixels() as u32, self.rows.used_pixels() as u32),
            row_tree: if self.row_tree.is_some() { config.row_tree_size } else { 0 },
            col_tree: if self.col_tree.is_some() { config.col_tree_size } else { 0 },
            row_labels: if text { config.row_label_size } else { 0 },
            col_labels: if text { config.col_label_size } else { 0 },
            color_bar: bar,
            margin: config.margin,
        }
    }

    pub fn layout(&self) -> Layout {
        Layout::heatmap(&self.panel_sizes())
    }

    /// Rasterizes the visible window of the matrix.
    pub fn render_heatmap(&mut self) -> PixelBuffer {
        let (w, h) = (self.cols.used_pixels(), self.rows.used_pixels());
        let mut pixels = PixelBuffer::filled(w.max(0) as usize, h.max(0) as usize, 0xFFFF_FFFF);
        let source = Rect::new(
            self.cols.first_visible(),
            self.rows.first_visible(),
            self.cols.num_visible(),
            self.rows.num_visible(),
        );
        self.drawer.paint(&mut pixels, &source, &Rect::new(0, 0, w, h), None);
        pixels
    }

    /// Correlation axis of a tree panel `len` pixels deep, root side at 0.
    fn height_transformation(tree: &Tree, len: u32) -> LinearTransformation {
        LinearTransformation::from_points(tree.corr_min(), 0.0, tree.corr_max(), len.saturating_sub(1) as f64)
    }

    /// Elbows of the row tree inside a `width x height` panel left of the heatmap.
    pub fn row_branches(&self, width: u32, height: u32) -> Vec<Branch> {
        let Some(tree) = &self.row_tree else {
            return Vec::new();
        };
        let x_t = Self::height_transformation(tree, width);
        let y_t = self.rows.index_transformation(0);
        let dest = Rect::new(0, 0, width as i32, height as i32);
        self.config
            .tree_painter(Orientation::Left)
            .paint(tree, &x_t, &y_t, &dest, self.row_selection.node)
    }

    /// Elbows of the column tree inside a `width x height` panel above the heatmap.
    pub fn col_branches(&self, width: u32, height: u32) -> Vec<Branch> {
        let Some(tree) = &self.col_tree else {
            return Vec::new();
        };
        let x_t = self.cols.index_transformation(0);
        let y_t = Self::height_transformation(tree, height);
        let dest = Rect::new(0, 0, width as i32, height as i32);
        self.config
            .tree_painter(Orientation::Top)
            .paint(tree, &x_t, &y_t, &dest, self.col_selection.node)
    }

    fn labels(&self, axis: Axis, depth: u32) -> LabelView {
        let (info, viewport, label_axis) = match axis {
            Axis::Rows => (&self.cdt.row_labels, &self.rows, LabelAxis::Rows),
            Axis::Columns => (&self.cdt.col_labels, &self.cols, LabelAxis::Columns),
        };
        let Some(column) = info.display_column() else {
            return LabelView::new(label_axis, 0, depth);
        };
        let mut view = LabelView::from_viewport(label_axis, info, column, viewport, self.config.font_size, depth);
        if let Some((min, max)) = self.selected_range(axis) {
            view.highlight(min, max, self.config.highlight);
        }
        view
    }

    /// Draws every panel present in `area`.
    pub fn draw(&mut self, area: &StructuredDrawingArea) -> Result<()> {
        if let Some(a) = area.get_area(panel::HEATMAP) {
            a.draw(&HeatmapView::new(&self.render_heatmap()))?;
        }
        if let Some(a) = area.get_area(panel::ROW_TREE) {
            let (w, h) = a.dim_in_pixel();
            a.draw(&DendrogramView::new(self.row_branches(w, h)))?;
        }
        if let Some(a) = area.get_area(panel::COL_TREE) {
            let (w, h) = a.dim_in_pixel();
            a.draw(&DendrogramView::new(self.col_branches(w, h)))?;
        }
        if let Some(a) = area.get_area(panel::ROW_LABELS) {
            a.draw(&self.labels(Axis::Rows, a.dim_in_pixel().0))?;
        }
        if let Some(a) = area.get_area(panel::COL_LABELS) {
            a.draw(&self.labels(Axis::Columns, a.dim_in_pixel().1))?;
        }
        if let Some(a) = area.get_area(panel::COLOR_BAR) {
            let (w, h) = a.dim_in_pixel();
            a.draw(&ColorBar::new(self.drawer.extractor(), w, h, self.config.font_size))?;
        }
        Ok(())
    }
}
