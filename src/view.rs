// @file view.rs
// @brief plotters elements for the heatmap, dendrograms, labels and color bar

use crate::color::{ContrastColorExtractor, unpack_argb};
use crate::drawer::PixelBuffer;
use crate::labels::LabelInfo;
use crate::transform::Rect;
use crate::tree::Branch;
use crate::viewport::Viewport;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_backend::DrawingErrorKind;

const FONT_FAMILY: &str = "sans-serif";

/// Rasterized heatmap, blitted as is.
#[derive(Clone, Debug)]
pub struct HeatmapView {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl HeatmapView {
    pub fn new(pixels: &PixelBuffer) -> HeatmapView {
        let rgb = pixels
            .pixels()
            .iter()
            .flat_map(|&argb| {
                let c = unpack_argb(argb);
                [c.0, c.1, c.2]
            })
            .collect();
        HeatmapView {
            width: pixels.width() as u32,
            height: pixels.height() as u32,
            rgb,
        }
    }

    pub fn get_dim(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a HeatmapView {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for HeatmapView
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, mut pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let Some(pos) = pos.next() else {
            return Ok(());
        };
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        backend.blit_bitmap(pos, (self.width, self.height), &self.rgb)
    }
}

/// Display list of a painted dendrogram.
#[derive(Clone, Debug)]
pub struct DendrogramView {
    branches: Vec<Branch>,
    stroke_width: u32,
}

impl DendrogramView {
    pub fn new(branches: Vec<Branch>) -> DendrogramView {
        DendrogramView {
            branches,
            stroke_width: 1,
        }
    }

    pub fn with_stroke_width(self, stroke_width: u32) -> DendrogramView {
        DendrogramView { stroke_width, ..self }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a DendrogramView {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for DendrogramView
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, mut pos: I, backend: &mut DB, dim: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let Some(pos) = pos.next() else {
            return Ok(());
        };
        let shift = |(x, y): (i32, i32)| (pos.0 + x, pos.1 + y);
        // elbows of nodes straddling the visible window reach past the panel
        let clip = Rect::new(0, 0, dim.0 as i32, dim.1 as i32);

        // selected branches last so they stay on top
        let (selected, plain): (Vec<_>, Vec<_>) = self.branches.iter().partition(|b| b.selected);
        for branch in plain.into_iter().chain(selected) {
            let style = ShapeStyle {
                color: branch.color.into(),
                filled: false,
                stroke_width: self.stroke_width,
            };
            for (a, b) in branch.clipped_segments(&clip) {
                backend.draw_line(shift(a), shift(b), &style)?;
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelAxis {
    /// left-aligned, one per row, right of the heatmap
    Rows,
    /// rotated, one per column, above the heatmap
    Columns,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub index: i32,
    /// pixel center of the tile along the axis
    pub center: i32,
    pub text: String,
    pub color: RGBColor,
}

/// Row or column labels aligned with a viewport.
#[derive(Clone, Debug)]
pub struct LabelView {
    axis: LabelAxis,
    font_size: u32,
    /// extent of the label strip across the axis
    depth: u32,
    labels: Vec<Label>,
}

impl LabelView {
    pub fn new(axis: LabelAxis, font_size: u32, depth: u32) -> LabelView {
        LabelView {
            axis,
            font_size,
            depth,
            labels: Vec::new(),
        }
    }

    /// Labels of the visible indexes. Nothing is shown when the font is disabled or tiles
    /// are narrower than half the font.
    pub fn from_viewport(
        axis: LabelAxis,
        info: &LabelInfo,
        column: usize,
        viewport: &Viewport,
        font_size: u32,
        depth: u32,
    ) -> LabelView {
        let mut view = LabelView::new(axis, font_size, depth);
        if font_size == 0 {
            return view;
        }
        let scale = viewport.scale();
        if scale < font_size as f64 / 2.0 {
            log::debug!("{axis:?} labels hidden at {scale:.2} pixels per index");
            return view;
        }
        for i in viewport.first_visible()..=viewport.last_visible() {
            let Some(text) = info.label(i as usize, column) else {
                continue;
            };
            let center = viewport.get_pixel(i) + (scale / 2.0) as i32;
            view.push(i, center, text, BLACK);
        }
        view
    }

    pub fn push(&mut self, index: i32, center: i32, text: &str, color: RGBColor) {
        self.labels.push(Label {
            index,
            center,
            text: text.to_string(),
            color,
        });
    }

    /// Recolors the labels of indexes `min..=max`.
    pub fn highlight(&mut self, min: i32, max: i32, color: RGBColor) {
        for label in self.labels.iter_mut().filter(|l| min <= l.index && l.index <= max) {
            label.color = color;
        }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a LabelView {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for LabelView
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, mut pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let Some(pos) = pos.next() else {
            return Ok(());
        };
        if self.font_size == 0 || self.labels.is_empty() {
            return Ok(());
        }
        let font = (FONT_FAMILY, self.font_size as f64).into_font();
        let font = match self.axis {
            LabelAxis::Rows => font,
            LabelAxis::Columns => font.transform(FontTransform::Rotate270),
        };
        let base = TextStyle::from(font).pos(Pos::new(HPos::Left, VPos::Center));
        let setback = 2;
        for label in &self.labels {
            let style = base.color(&label.color);
            let at = match self.axis {
                LabelAxis::Rows => (pos.0 + setback, pos.1 + label.center),
                LabelAxis::Columns => (pos.0 + label.center, pos.1 + self.depth as i32 - setback),
            };
            backend.draw_text(&label.text, &style, at)?;
        }
        Ok(())
    }
}

/// Horizontal gradient over `center +- contrast` with its bounds printed below.
#[derive(Clone, Debug)]
pub struct ColorBar {
    extractor: ContrastColorExtractor,
    width: u32,
    height: u32,
    font_size: u32,
}

impl ColorBar {
    pub fn new(extractor: &ContrastColorExtractor, width: u32, height: u32, font_size: u32) -> ColorBar {
        ColorBar {
            extractor: extractor.clone(),
            width,
            height,
            font_size,
        }
    }

    fn bar_height(&self) -> u32 {
        let text = if self.font_size > 0 { self.font_size + 2 } else { 0 };
        self.height.saturating_sub(text)
    }

    /// Color of column `x` of the bar.
    pub fn color_at(&self, x: u32) -> RGBColor {
        if self.width < 2 {
            return self.extractor.ramp(0.0);
        }
        let factor = 2.0 * x as f64 / (self.width - 1) as f64 - 1.0;
        self.extractor.ramp(factor)
    }

    pub fn bounds(&self) -> (f64, f64) {
        let center = self.extractor.center();
        let contrast = self.extractor.contrast();
        (center - contrast, center + contrast)
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a ColorBar {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0))
    }
}

impl<DB> Drawable<DB> for ColorBar
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, mut pos: I, backend: &mut DB, _: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let Some(pos) = pos.next() else {
            return Ok(());
        };
        let shift = |(x, y): (i32, i32)| (pos.0 + x, pos.1 + y);

        let height = self.bar_height();
        if height > 0 && self.width > 0 {
            let row = (0..self.width)
                .flat_map(|x| {
                    let c = self.color_at(x);
                    [c.0, c.1, c.2]
                })
                .collect::<Vec<_>>();
            let rgb = row.repeat(height as usize);
            backend.blit_bitmap(pos, (self.width, height), &rgb)?;
        }
        if self.font_size == 0 {
            return Ok(());
        }

        let (lo, hi) = self.bounds();
        let font = TextStyle::from((FONT_FAMILY, self.font_size as f64).into_font()).color(&BLACK);
        let y = height as i32 + 2;
        backend.draw_text(&format!("{lo:.2}"), &font.pos(Pos::new(HPos::Left, VPos::Top)), shift((0, y)))?;
        backend.draw_text(
            &format!("{hi:.2}"),
            &font.pos(Pos::new(HPos::Right, VPos::Top)),
            shift((self.width as i32 - 1, y)),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::pack_argb;
    use crate::map::IndexPixelMap;
    use crate::tree::NodeId;

    const W: u32 = 24;
    const H: u32 = 16;

    fn pixel(buffer: &[u8], x: u32, y: u32) -> RGBColor {
        let i = ((y * W + x) * 3) as usize;
        RGBColor(buffer[i], buffer[i + 1], buffer[i + 2])
    }

    fn render<E>(elem: &E) -> Vec<u8>
    where
        E: for<'x> Drawable<BitMapBackend<'x>>,
        for<'b> &'b E: PointCollection<'b, (i32, i32)>,
    {
        let mut buffer = vec![255u8; (W * H * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (W, H)).into_drawing_area();
            let area = root.clone().shrink((2, 3), (W - 2, H - 3));
            area.draw(elem).unwrap();
            root.present().unwrap();
        }
        buffer
    }

    #[test]
    fn test_heatmap_blit() {
        let mut pixels = PixelBuffer::filled(3, 2, pack_argb(&RGBColor(10, 20, 30)));
        assert!(pixels.set(2, 1, pack_argb(&RED)));
        let view = HeatmapView::new(&pixels);
        assert_eq!(view.get_dim(), (3, 2));

        let buffer = render(&view);
        assert_eq!(pixel(&buffer, 2, 3), RGBColor(10, 20, 30));
        assert_eq!(pixel(&buffer, 4, 4), RED);
        assert_eq!(pixel(&buffer, 5, 4), WHITE);
        assert_eq!(pixel(&buffer, 1, 3), WHITE);
    }

    #[test]
    fn test_dendrogram_paths() {
        let branch = |node, points, color, selected| Branch {
            node: NodeId(node),
            points,
            color,
            selected,
        };
        let view = DendrogramView::new(vec![
            branch(0, [(0, 2), (10, 2), (10, 8), (0, 8)], BLUE, false),
            branch(1, [(16, 0), (16, 10), (20, 10), (20, 0)], RED, true),
        ]);
        let buffer = render(&view);
        assert_eq!(pixel(&buffer, 7, 5), BLUE);
        assert_eq!(pixel(&buffer, 12, 8), BLUE);
        assert_eq!(pixel(&buffer, 18, 8), RED);
        assert_eq!(pixel(&buffer, 7, 8), WHITE);
    }

    #[test]
    fn test_dendrogram_clipped_to_area() {
        // the area is 22x13 at (2, 3); both elbows reach above or left of it
        let branch = |node, points| Branch {
            node: NodeId(node),
            points,
            color: BLUE,
            selected: false,
        };
        let view = DendrogramView::new(vec![
            branch(0, [(10, 6), (5, 6), (5, -5), (30, -5)]),
            branch(1, [(4, 10), (-4, 10), (-4, -5), (1, -5)]),
        ]);
        let buffer = render(&view);
        assert_eq!(pixel(&buffer, 10, 9), BLUE);
        // the vertical piece stops at the top edge of the area
        assert_eq!(pixel(&buffer, 7, 5), BLUE);
        assert_eq!(pixel(&buffer, 7, 3), BLUE);
        assert_eq!(pixel(&buffer, 20, 3), WHITE);
        // only the horizontal piece of the second elbow is inside
        assert_eq!(pixel(&buffer, 4, 13), BLUE);
        assert_eq!(pixel(&buffer, 2, 13), BLUE);
        for y in 0..H {
            for x in 0..W {
                if x < 2 || y < 3 {
                    assert_eq!(pixel(&buffer, x, y), WHITE, "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_color_bar_gradient() {
        let ex = ContrastColorExtractor::default();
        let bar = ColorBar::new(&ex, 11, 4, 0);
        assert_eq!(bar.color_at(0), RGBColor(0, 255, 0));
        assert_eq!(bar.color_at(5), RGBColor(0, 0, 0));
        assert_eq!(bar.color_at(10), RGBColor(255, 0, 0));
        assert_eq!(bar.bounds(), (-3.0, 3.0));

        let buffer = render(&bar);
        assert_eq!(pixel(&buffer, 2, 3), RGBColor(0, 255, 0));
        assert_eq!(pixel(&buffer, 12, 6), RGBColor(255, 0, 0));
        assert_eq!(pixel(&buffer, 12, 7), WHITE);
        assert_eq!(pixel(&buffer, 13, 3), WHITE);
    }

    #[test]
    fn test_labels_follow_viewport() {
        let info = LabelInfo::numbered("ROW", 10);
        let mut viewport = Viewport::new(IndexPixelMap::fixed(10.0));
        viewport.set_available_pixels(100);
        viewport.set_index_range(0, 9);
        viewport.zoom_to_selected(4, 7);

        let mut view = LabelView::from_viewport(LabelAxis::Rows, &info, 0, &viewport, 12, 50);
        view.highlight(5, 5, RED);
        let centers = view.labels().iter().map(|l| l.center).collect::<Vec<_>>();
        assert_eq!(centers, vec![12, 37, 62, 87]);
        assert_eq!(view.labels()[0].text, info.label(4, 0).unwrap());
        assert_eq!(view.labels()[1].color, RED);
        assert_eq!(view.labels()[2].color, BLACK);

        let hidden = LabelView::from_viewport(LabelAxis::Columns, &info, 0, &viewport, 0, 50);
        assert!(hidden.labels().is_empty());
        let buffer = render(&hidden);
        assert!(buffer.iter().all(|&b| b == 255));

        viewport.full_zoom_out();
        let crowded = LabelView::from_viewport(LabelAxis::Rows, &info, 0, &viewport, 30, 50);
        assert!(crowded.labels().is_empty());
    }
}
