// @file painter.rs
// @brief dendrogram -> display list of elbow polylines

use crate::transform::{LinearTransformation, Rect};
use crate::tree::node::{NodeId, Tree};
use plotters::prelude::{RED, RGBColor};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// row tree: root on the left, index along y, height along x
    Left,
    /// column tree: root on top, index along x, height along y
    Top,
}

/// One internal node drawn as the elbow joining its two children.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub node: NodeId,
    /// right child end, the two corners, left child end
    pub points: [(i32, i32); 4],
    pub color: RGBColor,
    pub selected: bool,
}

pub type Segment = ((i32, i32), (i32, i32));

impl Branch {
    /// The three axis-aligned pieces of the elbow cut to `clip`; pieces entirely outside are dropped.
    pub fn clipped_segments(&self, clip: &Rect) -> Vec<Segment> {
        self.points
            .windows(2)
            .filter_map(|w| clip_segment(w[0], w[1], clip))
            .collect()
    }
}

/// Part of the axis-aligned segment `a`-`b` inside `clip`. Exact for horizontal and vertical
/// segments only, which is all an elbow is made of.
fn clip_segment(a: (i32, i32), b: (i32, i32), clip: &Rect) -> Option<Segment> {
    if clip.is_empty() {
        return None;
    }
    let (max_x, max_y) = (clip.right() - 1, clip.bottom() - 1);
    if a.0.max(b.0) < clip.x || a.0.min(b.0) > max_x || a.1.max(b.1) < clip.y || a.1.min(b.1) > max_y {
        return None;
    }
    let clamp = |(x, y): (i32, i32)| (x.clamp(clip.x, max_x), y.clamp(clip.y, max_y));
    Some((clamp(a), clamp(b)))
}

#[derive(Clone, Debug)]
pub struct TreePainter {
    orientation: Orientation,
    highlight: RGBColor,
}

impl TreePainter {
    pub fn new(orientation: Orientation) -> TreePainter {
        TreePainter {
            orientation,
            highlight: RED,
        }
    }

    pub fn with_highlight(self, highlight: RGBColor) -> TreePainter {
        TreePainter { highlight, ..self }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn index_transform<'a>(&self, x_t: &'a LinearTransformation, y_t: &'a LinearTransformation) -> &'a LinearTransformation {
        match self.orientation {
            Orientation::Left => y_t,
            Orientation::Top => x_t,
        }
    }

    /// Index window `[min, max]` covered by `dest` along the index axis.
    fn visible_range(&self, index_t: &LinearTransformation, dest: &Rect) -> Option<(f64, f64)> {
        let (start, end) = match self.orientation {
            Orientation::Left => (dest.y, dest.bottom()),
            Orientation::Top => (dest.x, dest.right()),
        };
        let lo = index_t.inverse_transform(start as f64)?.trunc();
        let hi = index_t.inverse_transform(end as f64)?.trunc() + 1.0;
        Some(if lo <= hi { (lo, hi) } else { (hi, lo) })
    }

    /// Draws every internal node whose leaf span overlaps `dest`; the subtree under `selected`
    /// takes the highlight color.
    pub fn paint(
        &self,
        tree: &Tree,
        x_t: &LinearTransformation,
        y_t: &LinearTransformation,
        dest: &Rect,
        selected: Option<NodeId>,
    ) -> Vec<Branch> {
        let Some(root) = tree.root() else {
            log::warn!("tree has no root, nothing to draw");
            return Vec::new();
        };
        if tree.node(root).is_leaf() {
            log::warn!("tree root {:?} is a leaf, nothing to draw", tree.node(root).id);
            return Vec::new();
        }
        let Some((min_index, max_index)) = self.visible_range(self.index_transform(x_t, y_t), dest) else {
            log::debug!("index transformation is not invertible ({x_t} / {y_t}), tree not drawn");
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut stack = vec![root];
        let mut in_selection = false;
        while let Some(id) = stack.pop() {
            let node = tree.node(id);
            if node.max_index < min_index || node.min_index > max_index {
                continue;
            }
            if Some(id) == selected {
                if in_selection {
                    // second visit: the whole selected subtree has been drawn
                    in_selection = false;
                    continue;
                }
                in_selection = true;
                stack.push(id);
            }
            stack.extend(tree.children(id).filter(|&c| !tree.node(c).is_leaf()));
            if let Some(branch) = self.paint_single(tree, x_t, y_t, id, in_selection) {
                out.push(branch);
            }
        }
        out
    }

    /// Draws `root` and all internal nodes below it with a fixed selection state, without culling.
    pub fn paint_subtree(
        &self,
        tree: &Tree,
        x_t: &LinearTransformation,
        y_t: &LinearTransformation,
        root: NodeId,
        is_selected: bool,
    ) -> Vec<Branch> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if tree.node(id).is_leaf() {
                continue;
            }
            stack.extend(tree.children(id));
            if let Some(branch) = self.paint_single(tree, x_t, y_t, id, is_selected) {
                out.push(branch);
            }
        }
        out
    }

    /// Elbow of one internal node; `None` for a leaf.
    pub fn paint_single(
        &self,
        tree: &Tree,
        x_t: &LinearTransformation,
        y_t: &LinearTransformation,
        id: NodeId,
        is_selected: bool,
    ) -> Option<Branch> {
        let node = tree.node(id);
        let left = tree.node(node.left?);
        let right = tree.node(node.right?);

        let points = match self.orientation {
            Orientation::Left => {
                let rx = x_t.transform(right.correlation) as i32;
                let lx = x_t.transform(left.correlation) as i32;
                let tx = x_t.transform(node.correlation) as i32;
                let ry = y_t.transform(right.index + 0.5) as i32;
                let ly = y_t.transform(left.index + 0.5) as i32;
                [(rx, ry), (tx, ry), (tx, ly), (lx, ly)]
            }
            Orientation::Top => {
                let ry = y_t.transform(right.correlation) as i32;
                let ly = y_t.transform(left.correlation) as i32;
                let ty = y_t.transform(node.correlation) as i32;
                let rx = x_t.transform(right.index + 0.5) as i32;
                let lx = x_t.transform(left.index + 0.5) as i32;
                [(rx, ry), (rx, ty), (lx, ty), (lx, ly)]
            }
        };
        Some(Branch {
            node: id,
            points,
            color: if is_selected { self.highlight } else { node.color },
            selected: is_selected,
        })
    }

    /// Weight that makes a correlation step comparable to an index step on screen.
    pub fn distance_weight(&self, x_t: &LinearTransformation, y_t: &LinearTransformation) -> f64 {
        let ratio = match self.orientation {
            Orientation::Left => x_t.slope() / y_t.slope(),
            Orientation::Top => y_t.slope() / x_t.slope(),
        };
        if ratio.is_finite() { ratio.abs() } else { 1.0 }
    }

    /// Internal node nearest to pixel `(px, py)`, for click selection.
    pub fn closest_to_pixel(
        &self,
        tree: &Tree,
        x_t: &LinearTransformation,
        y_t: &LinearTransformation,
        px: i32,
        py: i32,
    ) -> Option<NodeId> {
        let (index, corr) = match self.orientation {
            Orientation::Left => (y_t.inverse_transform(py as f64)? - 0.5, x_t.inverse_transform(px as f64)?),
            Orientation::Top => (x_t.inverse_transform(px as f64)? - 0.5, y_t.inverse_transform(py as f64)?),
        };
        tree.closest(index, corr, self.distance_weight(x_t, y_t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::tests::{four_leaf_tree, labels, record};
    use crate::tree::node::HeightKind;
    use std::collections::HashSet;

    // 10 pixels per leaf, correlation [0.2, 1.0] over 80 pixels
    fn left_transforms() -> (LinearTransformation, LinearTransformation) {
        (LinearTransformation::new(100.0, -20.0), LinearTransformation::new(10.0, 0.0))
    }

    /// left-deep chain over `n` leaves: N1 = (0, 1), N2 = (N1, 2), ...
    fn chain(n: usize) -> Tree {
        let mut records = vec![record("N1", "GENE0X", "GENE1X", 0.95)];
        for i in 2..n {
            let height = 0.95 - 0.9 * i as f64 / n as f64;
            records.push(record(&format!("N{i}"), &format!("N{}", i - 1), &format!("GENE{i}X"), height));
        }
        Tree::build(&records, HeightKind::Correlation, &labels(n)).unwrap()
    }

    #[test]
    fn test_left_elbow() {
        let tree = four_leaf_tree();
        let (x_t, y_t) = left_transforms();
        let painter = TreePainter::new(Orientation::Left);
        let n1 = tree.find("NODE1X").unwrap();
        let branch = painter.paint_single(&tree, &x_t, &y_t, n1, false).unwrap();
        // NODE1X at 0.9 joins leaves 0 and 1 (both at 1.0)
        assert_eq!(branch.points, [(80, 15), (70, 15), (70, 5), (80, 5)]);
        assert_eq!(branch.color, plotters::prelude::BLACK);

        let leaf = tree.leaf(0).unwrap();
        assert_eq!(painter.paint_single(&tree, &x_t, &y_t, leaf, false), None);
    }

    #[test]
    fn test_top_elbow() {
        let tree = four_leaf_tree();
        let x_t = LinearTransformation::new(10.0, 0.0);
        let y_t = LinearTransformation::new(100.0, -20.0);
        let painter = TreePainter::new(Orientation::Top);
        let n2 = tree.find("NODE2X").unwrap();
        let branch = painter.paint_single(&tree, &x_t, &y_t, n2, true).unwrap();
        // NODE2X at 0.7 joins leaves 2 and 3
        assert_eq!(branch.points, [(35, 80), (35, 50), (25, 50), (25, 80)]);
        assert_eq!(branch.color, RED);
    }

    #[test]
    fn test_paint_all() {
        let tree = four_leaf_tree();
        let (x_t, y_t) = left_transforms();
        let painter = TreePainter::new(Orientation::Left);
        let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(0, 0, 80, 40), None);
        assert_eq!(branches.len(), 3);
        assert!(branches.iter().all(|b| !b.selected));
    }

    #[test]
    fn test_selection_highlights_exactly_subtree() {
        let tree = chain(12);
        let (x_t, y_t) = left_transforms();
        let painter = TreePainter::new(Orientation::Left);
        for selected in tree.node_ids().filter(|&n| !tree.node(n).is_leaf()) {
            let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(0, 0, 80, 120), Some(selected));
            let expected = tree
                .descendants(selected)
                .into_iter()
                .filter(|&n| !tree.node(n).is_leaf())
                .collect::<HashSet<_>>();
            assert_eq!(branches.len(), 11);
            for b in &branches {
                assert_eq!(b.selected, expected.contains(&b.node), "selected={selected:?} node={:?}", b.node);
                assert_eq!(b.color == RED, b.selected);
            }
        }
    }

    #[test]
    fn test_culling() {
        let tree = four_leaf_tree();
        let (x_t, y_t) = left_transforms();
        let painter = TreePainter::new(Orientation::Left);

        // pixels 0..5 give the index window [0, 1]; NODE2X spans 2..3 and is skipped
        let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(0, 0, 80, 5), None);
        let drawn = branches.iter().map(|b| tree.node(b.node).id.as_str()).collect::<HashSet<_>>();
        assert_eq!(drawn, HashSet::from(["NODE3X", "NODE1X"]));

        // scrolled past everything
        let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(0, 100, 80, 10), None);
        assert!(branches.is_empty());
    }

    #[test]
    fn test_top_culling_and_selection() {
        let tree = four_leaf_tree();
        let x_t = LinearTransformation::new(10.0, 0.0);
        let y_t = LinearTransformation::new(100.0, -20.0);
        let painter = TreePainter::new(Orientation::Top);
        let drawn = |branches: &[Branch]| branches.iter().map(|b| tree.node(b.node).id.clone()).collect::<HashSet<_>>();

        // pixels 25..40 give the column window [2, 5]; NODE1X spans 0..1 and is skipped
        let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(25, 0, 15, 80), None);
        assert_eq!(drawn(&branches), HashSet::from(["NODE3X".to_string(), "NODE2X".to_string()]));

        let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(100, 0, 10, 80), None);
        assert!(branches.is_empty());

        let n2 = tree.find("NODE2X").unwrap();
        let branches = painter.paint(&tree, &x_t, &y_t, &Rect::new(0, 0, 40, 80), Some(n2));
        assert_eq!(branches.len(), 3);
        for b in &branches {
            assert_eq!(b.selected, b.node == n2);
            assert_eq!(b.color == RED, b.node == n2);
        }
    }

    #[test]
    fn test_clip_segment() {
        let clip = Rect::new(0, 0, 10, 10);
        assert_eq!(clip_segment((5, -10), (5, 10), &clip), Some(((5, 0), (5, 9))));
        assert_eq!(clip_segment((-3, 4), (3, 4), &clip), Some(((0, 4), (3, 4))));
        assert_eq!(clip_segment((20, 3), (30, 3), &clip), None);
        assert_eq!(clip_segment((-1, -5), (-1, 5), &clip), None);
        assert_eq!(clip_segment((1, 1), (2, 1), &Rect::new(0, 0, 0, 10)), None);
    }

    #[test]
    fn test_scrolled_elbows_stay_inside() {
        let tree = four_leaf_tree();
        // scrolled down by two rows: leaves 2 and 3 fill the 20 pixel panel
        let x_t = LinearTransformation::new(100.0, -20.0);
        let y_t = LinearTransformation::new(10.0, -20.0);
        let dest = Rect::new(0, 0, 80, 20);
        let painter = TreePainter::new(Orientation::Left);
        let branches = painter.paint(&tree, &x_t, &y_t, &dest, None);

        let root = tree.root().unwrap();
        let root_branch = branches.iter().find(|b| b.node == root).unwrap();
        assert!(root_branch.points.iter().any(|p| p.1 < 0));
        assert!(root_branch.clipped_segments(&dest).len() < 3);
        for b in &branches {
            for (a, c) in b.clipped_segments(&dest) {
                for (x, y) in [a, c] {
                    assert!((0..80).contains(&x) && (0..20).contains(&y), "{:?}: ({x}, {y})", tree.node(b.node).id);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_input() {
        let tree = four_leaf_tree();
        let painter = TreePainter::new(Orientation::Left);
        let x_t = LinearTransformation::new(1.0, 0.0);
        let flat = LinearTransformation::new(0.0, 5.0);
        assert!(painter.paint(&tree, &x_t, &flat, &Rect::new(0, 0, 10, 10), None).is_empty());
    }

    #[test]
    fn test_paint_subtree() {
        let tree = four_leaf_tree();
        let (x_t, y_t) = left_transforms();
        let painter = TreePainter::new(Orientation::Left);
        let n2 = tree.find("NODE2X").unwrap();
        let branches = painter.paint_subtree(&tree, &x_t, &y_t, n2, true);
        assert_eq!(branches.len(), 1);
        assert!(branches[0].selected);
        let root = tree.root().unwrap();
        assert_eq!(painter.paint_subtree(&tree, &x_t, &y_t, root, false).len(), 3);
    }

    #[test]
    fn test_closest_to_pixel() {
        let tree = four_leaf_tree();
        let (x_t, y_t) = left_transforms();
        let painter = TreePainter::new(Orientation::Left);
        assert_eq!(painter.distance_weight(&x_t, &y_t), 10.0);
        // right next to the NODE2X elbow at (50, 30)
        assert_eq!(painter.closest_to_pixel(&tree, &x_t, &y_t, 51, 31), tree.find("NODE2X"));
        // next to the root at (0, 20)
        assert_eq!(painter.closest_to_pixel(&tree, &x_t, &y_t, 2, 20), tree.root());
    }
}
