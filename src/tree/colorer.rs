// @file colorer.rs
// @brief node colors from tree annotations or leaf labels

use crate::color::parse_color;
use crate::labels::LabelInfo;
use crate::tree::node::Tree;
use plotters::prelude::RGBColor;
use std::collections::HashMap;

/// Sets each node with a parseable color annotation (e.g. a `NODECOLOR` column) to that color.
/// Returns the number of nodes colored.
pub fn color_from_annotations(tree: &mut Tree) -> usize {
    let mut count = 0;
    for id in tree.node_ids() {
        let Some(text) = tree.node(id).annotation.clone() else { continue };
        match parse_color(&text) {
            Ok(color) => {
                tree.node_mut(id).color = color;
                count += 1;
            }
            Err(e) => log::warn!("node {:?}: {e}", tree.node(id).id),
        }
    }
    count
}

/// Colors each leaf from `leaf_colors` (by matrix index) and each internal node by the most
/// frequent color over its leaf span. Ties go to the color seen first; nodes whose span has no
/// color keep theirs.
pub fn color_by_leaf_majority(tree: &mut Tree, leaf_colors: &[Option<RGBColor>]) {
    for id in tree.node_ids() {
        let node = tree.node(id);
        let lo = node.min_index.max(0.0) as usize;
        let hi = (node.max_index as usize).min(leaf_colors.len().saturating_sub(1));
        if leaf_colors.is_empty() || lo > hi {
            continue;
        }
        if let Some(color) = majority(&leaf_colors[lo..=hi]) {
            tree.node_mut(id).color = color;
        }
    }
}

fn majority(colors: &[Option<RGBColor>]) -> Option<RGBColor> {
    let mut counts: HashMap<(u8, u8, u8), (usize, usize)> = HashMap::new();
    for (pos, c) in colors.iter().enumerate() {
        if let Some(c) = c {
            counts.entry((c.0, c.1, c.2)).or_insert((0, pos)).0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.0.cmp(&b.1.0).then(b.1.1.cmp(&a.1.1)))
        .map(|((r, g, b), _)| RGBColor(r, g, b))
}

/// Per-index colors read from a label column holding hex strings; unparseable cells are `None`.
pub fn leaf_colors_from_labels(labels: &LabelInfo, column: usize) -> Vec<Option<RGBColor>> {
    (0..labels.len())
        .map(|i| labels.label(i, column).and_then(|s| parse_color(s).ok()))
        .collect()
}
