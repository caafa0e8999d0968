// @file node.rs
// @brief arena dendrogram (nodes addressed by NodeId)

use crate::error::TreeError;
use crate::labels::LabelInfo;
use plotters::prelude::{BLACK, RGBColor};
use std::collections::{HashMap, HashSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// How the branch heights of a tree file are interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeightKind {
    /// similarity in `[-1, 1]`, leaves at 1.0
    Correlation,
    /// distance from the root, leaves at the maximum
    Time,
}

/// One line of a GTR / ATR file.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub left: String,
    pub right: String,
    pub height: f64,
    pub annotation: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub id: String,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub parent: Option<NodeId>,
    /// branch height; leaves are set from the tree's height kind
    pub correlation: f64,
    /// leaf position, or the mean of the two children's indexes
    pub index: f64,
    pub min_index: f64,
    pub max_index: f64,
    pub color: RGBColor,
    pub annotation: Option<String>,
}

impl TreeNode {
    fn leaf(id: &str, index: usize) -> TreeNode {
        TreeNode {
            id: id.to_string(),
            left: None,
            right: None,
            parent: None,
            correlation: 1.0,
            index: index as f64,
            min_index: index as f64,
            max_index: index as f64,
            color: BLACK,
            annotation: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Squared distance to `(index, corr)` with the correlation axis stretched by `weight`.
    pub fn dist(&self, index: f64, corr: f64, weight: f64) -> f64 {
        let dx = self.index - index;
        let dy = (self.correlation - corr) * weight;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: Option<NodeId>,
    leaves: Vec<Option<NodeId>>,
    by_id: HashMap<String, NodeId>,
    kind: HeightKind,
    corr_min: f64,
    corr_max: f64,
}

impl Tree {
    /// Builds the tree from records in file order. Children that were not declared by an
    /// earlier record are leaves and must resolve to an index through `leaf_labels`; the last
    /// record is the root.
    pub fn build(records: &[NodeRecord], kind: HeightKind, leaf_labels: &LabelInfo) -> Result<Tree, TreeError> {
        if records.is_empty() {
            return Err(TreeError::Empty);
        }
        let mut tree = Tree {
            nodes: Vec::with_capacity(2 * records.len() + 1),
            root: None,
            leaves: vec![None; leaf_labels.len()],
            by_id: HashMap::new(),
            kind,
            corr_min: 0.0,
            corr_max: 1.0,
        };

        for record in records {
            if record.left == record.id || record.right == record.id {
                return Err(TreeError::SelfReference { id: record.id.clone() });
            }
            let left = tree.resolve_child(&record.left, leaf_labels)?;
            let right = tree.resolve_child(&record.right, leaf_labels)?;
            let (left, right) = if tree.nodes[left.0].index > tree.nodes[right.0].index {
                (right, left)
            } else {
                (left, right)
            };

            let (l, r) = (&tree.nodes[left.0], &tree.nodes[right.0]);
            let node = TreeNode {
                id: record.id.clone(),
                left: Some(left),
                right: Some(right),
                parent: None,
                correlation: record.height,
                index: (l.index + r.index) / 2.0,
                min_index: l.min_index.min(r.min_index),
                max_index: l.max_index.max(r.max_index),
                color: BLACK,
                annotation: record.annotation.clone(),
            };
            let id = NodeId(tree.nodes.len());
            tree.nodes.push(node);
            for child in [left, right] {
                if tree.nodes[child.0].parent.is_some() {
                    log::warn!("node {:?} has more than one parent", tree.nodes[child.0].id);
                }
                tree.nodes[child.0].parent = Some(id);
            }
            if tree.by_id.insert(record.id.clone(), id).is_some() {
                log::warn!("duplicate node id {:?} in tree file; the later one wins", record.id);
            }
            tree.root = Some(id);
        }

        tree.assign_leaf_heights(leaf_labels);
        Ok(tree)
    }

    fn resolve_child(&mut self, id: &str, leaf_labels: &LabelInfo) -> Result<NodeId, TreeError> {
        if let Some(&node) = self.by_id.get(id) {
            return Ok(node);
        }
        let index = leaf_labels
            .index_of_id(id)
            .ok_or_else(|| TreeError::UnknownLeaf { id: id.to_string() })?;
        let node = NodeId(self.nodes.len());
        self.nodes.push(TreeNode::leaf(id, index));
        self.by_id.insert(id.to_string(), node);
        if let Some(slot) = self.leaves.get_mut(index) {
            *slot = Some(node);
        }
        Ok(node)
    }

    fn assign_leaf_heights(&mut self, leaf_labels: &LabelInfo) {
        let internal = self.nodes.iter().filter(|n| !n.is_leaf()).map(|n| n.correlation);
        let (lo, hi) = internal.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c), hi.max(c)));

        match self.kind {
            HeightKind::Correlation => {
                if lo < -1.0 || hi > 1.0 {
                    log::warn!("correlation tree has branch heights in [{lo}, {hi}], outside [-1, 1]");
                }
                for node in self.nodes.iter_mut().filter(|n| n.is_leaf()) {
                    node.correlation = 1.0;
                }
                self.corr_min = lo.min(1.0);
                self.corr_max = 1.0;
            }
            HeightKind::Time => {
                let leaf_column = leaf_labels.index_of_prefix("LEAF");
                let mut hi = hi;
                let mut lo = lo;
                let mut explicit = Vec::new();
                for (i, node) in self.nodes.iter().enumerate().filter(|(_, n)| n.is_leaf()) {
                    let value = leaf_column
                        .and_then(|col| leaf_labels.label(node.index as usize, col))
                        .and_then(|s| s.trim().parse::<f64>().ok());
                    if let Some(v) = value {
                        hi = hi.max(v);
                        lo = lo.min(v);
                        explicit.push((i, v));
                    }
                }
                for node in self.nodes.iter_mut().filter(|n| n.is_leaf()) {
                    node.correlation = hi;
                }
                for (i, v) in explicit {
                    self.nodes[i].correlation = v;
                }
                self.corr_min = lo;
                self.corr_max = hi;
            }
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn kind(&self) -> HeightKind {
        self.kind
    }

    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Leaf node at matrix index `index`, if the tree covers it.
    pub fn leaf(&self, index: usize) -> Option<NodeId> {
        self.leaves.get(index).copied().flatten()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.iter().filter(|l| l.is_some()).count()
    }

    pub fn corr_min(&self) -> f64 {
        self.corr_min
    }

    pub fn corr_max(&self) -> f64 {
        self.corr_max
    }

    pub fn set_correlation_range(&mut self, min: f64, max: f64) {
        self.corr_min = min;
        self.corr_max = max;
    }

    /// Children of `id` (left first), empty for a leaf.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + use<> {
        let node = &self.nodes[id.0];
        node.left.into_iter().chain(node.right)
    }

    /// `id` and everything below it, in depth-first order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n));
        }
        out
    }

    pub fn min_corr(&self, id: NodeId) -> f64 {
        self.descendants(id)
            .into_iter()
            .map(|n| self.nodes[n.0].correlation)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max_corr(&self, id: NodeId) -> f64 {
        self.descendants(id)
            .into_iter()
            .map(|n| self.nodes[n.0].correlation)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn left_leaf(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(left) = self.nodes[cur.0].left {
            cur = left;
        }
        cur
    }

    pub fn right_leaf(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(right) = self.nodes[cur.0].right {
            cur = right;
        }
        cur
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, |n| self.nodes[n.0].parent)
    }

    /// First ancestor of `leaf` whose correlation drops below `corr`; the root if none does.
    pub fn closest_parent(&self, leaf: NodeId, corr: f64) -> NodeId {
        let mut cur = leaf;
        for parent in self.ancestors(leaf) {
            cur = parent;
            if self.nodes[parent.0].correlation < corr {
                break;
            }
        }
        cur
    }

    /// Lowest internal node spanning the leaves at `min_index` and `max_index`. Asking for a
    /// single leaf gives its parent.
    pub fn nearest_common_ancestor(&self, min_index: usize, max_index: usize) -> Option<NodeId> {
        let a = self.leaf(min_index)?;
        let b = self.leaf(max_index)?;
        let above_a = self.ancestors(a).collect::<HashSet<_>>();
        self.ancestors(b).find(|n| above_a.contains(n))
    }

    /// Internal node nearest to `(index, corr)`, searching from the root; correlation
    /// differences are scaled by `weight`. A tree made of a single leaf answers with it.
    pub fn closest(&self, index: f64, corr: f64, weight: f64) -> Option<NodeId> {
        let root = self.root?;
        let mut best = root;
        let mut best_dist = self.nodes[root.0].dist(index, corr, weight);
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            let d = self.nodes[n.0].dist(index, corr, weight);
            if d < best_dist {
                best = n;
                best_dist = d;
            }
            stack.extend(self.children(n).filter(|&c| !self.nodes[c.0].is_leaf()));
        }
        Some(best)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn labels(n: usize) -> LabelInfo {
        let rows = (0..n).map(|i| vec![format!("GENE{i}X"), format!("gene {i}")]).collect();
        LabelInfo::new(vec!["GID".to_string(), "NAME".to_string()], rows)
    }

    pub(crate) fn record(id: &str, left: &str, right: &str, height: f64) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            height,
            annotation: None,
        }
    }

    /// ((0, 1), (2, 3)) joined at 0.2
    pub(crate) fn four_leaf_tree() -> Tree {
        let records = [
            record("NODE1X", "GENE1X", "GENE0X", 0.9),
            record("NODE2X", "GENE2X", "GENE3X", 0.7),
            record("NODE3X", "NODE1X", "NODE2X", 0.2),
        ];
        Tree::build(&records, HeightKind::Correlation, &labels(4)).unwrap()
    }

    #[test]
    fn test_build() {
        let tree = four_leaf_tree();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.leaf_count(), 4);

        let root = tree.root().unwrap();
        let node = tree.node(root);
        assert_eq!(node.id, "NODE3X");
        assert_eq!(node.index, 1.5);
        assert_eq!((node.min_index, node.max_index), (0.0, 3.0));

        // children swapped so that the left one has the smaller index
        let n1 = tree.find("NODE1X").unwrap();
        assert_eq!(tree.node(tree.node(n1).left.unwrap()).id, "GENE0X");
        assert_eq!(tree.node(n1).parent, Some(root));

        assert_eq!(tree.corr_min(), 0.2);
        assert_eq!(tree.corr_max(), 1.0);
        assert_eq!(tree.node(tree.leaf(2).unwrap()).correlation, 1.0);
        assert_eq!(tree.left_leaf(root), tree.leaf(0).unwrap());
        assert_eq!(tree.right_leaf(root), tree.leaf(3).unwrap());
        assert_eq!(tree.min_corr(root), 0.2);
        assert_eq!(tree.max_corr(n1), 1.0);
    }

    #[test]
    fn test_unknown_leaf() {
        let records = [record("NODE1X", "GENE0X", "GENE7X", 0.5)];
        let err = Tree::build(&records, HeightKind::Correlation, &labels(4)).unwrap_err();
        assert_eq!(err, TreeError::UnknownLeaf { id: "GENE7X".to_string() });

        let records = [record("NODE1X", "NODE1X", "GENE0X", 0.5)];
        let err = Tree::build(&records, HeightKind::Correlation, &labels(4)).unwrap_err();
        assert!(matches!(err, TreeError::SelfReference { .. }));

        assert_eq!(Tree::build(&[], HeightKind::Correlation, &labels(4)).unwrap_err(), TreeError::Empty);
    }

    #[test]
    fn test_time_heights() {
        let records = [record("N1", "GENE0X", "GENE1X", 2.0), record("N2", "N1", "GENE2X", 0.5)];
        let tree = Tree::build(&records, HeightKind::Time, &labels(3)).unwrap();
        assert_eq!(tree.corr_min(), 0.5);
        assert_eq!(tree.corr_max(), 2.0);
        assert_eq!(tree.node(tree.leaf(0).unwrap()).correlation, 2.0);

        let rows = vec![
            vec!["GENE0X".to_string(), "3.5".to_string()],
            vec!["GENE1X".to_string(), String::new()],
            vec!["GENE2X".to_string(), "1.0".to_string()],
        ];
        let info = LabelInfo::new(vec!["GID".to_string(), "LEAF".to_string()], rows);
        let tree = Tree::build(&records, HeightKind::Time, &info).unwrap();
        assert_eq!(tree.corr_max(), 3.5);
        assert_eq!(tree.node(tree.leaf(0).unwrap()).correlation, 3.5);
        assert_eq!(tree.node(tree.leaf(1).unwrap()).correlation, 3.5);
        assert_eq!(tree.node(tree.leaf(2).unwrap()).correlation, 1.0);
    }

    #[test]
    fn test_ancestors() {
        let tree = four_leaf_tree();
        let root = tree.root().unwrap();
        let n1 = tree.find("NODE1X").unwrap();
        let n2 = tree.find("NODE2X").unwrap();

        assert_eq!(tree.nearest_common_ancestor(0, 1), Some(n1));
        assert_eq!(tree.nearest_common_ancestor(2, 3), Some(n2));
        assert_eq!(tree.nearest_common_ancestor(1, 2), Some(root));
        assert_eq!(tree.nearest_common_ancestor(3, 3), Some(n2));
        assert_eq!(tree.nearest_common_ancestor(0, 9), None);

        let leaf = tree.leaf(2).unwrap();
        assert_eq!(tree.closest_parent(leaf, 0.8), n2);
        assert_eq!(tree.closest_parent(leaf, 0.5), root);
        assert_eq!(tree.closest_parent(leaf, 0.1), root);
    }

    #[test]
    fn test_closest_matches_brute_force() {
        let tree = four_leaf_tree();
        let internal = tree.node_ids().filter(|&n| !tree.node(n).is_leaf()).collect::<Vec<_>>();
        for (index, corr, weight) in [(0.4, 0.95, 1.0), (2.6, 0.6, 1.0), (1.5, 0.0, 3.0), (3.0, 1.0, 0.1)] {
            let best = internal
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    let da = tree.node(a).dist(index, corr, weight);
                    let db = tree.node(b).dist(index, corr, weight);
                    da.total_cmp(&db)
                })
                .unwrap();
            assert_eq!(tree.closest(index, corr, weight), Some(best), "({index}, {corr}, {weight})");
        }
    }
}
