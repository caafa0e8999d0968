mod colorer;
mod file;
mod node;
mod painter;

pub use colorer::{color_by_leaf_majority, color_from_annotations, leaf_colors_from_labels};
pub use file::{TreeFile, load_tree, parse_tree_file};
pub use node::{HeightKind, NodeId, NodeRecord, Tree, TreeNode};
pub use painter::{Branch, Orientation, Segment, TreePainter};
