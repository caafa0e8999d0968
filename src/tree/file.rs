// @file file.rs
// @brief GTR / ATR tree file parser

use crate::error::TreeError;
use crate::labels::LabelInfo;
use crate::tree::node::{HeightKind, NodeRecord, Tree};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

/// Parsed node list, in file order.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeFile {
    pub kind: HeightKind,
    pub records: Vec<NodeRecord>,
    /// header name of the extra per-node column (e.g. `NODECOLOR`)
    pub annotation_name: Option<String>,
}

struct Columns {
    id: usize,
    left: usize,
    right: usize,
    height: usize,
    annotation: Option<usize>,
}

impl Columns {
    fn headerless(width: usize) -> Columns {
        Columns {
            id: 0,
            left: 1,
            right: 2,
            height: 3,
            annotation: if width > 4 { Some(4) } else { None },
        }
    }

    fn min_width(&self) -> usize {
        self.id.max(self.left).max(self.right).max(self.height) + 1
    }
}

fn parse_header(fields: &[&str]) -> Result<(Columns, HeightKind, Option<String>), TreeError> {
    let find = |name: &str| fields.iter().position(|f| f.trim().eq_ignore_ascii_case(name));
    let require = |name: &str| {
        find(name).ok_or_else(|| TreeError::MissingColumn {
            column: name.to_string(),
        })
    };

    let (height, kind) = match (find("CORRELATION"), find("TIME")) {
        (Some(c), _) => (c, HeightKind::Correlation),
        (None, Some(t)) => (t, HeightKind::Time),
        (None, None) => {
            return Err(TreeError::MissingColumn {
                column: "CORRELATION".to_string(),
            });
        }
    };
    let columns = Columns {
        id: require("NODEID")?,
        left: require("LEFT")?,
        right: require("RIGHT")?,
        height,
        annotation: None,
    };
    let taken = [columns.id, columns.left, columns.right, columns.height];
    let annotation = (0..fields.len()).find(|i| !taken.contains(i));
    let name = annotation.map(|i| fields[i].trim().to_string());
    Ok((Columns { annotation, ..columns }, kind, name))
}

pub fn parse_tree_file<R: BufRead>(reader: R) -> Result<TreeFile, TreeError> {
    let mut columns = None;
    let mut kind = HeightKind::Correlation;
    let mut annotation_name = None;
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let Ok(line) = line else {
            log::warn!("line {line_no}: unreadable, skipped");
            continue;
        };
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.split('\t').collect::<Vec<_>>();

        if columns.is_none() {
            if fields[0].trim().eq_ignore_ascii_case("NODEID") {
                let (c, k, name) = parse_header(&fields)?;
                columns = Some(c);
                kind = k;
                annotation_name = name;
                continue;
            }
            columns = Some(Columns::headerless(fields.len()));
        }
        let Some(c) = columns.as_ref() else { continue };

        if fields.len() < c.min_width() {
            return Err(TreeError::ShortLine {
                line: line_no,
                expected: c.min_width(),
                found: fields.len(),
            });
        }
        let raw = fields[c.height].trim();
        let height = raw.parse::<f64>().map_err(|_| TreeError::BadHeight {
            line: line_no,
            value: raw.to_string(),
        })?;
        let annotation = c
            .annotation
            .and_then(|col| fields.get(col))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        records.push(NodeRecord {
            id: fields[c.id].trim().to_string(),
            left: fields[c.left].trim().to_string(),
            right: fields[c.right].trim().to_string(),
            height,
            annotation,
        });
    }

    if records.is_empty() {
        return Err(TreeError::Empty);
    }
    Ok(TreeFile {
        kind,
        records,
        annotation_name,
    })
}

/// Loads a GTR (rows) or ATR (columns) file and links its leaves to `leaf_labels`.
pub fn load_tree(path: &Path, leaf_labels: &LabelInfo) -> Result<Tree> {
    let file = std::fs::File::open(path).with_context(|| format!("failed to open tree file {}", path.display()))?;
    let parsed = parse_tree_file(std::io::BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))?;
    log::info!(
        "loaded {} nodes from {} ({:?})",
        parsed.records.len(),
        path.display(),
        parsed.kind
    );
    let tree = Tree::build(&parsed.records, parsed.kind, leaf_labels)
        .with_context(|| format!("failed to build the tree from {}", path.display()))?;
    Ok(tree)
}
