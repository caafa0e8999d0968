// @file labels.rs
// @brief per-axis annotation table (GID / NAME / ... columns)

use regex::Regex;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct LabelInfo {
    prefixes: Vec<String>,
    labels: Vec<Vec<String>>,
    id_column: Option<usize>,
    id_to_index: HashMap<String, usize>,
}

impl LabelInfo {
    /// `prefixes` name the columns; every entry of `labels` holds one string per prefix.
    /// Ids are taken from the first of `GID`, `AID`, `NODEID`, or the first column.
    pub fn new(prefixes: Vec<String>, labels: Vec<Vec<String>>) -> LabelInfo {
        let id_column = ["GID", "AID", "NODEID"]
            .iter()
            .find_map(|key| prefixes.iter().position(|p| p.eq_ignore_ascii_case(key)))
            .or(if prefixes.is_empty() { None } else { Some(0) });

        let mut id_to_index = HashMap::new();
        if let Some(col) = id_column {
            for (i, row) in labels.iter().enumerate() {
                if let Some(id) = row.get(col) {
                    if id_to_index.insert(id.clone(), i).is_some() {
                        log::warn!("duplicate label id {id:?}; the last one wins");
                    }
                }
            }
        }
        LabelInfo {
            prefixes,
            labels,
            id_column,
            id_to_index,
        }
    }

    /// Labels `0..n` named by their index, for matrices loaded without annotation.
    pub fn numbered(prefix: &str, n: usize) -> LabelInfo {
        let labels = (0..n).map(|i| vec![i.to_string()]).collect();
        LabelInfo::new(vec![prefix.to_string()], labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn index_of_prefix(&self, prefix: &str) -> Option<usize> {
        self.prefixes.iter().position(|p| p.eq_ignore_ascii_case(prefix))
    }

    pub fn labels(&self, index: usize) -> Option<&[String]> {
        self.labels.get(index).map(|v| v.as_slice())
    }

    pub fn label(&self, index: usize, column: usize) -> Option<&str> {
        self.labels.get(index)?.get(column).map(|s| s.as_str())
    }

    pub fn label_by_prefix(&self, index: usize, prefix: &str) -> Option<&str> {
        self.label(index, self.index_of_prefix(prefix)?)
    }

    pub fn id(&self, index: usize) -> Option<&str> {
        self.label(index, self.id_column?)
    }

    pub fn index_of_id(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Column used for display: `NAME` if present, else the last column.
    pub fn display_column(&self) -> Option<usize> {
        self.index_of_prefix("NAME")
            .or_else(|| self.prefixes.len().checked_sub(1))
    }

    /// Indexes whose `column` matches `re`, ascending.
    pub fn find(&self, re: &Regex, column: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(column).is_some_and(|s| re.is_match(s)))
            .map(|(i, _)| i)
            .collect()
    }
}
