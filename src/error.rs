use thiserror::Error;

/// Failure while building a dendrogram from a GTR / ATR node list.
#[derive(Error, Debug, PartialEq)]
pub enum TreeError {
    #[error("identifier {id:?} from the tree file was not found in the data table")]
    UnknownLeaf { id: String },

    #[error("tree file has no {column} column")]
    MissingColumn { column: String },

    #[error("line {line}: expected at least {expected} columns, got {found}")]
    ShortLine { line: usize, expected: usize, found: usize },

    #[error("line {line}: failed to parse branch height {value:?}")]
    BadHeight { line: usize, value: String },

    #[error("node {id:?} refers to itself")]
    SelfReference { id: String },

    #[error("tree file contains no nodes")]
    Empty,
}

/// Failure while parsing a clustered data table.
#[derive(Error, Debug, PartialEq)]
pub enum CdtError {
    #[error("data table is empty")]
    Empty,

    #[error("line {line}: expected {expected} columns, got {found}")]
    RaggedLine { line: usize, expected: usize, found: usize },

    #[error("line {line}, column {column}: failed to parse {value:?} as a number")]
    BadValue { line: usize, column: usize, value: String },
}
