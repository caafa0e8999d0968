// @file cdt.rs
// @brief clustered data table (CDT / PCL) loader

use crate::error::CdtError;
use crate::labels::LabelInfo;
use crate::matrix::{DataMatrix, EMPTY, NODATA};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

/// Matrix plus the annotation of both axes.
#[derive(Clone, Debug)]
pub struct CdtFile {
    pub matrix: DataMatrix,
    pub row_labels: LabelInfo,
    pub col_labels: LabelInfo,
}

impl CdtFile {
    /// Swaps rows and columns, labels included.
    pub fn transposed(&self) -> CdtFile {
        CdtFile {
            matrix: self.matrix.transposed(),
            row_labels: self.col_labels.clone(),
            col_labels: self.row_labels.clone(),
        }
    }
}

/// Number of leading annotation columns: through `GWEIGHT` if present, else `GID` + two
/// name columns, else two name columns.
fn count_row_prefixes(header: &[String]) -> usize {
    if let Some(i) = header.iter().position(|h| h.eq_ignore_ascii_case("GWEIGHT")) {
        return i + 1;
    }
    let n = if header.first().is_some_and(|h| h.eq_ignore_ascii_case("GID")) { 3 } else { 2 };
    n.min(header.len())
}

/// Number of leading annotation rows (header included): through `EWEIGHT` if present, else
/// header + `AID` row, else the header alone.
fn count_col_prefixes(lines: &[Vec<String>]) -> usize {
    let first_cell = |i: usize| lines.get(i).and_then(|l| l.first()).map(|s| s.as_str()).unwrap_or("");
    if let Some(i) = (1..lines.len()).find(|&i| first_cell(i).eq_ignore_ascii_case("EWEIGHT")) {
        return i + 1;
    }
    if first_cell(1).eq_ignore_ascii_case("AID") { 2 } else { 1 }
}

pub fn parse_cdt<R: BufRead>(reader: R) -> Result<CdtFile, CdtError> {
    let mut lines = Vec::new();
    let mut line_numbers = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let Ok(line) = line else {
            log::warn!("line {}: unreadable, skipped", i + 1);
            continue;
        };
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        lines.push(line.split('\t').map(|s| s.trim().to_string()).collect::<Vec<_>>());
        line_numbers.push(i + 1);
    }
    let Some(header) = lines.first() else {
        return Err(CdtError::Empty);
    };

    let n_prefix_cols = count_row_prefixes(header);
    let n_prefix_rows = count_col_prefixes(&lines);
    let n_col = header.len() - n_prefix_cols;
    let n_row = lines.len().saturating_sub(n_prefix_rows);
    log::debug!("{n_prefix_cols} annotation columns, {n_prefix_rows} annotation rows, {n_row} x {n_col} values");

    let row_prefixes = header[..n_prefix_cols].to_vec();
    let mut row_labels = Vec::with_capacity(n_row);
    let mut values = Vec::with_capacity(n_row * n_col);
    for (i, line) in lines.iter().enumerate().skip(n_prefix_rows) {
        let line_no = line_numbers[i];
        if line.len() > header.len() {
            return Err(CdtError::RaggedLine {
                line: line_no,
                expected: header.len(),
                found: line.len(),
            });
        }
        let mut labels = line.iter().take(n_prefix_cols).cloned().collect::<Vec<_>>();
        labels.resize(n_prefix_cols, String::new());
        row_labels.push(labels);

        for col in n_prefix_cols..header.len() {
            let value = match line.get(col).map(|s| s.as_str()) {
                // missing trailing cells do not exist at all
                None => EMPTY,
                Some("") => NODATA,
                // `inf` and `NaN` would alias the sentinels
                Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| CdtError::BadValue {
                    line: line_no,
                    column: col + 1,
                    value: s.to_string(),
                })?,
            };
            values.push(value);
        }
    }

    // column labels: one entry per annotation row, the header row carrying the names
    let col_prefixes = (0..n_prefix_rows)
        .map(|r| if r == 0 { "NAME".to_string() } else { lines[r][0].to_uppercase() })
        .collect::<Vec<_>>();
    let col_labels = (n_prefix_cols..header.len())
        .map(|c| (0..n_prefix_rows).map(|r| lines[r].get(c).cloned().unwrap_or_default()).collect())
        .collect::<Vec<Vec<String>>>();

    let matrix = DataMatrix::new(n_row, n_col, values).map_err(|_| CdtError::Empty)?;
    Ok(CdtFile {
        matrix,
        row_labels: LabelInfo::new(row_prefixes, row_labels),
        col_labels: LabelInfo::new(col_prefixes, col_labels),
    })
}

pub fn load_cdt(path: &Path) -> Result<CdtFile> {
    let file = std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let cdt = parse_cdt(std::io::BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))?;
    log::info!(
        "loaded {} x {} matrix from {}",
        cdt.matrix.n_row(),
        cdt.matrix.n_col(),
        path.display()
    );
    Ok(cdt)
}
