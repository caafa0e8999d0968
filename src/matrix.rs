// @file matrix.rs
// @brief row-major expression matrix with missing / empty sentinels

use anyhow::{Result, anyhow};

/// A measurement that is missing from the data set.
pub const NODATA: f64 = f64::NAN;

/// A cell that does not exist at all (e.g. padding of a ragged table).
pub const EMPTY: f64 = f64::INFINITY;

pub fn is_nodata(v: f64) -> bool {
    v.is_nan()
}

pub fn is_empty(v: f64) -> bool {
    v == EMPTY
}

pub fn is_sentinel(v: f64) -> bool {
    is_nodata(v) || is_empty(v)
}

#[derive(Clone, Debug, Default)]
pub struct DataMatrix {
    n_row: usize,
    n_col: usize,
    values: Vec<f64>,
}

impl DataMatrix {
    pub fn new(n_row: usize, n_col: usize, values: Vec<f64>) -> Result<DataMatrix> {
        if values.len() != n_row * n_col {
            return Err(anyhow!(
                "matrix of {n_row} x {n_col} needs {} values, got {}",
                n_row * n_col,
                values.len()
            ));
        }
        Ok(DataMatrix { n_row, n_col, values })
    }

    pub fn filled(n_row: usize, n_col: usize, value: f64) -> DataMatrix {
        DataMatrix {
            n_row,
            n_col,
            values: vec![value; n_row * n_col],
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<DataMatrix> {
        let n_col = rows.first().map_or(0, |r| r.len());
        if let Some(i) = rows.iter().position(|r| r.len() != n_col) {
            return Err(anyhow!("row {i} has {} columns, expected {n_col}", rows[i].len()));
        }
        Ok(DataMatrix {
            n_row: rows.len(),
            n_col,
            values: rows.concat(),
        })
    }

    pub fn n_row(&self) -> usize {
        self.n_row
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.n_row {
            return None;
        }
        Some(&self.values[row * self.n_col..(row + 1) * self.n_col])
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.n_row || col >= self.n_col {
            return None;
        }
        Some(self.values[row * self.n_col + col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.n_row || col >= self.n_col {
            return Err(anyhow!("({row}, {col}) is out of a {} x {} matrix", self.n_row, self.n_col));
        }
        self.values[row * self.n_col + col] = value;
        Ok(())
    }

    fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied().filter(|&v| !is_sentinel(v))
    }

    pub fn min_value(&self) -> Option<f64> {
        self.valid_values().reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.valid_values().reduce(f64::max)
    }

    /// Mean of `|v|` over cells that are neither missing nor empty.
    pub fn abs_mean(&self) -> Option<f64> {
        let (sum, count) = self.valid_values().fold((0.0, 0usize), |(s, c), v| (s + v.abs(), c + 1));
        if count == 0 { None } else { Some(sum / count as f64) }
    }

    pub fn transposed(&self) -> DataMatrix {
        let mut values = vec![0.0; self.values.len()];
        transpose::transpose(&self.values, &mut values, self.n_col, self.n_row);
        DataMatrix {
            n_row: self.n_col,
            n_col: self.n_row,
            values,
        }
    }
}
