//! Numeric feature matrix extracted from a table.

use polars::prelude::*;

use super::loader::{is_numeric, DataLoader};

/// Dense row-major matrix of `f64` features with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    n_rows: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Build a matrix from rows. All rows must have `names.len()` entries.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Option<Self> {
        let n_cols = names.len();
        if rows.iter().any(|row| row.len() != n_cols) {
            return None;
        }
        Some(Self {
            names,
            n_rows: rows.len(),
            values: rows.iter().flatten().copied().collect(),
        })
    }

    /// Build a matrix from the numeric columns of a table.
    ///
    /// Non-numeric columns are skipped. A null or NaN in a numeric column is
    /// rejected with `FeatureError::MissingValues`.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, FeatureError> {
        let skipped: Vec<&str> = df
            .get_columns()
            .iter()
            .filter(|col| !is_numeric(col.dtype()))
            .map(|col| col.name().as_str())
            .collect();
        if !skipped.is_empty() {
            log::warn!("Skipping non-numeric columns: {:?}", skipped);
        }

        let names = DataLoader::get_numeric_columns(df);
        let n_rows = df.height();
        let n_cols = names.len();
        let mut values = vec![0.0; n_rows * n_cols];

        for (j, name) in names.iter().enumerate() {
            let column = DataLoader::get_f64_values(df, name)?;
            for (i, value) in column.into_iter().enumerate() {
                match value {
                    Some(v) if !v.is_nan() => values[i * n_cols + j] = v,
                    _ => return Err(FeatureError::MissingValues(name.clone())),
                }
            }
        }

        Ok(Self {
            names,
            n_rows,
            values,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[i * n_cols..(i + 1) * n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on 0
        self.values.chunks_exact(self.n_cols().max(1))
    }

    /// Copy out column `j`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|row| row[j]).collect()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FeatureError {
    #[error("Column {0} contains missing values")]
    MissingValues(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numeric_columns_row_major() {
        let df = df!(
            "U:0" => [1.0, 2.0, 3.0],
            "label" => ["a", "b", "c"],
            "n" => [10i64, 20, 30]
        )
        .unwrap();

        let matrix = FeatureMatrix::from_dataframe(&df).unwrap();

        assert_eq!(matrix.names(), &["U:0".to_string(), "n".to_string()]);
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.row(1), &[2.0, 20.0]);
        assert_eq!(matrix.column(1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn boolean_columns_become_zero_one() {
        let df = df!("a" => [0.5, 1.5, 2.5], "flag" => [true, false, true]).unwrap();

        let matrix = FeatureMatrix::from_dataframe(&df).unwrap();

        assert_eq!(matrix.names(), &["a".to_string(), "flag".to_string()]);
        assert_eq!(matrix.column(1), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn null_values_are_rejected() {
        let df = df!("Phi" => [Some(1.0), None, Some(3.0)]).unwrap();

        let err = FeatureMatrix::from_dataframe(&df).unwrap_err();
        assert!(matches!(err, FeatureError::MissingValues(ref c) if c == "Phi"));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(FeatureMatrix::from_rows(names.clone(), &[vec![1.0, 2.0], vec![3.0]]).is_none());
        let matrix = FeatureMatrix::from_rows(names, &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(matrix.rows().count(), 2);
    }
}
