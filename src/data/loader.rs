//! CSV Data Loader Module
//! Handles CSV file loading and column inspection using Polars.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file contains no rows: {0}")]
    NoData(String),
}

/// Loads simulation output tables with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file into a DataFrame.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        if df.height() == 0 {
            return Err(LoaderError::NoData(file_path.display().to_string()));
        }

        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        Ok(df)
    }

    /// Get list of column names.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names, in table order.
    pub fn get_numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Check whether a column exists.
    pub fn has_column(df: &DataFrame, column: &str) -> bool {
        df.get_column_names().iter().any(|name| name.as_str() == column)
    }

    /// Get a column as `f64` values, `None` for nulls.
    pub fn get_f64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, PolarsError> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }
}

/// Column types usable as features; booleans count as 0/1.
pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Import a CSV file as a table.
pub fn import_csv_data(path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
    DataLoader::load_csv(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_headers_and_rows() {
        let file = write_csv("XYZ:0,T,Phi\n0.0,1.0,2.5\n1.0,1.0,3.5\n");
        let df = import_csv_data(file.path()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(DataLoader::get_columns(&df), vec!["XYZ:0", "T", "Phi"]);
    }

    #[test]
    fn numeric_columns_skip_strings() {
        let file = write_csv("label,Phi,vtkGhostType\na,2.5,0\nb,3.5,2\n");
        let df = import_csv_data(file.path()).unwrap();

        assert_eq!(
            DataLoader::get_numeric_columns(&df),
            vec!["Phi", "vtkGhostType"]
        );
        assert!(DataLoader::has_column(&df, "label"));
        assert!(!DataLoader::has_column(&df, "U:0"));
    }

    #[test]
    fn f64_values_cast_integers() {
        let file = write_csv("n\n1\n2\n");
        let df = import_csv_data(file.path()).unwrap();

        let values = DataLoader::get_f64_values(&df, "n").unwrap();
        assert_eq!(values, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = import_csv_data("/nonexistent/dimred/input.csv");
        assert!(result.is_err());
    }

    #[test]
    fn header_only_file_has_no_data() {
        let file = write_csv("a,b\n");
        assert!(import_csv_data(file.path()).is_err());
    }
}
