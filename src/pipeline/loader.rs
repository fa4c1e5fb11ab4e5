//! Dataset loader and writer for CSV and Parquet files

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{AttritionError, Result};

/// Rows scanned to infer CSV column types
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Summary figures for a loaded table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn unsupported(extension: &str) -> AttritionError {
    AttritionError::Config(format!(
        "Unsupported file format: '{}'. Supported formats: csv, parquet",
        extension
    ))
}

/// Scan a dataset (CSV or Parquet based on extension)
pub fn scan_dataset(path: &Path) -> Result<LazyFrame> {
    if !path.exists() {
        return Err(AttritionError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let extension = extension_of(path);
    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .finish()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => return Err(unsupported(&extension)),
    };

    Ok(lf)
}

/// Load a dataset fully into memory
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    let df = scan_dataset(path)?.collect()?;
    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded dataset"
    );
    Ok(df)
}

/// Write a table as CSV or Parquet based on the extension of `path`
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = extension_of(path);
    match extension.as_str() {
        "csv" => {
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file).finish(df)?;
        }
        "parquet" => {
            let file = File::create(path)?;
            ParquetWriter::new(file).finish(df)?;
        }
        _ => return Err(unsupported(&extension)),
    }
    tracing::info!(path = %path.display(), rows = df.height(), "wrote dataset");
    Ok(())
}

pub fn dataset_stats(df: &DataFrame) -> DatasetStats {
    let (rows, columns) = df.shape();
    DatasetStats {
        rows,
        columns,
        memory_mb: df.estimated_size() as f64 / (1024.0 * 1024.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.csv");
        let mut df = df! {
            "age" => [30i64, 45],
            "poste" => ["Consultant", "Manager"],
        }
        .unwrap();

        save_dataset(&mut df, &path).unwrap();
        let back = load_dataset(&path).unwrap();
        assert_eq!(back.shape(), (2, 2));
        assert_eq!(back.get_column_names(), df.get_column_names());
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.parquet");
        let mut df = df! { "age" => [30i64, 45, 52] }.unwrap();

        save_dataset(&mut df, &path).unwrap();
        let back = load_dataset(&path).unwrap();
        assert!(back.equals(&df));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.xlsx");
        std::fs::write(&path, b"").unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, AttritionError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/employees.csv")).unwrap_err();
        assert!(matches!(err, AttritionError::Io(_)));
    }

    #[test]
    fn test_dataset_stats() {
        let df = df! { "a" => [1i64, 2, 3], "b" => [1.0f64, 2.0, 3.0] }.unwrap();
        let stats = dataset_stats(&df);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.columns, 2);
    }
}
