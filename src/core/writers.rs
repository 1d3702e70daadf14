//! Writer for point tables augmented with track distances.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;

use super::loaders::PointTable;
use crate::analysis::distance::TrackDistances;

/// Base names of the derived distance columns.
pub const TRACK_DIST: &str = "TrackDist";
pub const TRACK_DIST_CUM: &str = "TrackDistCum";
pub const DIST_ORIGIN: &str = "DistOrigin";

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Mismatched array lengths.
    #[error("row count mismatch: table has {rows} rows, distances have {distances} values")]
    LengthMismatch { rows: usize, distances: usize },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Names of the three derived columns, with an optional suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceColumns {
    pub step: String,
    pub cumulative: String,
    pub origin: String,
}

impl DistanceColumns {
    /// `TrackDist<suffix>`, `TrackDistCum<suffix>`, `DistOrigin<suffix>`.
    pub fn with_suffix(suffix: &str) -> Self {
        Self {
            step: format!("{}{}", TRACK_DIST, suffix),
            cumulative: format!("{}{}", TRACK_DIST_CUM, suffix),
            origin: format!("{}{}", DIST_ORIGIN, suffix),
        }
    }
}

impl Default for DistanceColumns {
    fn default() -> Self {
        Self::with_suffix("")
    }
}

/// Creates parent directories for a file path if they don't exist.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Format a distance; missing values are written as empty cells.
fn format_distance(value: f64) -> String {
    if value.is_finite() {
        format!("{:.6}", value)
    } else {
        String::new()
    }
}

/// Write a point table with the derived distance columns.
///
/// Columns already named like a derived column are dropped and the three
/// derived columns are appended at the end, so annotating a file twice is
/// stable.
///
/// # Errors
///
/// Returns an error if the number of distances differs from the number of
/// rows, or if the file cannot be created or written.
pub fn write_track_table(
    path: &Path,
    table: &PointTable,
    distances: &TrackDistances,
    columns: &DistanceColumns,
) -> Result<()> {
    if table.len() != distances.len() {
        return Err(WriteError::LengthMismatch {
            rows: table.len(),
            distances: distances.len(),
        });
    }

    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(BufWriter::new(file));

    let path_str = path.display().to_string();
    let derived = [&columns.step, &columns.cumulative, &columns.origin];

    let keep: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !derived.iter().any(|d| d.as_str() == *h))
        .map(|(i, _)| i)
        .collect();

    let mut header: StringRecord = keep.iter().map(|&i| &table.headers[i]).collect();
    for name in derived {
        header.push_field(name);
    }
    csv_writer.write_record(&header).map_err(|e| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    })?;

    for (i, record) in table.records.iter().enumerate() {
        let mut row: Vec<String> = keep
            .iter()
            .map(|&c| record.get(c).unwrap_or("").to_string())
            .collect();
        row.push(format_distance(distances.step[i]));
        row.push(format_distance(distances.cumulative[i]));
        row.push(format_distance(distances.origin[i]));

        csv_writer.write_record(&row).map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::{load_point_table, CoordinateColumns};
    use std::fs;
    use tempfile::tempdir;

    fn create_test_table() -> PointTable {
        PointTable {
            headers: StringRecord::from(vec!["Record", "X", "Y"]),
            records: vec![
                StringRecord::from(vec!["1", "0", "0"]),
                StringRecord::from(vec!["2", "3", "4"]),
            ],
            points: vec![vec![0.0, 0.0], vec![3.0, 4.0]],
            source_path: None,
        }
    }

    fn create_test_distances() -> TrackDistances {
        TrackDistances {
            step: vec![0.0, 5.0],
            cumulative: vec![0.0, 5.0],
            origin: vec![0.0, 5.0],
        }
    }

    #[test]
    fn test_write_track_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.csv");

        write_track_table(&path, &create_test_table(), &create_test_distances(), &DistanceColumns::default())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "Record,X,Y,TrackDist,TrackDistCum,DistOrigin");
        assert_eq!(lines[2], "2,3,4,5.000000,5.000000,5.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_track_table_suffix_and_nested_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("working_b").join("nested").join("track.csv");

        write_track_table(
            &path,
            &create_test_table(),
            &create_test_distances(),
            &DistanceColumns::with_suffix("_el"),
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Record,X,Y,TrackDist_el,TrackDistCum_el,DistOrigin_el"));
    }

    #[test]
    fn test_write_track_table_replaces_existing_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.csv");

        let mut table = create_test_table();
        table.headers = StringRecord::from(vec!["Record", "TrackDist", "X", "Y"]);
        table.records = vec![
            StringRecord::from(vec!["1", "99", "0", "0"]),
            StringRecord::from(vec!["2", "99", "3", "4"]),
        ];

        write_track_table(&path, &table, &create_test_distances(), &DistanceColumns::default()).unwrap();

        let reloaded = load_point_table(&path, &CoordinateColumns::default()).unwrap();
        assert_eq!(
            reloaded.headers.iter().collect::<Vec<_>>(),
            vec!["Record", "X", "Y", "TrackDist", "TrackDistCum", "DistOrigin"]
        );
        assert_eq!(reloaded.numeric_column("TrackDist").unwrap(), vec![0.0, 5.0]);
    }

    #[test]
    fn test_write_track_table_missing_values_are_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.csv");

        let distances = TrackDistances {
            step: vec![0.0, f64::NAN],
            cumulative: vec![0.0, f64::NAN],
            origin: vec![0.0, f64::NAN],
        };
        write_track_table(&path, &create_test_table(), &distances, &DistanceColumns::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().nth(2).unwrap().ends_with("4,,,"));
    }

    #[test]
    fn test_write_track_table_length_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.csv");

        let distances = TrackDistances {
            step: vec![0.0],
            cumulative: vec![0.0],
            origin: vec![0.0],
        };
        let result = write_track_table(&path, &create_test_table(), &distances, &DistanceColumns::default());

        match result.unwrap_err() {
            WriteError::LengthMismatch { rows, distances } => {
                assert_eq!(rows, 2);
                assert_eq!(distances, 1);
            }
            _ => panic!("Expected LengthMismatch error"),
        }
        assert!(!path.exists());
    }
}
