//! Loader for delimited point tables.
//!
//! A point table is a CSV file with a header row. Coordinate columns are
//! located by name; every other column is carried through untouched so the
//! table can be written back with derived columns appended.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use log::debug;
use thiserror::Error;

use crate::config::DistanceConfig;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Names of the coordinate columns of a point table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateColumns {
    pub x: String,
    pub y: String,
    /// Optional elevation column; used only when present in the table
    pub z: Option<String>,
}

impl Default for CoordinateColumns {
    fn default() -> Self {
        Self {
            x: "X".to_string(),
            y: "Y".to_string(),
            z: Some("Z".to_string()),
        }
    }
}

impl From<&DistanceConfig> for CoordinateColumns {
    fn from(config: &DistanceConfig) -> Self {
        Self {
            x: config.x_column.clone(),
            y: config.y_column.clone(),
            z: config.z_column.clone(),
        }
    }
}

/// A loaded point table.
#[derive(Debug, Clone)]
pub struct PointTable {
    /// Header row, as read.
    pub headers: StringRecord,
    /// Data rows, as read.
    pub records: Vec<StringRecord>,
    /// Parsed coordinates, one point per record (2 or 3 components).
    /// Empty or unparseable cells are NaN.
    pub points: Vec<Vec<f64>>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl PointTable {
    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table has no data rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of coordinate components per point.
    pub fn dimension(&self) -> usize {
        self.points.first().map_or(0, |p| p.len())
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Parse a numeric column; unparseable cells are NaN.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.records.iter().map(|r| parse_cell(r.get(idx))).collect())
    }
}

#[inline]
fn parse_cell(cell: Option<&str>) -> f64 {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::NAN)
}

/// Load a point table from a CSV file.
///
/// Column names are matched exactly first, then case-insensitively. The X
/// and Y columns are required; the Z column is used when present.
///
/// # Errors
///
/// Returns an error if the file cannot be read, if X or Y is missing, or if
/// the file has no data rows.
pub fn load_point_table<P: AsRef<Path>>(path: P, columns: &CoordinateColumns) -> Result<PointTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let col_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect();

    let find = |name: &str| -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .or_else(|| col_map.get(&name.to_lowercase()).copied())
    };

    let x_idx = find(&columns.x);
    let y_idx = find(&columns.y);
    let (x_idx, y_idx) = match (x_idx, y_idx) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            let mut missing = Vec::with_capacity(2);
            if x_idx.is_none() {
                missing.push(columns.x.as_str());
            }
            if y_idx.is_none() {
                missing.push(columns.y.as_str());
            }
            return Err(LoaderError::MissingColumns(missing.join(", ")));
        }
    };
    let z_idx = columns.z.as_deref().and_then(|z| find(z));

    debug!(
        "Coordinate columns in {}: x={}, y={}, z={:?}",
        path.display(),
        x_idx,
        y_idx,
        z_idx
    );

    let mut records = Vec::new();
    let mut points = Vec::new();

    for result in reader.records() {
        let record = result?;

        let mut point = vec![parse_cell(record.get(x_idx)), parse_cell(record.get(y_idx))];
        if let Some(z) = z_idx {
            point.push(parse_cell(record.get(z)));
        }

        points.push(point);
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(PointTable {
        headers,
        records,
        points,
        source_path: Some(path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_point_table_xyz() {
        let file = write_csv("Record,X,Y,Z,Comment\n1,0.0,0.0,1.5,start\n2,3.0,4.0,1.5,\n");
        let table = load_point_table(file.path(), &CoordinateColumns::default()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.dimension(), 3);
        assert_eq!(table.points[1], vec![3.0, 4.0, 1.5]);
        assert_eq!(&table.records[0][4], "start");
    }

    #[test]
    fn test_load_point_table_without_z() {
        let file = write_csv("x,y,depth\n1,2,0.3\n");
        let table = load_point_table(file.path(), &CoordinateColumns::default()).unwrap();

        // Case-insensitive fallback, Z is optional
        assert_eq!(table.dimension(), 2);
        assert_eq!(table.points[0], vec![1.0, 2.0]);
    }

    #[test]
    fn test_load_point_table_missing_cells_are_nan() {
        let file = write_csv("X,Y,Z\n1,2,3\n,5,6\n7,abc,9\n");
        let table = load_point_table(file.path(), &CoordinateColumns::default()).unwrap();

        assert!(table.points[1][0].is_nan());
        assert!(table.points[2][1].is_nan());
        assert_eq!(table.points[2][2], 9.0);
    }

    #[test]
    fn test_load_point_table_custom_columns() {
        let file = write_csv("Timestamp,X_el,Y_el,Z_el\n2024-05-30,10,20,30\n");
        let columns = CoordinateColumns {
            x: "X_el".to_string(),
            y: "Y_el".to_string(),
            z: Some("Z_el".to_string()),
        };
        let table = load_point_table(file.path(), &columns).unwrap();
        assert_eq!(table.points[0], vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_load_point_table_missing_columns() {
        let file = write_csv("Lat,Lon\n64.8,-147.7\n");
        let result = load_point_table(file.path(), &CoordinateColumns::default());

        match result {
            Err(LoaderError::MissingColumns(cols)) => assert_eq!(cols, "X, Y"),
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_load_point_table_header_only() {
        let file = write_csv("X,Y,Z\n");
        let result = load_point_table(file.path(), &CoordinateColumns::default());
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }

    #[test]
    fn test_numeric_column() {
        let file = write_csv("X,Y,Depth\n0,0,0.25\n1,1,\n");
        let table = load_point_table(file.path(), &CoordinateColumns::default()).unwrap();

        let depth = table.numeric_column("Depth").unwrap();
        assert_eq!(depth[0], 0.25);
        assert!(depth[1].is_nan());
        assert!(table.numeric_column("Nope").is_none());
    }
}
