//! Directory listing helpers.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while listing files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Return every file below `path`, recursively, sorted by path.
pub fn list_files_recursive(path: &Path) -> Result<Vec<PathBuf>, FileError> {
    if !path.is_dir() {
        return Err(FileError::DirectoryNotFound(path.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Keep the files whose last extension is one of `extensions`.
///
/// Extensions are given without the leading dot and compared ASCII
/// case-insensitively.
pub fn select_extension<S: AsRef<str>>(files: &[PathBuf], extensions: &[S]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|e| e.as_ref().eq_ignore_ascii_case(ext)))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// CSV files directly inside `dir`, sorted.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, FileError> {
    if !dir.is_dir() {
        return Err(FileError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut csv_files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    csv_files = select_extension(&csv_files, &["csv"]);
    csv_files.sort();
    Ok(csv_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap();
    }

    #[test]
    fn test_list_files_recursive() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("b.csv"));
        touch(&temp_dir.path().join("sub/a.ubx"));
        touch(&temp_dir.path().join("sub/deeper/c.pos"));

        let files = list_files_recursive(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("b.csv"));
        assert!(files.iter().any(|f| f.ends_with("sub/deeper/c.pos")));
    }

    #[test]
    fn test_list_files_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_files_recursive(&temp_dir.path().join("nope"));
        assert!(matches!(result, Err(FileError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_select_extension() {
        let files = vec![
            PathBuf::from("a/log.UBX"),
            PathBuf::from("a/log.ubx.zip"),
            PathBuf::from("a/events.pos"),
            PathBuf::from("a/README"),
        ];
        let selected = select_extension(&files, &["ubx", "pos"]);
        assert_eq!(
            selected,
            vec![PathBuf::from("a/log.UBX"), PathBuf::from("a/events.pos")]
        );
    }

    #[test]
    fn test_list_csv_files_not_recursive() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("z.csv"));
        touch(&temp_dir.path().join("a.CSV"));
        touch(&temp_dir.path().join("notes.txt"));
        touch(&temp_dir.path().join("sub/inner.csv"));

        let files = list_csv_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.CSV"));
    }
}
