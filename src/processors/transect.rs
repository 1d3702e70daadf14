//! Track distance annotation of transect tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::analysis::distance::{compute_track_distances_with, find_track_gaps, TrackDistances, TrackOptions};
use crate::config::DistanceConfig;
use crate::core::loaders::{load_point_table, CoordinateColumns, PointTable};
use crate::core::writers::{write_track_table, DistanceColumns};
use crate::file::list_csv_files;

/// Errors that can occur during transect annotation.
#[derive(Debug, Error)]
pub enum TransectError {
    #[error("No CSV files found in {folder}")]
    NoFilesFound { folder: PathBuf },

    #[error("Input and output are the same file: {path}")]
    SameFile { path: PathBuf },
}

/// Outcome of annotating one table.
#[derive(Debug, Clone)]
pub struct TransectSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Number of rows
    pub points: usize,
    /// Rows with a missing coordinate
    pub missing: usize,
    /// Track length, ignoring missing steps
    pub total_distance: f64,
    /// Rows preceded by a step above the gap threshold
    pub gaps: Vec<usize>,
}

/// Outcome of a batch annotation.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub annotated: Vec<TransectSummary>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Compute track distances for a loaded table using the configured origin.
pub fn compute_table_distances(table: &PointTable, config: &DistanceConfig) -> Result<TrackDistances> {
    let options = TrackOptions {
        origin: config.origin.as_deref(),
        carry_last_valid: config.carry_last_valid,
    };
    let distances = compute_track_distances_with(&table.points, options).with_context(|| {
        match &table.source_path {
            Some(path) => format!("Failed to compute distances for {}", path.display()),
            None => "Failed to compute distances".to_string(),
        }
    })?;
    Ok(distances)
}

/// Annotate a single table with `TrackDist`, `TrackDistCum` and `DistOrigin`.
///
/// Reads `input`, computes the distances and writes the augmented table to
/// `output` (parent directories are created).
///
/// # Returns
///
/// A summary with the number of points, missing points, total distance and
/// the indices of rows preceded by a gap when a gap threshold is configured.
pub fn annotate_csv(input: &Path, output: &Path, config: &DistanceConfig) -> Result<TransectSummary> {
    if input == output {
        return Err(TransectError::SameFile {
            path: input.to_path_buf(),
        }
        .into());
    }

    let columns = CoordinateColumns::from(config);
    let table = load_point_table(input, &columns)
        .with_context(|| format!("Failed to load point table: {}", input.display()))?;

    let distances = compute_table_distances(&table, config)?;

    let gaps = match config.gap_threshold {
        Some(threshold) => {
            let gaps = find_track_gaps(&distances.step, threshold);
            if !gaps.is_empty() {
                warn!(
                    "{}: {} point(s) preceded by a step above {} (rows {:?})",
                    input.display(),
                    gaps.len(),
                    threshold,
                    gaps
                );
            }
            gaps
        }
        None => Vec::new(),
    };

    let missing = distances.origin.iter().filter(|d| d.is_nan()).count();
    if missing > 0 {
        warn!("{}: {} point(s) with missing coordinates", input.display(), missing);
    }

    write_track_table(
        output,
        &table,
        &distances,
        &DistanceColumns::with_suffix(&config.column_suffix),
    )
    .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    info!(
        "Annotated {} points: {} -> {}",
        table.len(),
        input.display(),
        output.display()
    );

    Ok(TransectSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        points: table.len(),
        missing,
        total_distance: distances.total(),
        gaps,
    })
}

/// Annotate every CSV file of `input_dir` into `output_dir`.
///
/// Files are processed in parallel and keep their file name. A file that
/// fails is logged and reported in [`BatchSummary::failed`]; it does not stop
/// the batch.
pub fn annotate_batch(
    input_dir: &Path,
    output_dir: &Path,
    config: &DistanceConfig,
    limit: Option<usize>,
) -> Result<BatchSummary> {
    let mut files = list_csv_files(input_dir)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }
    if files.is_empty() {
        return Err(TransectError::NoFilesFound {
            folder: input_dir.to_path_buf(),
        }
        .into());
    }

    info!("Annotating {} file(s) from {}", files.len(), input_dir.display());

    let results: Vec<(PathBuf, Result<TransectSummary>)> = files
        .par_iter()
        .map(|input| {
            let output = match input.file_name() {
                Some(name) => output_dir.join(name),
                None => output_dir.join("unnamed.csv"),
            };
            (input.clone(), annotate_csv(input, &output, config))
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (input, result) in results {
        match result {
            Ok(s) => summary.annotated.push(s),
            Err(e) => {
                warn!("Skipping {}: {:#}", input.display(), e);
                summary.failed.push((input, format!("{:#}", e)));
            }
        }
    }

    Ok(summary)
}
