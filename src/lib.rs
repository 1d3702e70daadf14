//! Toolkit for the SALVO snow and ice survey data.
//!
//! This crate provides tools for:
//! - Computing track distances (step, cumulative, from origin) along transects
//! - Deriving canonical SALVO names for emlid receiver logs
//! - Deriving site, date and processing-level paths from the survey tree
//! - Renaming extracted emlid log directories
//!
//! # Example
//!
//! ```
//! use salvo::analysis::compute_track_distances;
//!
//! let points = vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![3.0, 4.0]];
//! let d = compute_track_distances(&points, None).unwrap();
//! assert_eq!(d.cumulative, vec![0.0, 5.0, 5.0]);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod file;
pub mod naming;
pub mod processors;
pub mod visualization;

pub use analysis::{compute_track_distances, point_distance, TrackDistances};
pub use config::{DistanceConfig, NamingTables, PlotConfig, SalvoConfig};
pub use naming::{build_canonical_name, detect_log_type, LogType, NamingError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
