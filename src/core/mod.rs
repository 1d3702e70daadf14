//! Core data types and I/O operations.

pub mod loaders;
pub mod writers;

pub use loaders::{load_point_table, CoordinateColumns, LoaderError, PointTable};
pub use writers::{ensure_parent_dirs, write_track_table, DistanceColumns, WriteError};
