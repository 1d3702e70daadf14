//! Derived quantities computed over survey data.

pub mod distance;

pub use distance::{
    compute_track_distances, compute_track_distances_with, find_track_gaps, point_distance,
    DistanceError, TrackDistances, TrackOptions,
};
