//! Euclidean distances along a point track.
//!
//! Given an ordered sequence of points (a transect), this module computes
//! for every point:
//! - the step distance to the previous point (`TrackDist`)
//! - the running sum of step distances (`TrackDistCum`)
//! - the distance to an origin point (`DistOrigin`)

use log::debug;
use thiserror::Error;

/// Errors that can occur during distance computation.
#[derive(Error, Debug, PartialEq)]
pub enum DistanceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for distance operations.
pub type Result<T> = std::result::Result<T, DistanceError>;

/// Per-point derived distances of a track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackDistances {
    /// Distance between point i and point i-1 (0 for the first point).
    pub step: Vec<f64>,
    /// Running sum of `step`.
    pub cumulative: Vec<f64>,
    /// Distance between point i and the origin point.
    pub origin: Vec<f64>,
}

impl TrackDistances {
    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.step.len()
    }

    /// Returns true if no point was processed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.step.is_empty()
    }

    /// Total track length, ignoring missing steps.
    pub fn total(&self) -> f64 {
        self.step.iter().filter(|d| d.is_finite()).sum()
    }
}

/// Options for [`compute_track_distances_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackOptions<'a> {
    /// Origin point; the first point of the track when `None`.
    pub origin: Option<&'a [f64]>,
    /// Measure steps from the last finite point instead of yielding NaN.
    pub carry_last_valid: bool,
}

/// Euclidean distance between two points.
///
/// Both points must have the same dimension. A one-component point is a
/// scalar and is broadcast to the dimension of the other point.
///
/// # Errors
///
/// Returns [`DistanceError::InvalidInput`] if a point is empty or if the
/// dimensions differ and neither point is a scalar.
///
/// # Example
///
/// ```
/// use salvo::analysis::distance::point_distance;
///
/// let d = point_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
/// assert_eq!(d, 5.0);
/// ```
pub fn point_distance(p1: &[f64], p2: &[f64]) -> Result<f64> {
    if p1.is_empty() || p2.is_empty() {
        return Err(DistanceError::InvalidInput(
            "points must have at least one component".to_string(),
        ));
    }

    let sum_sq: f64 = match (p1.len(), p2.len()) {
        (a, b) if a == b => p1.iter().zip(p2).map(|(a, b)| (a - b).powi(2)).sum(),
        (1, _) => p2.iter().map(|b| (p1[0] - b).powi(2)).sum(),
        (_, 1) => p1.iter().map(|a| (a - p2[0]).powi(2)).sum(),
        (a, b) => {
            return Err(DistanceError::InvalidInput(format!(
                "points must be of same dimension, got {} and {}",
                a, b
            )))
        }
    };

    Ok(sum_sq.sqrt())
}

/// Compute step, cumulative and origin distances for an ordered track.
///
/// The origin defaults to the first point. An origin with fewer components
/// than the points is zero-filled on the trailing dimensions.
///
/// # Errors
///
/// Returns [`DistanceError::InvalidInput`] if the points do not share a
/// single dimension, or if the origin has more components than the points.
///
/// # Example
///
/// ```
/// use salvo::analysis::distance::compute_track_distances;
///
/// let track = vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![3.0, 4.0]];
/// let d = compute_track_distances(&track, None).unwrap();
/// assert_eq!(d.step, vec![0.0, 5.0, 0.0]);
/// assert_eq!(d.cumulative, vec![0.0, 5.0, 5.0]);
/// assert_eq!(d.origin, vec![0.0, 5.0, 5.0]);
/// ```
pub fn compute_track_distances<P: AsRef<[f64]>>(
    points: &[P],
    origin: Option<&[f64]>,
) -> Result<TrackDistances> {
    compute_track_distances_with(
        points,
        TrackOptions {
            origin,
            carry_last_valid: false,
        },
    )
}

/// Same as [`compute_track_distances`], with missing-point handling options.
///
/// A point with a non-finite coordinate is a missing point: its step and
/// origin distances are NaN and the cumulative distance skips it (NaN at that
/// index, the following values continue from the last finite sum). With
/// `carry_last_valid`, the step of the next finite point is measured from the
/// last finite point.
pub fn compute_track_distances_with<P: AsRef<[f64]>>(
    points: &[P],
    options: TrackOptions<'_>,
) -> Result<TrackDistances> {
    let Some(first) = points.first() else {
        return Ok(TrackDistances::default());
    };

    let dim = first.as_ref().len();
    if dim == 0 {
        return Err(DistanceError::InvalidInput(
            "points must have at least one component".to_string(),
        ));
    }
    if let Some(i) = points.iter().position(|p| p.as_ref().len() != dim) {
        return Err(DistanceError::InvalidInput(format!(
            "point {} has {} components, expected {}",
            i,
            points[i].as_ref().len(),
            dim
        )));
    }

    let origin = resolve_origin(first.as_ref(), options.origin)?;

    let n = points.len();
    let mut step = Vec::with_capacity(n);
    let mut cumulative = Vec::with_capacity(n);
    let mut origin_dist = Vec::with_capacity(n);

    let mut previous: Option<&[f64]> = None;
    let mut running = 0.0;

    for (i, p) in points.iter().enumerate() {
        let p = p.as_ref();
        let missing = !is_finite_point(p);

        // First point is its own predecessor
        let predecessor = if i == 0 { Some(p) } else { previous };

        let d = match predecessor {
            Some(prev) if !missing => distance_unchecked(p, prev),
            _ => f64::NAN,
        };

        if d.is_nan() {
            cumulative.push(f64::NAN);
        } else {
            running += d;
            cumulative.push(running);
        }
        step.push(d);

        origin_dist.push(if missing {
            f64::NAN
        } else {
            distance_unchecked(p, &origin)
        });

        previous = if !missing {
            Some(p)
        } else if options.carry_last_valid {
            previous
        } else {
            None
        };
    }

    Ok(TrackDistances {
        step,
        cumulative,
        origin: origin_dist,
    })
}

/// Indices of points whose step distance exceeds `threshold`.
///
/// A large step usually means the previous measurement was skipped.
pub fn find_track_gaps(step: &[f64], threshold: f64) -> Vec<usize> {
    step.iter()
        .enumerate()
        .filter(|(_, d)| **d > threshold)
        .map(|(i, _)| i)
        .collect()
}

fn resolve_origin(first: &[f64], origin: Option<&[f64]>) -> Result<Vec<f64>> {
    let dim = first.len();
    match origin {
        None => Ok(first.to_vec()),
        Some(o) if o.is_empty() => Err(DistanceError::InvalidInput(
            "origin point must have at least one component".to_string(),
        )),
        Some(o) if o.len() > dim => Err(DistanceError::InvalidInput(format!(
            "origin point has {} components but points have {}",
            o.len(),
            dim
        ))),
        Some(o) => {
            if o.len() < dim {
                debug!(
                    "Origin point has {} components, filling {} trailing dimension(s) with 0",
                    o.len(),
                    dim - o.len()
                );
            }
            let mut padded = o.to_vec();
            padded.resize(dim, 0.0);
            Ok(padded)
        }
    }
}

#[inline]
fn is_finite_point(p: &[f64]) -> bool {
    p.iter().all(|c| c.is_finite())
}

#[inline]
fn distance_unchecked(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{} != {}", a, b);
    }

    #[test]
    fn test_point_distance_2d() {
        assert_eq!(point_distance(&[0.0, 0.0], &[3.0, 4.0]), Ok(5.0));
    }

    #[test]
    fn test_point_distance_symmetric() {
        let a = [1.5, -2.0, 7.25];
        let b = [-3.0, 4.5, 0.5];
        assert_eq!(point_distance(&a, &b), point_distance(&b, &a));
    }

    #[test]
    fn test_point_distance_scalar_broadcast() {
        // Scalar 1 against (1, 2, 3) -> sqrt(0 + 1 + 4)
        let d = point_distance(&[1.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_close(d, 5.0_f64.sqrt());
        assert_eq!(point_distance(&[1.0, 2.0, 3.0], &[1.0]), Ok(d));
    }

    #[test]
    fn test_point_distance_dimension_mismatch() {
        let result = point_distance(&[0.0, 0.0], &[1.0, 1.0, 1.0]);
        assert!(matches!(result, Err(DistanceError::InvalidInput(_))));
    }

    #[test]
    fn test_point_distance_empty() {
        assert!(point_distance(&[], &[1.0]).is_err());
    }

    #[test]
    fn test_track_example() {
        let track = vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![3.0, 4.0]];
        let d = compute_track_distances(&track, None).unwrap();

        assert_eq!(d.step, vec![0.0, 5.0, 0.0]);
        assert_eq!(d.cumulative, vec![0.0, 5.0, 5.0]);
        assert_eq!(d.origin, vec![0.0, 5.0, 5.0]);
        assert_close(d.total(), 5.0);
    }

    #[test]
    fn test_single_point_track() {
        let d = compute_track_distances(&[[12.0, -4.0, 3.0]], None).unwrap();
        assert_eq!(d.step, vec![0.0]);
        assert_eq!(d.cumulative, vec![0.0]);
        assert_eq!(d.origin, vec![0.0]);
    }

    #[test]
    fn test_empty_track() {
        let empty: Vec<[f64; 3]> = Vec::new();
        let d = compute_track_distances(&empty, None).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn test_cumulative_and_origin_invariants() {
        let track = vec![
            [0.0, 0.0, 0.0],
            [1.0, 2.0, 2.0],
            [4.0, 6.0, 2.0],
            [4.0, 6.0, -1.0],
            [-2.0, 0.5, 3.0],
        ];
        let origin = [1.0, 1.0, 1.0];
        let d = compute_track_distances(&track, Some(&origin[..])).unwrap();

        assert_eq!(d.len(), track.len());
        for i in 1..track.len() {
            assert_close(d.cumulative[i], d.cumulative[i - 1] + d.step[i]);
        }
        for (i, p) in track.iter().enumerate() {
            assert_close(d.origin[i], point_distance(p, &origin).unwrap());
        }
    }

    #[test]
    fn test_short_origin_is_zero_padded() {
        let track = vec![[0.0, 0.0, 2.0], [3.0, 4.0, 2.0]];
        let d = compute_track_distances(&track, Some(&[0.0, 0.0][..])).unwrap();

        // Origin becomes (0, 0, 0)
        assert_close(d.origin[0], 2.0);
        assert_close(d.origin[1], (25.0_f64 + 4.0).sqrt());
    }

    #[test]
    fn test_long_origin_is_rejected() {
        let track = vec![[0.0, 0.0], [1.0, 1.0]];
        let result = compute_track_distances(&track, Some(&[0.0, 0.0, 0.0][..]));
        assert!(matches!(result, Err(DistanceError::InvalidInput(_))));
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let track = vec![vec![0.0, 0.0], vec![1.0, 1.0, 1.0]];
        let result = compute_track_distances(&track, None);
        assert!(matches!(result, Err(DistanceError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_point_yields_nan() {
        let track = vec![[0.0, 0.0], [3.0, 4.0], [f64::NAN, 1.0], [6.0, 8.0]];
        let d = compute_track_distances(&track, None).unwrap();

        assert_eq!(d.step[1], 5.0);
        assert!(d.step[2].is_nan());
        assert!(d.cumulative[2].is_nan());
        assert!(d.origin[2].is_nan());
        // Predecessor is missing, step cannot be measured
        assert!(d.step[3].is_nan());
        assert_eq!(d.origin[3], 10.0);
    }

    #[test]
    fn test_missing_point_carry_last_valid() {
        let track = vec![[0.0, 0.0], [3.0, 4.0], [f64::NAN, f64::NAN], [6.0, 8.0]];
        let d = compute_track_distances_with(
            &track,
            TrackOptions {
                origin: None,
                carry_last_valid: true,
            },
        )
        .unwrap();

        assert!(d.step[2].is_nan());
        assert_eq!(d.step[3], 5.0);
        assert_eq!(d.cumulative[3], 10.0);
    }

    #[test]
    fn test_find_track_gaps() {
        let step = [0.0, 1.0, 2.5, 0.9, f64::NAN, 3.0];
        assert_eq!(find_track_gaps(&step, 1.8), vec![2, 5]);
    }
}
