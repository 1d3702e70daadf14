//! Plan-view plots of survey tracks.
//!
//! Tracks are drawn as a 2D scatter (X vs Y) coloured by cumulative track
//! distance, using the plotters library.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Empty track")]
    EmptyTrack,

    #[error("length mismatch: {x} x values, {y} y values, {c} distances")]
    LengthMismatch { x: usize, y: usize, c: usize },
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Colour of the track start (cumulative distance 0).
const START_COLOR: (u8, u8, u8) = (49, 54, 149);

/// Colour of the track end.
const END_COLOR: (u8, u8, u8) = (215, 48, 39);

/// Linear blend between the start and end colours, `t` in [0, 1].
fn ramp(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        mix(START_COLOR.0, END_COLOR.0),
        mix(START_COLOR.1, END_COLOR.1),
        mix(START_COLOR.2, END_COLOR.2),
    )
}

/// Plot a track in plan view and save it as PNG.
///
/// Points with a missing coordinate are not drawn. Missing cumulative
/// distances are drawn with the start colour.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `x`, `y` - Track coordinates
/// * `cumulative` - Cumulative track distance of each point
/// * `config` - Image size and maximum number of plotted points
pub fn plot_track(
    output_path: &Path,
    x: &[f64],
    y: &[f64],
    cumulative: &[f64],
    config: &PlotConfig,
) -> Result<()> {
    if x.len() != y.len() || x.len() != cumulative.len() {
        return Err(VisualizationError::LengthMismatch {
            x: x.len(),
            y: y.len(),
            c: cumulative.len(),
        });
    }

    let n = x.len();
    let max_points = config.max_points.max(1);
    let step = if n > max_points { n.div_ceil(max_points) } else { 1 };

    let max_dist = cumulative
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);

    let points: Vec<(f64, f64, RGBColor)> = (0..n)
        .step_by(step)
        .filter(|&i| x[i].is_finite() && y[i].is_finite())
        .map(|i| {
            let t = if max_dist > 0.0 { cumulative[i] / max_dist } else { 0.0 };
            (x[i], y[i], ramp(t))
        })
        .collect();

    if points.is_empty() {
        return Err(VisualizationError::EmptyTrack);
    }

    let (x_min, x_max, y_min, y_max) = compute_bounds(&points);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(
            points.iter().map(|(x, y, _)| (*x, *y)),
            RGBColor(180, 180, 180).stroke_width(1),
        ))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|(x, y, color)| Circle::new((*x, *y), 3, color.filled())),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Compute the bounds (min/max) for x and y coordinates.
fn compute_bounds(points: &[(f64, f64, RGBColor)]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for (x, y, _) in points {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp(0.0), RGBColor(START_COLOR.0, START_COLOR.1, START_COLOR.2));
        assert_eq!(ramp(1.0), RGBColor(END_COLOR.0, END_COLOR.1, END_COLOR.2));
        assert_eq!(ramp(f64::NAN), ramp(0.0));
        assert_eq!(ramp(7.0), ramp(1.0));
    }

    #[test]
    fn test_compute_bounds_degenerate() {
        let points = vec![(2.0, 3.0, ramp(0.0)), (2.0, 3.0, ramp(1.0))];
        assert_eq!(compute_bounds(&points), (1.0, 3.0, 2.0, 4.0));
    }

    #[test]
    fn test_plot_track_rejects_bad_input() {
        let config = PlotConfig::default();
        let out = Path::new("unused.png");

        let result = plot_track(out, &[0.0, 1.0], &[0.0], &[0.0, 1.0], &config);
        assert!(matches!(result, Err(VisualizationError::LengthMismatch { .. })));

        let result = plot_track(out, &[f64::NAN], &[0.0], &[0.0], &config);
        assert!(matches!(result, Err(VisualizationError::EmptyTrack)));
    }
}
