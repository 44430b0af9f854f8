//! SVG chart rendering with plotters
//!
//! Surfaces are drawn in 3D with strike on x, days to expiry on z and the grid
//! value on the vertical axis. Single expiry slices are drawn as 2D line charts.

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{OptionsError, OptionsResult};
use crate::surface::SurfaceGrid;

/// Rendering options shared by all charts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Extra caption line, e.g. "Spot: $100.00, Vol: 20.0%, Rate: 5.0%"
    pub subtitle: Option<String>,
    /// (strike, days, value) of the option to highlight
    pub highlight: Option<(f64, f64, f64)>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 768,
            subtitle: None,
            highlight: None,
        }
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> OptionsError {
    OptionsError::chart(e.to_string())
}

/// Pad a value range so flat surfaces still get a drawable axis.
fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span.abs() < 1e-9 {
        let pad = (lo.abs() * 0.05).max(1.0);
        (lo - pad, hi + pad)
    } else {
        (lo - span * 0.05, hi + span * 0.05)
    }
}

/// Blue (low) to yellow (high) gradient for `t` in [0, 1].
fn heat_color(t: f64) -> RGBColor {
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(68.0, 253.0), lerp(1.0, 231.0), lerp(84.0, 37.0))
}

/// Reject grids whose values do not line up with their axes.
fn check_shape(grid: &SurfaceGrid) -> OptionsResult<()> {
    if grid.values.len() != grid.days.len() {
        return Err(OptionsError::chart(format!(
            "Grid has {} value rows for {} expiries",
            grid.values.len(),
            grid.days.len()
        )));
    }
    if let Some((i, row)) = grid
        .values
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != grid.strikes.len())
    {
        return Err(OptionsError::chart(format!(
            "Grid row {} has {} values for {} strikes",
            i,
            row.len(),
            grid.strikes.len()
        )));
    }
    Ok(())
}

fn caption(grid: &SurfaceGrid, options: &ChartOptions) -> String {
    match &options.subtitle {
        Some(sub) => format!("{} | {}", grid.title, sub),
        None => grid.title.clone(),
    }
}

/// Draw the full grid as a 3D surface.
pub fn render_surface_svg(
    grid: &SurfaceGrid,
    path: impl AsRef<Path>,
    options: &ChartOptions,
) -> OptionsResult<()> {
    check_shape(grid)?;
    let (rows, cols) = grid.shape();
    if rows < 2 || cols < 2 {
        return Err(OptionsError::chart(format!(
            "Surface needs at least a 2x2 grid, got {}x{}",
            rows, cols
        )));
    }

    let path = path.as_ref();
    let kind = grid.kind;
    let (lo, hi) = grid.value_range();
    let (y_min, y_max) = padded_range(kind.display(lo), kind.display(hi));
    let x_range = grid.strikes[0]..grid.strikes[cols - 1];
    let z_range = grid.days[0]..grid.days[rows - 1];

    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(caption(grid, options), ("sans-serif", 26))
        .build_cartesian_3d(x_range, y_min..y_max, z_range)
        .map_err(chart_err)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.8;
        pb.pitch = 0.35;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.15))
        .max_light_lines(4)
        .draw()
        .map_err(chart_err)?;

    // SurfaceSeries hands back the axis values it was given
    let lookup = |strike: f64, day: f64| -> f64 {
        let j = grid.strikes.iter().position(|&s| s == strike);
        let i = grid.days.iter().position(|&d| d == day);
        i.zip(j)
            .and_then(|(i, j)| grid.value(i, j))
            .map_or(y_min, |v| kind.display(v))
    };

    chart
        .draw_series(
            SurfaceSeries::xoz(
                grid.strikes.iter().copied(),
                grid.days.iter().copied(),
                lookup,
            )
            .style_func(&|&v| {
                let t = if y_max > y_min {
                    ((v - y_min) / (y_max - y_min)).clamp(0.0, 1.0)
                } else {
                    0.5
                };
                heat_color(t).mix(0.8).filled()
            }),
        )
        .map_err(chart_err)?;

    if let Some((strike, day, value)) = options.highlight {
        chart
            .draw_series(std::iter::once(Circle::new(
                (strike, kind.display(value), day),
                6,
                RED.filled(),
            )))
            .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    info!(path = %path.display(), rows, cols, "surface chart written");
    Ok(())
}

/// Draw one expiry slice (value vs strike) as a 2D line chart.
pub fn render_smile_svg(
    grid: &SurfaceGrid,
    expiry_index: usize,
    path: impl AsRef<Path>,
    options: &ChartOptions,
) -> OptionsResult<()> {
    check_shape(grid)?;
    let kind = grid.kind;
    let points: Vec<(f64, f64)> = grid
        .smile_at(expiry_index)
        .ok_or_else(|| {
            OptionsError::chart(format!(
                "Expiry index {} out of range ({} expiries)",
                expiry_index,
                grid.days.len()
            ))
        })?
        .into_iter()
        .map(|(strike, value)| (strike, kind.display(value)))
        .collect();
    if points.len() < 2 {
        return Err(OptionsError::chart("Slice needs at least 2 strikes"));
    }

    let path = path.as_ref();
    let (y_lo, y_hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
            (lo.min(v), hi.max(v))
        });
    let (y_min, y_max) = padded_range(y_lo, y_hi);
    let x_min = points[0].0;
    let x_max = points[points.len() - 1].0;

    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!(
                "{} | {:.0} days to expiry",
                caption(grid, options),
                grid.days[expiry_index]
            ),
            ("sans-serif", 26),
        )
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Strike Price ($)")
        .y_desc(kind.z_label())
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))
        .map_err(chart_err)?;
    chart
        .draw_series(points.iter().map(|&pt| Circle::new(pt, 3, BLUE.filled())))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!(path = %path.display(), expiry_index, "smile chart written");
    Ok(())
}
