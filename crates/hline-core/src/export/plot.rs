//! Plot rendering: `plotters` draws an SVG which `svg2pdf` turns into a PDF.

use std::path::Path;

use chrono::{DateTime, Local};
use plotters::prelude::*;

use crate::capture::CaptureLog;
use crate::error::{Error, Result};
use crate::integrate::AveragedPsd;

/// Rendered plot size in pixels.
pub const PLOT_SIZE: (u32, u32) = (1024, 640);

/// Extension of saved plot files.
pub const PLOT_EXTENSION: &str = "pdf";

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Format fractional Unix seconds as local `HH:MM:SS`.
#[must_use]
pub fn format_clock(unix_seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, reason = "plot axes stay within i64 millis")]
    let millis = (unix_seconds * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Axis range covering `values` with a little headroom; flat data gets ±1.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let span = max - min;
    if span < f64::EPSILON {
        Some((min - 1.0, max + 1.0))
    } else {
        Some((min - span * 0.05, max + span * 0.05))
    }
}

struct LinePlot<'a> {
    points: Vec<(f64, f64)>,
    x_desc: &'a str,
    y_desc: &'a str,
    color: RGBColor,
    x_formatter: Option<&'a dyn Fn(&f64) -> String>,
}

fn render_line_svg(plot: &LinePlot<'_>) -> Result<String> {
    let points: Vec<(f64, f64)> = plot
        .points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let (x0, x1) = padded_range(points.iter().map(|p| p.0)).ok_or(Error::Empty("no finite points to plot"))?;
    let (y0, y1) = padded_range(points.iter().map(|p| p.1)).ok_or(Error::Empty("no finite points to plot"))?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(plot_err)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(plot.x_desc)
            .y_desc(plot.y_desc)
            .label_style(("sans-serif", 12));
        if let Some(formatter) = plot.x_formatter {
            mesh.x_label_formatter(formatter);
        }
        mesh.draw().map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(points, &plot.color))
            .map_err(plot_err)?;
        root.present().map_err(plot_err)?;
    }
    Ok(svg)
}

/// Render the continuum log: power against local time, red line.
pub fn render_continuum_svg(log: &CaptureLog) -> Result<String> {
    let clock = |x: &f64| format_clock(*x);
    render_line_svg(&LinePlot {
        points: log.iter().map(|s| (s.unix_seconds(), s.power_db)).collect(),
        x_desc: "Local Time",
        y_desc: "Continuum Power (dB)",
        color: RED,
        x_formatter: Some(&clock),
    })
}

/// Render an averaged PSD: power against radial velocity, blue line.
pub fn render_psd_svg(psd: &AveragedPsd) -> Result<String> {
    render_line_svg(&LinePlot {
        points: psd.velocities().into_iter().zip(psd.power_db()).collect(),
        x_desc: "Relative Velocity (km/s)",
        y_desc: "Measured Power (dB)",
        color: BLUE,
        x_formatter: None,
    })
}

/// Convert a rendered SVG document into a single-page PDF.
///
/// System fonts are loaded so axis labels survive the conversion; text in
/// a family that cannot be resolved is left out of the page.
pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(plot_err)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(plot_err)
}

/// Render the continuum plot as PDF bytes.
pub fn render_continuum_pdf(log: &CaptureLog) -> Result<Vec<u8>> {
    svg_to_pdf(&render_continuum_svg(log)?)
}

/// Render the PSD plot as PDF bytes.
pub fn render_psd_pdf(psd: &AveragedPsd) -> Result<Vec<u8>> {
    svg_to_pdf(&render_psd_svg(psd)?)
}

/// Save the continuum plot to `path` as PDF.
pub fn save_continuum(path: &Path, log: &CaptureLog) -> Result<()> {
    std::fs::write(path, render_continuum_pdf(log)?)?;
    log::info!("Wrote continuum plot to {}", path.display());
    Ok(())
}

/// Save the PSD plot to `path` as PDF.
pub fn save_psd(path: &Path, psd: &AveragedPsd) -> Result<()> {
    std::fs::write(path, render_psd_pdf(psd)?)?;
    log::info!("Wrote PSD plot to {}", path.display());
    Ok(())
}
