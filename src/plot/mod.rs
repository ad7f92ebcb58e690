//! Diagnostic charts for PCA results and spectra.
//!
//! Figure functions ([`scree_plot`], [`scores_plot`], [`loadings_plot`],
//! [`loadings_plot_all`], [`line_plot`]) read the derived views produced by
//! [`crate::Pca`] and return a [`Chart`]: a plain, serializable description of
//! what to draw. A chart is rendered to SVG with [`Chart::to_svg`], shown in a
//! notebook kernel with [`Chart::evcxr_display`], or written to disk with
//! [`save_plot`].

mod figures;
mod render;
mod save;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectraError};

pub use figures::{
    line_plot, loadings_plot, loadings_plot_all, scores_plot, scree_plot, LineOptions,
    LoadingsOptions, ScoresOptions, ScreeOptions, ScreeShow,
};
pub use save::{save_plot, save_plot_with};

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The ten-colour qualitative cycle used when no colour is given.
pub const DEFAULT_PALETTE: [Rgb; 10] = [
    Rgb(31, 119, 180),
    Rgb(255, 127, 14),
    Rgb(44, 160, 44),
    Rgb(214, 39, 40),
    Rgb(148, 103, 189),
    Rgb(140, 86, 75),
    Rgb(227, 119, 194),
    Rgb(127, 127, 127),
    Rgb(188, 189, 34),
    Rgb(23, 190, 207),
];

pub(crate) fn palette_color(i: usize) -> Rgb {
    DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()]
}

/// Point marker drawn at every data point of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    None,
    Circle,
    Square,
    Triangle,
    Cross,
}

impl FromStr for Marker {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "none" => Ok(Marker::None),
            "o" | "circle" => Ok(Marker::Circle),
            "s" | "square" => Ok(Marker::Square),
            "^" | "triangle" => Ok(Marker::Triangle),
            "x" | "cross" => Ok(Marker::Cross),
            other => Err(SpectraError::invalid(format!(
                "marker must be 'none', 'circle', 'square', 'triangle' or 'cross', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Points joined by a line, with optional markers.
    Line,
    /// Markers only.
    Scatter,
}

/// One data series of a [`Chart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub kind: SeriesKind,
    /// Legend entry; unlabelled series are left out of the legend.
    pub label: Option<String>,
    pub color: Rgb,
    pub marker: Marker,
    /// Marker radius in pixels.
    pub marker_size: u32,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    pub points: Vec<(f64, f64)>,
}

/// Text placed in data coordinates, horizontally centred with its bottom edge at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: u32,
    pub alpha: f64,
}

/// One axis of a [`Chart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAxis {
    pub label: String,
    pub range: (f64, f64),
    /// Categorical labels for the integer positions `0, 1, ...`; numeric ticks when `None`.
    pub tick_labels: Option<Vec<String>>,
}

impl ChartAxis {
    pub(crate) fn numeric(label: impl Into<String>, range: (f64, f64)) -> Self {
        ChartAxis {
            label: label.into(),
            range,
            tick_labels: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    UpperLeft,
    #[default]
    UpperRight,
    LowerLeft,
    LowerRight,
}

/// A declarative chart: everything needed to draw it, nothing backend specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    /// Size in pixels, `(width, height)`.
    pub size: (u32, u32),
    pub x_axis: ChartAxis,
    pub y_axis: ChartAxis,
    pub series: Vec<Series>,
    pub annotations: Vec<Annotation>,
    /// Where to draw the legend; no legend when `None`.
    pub legend: Option<LegendPosition>,
}

impl Chart {
    /// Serializes the chart model as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What a figure function does with the chart it builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    /// Only return the chart.
    #[default]
    Return,
    /// Also emit it to the notebook kernel through [`Chart::evcxr_display`].
    Inline,
}

pub(crate) fn finish(chart: Chart, display: Display) -> Result<Chart> {
    if display == Display::Inline {
        chart.evcxr_display()?;
    }
    Ok(chart)
}

/// Spacing of "nice" ticks (1, 2, 2.5 or 5 times a power of ten) covering
/// `span` with at most `max_ticks` intervals.
pub(crate) fn tick_spacing(span: f64, max_ticks: usize) -> f64 {
    if !(span.is_finite() && span > 0.0) || max_ticks == 0 {
        return 1.0;
    }
    let raw = span / max_ticks as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|step| *step >= residual - 1e-12)
        .unwrap_or(10.0);
    nice * magnitude
}

/// Expands `(lo, hi)` by `fraction` of its span on both sides; a degenerate
/// range is widened to unit width.
pub(crate) fn with_margins(lo: f64, hi: f64, fraction: f64) -> (f64, f64) {
    let span = hi - lo;
    if span.abs() < f64::EPSILON * lo.abs().max(1.0) {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - span * fraction, hi + span * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tick_spacing_picks_nice_steps() {
        assert_abs_diff_eq!(tick_spacing(112.5, 8), 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tick_spacing(1.0, 8), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(tick_spacing(9.0, 8), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tick_spacing(20.0, 8), 2.5, epsilon = 1e-12);
        assert_eq!(tick_spacing(0.0, 8), 1.0);
    }

    #[test]
    fn test_with_margins() {
        assert_eq!(with_margins(0.0, 10.0, 0.1), (-1.0, 11.0));
        assert_eq!(with_margins(3.0, 3.0, 0.1), (2.5, 3.5));
    }

    #[test]
    fn test_marker_parsing() {
        assert_eq!("o".parse::<Marker>().unwrap(), Marker::Circle);
        assert_eq!("square".parse::<Marker>().unwrap(), Marker::Square);
        assert!(matches!("hexagon".parse::<Marker>(), Err(SpectraError::InvalidInput(_))));
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), palette_color(10));
        assert_ne!(palette_color(0), palette_color(1));
    }
}
