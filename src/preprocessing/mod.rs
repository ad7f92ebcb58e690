//! Spectral preprocessing applied before PCA.
//!
//! - [`smoothing`]: Savitzky–Golay smoothing and differentiation.
//! - [`background`] / [`remove_background`]: baseline estimation by iterative
//!   polynomial fitting or by SNIP clipping.
//! - [`index`], [`cut`], [`icut`]: nearest-value lookup and row slicing of a
//!   spectrum stored as a two-column (or wider) array whose first column is the
//!   spectral axis.
//!
//! All functions work on one spectrum; use [`crate::SpectralTable::map_spectra`]
//! to apply them to every row of a table.

mod baseline;
mod savgol;

use std::str::FromStr;

use log::debug;
use ndarray::{s, Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectraError};

/// Boundary handling for [`smoothing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMode {
    /// Convolve the interior and fit a polynomial to the first and last window
    /// to fill the edges.
    #[default]
    Interp,
    /// Reflect about the edge sample, excluding it (`d c b | a b c d | c b a`).
    Mirror,
    /// Repeat the edge sample.
    Nearest,
    /// Pad with zeros.
    Constant,
    /// Wrap around to the opposite edge.
    Wrap,
}

impl FromStr for SmoothingMode {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interp" => Ok(SmoothingMode::Interp),
            "mirror" => Ok(SmoothingMode::Mirror),
            "nearest" => Ok(SmoothingMode::Nearest),
            "constant" => Ok(SmoothingMode::Constant),
            "wrap" => Ok(SmoothingMode::Wrap),
            other => Err(SpectraError::invalid(format!(
                "mode must be 'interp', 'mirror', 'nearest', 'constant' or 'wrap', got '{}'",
                other
            ))),
        }
    }
}

/// Smooths (or differentiates) a signal with a Savitzky–Golay filter.
///
/// * `window_length` - Length of the filter window; must be a positive odd number.
/// * `polyorder` - Order of the local polynomial; must be less than `window_length`.
/// * `deriv` - Order of the derivative to compute (0 = plain smoothing), unit sample spacing.
/// * `mode` - How samples beyond the edges are obtained.
///
/// # Errors
/// `InvalidInput` for an even or zero window, for `polyorder >= window_length`,
/// and for [`SmoothingMode::Interp`] with a window longer than the signal.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use spectral_pca::preprocessing::{smoothing, SmoothingMode};
///
/// let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
/// let smoothed = smoothing(y.view(), 5, 2, 0, SmoothingMode::Interp).unwrap();
/// assert!((smoothed[3] - 4.0).abs() < 1e-9);
/// ```
pub fn smoothing(
    x: ArrayView1<'_, f64>,
    window_length: usize,
    polyorder: usize,
    deriv: usize,
    mode: SmoothingMode,
) -> Result<Array1<f64>> {
    savgol::savgol_filter(x, window_length, polyorder, deriv, mode)
}

/// Baseline estimation algorithm for [`background`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    /// Iterative polynomial fitting; `n` is the polynomial degree.
    #[default]
    Poly,
    /// Statistics-sensitive non-linear iterative peak clipping; `n` is the half-width.
    Snip,
}

impl FromStr for BackgroundKind {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "poly" => Ok(BackgroundKind::Poly),
            "snip" => Ok(BackgroundKind::Snip),
            other => Err(SpectraError::invalid(format!(
                "type must be 'poly' or 'snip', got '{}'",
                other
            ))),
        }
    }
}

/// Parameters of [`remove_background`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// Polynomial degree (`Poly`) or clipping half-width (`Snip`).
    pub n: usize,
    pub kind: BackgroundKind,
    /// Maximum number of fitting iterations (`Poly` only).
    pub max_it: usize,
    /// Relative change of the polynomial coefficients below which fitting stops (`Poly` only).
    pub tol: f64,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        BackgroundOptions {
            n: 2,
            kind: BackgroundKind::Poly,
            max_it: 100,
            tol: 1e-3,
        }
    }
}

/// Estimates the smooth background under a spectrum and returns it.
///
/// Subtract the result from `x` (or call [`remove_background`]) to obtain the
/// baseline-corrected spectrum.
pub fn background(
    x: ArrayView1<'_, f64>,
    n: usize,
    kind: BackgroundKind,
    max_it: usize,
    tol: f64,
) -> Result<Array1<f64>> {
    debug!(
        "Estimating {:?} background (n={}) for a signal of length {}.",
        kind,
        n,
        x.len()
    );
    match kind {
        BackgroundKind::Poly => baseline::polynomial_baseline(x, n, max_it, tol),
        BackgroundKind::Snip => Ok(baseline::snip(x, n)),
    }
}

/// Returns `x` minus its estimated background.
pub fn remove_background(x: ArrayView1<'_, f64>, options: &BackgroundOptions) -> Result<Array1<f64>> {
    let base = background(x, options.n, options.kind, options.max_it, options.tol)?;
    Ok(&x - &base)
}

/// Returns the row whose first-column value is nearest to `n`.
///
/// Distance is the absolute difference; on ties the first row wins.
///
/// # Errors
/// `InvalidInput` if `x` has no rows or no columns.
pub fn index(x: ArrayView2<'_, f64>, n: f64) -> Result<usize> {
    if x.ncols() == 0 {
        return Err(SpectraError::invalid(
            "cannot locate a value in an array with no columns",
        ));
    }
    nearest_index(x.column(0), n)
        .ok_or_else(|| SpectraError::invalid("cannot locate a value in an array with no rows"))
}

/// Rows between the first-column values nearest to `start` and `end` (end exclusive).
pub fn cut<'a>(x: ArrayView2<'a, f64>, start: f64, end: f64) -> Result<ArrayView2<'a, f64>> {
    let lo = index(x, start)?;
    let hi = index(x, end)?;
    Ok(icut(x, lo, hi))
}

/// Rows `start..end` by position. Bounds past the end are clamped and an
/// inverted range yields no rows.
pub fn icut<'a>(x: ArrayView2<'a, f64>, start: usize, end: usize) -> ArrayView2<'a, f64> {
    let end = end.min(x.nrows());
    let start = start.min(end);
    x.slice_move(s![start..end, ..])
}

pub(crate) fn nearest_index(values: ArrayView1<'_, f64>, n: f64) -> Option<usize> {
    values
        .iter()
        .map(|v| (v - n).abs())
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}
