// src/preprocessing/baseline.rs

use log::trace;
use ndarray::{s, Array1, Array2, ArrayView1};
use ndarray_linalg::{LeastSquaresSvd, Norm};

use crate::error::{Result, SpectraError};

/// Iterative polynomial baseline.
///
/// Each pass fits a polynomial of the given degree to the working signal, then
/// clips the working signal to that fit so peaks stop pulling the baseline up.
/// Fitting stops once the relative change of the coefficient vector drops below
/// `tol`, or after `max_it` passes.
///
/// The abscissa spans `[0, max|x|^(1/(degree+1))]` to keep the Vandermonde
/// matrix reasonably conditioned.
pub(super) fn polynomial_baseline(
    x: ArrayView1<'_, f64>,
    degree: usize,
    max_it: usize,
    tol: f64,
) -> Result<Array1<f64>> {
    let n = x.len();
    if n == 0 {
        return Err(SpectraError::invalid(
            "cannot estimate the background of an empty signal",
        ));
    }

    let order = degree + 1;
    let peak = x.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let span = peak.powf(1.0 / order as f64);
    let positions = Array1::linspace(0.0, span, n);
    let vandermonde = Array2::from_shape_fn((n, order), |(i, power)| {
        positions[i].powi((order - 1 - power) as i32)
    });

    let mut working = x.to_owned();
    let mut coefficients = Array1::<f64>::ones(order);
    let mut base = working.clone();

    for iteration in 0..max_it {
        let fitted = vandermonde.least_squares(&working)?.solution;
        let change = (&fitted - &coefficients).norm_l2() / coefficients.norm_l2();
        if change < tol {
            trace!("Polynomial baseline converged after {} iterations.", iteration);
            break;
        }
        coefficients = fitted;
        base = vandermonde.dot(&coefficients);
        working.zip_mut_with(&base, |w, &b| *w = w.min(b));
    }

    Ok(base)
}

/// SNIP background: for half-widths `width, width-1, ..., 1`, every interior
/// sample is replaced by the mean of its two neighbours at that distance when
/// the mean is lower.
pub(super) fn snip(x: ArrayView1<'_, f64>, width: usize) -> Array1<f64> {
    let n = x.len();
    let mut data = x.to_owned();
    let mut work = data.clone();

    for p in (1..=width).rev() {
        if 2 * p >= n {
            continue;
        }
        for i in p..n - p {
            let mean = (data[i - p] + data[i + p]) / 2.0;
            let current = data[i];
            work[i] = if mean < current { mean } else { current };
        }
        data.slice_mut(s![p..n - p]).assign(&work.slice(s![p..n - p]));
    }
    data
}
