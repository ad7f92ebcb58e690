// src/preprocessing/savgol.rs

use ndarray::{s, Array1, Array2, ArrayView1};
use ndarray_linalg::LeastSquaresSvd;

use super::SmoothingMode;
use crate::error::{Result, SpectraError};

/// Filter weights `h` such that `y[i] = sum_k h[k] * x[i + k - half]`.
///
/// The weights are the minimum-norm solution of `A h = b`, where row `o` of `A`
/// holds the window offsets raised to the power `o` and `b` selects the
/// `deriv`-th polynomial coefficient (scaled by `deriv!`).
fn savgol_coefficients(window_length: usize, polyorder: usize, deriv: usize) -> Result<Array1<f64>> {
    if deriv > polyorder {
        return Ok(Array1::zeros(window_length));
    }
    let half = (window_length / 2) as f64;
    let design = Array2::from_shape_fn((polyorder + 1, window_length), |(order, j)| {
        (j as f64 - half).powi(order as i32)
    });
    let mut target = Array1::<f64>::zeros(polyorder + 1);
    target[deriv] = (1..=deriv).map(|k| k as f64).product::<f64>();

    let fit = design.least_squares(&target)?;
    Ok(fit.solution)
}

pub(super) fn savgol_filter(
    x: ArrayView1<'_, f64>,
    window_length: usize,
    polyorder: usize,
    deriv: usize,
    mode: SmoothingMode,
) -> Result<Array1<f64>> {
    if window_length == 0 || window_length % 2 == 0 {
        return Err(SpectraError::invalid(format!(
            "window_length must be a positive odd number, got {}",
            window_length
        )));
    }
    if polyorder >= window_length {
        return Err(SpectraError::invalid(format!(
            "polyorder ({}) must be less than window_length ({})",
            polyorder, window_length
        )));
    }
    let n = x.len();
    if mode == SmoothingMode::Interp && window_length > n {
        return Err(SpectraError::invalid(format!(
            "if mode is 'interp', window_length ({}) must be less than or equal to the size of x ({})",
            window_length, n
        )));
    }
    if n == 0 {
        return Ok(Array1::zeros(0));
    }

    let weights = savgol_coefficients(window_length, polyorder, deriv)?;
    let half = (window_length / 2) as isize;

    let mut y = Array1::<f64>::zeros(n);
    for (i, out) in y.iter_mut().enumerate() {
        *out = weights
            .iter()
            .enumerate()
            .map(|(j, &w)| w * padded_sample(x, i as isize + j as isize - half, mode))
            .sum();
    }

    if mode == SmoothingMode::Interp {
        let half = window_length / 2;
        fit_edge(x, 0, window_length, 0, half, polyorder, deriv, &mut y)?;
        fit_edge(x, n - window_length, n, n - half, n, polyorder, deriv, &mut y)?;
    }
    Ok(y)
}

fn padded_sample(x: ArrayView1<'_, f64>, position: isize, mode: SmoothingMode) -> f64 {
    let n = x.len() as isize;
    if (0..n).contains(&position) {
        return x[position as usize];
    }
    match mode {
        SmoothingMode::Interp | SmoothingMode::Constant => 0.0,
        SmoothingMode::Nearest => x[position.clamp(0, n - 1) as usize],
        SmoothingMode::Wrap => x[position.rem_euclid(n) as usize],
        SmoothingMode::Mirror => {
            if n == 1 {
                return x[0];
            }
            let period = 2 * (n - 1);
            let folded = position.rem_euclid(period);
            let reflected = if folded >= n { period - folded } else { folded };
            x[reflected as usize]
        }
    }
}

/// Replaces `y[interp_start..interp_stop]` with the `deriv`-th derivative of a
/// polynomial fitted to `x[window_start..window_stop]`.
#[allow(clippy::too_many_arguments)]
fn fit_edge(
    x: ArrayView1<'_, f64>,
    window_start: usize,
    window_stop: usize,
    interp_start: usize,
    interp_stop: usize,
    polyorder: usize,
    deriv: usize,
    y: &mut Array1<f64>,
) -> Result<()> {
    let window = x.slice(s![window_start..window_stop]);
    let vandermonde = Array2::from_shape_fn((window.len(), polyorder + 1), |(t, order)| {
        (t as f64).powi(order as i32)
    });
    let coefficients = vandermonde.least_squares(&window)?.solution;

    for i in interp_start..interp_stop {
        let t = (i - window_start) as f64;
        y[i] = polynomial_derivative(coefficients.view(), deriv, t);
    }
    Ok(())
}

/// Evaluates the `deriv`-th derivative of `sum_o c[o] * t^o` at `t`.
fn polynomial_derivative(coefficients: ArrayView1<'_, f64>, deriv: usize, t: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .skip(deriv)
        .map(|(order, &c)| {
            let falling: f64 = ((order - deriv + 1)..=order).map(|k| k as f64).product();
            c * falling * t.powi((order - deriv) as i32)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_coefficients_match_classic_five_point_quadratic() {
        // Savitzky & Golay (1964), quadratic/cubic 5-point smoothing: (-3, 12, 17, 12, -3) / 35
        let weights = savgol_coefficients(5, 2, 0).unwrap();
        let expected = array![-3.0, 12.0, 17.0, 12.0, -3.0] / 35.0;
        for (w, e) in weights.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*w, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_first_derivative_weights_sum_to_zero() {
        let weights = savgol_coefficients(7, 2, 1).unwrap();
        assert_abs_diff_eq!(weights.sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interp_preserves_polynomials_up_to_polyorder() {
        let x = Array1::from_shape_fn(21, |i| {
            let t = i as f64;
            0.5 * t * t - 3.0 * t + 2.0
        });
        let y = savgol_filter(x.view(), 7, 2, 0, SmoothingMode::Interp).unwrap();
        for (a, b) in x.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_interp_first_derivative_of_line_is_its_slope() {
        let x = Array1::from_shape_fn(15, |i| 4.0 * i as f64 - 1.0);
        let y = savgol_filter(x.view(), 5, 2, 1, SmoothingMode::Interp).unwrap();
        for value in y.iter() {
            assert_abs_diff_eq!(*value, 4.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_derivative_above_polyorder_is_zero() {
        let x = Array1::from_shape_fn(9, |i| (i as f64).sin());
        let y = savgol_filter(x.view(), 5, 1, 3, SmoothingMode::Nearest).unwrap();
        assert!(y.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_padding_modes() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(padded_sample(x.view(), -1, SmoothingMode::Mirror), 2.0);
        assert_eq!(padded_sample(x.view(), 5, SmoothingMode::Mirror), 2.0);
        assert_eq!(padded_sample(x.view(), -2, SmoothingMode::Nearest), 1.0);
        assert_eq!(padded_sample(x.view(), 4, SmoothingMode::Wrap), 1.0);
        assert_eq!(padded_sample(x.view(), -1, SmoothingMode::Wrap), 4.0);
        assert_eq!(padded_sample(x.view(), 9, SmoothingMode::Constant), 0.0);
    }

    #[test]
    fn test_constant_signal_survives_every_mode_but_constant() {
        let x = Array1::from_elem(12, 3.0);
        for mode in [SmoothingMode::Interp, SmoothingMode::Mirror, SmoothingMode::Nearest, SmoothingMode::Wrap] {
            let y = savgol_filter(x.view(), 5, 2, 0, mode).unwrap();
            for value in y.iter() {
                assert_abs_diff_eq!(*value, 3.0, epsilon = 1e-9);
            }
        }
        let y = savgol_filter(x.view(), 5, 2, 0, SmoothingMode::Constant).unwrap();
        assert!(y[0] < 3.0);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let x = Array1::from_elem(10, 1.0);
        assert!(matches!(savgol_filter(x.view(), 4, 2, 0, SmoothingMode::Interp), Err(SpectraError::InvalidInput(_))));
        assert!(matches!(savgol_filter(x.view(), 0, 0, 0, SmoothingMode::Interp), Err(SpectraError::InvalidInput(_))));
        assert!(matches!(savgol_filter(x.view(), 5, 5, 0, SmoothingMode::Interp), Err(SpectraError::InvalidInput(_))));
        assert!(matches!(savgol_filter(x.view(), 11, 2, 0, SmoothingMode::Interp), Err(SpectraError::InvalidInput(_))));
        assert!(savgol_filter(x.view(), 11, 2, 0, SmoothingMode::Mirror).is_ok());
    }
}
