// src/decomposition.rs
//
// Eigen-decomposition behind `Pca`: mean-centering, principal axes, variances and scores.

use std::time::Instant;

use log::{debug, warn};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use ndarray_linalg::{Eigh, SVDInto, QR, UPLO};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectraError};

/// Eigenvalues at or below this fraction of the largest one are treated as zero
/// when mapping Gram-matrix eigenvectors back to feature space.
const RELATIVE_EIGENVALUE_FLOOR: f64 = 1e-12;
/// Threshold for a principal axis norm to be considered non-zero.
const NORMALIZATION_THRESHOLD: f64 = 1e-12;

/// How the principal axes are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Solver {
    /// Exact eigen-decomposition of the covariance matrix (features ≤ samples)
    /// or of the Gram matrix (features > samples).
    #[default]
    Full,
    /// Randomized SVD (Halko, Martinsson & Tropp, 2011).
    ///
    /// The sketch holds `n_components + n_oversamples` random directions, refined by
    /// `n_power_iterations` QR-stabilised power iterations. The random matrix is
    /// drawn from a `ChaCha8Rng` seeded with `seed`, so results are reproducible.
    Randomized {
        n_oversamples: usize,
        n_power_iterations: usize,
        seed: u64,
    },
}

impl Solver {
    /// Randomized solver with 10 oversamples and 4 power iterations.
    pub fn randomized(seed: u64) -> Self {
        Solver::Randomized {
            n_oversamples: 10,
            n_power_iterations: 4,
            seed,
        }
    }
}

/// Raw output of one decomposition.
#[derive(Debug, Clone)]
pub(crate) struct Decomposition {
    /// Column means of the input, shape (n_features).
    pub mean: Array1<f64>,
    /// Unit-norm principal axes as rows, shape (k_components, n_features).
    pub components: Array2<f64>,
    /// Variance along each axis, descending. Shape (k_components).
    pub explained_variance: Array1<f64>,
    /// `explained_variance` divided by the total variance of the input.
    pub explained_variance_ratio: Array1<f64>,
    /// Singular values of the centered input, `sqrt(variance * (n - 1))`.
    pub singular_values: Array1<f64>,
    /// Centered input projected onto the axes, shape (n_samples, k_components).
    pub scores: Array2<f64>,
}

/// Centers `data` and extracts its `n_components` leading principal axes.
///
/// Data is centered but not scaled. Each axis is sign-normalised so that its
/// largest-magnitude entry is positive, which makes repeated runs identical.
///
/// # Errors
/// `InvalidInput` for fewer than two samples, no features, or an
/// `n_components` outside `1..=min(n_samples, n_features)`. Failures of the
/// underlying LAPACK routines are passed through.
pub(crate) fn decompose(
    data: ArrayView2<'_, f64>,
    n_components: usize,
    solver: &Solver,
) -> Result<Decomposition> {
    let (n_samples, n_features) = data.dim();
    if n_samples < 2 || n_features == 0 {
        return Err(SpectraError::invalid(format!(
            "PCA needs at least 2 samples and 1 feature, got {} x {}",
            n_samples, n_features
        )));
    }
    let max_components = n_samples.min(n_features);
    if n_components == 0 || n_components > max_components {
        return Err(SpectraError::invalid(format!(
            "n_components must be between 1 and min(n_samples, n_features) = {}, got {}",
            max_components, n_components
        )));
    }

    let start_time = Instant::now();

    // --- 1. Mean centering ---
    let mean = data
        .mean_axis(Axis(0))
        .ok_or_else(|| SpectraError::invalid("failed to compute the mean of the data"))?;
    let centered = &data - &mean;
    let degrees_of_freedom = (n_samples - 1) as f64;
    let total_variance = centered.iter().map(|v| v * v).sum::<f64>() / degrees_of_freedom;

    // --- 2. Principal axes (columns) and their variances ---
    let (mut axes, variances) = match *solver {
        Solver::Full => exact_axes(&centered, n_components)?,
        Solver::Randomized {
            n_oversamples,
            n_power_iterations,
            seed,
        } => randomized_axes(
            &centered,
            n_components,
            n_oversamples,
            n_power_iterations,
            seed,
        )?,
    };
    flip_signs(&mut axes);

    // --- 3. Derived quantities ---
    let explained_variance = variances.mapv(|v| v.max(0.0));
    let explained_variance_ratio = if total_variance > 0.0 {
        &explained_variance / total_variance
    } else {
        warn!("Input has zero total variance; explained variance ratios are reported as 0.");
        Array1::zeros(n_components)
    };
    let singular_values = explained_variance.mapv(|v| (v * degrees_of_freedom).sqrt());
    let scores = centered.dot(&axes);

    debug!(
        "Decomposed {}x{} data into {} components with {:?} in {:?}",
        n_samples,
        n_features,
        n_components,
        solver,
        start_time.elapsed()
    );

    Ok(Decomposition {
        mean,
        components: axes.reversed_axes(),
        explained_variance,
        explained_variance_ratio,
        singular_values,
        scores,
    })
}

/// Exact path. Returns axes as columns, shape (n_features, k), and their variances.
fn exact_axes(centered: &Array2<f64>, k: usize) -> Result<(Array2<f64>, Array1<f64>)> {
    let (n_samples, n_features) = centered.dim();
    let degrees_of_freedom = (n_samples - 1) as f64;

    let mut axes = Array2::<f64>::zeros((n_features, k));
    let mut variances = Array1::<f64>::zeros(k);

    if n_features <= n_samples {
        // (A) f×f covariance = Xcᵀ Xc / (n-1); its eigenvectors are the axes.
        debug!("Eigen-decomposing the {0}x{0} covariance matrix.", n_features);
        let mut covariance = centered.t().dot(centered);
        covariance /= degrees_of_freedom;
        let (values, vectors) = covariance.eigh(UPLO::Upper)?;

        for (c, &idx) in descending_order(&values).iter().take(k).enumerate() {
            axes.column_mut(c).assign(&vectors.column(idx));
            variances[c] = values[idx];
        }
    } else {
        // (B) n×n Gram matrix = Xc Xcᵀ / (n-1); the axis for eigenvector u is Xcᵀ u,
        //     renormalised to unit length.
        debug!(
            "More features ({}) than samples ({}); eigen-decomposing the Gram matrix.",
            n_features, n_samples
        );
        let mut gram = centered.dot(&centered.t());
        gram /= degrees_of_freedom;
        let (values, vectors) = gram.eigh(UPLO::Upper)?;

        let largest = values.iter().copied().fold(0.0_f64, f64::max);
        let floor = largest * RELATIVE_EIGENVALUE_FLOOR;
        for (c, &idx) in descending_order(&values).iter().take(k).enumerate() {
            variances[c] = values[idx];
            if values[idx] <= floor {
                warn!(
                    "Component {} carries no variance (rank-deficient data); its axis is set to zero.",
                    c + 1
                );
                continue;
            }
            axes.column_mut(c).assign(&centered.t().dot(&vectors.column(idx)));
        }
    }

    normalize_columns(&mut axes);
    Ok((axes, variances))
}

/// Randomized path, following the sketch-then-project strategy of the exact path:
/// tall data sketches the range of `A`, wide data sketches the range of `Aᵀ`.
fn randomized_axes(
    centered: &Array2<f64>,
    k: usize,
    n_oversamples: usize,
    n_power_iterations: usize,
    seed: u64,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let (n_samples, n_features) = centered.dim();
    let degrees_of_freedom = (n_samples - 1) as f64;
    let sketch_width = (k + n_oversamples).min(n_samples.min(n_features)).max(k);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    debug!(
        "Randomized SVD: sketch width {}, {} power iterations, seed {}.",
        sketch_width, n_power_iterations, seed
    );

    let (rotation, singular_values) = if n_features <= n_samples {
        // Y = A Ω (N×L) → Q; B = Qᵀ A (L×D); axes = rows of Vᵀ from B = U S Vᵀ.
        let omega: Array2<f64> =
            Array2::from_shape_fn((n_features, sketch_width), |_| rng.sample(StandardNormal));
        let mut q_basis = orthonormal_basis(centered.dot(&omega))?;
        for _ in 0..n_power_iterations {
            let w_basis = orthonormal_basis(centered.t().dot(&q_basis))?;
            q_basis = orthonormal_basis(centered.dot(&w_basis))?;
        }
        let projected = q_basis.t().dot(centered);
        let (_, s_values, vt) = projected.svd_into(false, true)?;
        let vt = vt.ok_or_else(|| SpectraError::invalid("SVD of the sketch returned no Vᵀ"))?;
        (vt.t().to_owned(), s_values)
    } else {
        // Y = Aᵀ Ω (D×L) → Q; B = (A Q)ᵀ (L×N); axes = Q U from B = U S Vᵀ.
        let omega: Array2<f64> =
            Array2::from_shape_fn((n_samples, sketch_width), |_| rng.sample(StandardNormal));
        let mut q_basis = orthonormal_basis(centered.t().dot(&omega))?;
        for _ in 0..n_power_iterations {
            let w_basis = orthonormal_basis(centered.dot(&q_basis))?;
            q_basis = orthonormal_basis(centered.t().dot(&w_basis))?;
        }
        let projected = centered.dot(&q_basis).t().to_owned();
        let (u, s_values, _) = projected.svd_into(true, false)?;
        let u = u.ok_or_else(|| SpectraError::invalid("SVD of the sketch returned no U"))?;
        (q_basis.dot(&u), s_values)
    };

    let recovered = rotation.ncols().min(singular_values.len());
    if recovered < k {
        return Err(SpectraError::invalid(format!(
            "randomized sketch recovered only {} of {} requested components",
            recovered, k
        )));
    }

    let mut axes = rotation.slice(s![.., ..k]).to_owned();
    normalize_columns(&mut axes);
    let variances = singular_values
        .slice(s![..k])
        .mapv(|s_val| s_val * s_val / degrees_of_freedom);
    Ok((axes, variances))
}

fn orthonormal_basis(matrix: Array2<f64>) -> Result<Array2<f64>> {
    let (q_factor, _r) = matrix.qr()?;
    Ok(q_factor)
}

/// Indices of `values` sorted by descending value; equal values keep their order.
fn descending_order(values: &Array1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}

fn normalize_columns(axes: &mut Array2<f64>) {
    for mut column in axes.columns_mut() {
        let norm = column.dot(&column).sqrt();
        if norm > NORMALIZATION_THRESHOLD {
            column.mapv_inplace(|v| v / norm);
        } else {
            column.fill(0.0);
        }
    }
}

/// Flips each axis so that its largest-magnitude entry is positive.
fn flip_signs(axes: &mut Array2<f64>) {
    for mut column in axes.columns_mut() {
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
        if pivot < 0.0 {
            column.mapv_inplace(|v| -v);
        }
    }
}
