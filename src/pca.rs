// Principal component analysis (PCA) over a table of spectra

use std::time::Instant;

use log::info;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::decomposition::{decompose, Solver};
use crate::error::{Result, SpectraError};
use crate::plot::{self, Chart, LoadingsOptions, ScoresOptions, ScreeOptions};
use crate::table::{axis_labels, LabeledTable, SpectralTable};

/// Row labels of the table returned by [`Pca::explain`], in row order.
pub const EXPLAINED_VARIANCE: &str = "Explained variance";
pub const CUMULATIVE_EXPLAINED_VARIANCE: &str = "Cumulative explained variance";
pub const EXPLAINED_VARIANCE_RATIO: &str = "Explained variance ratio";
pub const CUMULATIVE_EXPLAINED_VARIANCE_RATIO: &str = "Cumulative explained variance ratio";

/// Settings for [`Pca::with_options`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaOptions {
    /// Number of components to keep; `None` keeps `min(n_samples, n_features)`.
    pub n_components: Option<usize>,
    pub solver: Solver,
}

/// A fitted principal component analysis of one [`SpectralTable`].
///
/// The decomposition runs once, in the constructor; every view is derived from
/// the stored result, so repeated calls return identical tables. The data is
/// mean-centred but not scaled.
///
/// All derived views label their components `PC1 … PCk`:
/// * [`explain`](Pca::explain): 4 × k variance summary.
/// * [`loadings`](Pca::loadings): features × k, components scaled by the
///   square root of their explained variance.
/// * [`scores`](Pca::scores): samples × k, the centred spectra projected onto
///   the components.
///
/// # Examples
///
/// ```no_run
/// use spectral_pca::{Pca, SpectralTable};
///
/// # fn run() -> spectral_pca::Result<()> {
/// let table = SpectralTable::from_csv_path("spectra.csv")?;
/// let pca = Pca::new(&table, Some(3))?;
/// println!("{}", pca.explain());
/// let chart = pca.scree_plot(&Default::default())?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Pca {
    samples: Vec<String>,
    axis: Array1<f64>,
    /// Mean spectrum of the training data. Shape: (n_features)
    mean: Array1<f64>,
    /// Unit-norm principal axes as rows. Shape: (k_components, n_features)
    components: Array2<f64>,
    /// Shape: (k_components)
    explained_variance: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
    cumulative_explained_variance: Array1<f64>,
    cumulative_explained_variance_ratio: Array1<f64>,
    singular_values: Array1<f64>,
    /// Shape: (n_samples, k_components)
    scores: Array2<f64>,
}

impl Pca {
    /// Runs PCA on `table`, keeping `n_components` components (all when `None`).
    ///
    /// # Errors
    /// `InvalidInput` if the table has no features, fewer than two samples, or
    /// if `n_components` is zero or larger than `min(n_samples, n_features)`.
    pub fn new(table: &SpectralTable, n_components: Option<usize>) -> Result<Self> {
        Self::with_options(
            table,
            &PcaOptions {
                n_components,
                ..PcaOptions::default()
            },
        )
    }

    /// Runs PCA on `table` with an explicit solver.
    pub fn with_options(table: &SpectralTable, options: &PcaOptions) -> Result<Self> {
        let (n_samples, n_features) = (table.n_samples(), table.n_features());
        if table.is_empty() {
            return Err(SpectraError::invalid(format!(
                "cannot run PCA on an empty table ({} samples x {} features)",
                n_samples, n_features
            )));
        }
        if n_samples < 2 {
            return Err(SpectraError::invalid(format!(
                "PCA needs at least 2 samples, got {}",
                n_samples
            )));
        }
        let max_components = n_samples.min(n_features);
        let k = options.n_components.unwrap_or(max_components);
        if k == 0 || k > max_components {
            return Err(SpectraError::invalid(format!(
                "n_components must be between 1 and min(n_samples, n_features) = {}, got {}",
                max_components, k
            )));
        }

        let start_time = Instant::now();
        let result = decompose(table.data(), k, &options.solver)?;

        let cumulative_explained_variance = running_sum(&result.explained_variance);
        let cumulative_explained_variance_ratio =
            running_sum(&result.explained_variance_ratio).mapv(|v| v.min(1.0));

        info!(
            "PCA kept {} of {} possible components ({:.2}% of the variance) from {} spectra x {} features in {:?}",
            k,
            max_components,
            cumulative_explained_variance_ratio[k - 1] * 100.0,
            n_samples,
            n_features,
            start_time.elapsed()
        );

        Ok(Self {
            samples: table.samples().to_vec(),
            axis: table.axis().to_owned(),
            mean: result.mean,
            components: result.components,
            explained_variance: result.explained_variance,
            explained_variance_ratio: result.explained_variance_ratio,
            cumulative_explained_variance,
            cumulative_explained_variance_ratio,
            singular_values: result.singular_values,
            scores: result.scores,
        })
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// `PC1 … PCk`.
    pub fn component_labels(&self) -> Vec<String> {
        (1..=self.n_components()).map(|i| format!("PC{}", i)).collect()
    }

    /// Variance along each component, descending.
    pub fn explained_variance(&self) -> ArrayView1<'_, f64> {
        self.explained_variance.view()
    }

    /// Fraction of the total variance explained by each component.
    pub fn explained_variance_ratio(&self) -> ArrayView1<'_, f64> {
        self.explained_variance_ratio.view()
    }

    pub fn cumulative_explained_variance(&self) -> ArrayView1<'_, f64> {
        self.cumulative_explained_variance.view()
    }

    /// Running sum of [`explained_variance_ratio`](Pca::explained_variance_ratio);
    /// never exceeds 1.
    pub fn cumulative_explained_variance_ratio(&self) -> ArrayView1<'_, f64> {
        self.cumulative_explained_variance_ratio.view()
    }

    pub fn singular_values(&self) -> ArrayView1<'_, f64> {
        self.singular_values.view()
    }

    /// Unit-norm principal axes as rows, shape (k_components, n_features).
    pub fn components(&self) -> ArrayView2<'_, f64> {
        self.components.view()
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    /// Feature axis of the training table.
    pub fn axis(&self) -> ArrayView1<'_, f64> {
        self.axis.view()
    }

    /// Sample labels of the training table, in input order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Explained variance summary: rows [`EXPLAINED_VARIANCE`],
    /// [`CUMULATIVE_EXPLAINED_VARIANCE`], [`EXPLAINED_VARIANCE_RATIO`] and
    /// [`CUMULATIVE_EXPLAINED_VARIANCE_RATIO`]; one column per component.
    pub fn explain(&self) -> LabeledTable {
        let mut values = Array2::zeros((4, self.n_components()));
        for (mut row, source) in values.rows_mut().into_iter().zip([
            &self.explained_variance,
            &self.cumulative_explained_variance,
            &self.explained_variance_ratio,
            &self.cumulative_explained_variance_ratio,
        ]) {
            row.assign(source);
        }
        LabeledTable::from_parts(
            [
                EXPLAINED_VARIANCE,
                CUMULATIVE_EXPLAINED_VARIANCE,
                EXPLAINED_VARIANCE_RATIO,
                CUMULATIVE_EXPLAINED_VARIANCE_RATIO,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            self.component_labels(),
            values,
        )
    }

    /// Loadings: `components[c, f] * sqrt(explained_variance[c])` at row `f`,
    /// column `c`. Rows are labelled with the feature axis positions.
    pub fn loadings(&self) -> LabeledTable {
        let scale = self.explained_variance.mapv(f64::sqrt);
        let values = &self.components.t() * &scale;
        LabeledTable::from_parts(
            axis_labels(self.axis.view()),
            self.component_labels(),
            values,
        )
    }

    /// Scores of the training spectra, one row per sample in input order.
    pub fn scores(&self) -> LabeledTable {
        LabeledTable::from_parts(
            self.samples.clone(),
            self.component_labels(),
            self.scores.clone(),
        )
    }

    /// Projects new spectra, recorded on the same feature axis, onto the
    /// retained components.
    ///
    /// # Errors
    /// `InvalidInput` if `table` does not have the training feature count.
    pub fn transform(&self, table: &SpectralTable) -> Result<LabeledTable> {
        if table.n_features() != self.mean.len() {
            return Err(SpectraError::invalid(format!(
                "table has {} features, PCA was fitted on {}",
                table.n_features(),
                self.mean.len()
            )));
        }
        let centered = &table.data() - &self.mean;
        let projected = centered.dot(&self.components.t());
        Ok(LabeledTable::from_parts(
            table.samples().to_vec(),
            self.component_labels(),
            projected,
        ))
    }

    /// [`plot::scree_plot`] of this result.
    pub fn scree_plot(&self, options: &ScreeOptions) -> Result<Chart> {
        plot::scree_plot(&self.explain(), options)
    }

    /// [`plot::scores_plot`] of this result.
    pub fn scores_plot(&self, options: &ScoresOptions) -> Result<Chart> {
        plot::scores_plot(&self.scores(), &self.explain(), options)
    }

    /// [`plot::loadings_plot`] of this result.
    pub fn loadings_plot(&self, options: &LoadingsOptions) -> Result<Chart> {
        plot::loadings_plot(&self.loadings(), self.axis.view(), options)
    }

    /// [`plot::loadings_plot_all`] of this result.
    pub fn loadings_plot_all(&self, options: &LoadingsOptions) -> Result<Vec<Chart>> {
        plot::loadings_plot_all(&self.loadings(), self.axis.view(), options)
    }
}

fn running_sum(values: &Array1<f64>) -> Array1<f64> {
    let mut sums = values.clone();
    sums.accumulate_axis_inplace(Axis(0), |&previous, current| *current += previous);
    sums
}
