//! Principal component analysis, diagnostic charts and preprocessing for
//! spectroscopic (e.g. Raman) datasets.
//!
//! A typical session loads a [`SpectralTable`], cleans each spectrum with the
//! [`preprocessing`] functions, fits a [`Pca`] and inspects it through its
//! derived tables ([`Pca::explain`], [`Pca::loadings`], [`Pca::scores`]) and
//! charts ([`plot`]).
//!
//! ```no_run
//! use spectral_pca::preprocessing::{remove_background, smoothing, BackgroundOptions, SmoothingMode};
//! use spectral_pca::plot::{save_plot, ScreeOptions};
//! use spectral_pca::{Pca, SpectralTable};
//!
//! # fn main() -> spectral_pca::Result<()> {
//! let raw = SpectralTable::from_csv_path("spectra.csv")?;
//! let cleaned = raw
//!     .cut(400.0, 1800.0)?
//!     .map_spectra(|y| smoothing(y, 11, 3, 0, SmoothingMode::Interp))?
//!     .map_spectra(|y| remove_background(y, &BackgroundOptions::default()))?;
//!
//! let pca = Pca::new(&cleaned, Some(5))?;
//! println!("{}", pca.explain());
//! save_plot(&pca.scree_plot(&ScreeOptions::default())?, "figures/scree.svg")?;
//! # Ok(())
//! # }
//! ```
//!
//! The crate logs through the `log` facade and never installs a logger.

mod decomposition;
pub mod error;
pub mod pca;
pub mod plot;
pub mod preprocessing;
pub mod table;


pub use decomposition::Solver;
pub use error::{Result, SpectraError};
pub use pca::{Pca, PcaOptions};
pub use plot::{Chart, Display};
pub use table::{LabeledTable, SpectralTable};
