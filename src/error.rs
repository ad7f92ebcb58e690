// src/error.rs

use thiserror::Error;

/// Errors raised by the spectral PCA toolkit.
///
/// `InvalidInput` is produced by this crate's own argument checks. Every other
/// variant carries the error of the delegated library unchanged.
#[derive(Debug, Error)]
pub enum SpectraError {
    /// A bad option value, an out-of-range component count or an empty/malformed table.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The charting backend failed while drawing.
    #[error("failed to render chart: {0}")]
    Render(String),
}

impl SpectraError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SpectraError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SpectraError>;
