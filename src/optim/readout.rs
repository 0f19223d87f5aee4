use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{error::Result, linalg};

/// Fits a linear map from collected states to targets.
///
/// `design` has one augmented state per column, `targets` one output per row;
/// the result maps a column of `design` to a column of `targets`.
pub trait Readout {
    fn fit(&self, design: &Array2<f64>, targets: &Array2<f64>) -> Result<Array2<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReadoutMethod {
    /// Tikhonov-regularized least squares.
    Ridge { regularization: f64 },
    /// Plain least squares through the Moore-Penrose pseudo-inverse.
    PseudoInverse,
}

impl From<Option<f64>> for ReadoutMethod {
    fn from(regularization: Option<f64>) -> Self {
        match regularization {
            Some(regularization) => Self::Ridge { regularization },
            None => Self::PseudoInverse,
        }
    }
}

impl Readout for ReadoutMethod {
    fn fit(&self, design: &Array2<f64>, targets: &Array2<f64>) -> Result<Array2<f64>> {
        match *self {
            Self::Ridge { regularization } => linalg::ridge_solve(design, targets, regularization),
            Self::PseudoInverse => linalg::pinv_solve(design, targets),
        }
    }
}
