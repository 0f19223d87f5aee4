//! Dense linear algebra behind the reservoir.
//!
//! Arrays stay `ndarray` everywhere else in the crate; this module converts to
//! `nalgebra` for the two things ndarray does not provide: the eigenvalues of a
//! non-symmetric matrix and least-squares solves.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{Error, Result};

const SCHUR_MAX_ITER: usize = 100_000;
const SVD_MAX_ITER: usize = 100_000;

pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

/// Largest eigenvalue modulus of a square matrix.
///
/// Uses a real Schur decomposition so complex conjugate pairs of an
/// asymmetric matrix are accounted for.
pub fn spectral_radius(a: &Array2<f64>) -> Result<f64> {
    let (rows, cols) = a.dim();
    if rows != cols || rows == 0 {
        return Err(Error::invalid_config(format!(
            "spectral radius needs a non-empty square matrix, got {rows}x{cols}"
        )));
    }

    let schur = to_dmatrix(a)
        .try_schur(f64::EPSILON, SCHUR_MAX_ITER)
        .ok_or_else(|| Error::Numerical("schur decomposition did not converge".into()))?;

    Ok(schur
        .complex_eigenvalues()
        .iter()
        .map(|l| l.norm())
        .fold(0., f64::max))
}

/// Ridge regression in closed form, `Y Xᵗ (X Xᵗ + reg I)⁻¹`.
///
/// `design` holds one sample per column, `targets` one output per row.
pub fn ridge_solve(
    design: &Array2<f64>,
    targets: &Array2<f64>,
    reg: f64,
) -> Result<Array2<f64>> {
    check_samples(design, targets)?;

    let x = to_dmatrix(design);
    let y = to_dmatrix(targets);
    let n = x.nrows();

    let gram = &x * x.transpose() + DMatrix::<f64>::identity(n, n) * reg;
    let rhs = &x * y.transpose();

    // gram is symmetric, so solving gram·Wᵗ = X·Yᵗ gives the readout transposed
    let chol = gram.cholesky().ok_or_else(|| {
        Error::Numerical(format!(
            "X·Xᵗ + {reg}·I is not positive definite, increase the regularization"
        ))
    })?;

    Ok(from_dmatrix(&chol.solve(&rhs).transpose()))
}

/// Moore-Penrose pseudo-inverse through the SVD.
///
/// Singular values below `max(rows, cols) * eps * σ_max` are treated as zero.
pub fn pseudo_inverse(a: &Array2<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = a.dim();
    let svd = to_dmatrix(a)
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITER)
        .ok_or_else(|| Error::Numerical("svd did not converge".into()))?;

    let cutoff = rows.max(cols) as f64 * f64::EPSILON * svd.singular_values.max();
    let pinv = svd
        .pseudo_inverse(cutoff)
        .map_err(|e| Error::Numerical(e.to_string()))?;

    Ok(from_dmatrix(&pinv))
}

/// Least-squares readout `Y · pinv(X)`.
pub fn pinv_solve(design: &Array2<f64>, targets: &Array2<f64>) -> Result<Array2<f64>> {
    check_samples(design, targets)?;
    Ok(targets.dot(&pseudo_inverse(design)?))
}

fn check_samples(design: &Array2<f64>, targets: &Array2<f64>) -> Result<()> {
    if design.ncols() != targets.ncols() {
        return Err(Error::invalid_config(format!(
            "design matrix has {} samples but targets have {}",
            design.ncols(),
            targets.ncols()
        )));
    }

    if design.ncols() == 0 {
        return Err(Error::insufficient_data(1, 0));
    }

    Ok(())
}
