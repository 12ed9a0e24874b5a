use crate::error::{BasisError, BgResult};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use tracing::info;

/// Pseudo-inverse of the prior covariance and its symmetric square root.
/// Null directions (constant grid points, fewer replicas than points) are
/// dropped rather than inverted.
#[derive(Debug, Clone)]
pub struct Whitening {
    pub inverse: DMatrix<f64>,
    pub sqrt_inverse: DMatrix<f64>,
    /// Eigen-directions kept above the cutoff.
    pub rank: usize,
}

/// Computes `C^+` and `(C^+)^1/2` from the symmetric eigendecomposition of
/// `C`, keeping eigenvalues above `max * eps * n` like `numpy.linalg.pinv`.
pub fn whiten(covariance: &DMatrix<f64>) -> BgResult<Whitening> {
    let n = covariance.nrows();
    if n == 0 || n != covariance.ncols() {
        return Err(BasisError::Preprocess {
            reason: format!(
                "covariance must be square and non-empty, got {}x{}",
                covariance.nrows(),
                covariance.ncols()
            ),
        });
    }
    if covariance.iter().any(|v| !v.is_finite()) {
        return Err(BasisError::Preprocess {
            reason: "covariance has non-finite entries".into(),
        });
    }

    // Symmetrize away rounding noise before the eigensolve.
    let sym = (covariance + covariance.transpose()) * 0.5;
    let eigen = SymmetricEigen::new(sym);

    let max = eigen.eigenvalues.iter().cloned().fold(0.0f64, f64::max);
    if !(max > 0.0) {
        return Err(BasisError::Preprocess {
            reason: format!(
                "covariance of {} grid points has no spread, every point is constant",
                n
            ),
        });
    }
    let cutoff = max * f64::EPSILON * n as f64;
    let keep = |l: f64| l > cutoff;

    let inv_diag = DVector::from_iterator(
        n,
        eigen
            .eigenvalues
            .iter()
            .map(|&l| if keep(l) { 1.0 / l } else { 0.0 }),
    );
    let sqrt_inv_diag = DVector::from_iterator(
        n,
        eigen
            .eigenvalues
            .iter()
            .map(|&l| if keep(l) { 1.0 / l.sqrt() } else { 0.0 }),
    );
    let rank = eigen.eigenvalues.iter().filter(|&&l| keep(l)).count();

    let v = &eigen.eigenvectors;
    let inverse = v * DMatrix::from_diagonal(&inv_diag) * v.transpose();
    let sqrt_inverse = v * DMatrix::from_diagonal(&sqrt_inv_diag) * v.transpose();

    if rank < n {
        info!(
            "🧮 Whitened {}x{} prior covariance, dropped {} null directions",
            n,
            n,
            n - rank
        );
    } else {
        info!("🧮 Whitened {}x{} prior covariance", n, n);
    }

    Ok(Whitening {
        inverse,
        sqrt_inverse,
        rank,
    })
}
