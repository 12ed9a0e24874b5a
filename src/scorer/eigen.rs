use super::fit::CoefficientMatrix;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use thiserror::Error;

// numpy.allclose defaults
const ALLCLOSE_RTOL: f64 = 1e-5;
const ALLCLOSE_ATOL: f64 = 1e-8;
/// Smallest accepted eigenvalue ratio of the coefficient covariance.
const MIN_RCOND: f64 = 1e-12;

/// The coefficient covariance of a candidate could not be inverted to
/// tolerance. Recoverable: the candidate is discarded.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("degenerate basis of size {size}: {reason}")]
pub struct DegenerateBasis {
    pub size: usize,
    pub reason: String,
}

/// Covariance of the fitted coefficients across replicas and its inverse.
#[derive(Debug, Clone)]
pub struct CoefficientCovariance {
    pub covariance: DMatrix<f64>,
    pub inverse: DMatrix<f64>,
}

impl CoefficientCovariance {
    /// Unbiased covariance treating rows as observations and columns as
    /// variables (`numpy.cov(c, rowvar=0)`).
    pub fn estimate(coefficients: &CoefficientMatrix) -> DMatrix<f64> {
        let c = coefficients.matrix();
        let rows = c.nrows();
        let mean = c.row_mean();
        let centered = DMatrix::from_fn(rows, c.ncols(), |i, k| c[(i, k)] - mean[k]);
        let divisor = if rows > 1 { (rows - 1) as f64 } else { 1.0 };
        (centered.transpose() * &centered) / divisor
    }

    pub fn from_coefficients(coefficients: &CoefficientMatrix) -> Result<Self, DegenerateBasis> {
        Self::invert(Self::estimate(coefficients))
    }

    pub fn invert(covariance: DMatrix<f64>) -> Result<Self, DegenerateBasis> {
        let n = covariance.nrows();
        let degenerate = |reason: String| DegenerateBasis { size: n, reason };

        let spectrum = covariance.clone().symmetric_eigenvalues();
        let max = spectrum.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = spectrum.iter().cloned().fold(f64::INFINITY, f64::min);
        if !(max > 0.0) || !(min > max * MIN_RCOND) {
            return Err(degenerate(format!(
                "coefficient covariance eigenvalues span [{:e}, {:e}]",
                min, max
            )));
        }

        let inverse = covariance
            .clone()
            .try_inverse()
            .ok_or_else(|| degenerate("coefficient covariance is singular".into()))?;
        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(degenerate("inverse has non-finite entries".into()));
        }

        let product = &covariance * &inverse;
        let mut max_deviation = 0.0f64;
        let mut within = true;
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { 1.0 } else { 0.0 };
                let diff = (product[(i, j)] - expected).abs();
                max_deviation = max_deviation.max(diff);
                if !(diff <= ALLCLOSE_ATOL + ALLCLOSE_RTOL * expected) {
                    within = false;
                }
            }
        }
        if !within {
            return Err(degenerate(format!(
                "covariance x inverse deviates from identity by {:e}",
                max_deviation
            )));
        }

        Ok(Self {
            covariance,
            inverse,
        })
    }
}

/// Hessian directions of a candidate: eigenvectors of the inverse
/// coefficient covariance, each column scaled by `1/sqrt(eigenvalue)`.
/// Column order is the decomposition's order.
#[derive(Debug, Clone)]
pub struct Eigensystem {
    pub eigenvalues: DVector<f64>,
    pub vectors: DMatrix<f64>,
}

impl Eigensystem {
    pub fn from_inverse(inverse: &DMatrix<f64>) -> Result<Self, DegenerateBasis> {
        let n = inverse.nrows();
        // Symmetric by construction up to rounding.
        let sym = (inverse + inverse.transpose()) * 0.5;
        let eigen = SymmetricEigen::new(sym);

        if let Some(bad) = eigen.eigenvalues.iter().find(|&&l| !(l > 0.0)) {
            return Err(DegenerateBasis {
                size: n,
                reason: format!("inverse covariance has eigenvalue {:e}", bad),
            });
        }

        let mut vectors = eigen.eigenvectors;
        for (mut column, &lambda) in vectors.column_iter_mut().zip(eigen.eigenvalues.iter()) {
            column /= lambda.sqrt();
        }

        Ok(Self {
            eigenvalues: eigen.eigenvalues,
            vectors,
        })
    }

    pub fn size(&self) -> usize {
        self.eigenvalues.len()
    }
}
