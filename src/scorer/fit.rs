use crate::ensemble::{BasisView, EnsembleAccessor};
use crate::error::{BasisError, BgResult, FitError};
use nalgebra::{DMatrix, DVector, SVD};
use rayon::prelude::*;

const SVD_MAX_ITERS: usize = 10_000;

/// Whitened deviations of the basis members from the prior central value,
/// `points x n`.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    a: DMatrix<f64>,
}

impl DesignMatrix {
    pub fn build(
        view: &BasisView,
        reference: &[f64],
        sqrt_inverse: &DMatrix<f64>,
    ) -> Result<Self, FitError> {
        let points = view.points;
        let n = view.size();
        if n > points {
            return Err(FitError::Underdetermined {
                basis_size: n,
                grid_points: points,
            });
        }
        if sqrt_inverse.nrows() != points || sqrt_inverse.ncols() != points {
            return Err(FitError::Shape {
                replica: 0,
                got: sqrt_inverse.nrows(),
                expected: points,
            });
        }

        let raw = DMatrix::from_fn(points, n, |p, k| view.member(k)[p] - reference[p]);
        Ok(Self {
            a: sqrt_inverse * raw,
        })
    }

    pub fn rows(&self) -> usize {
        self.a.nrows()
    }

    pub fn cols(&self) -> usize {
        self.a.ncols()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.a
    }
}

/// One row of least-squares coefficients per full-ensemble replica, `N x n`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientMatrix {
    c: DMatrix<f64>,
}

impl CoefficientMatrix {
    /// Rows must all have length `n`; row order is replica order.
    pub fn from_rows(rows: &[DVector<f64>], n: usize) -> Result<Self, FitError> {
        if let Some((replica, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(FitError::Shape {
                replica: replica + 1,
                got: row.len(),
                expected: n,
            });
        }
        Ok(Self {
            c: DMatrix::from_fn(rows.len(), n, |i, k| rows[i][k]),
        })
    }

    pub fn from_matrix(c: DMatrix<f64>) -> Self {
        Self { c }
    }

    pub fn replicas(&self) -> usize {
        self.c.nrows()
    }

    pub fn basis_size(&self) -> usize {
        self.c.ncols()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.c
    }
}

/// Solves every replica against the candidate basis on a dedicated pool.
pub struct BasisFitter {
    pool: rayon::ThreadPool,
}

impl BasisFitter {
    pub fn new(threads: usize) -> BgResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("basisga-fit-{}", i))
            .build()
            .map_err(|e| BasisError::ThreadPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn fit(
        &self,
        ensemble: &dyn EnsembleAccessor,
        view: &BasisView,
        sqrt_inverse: &DMatrix<f64>,
    ) -> Result<CoefficientMatrix, FitError> {
        let reference = ensemble.central_value();
        let design = DesignMatrix::build(view, reference, sqrt_inverse)?;
        let (rows, cols) = (design.rows(), design.cols());

        let svd = SVD::try_new(design.a, true, true, f64::EPSILON, SVD_MAX_ITERS)
            .ok_or(FitError::NoConvergence { rows, cols })?;
        let sigma_max = svd.singular_values.iter().cloned().fold(0.0, f64::max);
        let cutoff = f64::EPSILON * rows.max(cols) as f64 * sigma_max;

        let n_rep = ensemble.total_replica_count();

        // Each task reads shared data and returns its own row; collect keeps
        // replica order regardless of completion order.
        let solved: Vec<DVector<f64>> = self.pool.install(|| {
            (0..n_rep)
                .into_par_iter()
                .map(|i| {
                    let values = ensemble.replica_values(i);
                    if values.len() != rows {
                        return Err(FitError::Shape {
                            replica: i + 1,
                            got: values.len(),
                            expected: rows,
                        });
                    }
                    let deviation = DVector::from_fn(rows, |p, _| values[p] - reference[p]);
                    let b = sqrt_inverse * deviation;
                    let coeffs = svd
                        .solve(&b, cutoff)
                        .map_err(|_| FitError::NoConvergence { rows, cols })?;
                    if coeffs.iter().any(|c| !c.is_finite()) {
                        return Err(FitError::NonFinite { replica: i + 1 });
                    }
                    Ok(coeffs)
                })
                .collect::<Result<Vec<_>, FitError>>()
        })?;

        CoefficientMatrix::from_rows(&solved, cols)
    }
}
