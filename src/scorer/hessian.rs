use crate::ensemble::BasisView;
use nalgebra::DMatrix;

/// Symmetric Hessian uncertainty at one grid point.
///
/// Eigenvector `l` displaces the central value by
/// `sum_k v[k, l] * (y_k - cv)`, where `y_k` are the basis members; the
/// uncertainty is the quadrature sum of all displacements.
pub fn hessian_std(vectors: &DMatrix<f64>, view: &BasisView, point: usize, cv: f64) -> f64 {
    let n = view.size();
    debug_assert_eq!(vectors.nrows(), n);

    let mut err = 0.0;
    for l in 0..vectors.ncols() {
        let mut shift = 0.0;
        for k in 0..n {
            shift += vectors[(k, l)] * (view.member(k)[point] - cv);
        }
        err += shift * shift;
    }
    err.sqrt()
}
