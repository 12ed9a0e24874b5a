pub mod eigen;
pub mod fit;
pub mod hessian;
pub mod types;

pub use self::eigen::{CoefficientCovariance, DegenerateBasis, Eigensystem};
pub use self::fit::{BasisFitter, CoefficientMatrix, DesignMatrix};
pub use self::types::{CandidateScore, ScoreDetails};

use crate::core_types::ReplicaIndexSet;
use crate::ensemble::preprocess::{whiten, Whitening};
use crate::ensemble::{BasisView, EnsembleAccessor, Grid};
use crate::error::{BgResult, FitError};
use std::sync::Arc;
use tracing::debug;

pub type SharedEnsemble = Arc<dyn EnsembleAccessor + Send>;

/// Fits candidate bases against a fixed ensemble and scores them.
pub struct Scorer {
    pub ensemble: SharedEnsemble,
    pub whitening: Whitening,
    fitter: BasisFitter,
}

impl Scorer {
    pub fn new(ensemble: SharedEnsemble, threads: usize) -> BgResult<Self> {
        let whitening = whiten(ensemble.full_covariance())?;
        let fitter = BasisFitter::new(threads)?;
        Ok(Self::with_parts(ensemble, whitening, fitter))
    }

    pub fn with_parts(ensemble: SharedEnsemble, whitening: Whitening, fitter: BasisFitter) -> Self {
        Self {
            ensemble,
            whitening,
            fitter,
        }
    }

    pub fn threads(&self) -> usize {
        self.fitter.threads()
    }

    /// Fit, invert and diagonalize. The outer error is fatal; the inner one
    /// marks a degenerate candidate.
    pub fn hessian_basis(
        &self,
        basis: &ReplicaIndexSet,
    ) -> Result<Result<(BasisView, Eigensystem), DegenerateBasis>, FitError> {
        let ens = self.ensemble.as_ref();
        let view = ens.rebase(basis);
        let coefficients = self.fitter.fit(ens, &view, &self.whitening.sqrt_inverse)?;

        let eigensystem = CoefficientCovariance::from_coefficients(&coefficients)
            .and_then(|cov| Eigensystem::from_inverse(&cov.inverse));

        Ok(eigensystem.map(|eig| (view, eig)))
    }

    pub fn score(&self, basis: &ReplicaIndexSet) -> Result<CandidateScore, FitError> {
        match self.hessian_basis(basis)? {
            Ok((view, eig)) => {
                let ens = self.ensemble.as_ref();
                let details = accumulate_erf(
                    &eig,
                    &view,
                    ens.grid(),
                    ens.central_value(),
                    ens.std_dev(),
                    ens.validity_mask(),
                );
                Ok(CandidateScore::Scored(details))
            }
            Err(degenerate) => {
                debug!("Discarding candidate {:?}: {}", basis.as_slice(), degenerate);
                Ok(CandidateScore::Degenerate(degenerate))
            }
        }
    }
}

/// Sums `|(hessian - prior) / prior|` over the valid grid points. Points
/// whose prior std is exactly zero contribute nothing.
pub fn accumulate_erf(
    eig: &Eigensystem,
    view: &BasisView,
    grid: &Grid,
    prior_cv: &[f64],
    prior_std: &[f64],
    mask: &[bool],
) -> ScoreDetails {
    let mut details = ScoreDetails {
        eigenvalues: eig.eigenvalues.iter().copied().collect(),
        ..Default::default()
    };

    for (f, flavor) in grid.flavors.iter().enumerate() {
        let mut flavor_erf = 0.0;
        for x in 0..grid.nx() {
            let p = grid.flat(f, x);
            if !mask[p] {
                continue;
            }
            details.valid_points += 1;

            let t0 = prior_std[p];
            if t0 == 0.0 {
                details.zero_std_points += 1;
                continue;
            }
            let t1 = hessian::hessian_std(&eig.vectors, view, p, prior_cv[p]);
            flavor_erf += ((t1 - t0) / t0).abs();
        }
        details.erf += flavor_erf;
        details.per_flavor.push((flavor.to_string(), flavor_erf));
    }

    details
}
