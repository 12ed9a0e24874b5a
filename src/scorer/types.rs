use super::eigen::DegenerateBasis;
use crate::ensemble::Flavor;
use serde::Serialize;

/// Breakdown of one candidate's ERF.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScoreDetails {
    pub erf: f64,

    // Grid coverage
    pub valid_points: usize,
    pub zero_std_points: usize,

    // ERF summed per flavor, grid order
    pub per_flavor: Vec<(String, f64)>,

    // Spectrum of the inverse coefficient covariance
    pub eigenvalues: Vec<f64>,
}

impl ScoreDetails {
    pub fn flavor_erf(&self, flavor: Flavor) -> Option<f64> {
        let label = flavor.to_string();
        self.per_flavor
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, v)| *v)
    }
}

/// Result of scoring one candidate basis.
#[derive(Debug, Clone)]
pub enum CandidateScore {
    Scored(ScoreDetails),
    Degenerate(DegenerateBasis),
}

impl CandidateScore {
    pub fn erf(&self) -> Option<f64> {
        match self {
            Self::Scored(d) => Some(d.erf),
            Self::Degenerate(_) => None,
        }
    }
}
