pub mod mutation;
pub mod progress;
pub mod runner;

pub use self::progress::{Tee, TracingSink, WriterSink};
pub use self::runner::{
    OptimizationOptions, Optimizer, ProgressCallback, ResultRecord, SearchOutcome, Silent,
    StopReason,
};

use crate::core_types::ReplicaIndexSet;
use crate::scorer::{CandidateScore, DegenerateBasis};
use serde::Serialize;
use strum_macros::Display;

/// What happened to one evaluated candidate.
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Accepted(f64),
    Rejected(f64),
    Degenerate(DegenerateBasis),
}

impl Outcome {
    pub fn erf(&self) -> Option<f64> {
        match self {
            Self::Accepted(e) | Self::Rejected(e) => Some(*e),
            Self::Degenerate(_) => None,
        }
    }

    /// Degenerate draws produce no score and do not use up an iteration.
    pub fn consumes_iteration(&self) -> bool {
        !matches!(self, Self::Degenerate(_))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub accepted: usize,
    pub rejected: usize,
    pub degenerate: usize,
}

/// Accepted basis and best score. Only the search loop mutates this.
#[derive(Debug, Clone)]
pub struct SearchState {
    accepted: ReplicaIndexSet,
    best_erf: f64,
    pub stats: SearchStats,
}

impl SearchState {
    pub fn new(initial: ReplicaIndexSet) -> Self {
        Self {
            accepted: initial,
            best_erf: f64::INFINITY,
            stats: SearchStats::default(),
        }
    }

    pub fn accepted(&self) -> &ReplicaIndexSet {
        &self.accepted
    }

    pub fn best_erf(&self) -> f64 {
        self.best_erf
    }

    /// Judges a scored candidate. The accepted set is replaced only when the
    /// candidate strictly improves on the best ERF.
    pub fn consider(&mut self, candidate: ReplicaIndexSet, score: CandidateScore) -> Outcome {
        match score {
            CandidateScore::Degenerate(reason) => {
                self.stats.degenerate += 1;
                Outcome::Degenerate(reason)
            }
            CandidateScore::Scored(details) => {
                let erf = details.erf;
                if erf < self.best_erf {
                    self.best_erf = erf;
                    self.accepted = candidate;
                    self.stats.accepted += 1;
                    Outcome::Accepted(erf)
                } else {
                    self.stats.rejected += 1;
                    Outcome::Rejected(erf)
                }
            }
        }
    }
}
