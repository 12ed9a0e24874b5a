use super::{mutation, Outcome, SearchState, SearchStats};
use crate::config::{Config, SearchParams};
use crate::core_types::ReplicaIndexSet;
use crate::error::{BasisError, BgResult};
use crate::scorer::{DegenerateBasis, Scorer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum_macros::Display;
use tracing::{info, warn};

pub struct OptimizationOptions {
    pub max_iters: usize,
    pub seed: u64,
    /// The run aborts on the N-th consecutive degenerate candidate.
    pub max_degenerate_retries: usize,
    pub patience: Option<usize>,
    pub max_time: Option<Duration>,
}

impl From<&SearchParams> for OptimizationOptions {
    fn from(p: &SearchParams) -> Self {
        Self {
            max_iters: p.max_iters,
            seed: p.seed,
            max_degenerate_retries: p.max_degenerate_retries,
            patience: p.patience,
            max_time: p.max_time.map(Duration::from_secs),
        }
    }
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self::from(&SearchParams::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    Budget,
    Patience,
    WallClock,
    Cancelled,
}

/// Receives one call per counted iteration. Returning `false` stops the run.
pub trait ProgressCallback {
    fn on_iteration(&mut self, iteration: usize, outcome: &Outcome, state: &SearchState) -> bool;

    fn on_degenerate(&mut self, _iteration: usize, _reason: &DegenerateBasis) {}
}

/// Discards all progress.
pub struct Silent;

impl ProgressCallback for Silent {
    fn on_iteration(&mut self, _: usize, _: &Outcome, _: &SearchState) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: ReplicaIndexSet,
    pub best_erf: f64,
    /// ERF of the unmutated initial set (iteration 0).
    pub baseline_erf: Option<f64>,
    pub iterations: usize,
    pub stats: SearchStats,
    pub stop: StopReason,
}

/// Final report of a run. Field names are read by downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "Iterations")]
    pub iterations: usize,
    #[serde(rename = "Final ERF")]
    pub final_erf: f64,
    pub pdf_name: String,
    pub nrep: usize,
    #[serde(rename = "Q")]
    pub q: f64,
    pub epsilon: f64,
    pub basis: Vec<usize>,
}

impl SearchOutcome {
    pub fn to_record(&self, pdf_name: &str, config: &Config) -> ResultRecord {
        ResultRecord {
            iterations: config.search.max_iters,
            final_erf: self.best_erf,
            pdf_name: pdf_name.to_string(),
            nrep: self.best.len(),
            q: config.ensemble.q,
            epsilon: config.ensemble.epsilon,
            basis: self.best.sorted(),
        }
    }
}

pub struct Optimizer {
    scorer: Arc<Scorer>,
    options: OptimizationOptions,
}

impl Optimizer {
    pub fn new(scorer: Arc<Scorer>, options: OptimizationOptions) -> Self {
        Self { scorer, options }
    }

    pub fn run<CB: ProgressCallback>(
        &self,
        initial: ReplicaIndexSet,
        callback: &mut CB,
    ) -> BgResult<SearchOutcome> {
        let opts = &self.options;
        let total = self.scorer.ensemble.total_replica_count();

        // 1. Init
        let mut rng = fastrand::Rng::with_seed(opts.seed);
        let mut state = SearchState::new(initial);
        let mut baseline_erf = None;
        let mut iteration = 0;
        let mut retries = 0;
        let mut since_improvement = 0;
        let mut stop = StopReason::Budget;
        let start_time = Instant::now();

        info!(
            "🔥 Searching {} of {} replicas for {} iterations on {} threads",
            state.accepted().len(),
            total,
            opts.max_iters,
            self.scorer.threads()
        );

        // 2. Main Loop
        while iteration < opts.max_iters {
            if let Some(limit) = opts.max_time {
                if start_time.elapsed() >= limit {
                    stop = StopReason::WallClock;
                    break;
                }
            }

            // A. Candidate: the baseline goes in unchanged unless it already
            // proved degenerate.
            let candidate = if iteration == 0 && retries == 0 {
                state.accepted().clone()
            } else {
                mutation::mutate(&mut rng, state.accepted(), total)?
            };

            // B. Fit + score, fatal errors abort the run
            let score = self.scorer.score(&candidate)?;

            // C. Transition
            let outcome = state.consider(candidate, score);
            match &outcome {
                Outcome::Degenerate(reason) => {
                    retries += 1;
                    callback.on_degenerate(iteration, reason);
                    if retries >= opts.max_degenerate_retries {
                        warn!(
                            "Giving up at iteration {} after {} degenerate candidates",
                            iteration, retries
                        );
                        return Err(BasisError::DegenerateRetriesExhausted { iteration, retries });
                    }
                    continue;
                }
                Outcome::Accepted(_) => since_improvement = 0,
                Outcome::Rejected(_) => since_improvement += 1,
            }

            if iteration == 0 {
                baseline_erf = outcome.erf();
            }
            retries = 0;

            let keep_going = callback.on_iteration(iteration, &outcome, &state);
            iteration += 1;

            if !keep_going {
                stop = StopReason::Cancelled;
                break;
            }
            if let Some(patience) = opts.patience {
                if since_improvement >= patience {
                    stop = StopReason::Patience;
                    break;
                }
            }
        }

        info!(
            "Search finished ({}) after {} iterations, best ERF {:.6}",
            stop,
            iteration,
            state.best_erf()
        );

        Ok(SearchOutcome {
            best: state.accepted().clone(),
            best_erf: state.best_erf(),
            baseline_erf,
            iterations: iteration,
            stats: state.stats,
            stop,
        })
    }
}
