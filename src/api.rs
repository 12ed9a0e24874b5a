use crate::config::Config;
use crate::core_types::ReplicaIndexSet;
use crate::ensemble::loader::load_ensemble;
use crate::ensemble::{Ensemble, EnsembleAccessor};
use crate::error::BgResult;
use crate::optimizer::{
    OptimizationOptions, Optimizer, ProgressCallback, ResultRecord, SearchOutcome,
};
use crate::scorer::{CandidateScore, Scorer};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A loaded ensemble with its whitened covariance, ready to search or
/// evaluate bases.
pub struct Session {
    pub name: String,
    pub config: Config,
    pub scorer: Arc<Scorer>,
}

impl Session {
    pub fn load<P: AsRef<Path>>(path: P, config: Config) -> BgResult<Self> {
        let ensemble = load_ensemble(path, config.ensemble.epsilon)?;
        Self::from_ensemble(ensemble, config)
    }

    pub fn from_ensemble(ensemble: Ensemble, config: Config) -> BgResult<Self> {
        let name = ensemble.name.clone();
        let (nf, nx) = ensemble.grid_dimensions();
        info!(
            "Ensemble '{}': {} replicas on {} flavors x {} x-points (Q = {} GeV)",
            name,
            ensemble.total_replica_count(),
            nf,
            nx,
            config.ensemble.q
        );

        let threads = config.search.resolved_threads();
        let scorer = Arc::new(Scorer::new(Arc::new(ensemble), threads)?);
        Ok(Self {
            name,
            config,
            scorer,
        })
    }

    pub fn total_replicas(&self) -> usize {
        self.scorer.ensemble.total_replica_count()
    }

    pub fn natural_basis(&self, n: usize) -> BgResult<ReplicaIndexSet> {
        ReplicaIndexSet::natural(n, self.total_replicas())
    }

    pub fn basis(&self, ids: Vec<usize>) -> BgResult<ReplicaIndexSet> {
        ReplicaIndexSet::new(ids, self.total_replicas())
    }

    pub fn search<CB: ProgressCallback>(
        &self,
        initial: ReplicaIndexSet,
        callback: &mut CB,
    ) -> BgResult<(SearchOutcome, ResultRecord)> {
        let optimizer = Optimizer::new(
            self.scorer.clone(),
            OptimizationOptions::from(&self.config.search),
        );
        let outcome = optimizer.run(initial, callback)?;
        let record = outcome.to_record(&self.name, &self.config);
        Ok((outcome, record))
    }

    /// Scores one basis with iteration-0 semantics.
    pub fn evaluate(&self, basis: &ReplicaIndexSet) -> BgResult<CandidateScore> {
        Ok(self.scorer.score(basis)?)
    }
}
