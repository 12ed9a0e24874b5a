use clap::Args;

pub const DEFAULT_MAX_ITERS: usize = 2000;
pub const DEFAULT_EPSILON: f64 = 100.0;

#[derive(Args, Debug, Clone, Default)]
pub struct Config {
    #[command(flatten)]
    pub ensemble: EnsembleParams,
    #[command(flatten)]
    pub search: SearchParams,
}

#[derive(Args, Debug, Clone)]
pub struct EnsembleParams {
    /// Energy scale of the grid, recorded in the report.
    #[arg(short = 'Q', long = "q", default_value_t = 1.0)]
    pub q: f64,
    /// Minimum ratio between one sigma and 68% intervals to select a point.
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    pub epsilon: f64,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            q: 1.0,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SearchParams {
    #[arg(long, default_value_t = DEFAULT_MAX_ITERS)]
    pub max_iters: usize,
    #[arg(short = 'S', long, default_value_t = 0)]
    pub seed: u64,
    /// Abort after this many consecutive degenerate candidates at one iteration.
    #[arg(long, default_value_t = 1000)]
    pub max_degenerate_retries: usize,
    /// Stop after this many iterations without improvement.
    #[arg(long)]
    pub patience: Option<usize>,
    /// Wall-clock limit in seconds.
    #[arg(short = 'T', long)]
    pub max_time: Option<u64>,
    /// Worker threads for the per-replica fits (defaults to all cores).
    #[arg(long)]
    pub threads: Option<usize>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
            seed: 0,
            max_degenerate_retries: 1000,
            patience: None,
            max_time: None,
            threads: None,
        }
    }
}

impl SearchParams {
    pub fn resolved_threads(&self) -> usize {
        self.threads.filter(|&t| t > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}
