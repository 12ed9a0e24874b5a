use thiserror::Error;

/// Fatal least-squares failures. Any of these means the run is misconfigured
/// and must stop; they are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error(
        "basis of {basis_size} replicas is underdetermined on a grid of {grid_points} points, \
         reduce the size of the basis"
    )]
    Underdetermined {
        basis_size: usize,
        grid_points: usize,
    },

    #[error("SVD of the {rows}x{cols} design matrix did not converge")]
    NoConvergence { rows: usize, cols: usize },

    #[error("least-squares solve produced non-finite coefficients for replica {replica}")]
    NonFinite { replica: usize },

    #[error("replica {replica} has {got} grid values, design matrix expects {expected}")]
    Shape {
        replica: usize,
        got: usize,
        expected: usize,
    },
}

#[derive(Error, Debug)]
pub enum BasisError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Covariance Preprocessing Error: {reason}")]
    Preprocess { reason: String },

    #[error("Fit Failure: {0}")]
    Fit(#[from] FitError),

    #[error(
        "no free replica found after {attempts} draws (basis size {basis_size}, {replicas} replicas)"
    )]
    SamplingExhausted {
        attempts: usize,
        basis_size: usize,
        replicas: usize,
    },

    #[error(
        "iteration {iteration}: {retries} consecutive degenerate candidates, \
         the basis is too redundant, try to reduce its size"
    )]
    DegenerateRetriesExhausted { iteration: usize, retries: usize },

    #[error("Thread Pool Error: {0}")]
    ThreadPool(String),
}

pub type BgResult<T> = Result<T, BasisError>;
