pub mod flavor;
pub mod loader;
pub mod preprocess;

pub use self::flavor::Flavor;

use crate::core_types::ReplicaIndexSet;
use crate::error::{BasisError, BgResult};
use nalgebra::DMatrix;
use tracing::debug;

/// (flavor, x) grid on which every replica is sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub flavors: Vec<Flavor>,
    pub xs: Vec<f64>,
}

impl Grid {
    pub fn new(flavors: Vec<Flavor>, xs: Vec<f64>) -> Self {
        Self { flavors, xs }
    }

    pub fn nf(&self) -> usize {
        self.flavors.len()
    }

    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    pub fn points(&self) -> usize {
        self.nf() * self.nx()
    }

    /// Flat index of (flavor, x); all per-point arrays use this layout.
    #[inline(always)]
    pub fn flat(&self, f: usize, x: usize) -> usize {
        self.nx() * f + x
    }
}

/// Read-only access to a replica ensemble sampled on a grid.
///
/// Per-point arrays are flattened with [`Grid::flat`]; per-replica values
/// are stored replica-major, so `per_replica_values()[r * points + p]` is
/// replica `r` (zero-based) at point `p`.
pub trait EnsembleAccessor: Sync {
    fn grid(&self) -> &Grid;
    fn total_replica_count(&self) -> usize;
    fn per_replica_values(&self) -> &[f64];
    fn central_value(&self) -> &[f64];
    fn std_dev(&self) -> &[f64];
    fn validity_mask(&self) -> &[bool];
    fn full_covariance(&self) -> &DMatrix<f64>;

    fn grid_dimensions(&self) -> (usize, usize) {
        (self.grid().nf(), self.grid().nx())
    }

    fn replica_values(&self, replica: usize) -> &[f64] {
        let p = self.grid().points();
        &self.per_replica_values()[replica * p..(replica + 1) * p]
    }

    /// Central value, std and member values restricted to `basis`.
    fn rebase(&self, basis: &ReplicaIndexSet) -> BasisView {
        let points = self.grid().points();
        let mut values = Vec::with_capacity(basis.len() * points);
        for r in basis.zero_based() {
            values.extend_from_slice(self.replica_values(r));
        }
        let (central, std) = mean_std(&values, basis.len(), points);
        BasisView {
            indices: basis.clone(),
            points,
            values,
            central,
            std,
        }
    }
}

/// Ensemble statistics restricted to a candidate basis.
#[derive(Debug, Clone)]
pub struct BasisView {
    pub indices: ReplicaIndexSet,
    pub points: usize,
    /// Member-major values, `values[k * points + p]` for basis member `k`.
    pub values: Vec<f64>,
    pub central: Vec<f64>,
    pub std: Vec<f64>,
}

impl BasisView {
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    pub fn member(&self, k: usize) -> &[f64] {
        &self.values[k * self.points..(k + 1) * self.points]
    }
}

/// In-memory ensemble with its prior statistics computed once at load.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub name: String,
    grid: Grid,
    n_rep: usize,
    values: Vec<f64>,
    central: Vec<f64>,
    std: Vec<f64>,
    mask: Vec<bool>,
    covariance: DMatrix<f64>,
}

impl Ensemble {
    pub fn from_values(
        name: &str,
        grid: Grid,
        n_rep: usize,
        values: Vec<f64>,
        epsilon: f64,
    ) -> BgResult<Self> {
        let points = grid.points();
        if points == 0 {
            return Err(BasisError::Validation("ensemble grid is empty".into()));
        }
        if n_rep < 2 {
            return Err(BasisError::Validation(format!(
                "ensemble needs at least 2 replicas, got {}",
                n_rep
            )));
        }
        if values.len() != n_rep * points {
            return Err(BasisError::Validation(format!(
                "expected {} values ({} replicas x {} points), got {}",
                n_rep * points,
                n_rep,
                points,
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(BasisError::Validation(format!(
                "non-finite value for replica {} at grid point {}",
                pos / points + 1,
                pos % points
            )));
        }

        let (central, std) = mean_std(&values, n_rep, points);
        let mask = validity_mask(&values, n_rep, points, &central, &std, epsilon);
        let covariance = sample_covariance(&values, n_rep, points, &central);

        debug!(
            "Ensemble '{}': {} replicas, {}x{} grid, {} valid points",
            name,
            n_rep,
            grid.nf(),
            grid.nx(),
            mask.iter().filter(|&&m| m).count()
        );

        Ok(Self {
            name: name.to_string(),
            grid,
            n_rep,
            values,
            central,
            std,
            mask,
            covariance,
        })
    }
}

impl EnsembleAccessor for Ensemble {
    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn total_replica_count(&self) -> usize {
        self.n_rep
    }

    fn per_replica_values(&self) -> &[f64] {
        &self.values
    }

    fn central_value(&self) -> &[f64] {
        &self.central
    }

    fn std_dev(&self) -> &[f64] {
        &self.std
    }

    fn validity_mask(&self) -> &[bool] {
        &self.mask
    }

    fn full_covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }
}

/// Mean and unbiased standard deviation per point of a row-major
/// `rows x points` block. A single row has zero spread.
///
/// Sums run over deviations from the first row, so a point where every
/// row holds the same value gets exactly that value as mean and exactly 0
/// as std.
pub fn mean_std(values: &[f64], rows: usize, points: usize) -> (Vec<f64>, Vec<f64>) {
    if rows == 0 {
        return (vec![0.0; points], vec![0.0; points]);
    }
    let shift = &values[..points];
    let mut sum = vec![0.0; points];
    let mut sum_sq = vec![0.0; points];
    for row in values.chunks_exact(points).take(rows) {
        for p in 0..points {
            let d = row[p] - shift[p];
            sum[p] += d;
            sum_sq[p] += d * d;
        }
    }

    let n = rows as f64;
    let divisor = if rows > 1 { (rows - 1) as f64 } else { 1.0 };
    let mean = (0..points).map(|p| shift[p] + sum[p] / n).collect();
    let std = (0..points)
        .map(|p| ((sum_sq[p] - sum[p] * sum[p] / n) / divisor).max(0.0).sqrt())
        .collect();
    (mean, std)
}

/// Unbiased covariance of the flattened grid, `points x points`.
pub fn sample_covariance(
    values: &[f64],
    rows: usize,
    points: usize,
    mean: &[f64],
) -> DMatrix<f64> {
    let centered = DMatrix::from_fn(rows, points, |r, p| values[r * points + p] - mean[p]);
    let divisor = if rows > 1 { (rows - 1) as f64 } else { 1.0 };
    (centered.transpose() * &centered) / divisor
}

/// Linear-interpolated percentile of an ascending slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// A point is kept when its central value is usable and the one-sigma band
/// agrees with the 68% interval to within `epsilon`.
fn validity_mask(
    values: &[f64],
    rows: usize,
    points: usize,
    central: &[f64],
    std: &[f64],
    epsilon: f64,
) -> Vec<bool> {
    let mut column = Vec::with_capacity(rows);
    (0..points)
        .map(|p| {
            if central[p] == 0.0 || !central[p].is_finite() {
                return false;
            }
            column.clear();
            column.extend((0..rows).map(|r| values[r * points + p]));
            column.sort_by(|a, b| a.total_cmp(b));
            // Constant points are kept; scoring skips them by their zero std.
            if column[0] == column[rows - 1] {
                return true;
            }
            let half_width = (percentile(&column, 84.0) - percentile(&column, 16.0)) / 2.0;
            half_width > 0.0 && (std[p] / half_width - 1.0).abs() <= epsilon
        })
        .collect()
}
