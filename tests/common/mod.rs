#![allow(dead_code)]

use basisga::config::{Config, SearchParams};
use basisga::ensemble::{Ensemble, EnsembleAccessor, Flavor, Grid};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const FLAVORS: [Flavor; 6] = [
    Flavor::Gluon,
    Flavor::U,
    Flavor::D,
    Flavor::UBar,
    Flavor::DBar,
    Flavor::S,
];

pub fn grid(nf: usize, nx: usize) -> Grid {
    let xs = (0..nx).map(|i| 1e-3 * 10f64.powf(i as f64 * 0.5)).collect();
    Grid::new(FLAVORS[..nf].to_vec(), xs)
}

/// Replica-major values scattered around a smooth positive central curve.
pub fn synthetic_values(n_rep: usize, points: usize, seed: u64) -> Vec<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut values = Vec::with_capacity(n_rep * points);
    for _ in 0..n_rep {
        for p in 0..points {
            let base = 1.0 + 0.5 * p as f64;
            // roughly normal, unit-ish spread
            let noise = rng.f64() + rng.f64() + rng.f64() - 1.5;
            values.push(base * (1.0 + 0.2 * noise));
        }
    }
    values
}

pub fn synthetic_ensemble(n_rep: usize, nf: usize, nx: usize, seed: u64) -> Ensemble {
    let grid = grid(nf, nx);
    let values = synthetic_values(n_rep, grid.points(), seed);
    Ensemble::from_values("synthetic", grid, n_rep, values, 100.0).unwrap()
}

/// Same as [`synthetic_ensemble`] but replica 2 is an exact copy of replica 1.
pub fn ensemble_with_twin(n_rep: usize, nf: usize, nx: usize, seed: u64) -> Ensemble {
    let grid = grid(nf, nx);
    let points = grid.points();
    let mut values = synthetic_values(n_rep, points, seed);
    let first: Vec<f64> = values[..points].to_vec();
    values[points..2 * points].copy_from_slice(&first);
    Ensemble::from_values("twin", grid, n_rep, values, 100.0).unwrap()
}

pub fn config(max_iters: usize, seed: u64) -> Config {
    Config {
        search: SearchParams {
            max_iters,
            seed,
            threads: Some(2),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn write_csv(path: &Path, ensemble: &Ensemble) {
    let mut file = File::create(path).unwrap();
    writeln!(file, "replica,flavor,x,value").unwrap();
    let grid = ensemble.grid();
    for r in 0..ensemble.total_replica_count() {
        let values = ensemble.replica_values(r);
        for (f, flavor) in grid.flavors.iter().enumerate() {
            for (xi, x) in grid.xs.iter().enumerate() {
                writeln!(file, "{},{},{},{}", r + 1, flavor, x, values[grid.flat(f, xi)]).unwrap();
            }
        }
    }
}
