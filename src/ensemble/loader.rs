use super::{Ensemble, Flavor, Grid};
use crate::error::{BasisError, BgResult};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct Record {
    replica: usize,
    flavor: String,
    x: f64,
    value: f64,
}

/// Loads a long-format `replica,flavor,x,value` CSV file. The ensemble is
/// named after the file stem.
pub fn load_ensemble<P: AsRef<Path>>(path: P, epsilon: f64) -> BgResult<Ensemble> {
    let path = path.as_ref();
    info!("📂 Loading ensemble: {}", path.display());
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "ensemble".to_string());
    let file = File::open(path)?;
    read_ensemble(file, &name, epsilon)
}

pub fn read_ensemble<R: Read>(reader: R, name: &str, epsilon: f64) -> BgResult<Ensemble> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut flavors: Vec<Flavor> = Vec::new();
    let mut xs: Vec<f64> = Vec::new();
    // (replica, flavor slot, x slot, value)
    let mut entries: Vec<(usize, usize, usize, f64)> = Vec::new();
    let mut replica_ids: BTreeSet<usize> = BTreeSet::new();

    for (row, result) in rdr.deserialize::<Record>().enumerate() {
        let rec = result?;
        if rec.replica == 0 {
            return Err(BasisError::Validation(format!(
                "row {}: replica ids start at 1",
                row + 1
            )));
        }
        let flavor = Flavor::parse_label(&rec.flavor).ok_or_else(|| {
            BasisError::Validation(format!("row {}: unknown flavor '{}'", row + 1, rec.flavor))
        })?;

        let fi = match flavors.iter().position(|&f| f == flavor) {
            Some(i) => i,
            None => {
                flavors.push(flavor);
                flavors.len() - 1
            }
        };
        let xi = match xs.iter().position(|&x| x.to_bits() == rec.x.to_bits()) {
            Some(i) => i,
            None => {
                xs.push(rec.x);
                xs.len() - 1
            }
        };

        replica_ids.insert(rec.replica);
        entries.push((rec.replica - 1, fi, xi, rec.value));
    }

    // Ids must be exactly 1..=N before anything is sized from them.
    let max_replica = replica_ids.last().copied().unwrap_or(0);
    if replica_ids.len() != max_replica {
        let missing = (1..=max_replica)
            .find(|id| !replica_ids.contains(id))
            .unwrap_or(max_replica);
        return Err(BasisError::Validation(format!(
            "replica ids must run 1..=N without gaps, replica {} is missing (largest id {})",
            missing, max_replica
        )));
    }

    let grid = Grid::new(flavors, xs);
    let points = grid.points();
    let slot_count = max_replica.checked_mul(points).ok_or_else(|| {
        BasisError::Validation(format!(
            "{} replicas x {} grid points is too large",
            max_replica, points
        ))
    })?;
    let mut slots: Vec<Option<f64>> = vec![None; slot_count];

    for (r, fi, xi, value) in entries {
        let slot = &mut slots[r * points + grid.flat(fi, xi)];
        if slot.is_some() {
            return Err(BasisError::Validation(format!(
                "duplicate value for replica {}, flavor {}, x = {}",
                r + 1,
                grid.flavors[fi],
                grid.xs[xi]
            )));
        }
        *slot = Some(value);
    }

    let mut values = Vec::with_capacity(slots.len());
    for (i, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(v) => values.push(v),
            None => {
                let p = i % points;
                return Err(BasisError::Validation(format!(
                    "replica {} has no value for flavor {}, x = {}",
                    i / points + 1,
                    grid.flavors[p / grid.nx()],
                    grid.xs[p % grid.nx()]
                )));
            }
        }
    }

    debug!(
        "   -> Read {} replicas on {} flavors x {} x-points.",
        max_replica,
        grid.nf(),
        grid.nx()
    );

    Ensemble::from_values(name, grid, max_replica, values, epsilon)
}
