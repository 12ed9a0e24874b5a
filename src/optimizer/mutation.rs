use crate::core_types::ReplicaIndexSet;
use crate::error::{BasisError, BgResult};
use fastrand::Rng;

/// Draws allowed per ensemble replica before giving up on finding a free id.
const DRAWS_PER_REPLICA: usize = 64;

/// Maps a uniform draw in [0, 1) to the number of substitutions.
/// Everything above 0.7 gets the maximum of four.
pub fn mutation_count(g: f64) -> usize {
    if g <= 0.3 {
        1
    } else if g <= 0.6 {
        2
    } else if g <= 0.7 {
        3
    } else {
        4
    }
}

/// Uniform replica id in `1..=total` not already in `set`.
pub fn draw_free_replica(rng: &mut Rng, set: &ReplicaIndexSet, total: usize) -> BgResult<usize> {
    let attempts = DRAWS_PER_REPLICA * total.max(1);
    for _ in 0..attempts {
        let val = rng.usize(1..=total);
        if !set.contains(val) {
            return Ok(val);
        }
    }
    Err(BasisError::SamplingExhausted {
        attempts,
        basis_size: set.len(),
        replicas: total,
    })
}

/// Returns a mutated copy of `current`; the input is never touched.
pub fn mutate(rng: &mut Rng, current: &ReplicaIndexSet, total: usize) -> BgResult<ReplicaIndexSet> {
    let mut candidate = current.clone();
    let nmut = mutation_count(rng.f64());
    for _ in 0..nmut {
        let val = draw_free_replica(rng, &candidate, total)?;
        let pos = rng.usize(0..candidate.len());
        candidate.replace(pos, val);
    }
    Ok(candidate)
}
