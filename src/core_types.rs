use crate::error::{BasisError, BgResult};
use serde::{Deserialize, Serialize};

/// Ordered set of distinct, 1-based replica ids forming a candidate basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaIndexSet(Vec<usize>);

impl ReplicaIndexSet {
    /// Validates that `ids` is non-empty, duplicate free and within `1..=total`.
    pub fn new(ids: Vec<usize>, total: usize) -> BgResult<Self> {
        if ids.is_empty() {
            return Err(BasisError::Config("basis must contain at least one replica".into()));
        }
        if ids.len() >= total {
            return Err(BasisError::Config(format!(
                "basis size {} must be smaller than the ensemble size {}",
                ids.len(),
                total
            )));
        }
        let mut seen = vec![false; total + 1];
        for &id in &ids {
            if id == 0 || id > total {
                return Err(BasisError::Config(format!(
                    "replica {} is outside 1..={}",
                    id, total
                )));
            }
            if seen[id] {
                return Err(BasisError::Config(format!("replica {} appears twice", id)));
            }
            seen[id] = true;
        }
        Ok(Self(ids))
    }

    /// The natural starting basis `1..=n`.
    pub fn natural(n: usize, total: usize) -> BgResult<Self> {
        Self::new((1..=n).collect(), total)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn contains(&self, id: usize) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Zero-based positions into the full ensemble.
    pub fn zero_based(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|&id| id - 1)
    }

    pub fn sorted(&self) -> Vec<usize> {
        let mut v = self.0.clone();
        v.sort_unstable();
        v
    }

    /// Overwrites one position. Callers guarantee `id` is not already present.
    pub(crate) fn replace(&mut self, pos: usize, id: usize) {
        debug_assert!(!self.contains(id));
        self.0[pos] = id;
    }

    pub fn has_duplicates(&self) -> bool {
        let sorted = self.sorted();
        sorted.windows(2).any(|w| w[0] == w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicates_and_out_of_range() {
        assert!(ReplicaIndexSet::new(vec![1, 2, 2], 10).is_err());
        assert!(ReplicaIndexSet::new(vec![0, 2], 10).is_err());
        assert!(ReplicaIndexSet::new(vec![1, 11], 10).is_err());
        assert!(ReplicaIndexSet::new(vec![], 10).is_err());
        assert!(ReplicaIndexSet::new(vec![1, 2, 3], 3).is_err());
    }

    #[test]
    fn test_sorted_keeps_original_order() {
        let set = ReplicaIndexSet::new(vec![7, 2, 5], 10).unwrap();
        assert_eq!(set.sorted(), vec![2, 5, 7]);
        assert_eq!(set.as_slice(), &[7, 2, 5]);
        assert_eq!(set.zero_based().collect::<Vec<_>>(), vec![6, 1, 4]);
    }
}
