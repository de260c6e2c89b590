//! Elimination orderings over the keys of a [`GaussianFactorGraph`].
//!
//! The column layout of the assembled system follows the ordering, so a good ordering
//! keeps fill-in of the factorization low. The default heuristic is a greedy minimum
//! degree over key adjacency: repeatedly eliminate the key with the fewest neighbours,
//! connecting its neighbours into a clique. Ties go to the smallest key, which makes the
//! result deterministic.

use std::{
    collections::{BTreeSet, HashSet},
    fmt,
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::linalg::{GaussianFactorGraph, Key, LinAlgError, LinAlgResult};

/// How to compute an ordering when none is supplied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OrderingType {
    /// Greedy minimum degree over key adjacency.
    #[default]
    MinDegree,
    /// Keys in ascending order.
    Natural,
}

impl Display for OrderingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OrderingType::MinDegree => write!(f, "Minimum degree"),
            OrderingType::Natural => write!(f, "Natural"),
        }
    }
}

impl FromStr for OrderingType {
    type Err = LinAlgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "min_degree" | "minimum_degree" | "colamd" | "amd" => Ok(OrderingType::MinDegree),
            "natural" => Ok(OrderingType::Natural),
            other => Err(LinAlgError::InvalidOrdering(format!(
                "unknown ordering type '{other}'"
            ))),
        }
    }
}

/// A total order over keys; position `i` is eliminated `i`-th.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    keys: Vec<Key>,
}

impl Ordering {
    pub fn from_keys(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// Keys of `graph` in ascending order.
    pub fn natural(graph: &GaussianFactorGraph) -> Self {
        Self::from_keys(graph.keys())
    }

    /// Greedy minimum-degree ordering of the keys of `graph`.
    pub fn min_degree(graph: &GaussianFactorGraph) -> Self {
        let mut adjacency = graph.adjacency();
        let mut queue: BTreeSet<(usize, Key)> = adjacency
            .iter()
            .map(|(key, neighbours)| (neighbours.len(), *key))
            .collect();
        let mut keys = Vec::with_capacity(adjacency.len());

        while let Some((_, key)) = queue.pop_first() {
            let neighbours = adjacency.remove(&key).unwrap_or_default();
            for &n in &neighbours {
                let Some(adj) = adjacency.get_mut(&n) else {
                    continue;
                };
                let old_degree = adj.len();
                adj.remove(&key);
                adj.extend(neighbours.iter().copied().filter(|m| *m != n));
                if adj.len() != old_degree {
                    queue.remove(&(old_degree, n));
                    queue.insert((adj.len(), n));
                }
            }
            keys.push(key);
        }

        Self { keys }
    }

    pub fn compute(graph: &GaussianFactorGraph, ordering_type: OrderingType) -> Self {
        match ordering_type {
            OrderingType::MinDegree => Self::min_degree(graph),
            OrderingType::Natural => Self::natural(graph),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys.iter().copied()
    }

    pub fn as_slice(&self) -> &[Key] {
        &self.keys
    }

    /// Check that this ordering is a permutation of `keys`.
    ///
    /// # Errors
    /// [`LinAlgError::InvalidOrdering`] on a missing, unknown or repeated key.
    pub fn validate(&self, keys: &[Key]) -> LinAlgResult<()> {
        let expected: HashSet<Key> = keys.iter().copied().collect();
        let mut seen = HashSet::with_capacity(self.keys.len());

        for key in &self.keys {
            if !expected.contains(key) {
                return Err(LinAlgError::InvalidOrdering(format!(
                    "key {key} is not in the graph"
                )));
            }
            if !seen.insert(*key) {
                return Err(LinAlgError::InvalidOrdering(format!(
                    "key {key} appears more than once"
                )));
            }
        }

        if seen.len() != expected.len() {
            return Err(LinAlgError::InvalidOrdering(format!(
                "ordering covers {} of {} keys",
                seen.len(),
                expected.len()
            )));
        }
        Ok(())
    }
}

impl FromIterator<Key> for Ordering {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self::from_keys(iter.into_iter().collect())
    }
}
