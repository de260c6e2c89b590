use nalgebra::DVector;
use std::{
    collections::BTreeMap,
    fmt,
    fmt::{Display, Formatter},
};

use crate::linalg::Key;

/// Solution of a linear least-squares problem: one tangent increment per key.
///
/// Keys iterate in ascending order regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorValues {
    values: BTreeMap<Key, DVector<f64>>,
}

impl VectorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the vector stored under `key`, returning the previous one.
    pub fn insert(&mut self, key: Key, value: DVector<f64>) -> Option<DVector<f64>> {
        self.values.insert(key, value)
    }

    pub fn get(&self, key: Key) -> Option<&DVector<f64>> {
        self.values.get(&key)
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &DVector<f64>)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Total number of scalar entries over all keys.
    pub fn dim(&self) -> usize {
        self.values.values().map(|v| v.len()).sum()
    }

    /// True when both hold the same keys and every pair of vectors is within `tolerance`
    /// in each component.
    pub fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.len() == other.len()
            && self.values.iter().all(|(key, value)| {
                other.values.get(key).is_some_and(|o| {
                    o.len() == value.len()
                        && value
                            .iter()
                            .zip(o.iter())
                            .all(|(a, b)| (a - b).abs() <= tolerance)
                })
            })
    }
}

impl FromIterator<(Key, DVector<f64>)> for VectorValues {
    fn from_iter<I: IntoIterator<Item = (Key, DVector<f64>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Display for VectorValues {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "VectorValues ({} keys)", self.len())?;
        for (key, value) in &self.values {
            write!(f, "  {key}:")?;
            for v in value.iter() {
                write!(f, " {v:.6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
