//! Linear Gaussian factors and the graph that collects them.
//!
//! A [`JacobianFactor`] is the linearization of one measurement: the whitened error
//! `‖Σ^{-1/2}(Σ_k A_k x_k − b)‖²` over a handful of keys. A [`GaussianFactorGraph`] is
//! the sum of such terms, i.e. a sparse linear least-squares problem whose unknowns are
//! the per-key tangent increments.
//!
//! Stacking the factors row-block by row-block and the keys column-block by column-block
//! (in elimination order) gives the sparse system `A x ≈ b` handed to the solvers:
//!
//! ```text
//!            x2   l1   x1
//!   f0  [  .    .   10I ]        [ -1 -1 ]
//!   f1  [ 10I   .  -10I ]  x  ≈  [  2 -1 ]
//!   f2  [  .   5I   -5I ]        [  0  1 ]
//!   f3  [ -5I  5I    .  ]        [ -1 1.5]
//! ```

use faer::{
    Mat,
    sparse::{Pair, SparseColMat, SymbolicSparseColMat},
};
use nalgebra::{DMatrix, DVector};
use std::collections::{BTreeMap, BTreeSet};

use crate::linalg::{Key, LinAlgError, LinAlgResult, Ordering, VectorValues};

/// Measurement noise attached to a factor, expressed as standard deviations.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseModel {
    /// Identity covariance of the given dimension.
    Unit(usize),
    /// The same sigma on every row.
    Isotropic { dim: usize, sigma: f64 },
    /// One sigma per row.
    Diagonal(DVector<f64>),
}

impl NoiseModel {
    pub fn unit(dim: usize) -> Self {
        NoiseModel::Unit(dim)
    }

    pub fn isotropic(dim: usize, sigma: f64) -> LinAlgResult<Self> {
        let model = NoiseModel::Isotropic { dim, sigma };
        model.validate()?;
        Ok(model)
    }

    pub fn diagonal(sigmas: DVector<f64>) -> LinAlgResult<Self> {
        let model = NoiseModel::Diagonal(sigmas);
        model.validate()?;
        Ok(model)
    }

    pub fn dim(&self) -> usize {
        match self {
            NoiseModel::Unit(dim) => *dim,
            NoiseModel::Isotropic { dim, .. } => *dim,
            NoiseModel::Diagonal(sigmas) => sigmas.len(),
        }
    }

    /// Standard deviation of row `row`.
    pub fn sigma(&self, row: usize) -> f64 {
        match self {
            NoiseModel::Unit(_) => 1.0,
            NoiseModel::Isotropic { sigma, .. } => *sigma,
            NoiseModel::Diagonal(sigmas) => sigmas[row],
        }
    }

    /// Every sigma must be finite and strictly positive.
    pub fn validate(&self) -> LinAlgResult<()> {
        let bad = (0..self.dim())
            .map(|i| self.sigma(i))
            .find(|s| !s.is_finite() || *s <= 0.0);
        match bad {
            Some(sigma) => Err(LinAlgError::InvalidNoiseModel(format!(
                "sigma must be finite and positive, got {sigma}"
            ))),
            None => Ok(()),
        }
    }

    /// Scale each row of `v` by the inverse of its sigma.
    pub fn whiten(&self, v: &DVector<f64>) -> DVector<f64> {
        match self {
            NoiseModel::Unit(_) => v.clone(),
            _ => DVector::from_fn(v.len(), |i, _| v[i] / self.sigma(i)),
        }
    }

    /// Row-scale a Jacobian block the same way [`NoiseModel::whiten`] scales a vector.
    pub fn whiten_matrix(&self, a: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            NoiseModel::Unit(_) => a.clone(),
            _ => DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[(i, j)] / self.sigma(i)),
        }
    }
}

/// One linear term `Σ_k A_k x_k − b` with its noise model.
///
/// Blocks are checked on construction: every `A_k` has as many rows as `b`, keys are
/// distinct and the noise model matches the row count.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianFactor {
    terms: Vec<(Key, DMatrix<f64>)>,
    rhs: DVector<f64>,
    noise: NoiseModel,
}

impl JacobianFactor {
    pub fn new(
        terms: Vec<(Key, DMatrix<f64>)>,
        rhs: DVector<f64>,
        noise: NoiseModel,
    ) -> LinAlgResult<Self> {
        if terms.is_empty() {
            return Err(LinAlgError::DimensionMismatch(
                "factor must reference at least one key".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for (key, block) in &terms {
            if !seen.insert(*key) {
                return Err(LinAlgError::DimensionMismatch(format!(
                    "key {key} appears twice in one factor"
                )));
            }
            if block.nrows() != rhs.len() {
                return Err(LinAlgError::DimensionMismatch(format!(
                    "block for key {key} has {} rows, rhs has {}",
                    block.nrows(),
                    rhs.len()
                )));
            }
        }

        if noise.dim() != rhs.len() {
            return Err(LinAlgError::InvalidNoiseModel(format!(
                "noise model has dimension {}, factor has {} rows",
                noise.dim(),
                rhs.len()
            )));
        }
        noise.validate()?;

        Ok(Self { terms, rhs, noise })
    }

    pub fn unary(
        key: Key,
        a: DMatrix<f64>,
        b: DVector<f64>,
        noise: NoiseModel,
    ) -> LinAlgResult<Self> {
        Self::new(vec![(key, a)], b, noise)
    }

    pub fn binary(
        key1: Key,
        a1: DMatrix<f64>,
        key2: Key,
        a2: DMatrix<f64>,
        b: DVector<f64>,
        noise: NoiseModel,
    ) -> LinAlgResult<Self> {
        Self::new(vec![(key1, a1), (key2, a2)], b, noise)
    }

    pub fn rows(&self) -> usize {
        self.rhs.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.terms.iter().map(|(k, _)| *k)
    }

    pub fn terms(&self) -> &[(Key, DMatrix<f64>)] {
        &self.terms
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    /// Whitened residual `Σ^{-1/2}(Σ_k A_k x_k − b)` at `values`.
    pub fn whitened_residual(&self, values: &VectorValues) -> LinAlgResult<DVector<f64>> {
        let mut residual = -self.rhs.clone();
        for (key, block) in &self.terms {
            let x = values.get(*key).ok_or_else(|| {
                LinAlgError::DimensionMismatch(format!("no value for key {key}"))
            })?;
            if x.len() != block.ncols() {
                return Err(LinAlgError::DimensionMismatch(format!(
                    "value for key {key} has length {}, expected {}",
                    x.len(),
                    block.ncols()
                )));
            }
            residual += block * x;
        }
        Ok(self.noise.whiten(&residual))
    }

    /// `0.5 ‖Σ^{-1/2}(Σ_k A_k x_k − b)‖²`.
    pub fn error(&self, values: &VectorValues) -> LinAlgResult<f64> {
        Ok(0.5 * self.whitened_residual(values)?.norm_squared())
    }
}

/// A whitened, column-ordered sparse least-squares system.
#[derive(Debug, Clone)]
pub struct SparseSystem {
    pub jacobian: SparseColMat<usize, f64>,
    pub rhs: Mat<f64>,
    /// `(key, first column, dimension)` in elimination order.
    pub columns: Vec<(Key, usize, usize)>,
}

impl SparseSystem {
    /// Split a stacked solution vector back into per-key vectors.
    pub fn scatter(&self, solution: &Mat<f64>) -> VectorValues {
        self.columns
            .iter()
            .map(|&(key, start, dim)| {
                (key, DVector::from_fn(dim, |i, _| solution[(start + i, 0)]))
            })
            .collect()
    }
}

/// A collection of [`JacobianFactor`]s over shared keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaussianFactorGraph {
    factors: Vec<JacobianFactor>,
}

impl GaussianFactorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, factor: JacobianFactor) {
        self.factors.push(factor);
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JacobianFactor> {
        self.factors.iter()
    }

    /// Total number of rows over all factors.
    pub fn rows(&self) -> usize {
        self.factors.iter().map(JacobianFactor::rows).sum()
    }

    /// Every key referenced by some factor, ascending.
    pub fn keys(&self) -> Vec<Key> {
        self.factors
            .iter()
            .flat_map(JacobianFactor::keys)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Column dimension of each key.
    ///
    /// # Errors
    /// [`LinAlgError::DimensionMismatch`] when two factors disagree on a key's width.
    pub fn key_dimensions(&self) -> LinAlgResult<BTreeMap<Key, usize>> {
        let mut dims = BTreeMap::new();
        for factor in &self.factors {
            for (key, block) in factor.terms() {
                let dim = *dims.entry(*key).or_insert(block.ncols());
                if dim != block.ncols() {
                    return Err(LinAlgError::DimensionMismatch(format!(
                        "key {key} used with dimensions {dim} and {}",
                        block.ncols()
                    )));
                }
            }
        }
        Ok(dims)
    }

    /// Sum of the factor errors at `values`.
    pub fn error(&self, values: &VectorValues) -> LinAlgResult<f64> {
        self.factors.iter().map(|f| f.error(values)).sum()
    }

    /// Key adjacency: two keys are neighbours when some factor references both.
    pub fn adjacency(&self) -> BTreeMap<Key, BTreeSet<Key>> {
        let mut adjacency: BTreeMap<Key, BTreeSet<Key>> = BTreeMap::new();
        for factor in &self.factors {
            for key in factor.keys() {
                let neighbours = adjacency.entry(key).or_default();
                neighbours.extend(factor.keys().filter(|k| *k != key));
            }
        }
        adjacency
    }

    /// Stack the whitened factors into a sparse system with columns laid out in
    /// `ordering` order.
    ///
    /// The sparsity pattern is built first from the block positions, then filled with
    /// values in the pattern's argsort order.
    ///
    /// # Errors
    /// - [`LinAlgError::DimensionMismatch`] for inconsistent key dimensions
    /// - [`LinAlgError::InvalidOrdering`] when `ordering` is not a permutation of the keys
    /// - [`LinAlgError::SparseMatrixCreation`] if faer rejects the pattern
    pub fn sparse_system(&self, ordering: &Ordering) -> LinAlgResult<SparseSystem> {
        let dims = self.key_dimensions()?;
        ordering.validate(&self.keys())?;

        let mut col_offset = 0;
        let mut offsets = BTreeMap::new();
        let mut columns = Vec::with_capacity(ordering.len());
        for key in ordering.iter() {
            let dim = dims.get(&key).copied().unwrap_or_default();
            offsets.insert(key, col_offset);
            columns.push((key, col_offset, dim));
            col_offset += dim;
        }
        let total_rows = self.rows();

        let mut indices = Vec::<Pair<usize, usize>>::new();
        let mut values = Vec::<f64>::new();
        let mut rhs = Mat::<f64>::zeros(total_rows, 1);

        let mut row_offset = 0;
        for factor in &self.factors {
            let noise = factor.noise();
            for (key, block) in factor.terms() {
                let col_start = offsets.get(key).copied().unwrap_or_default();
                let whitened = noise.whiten_matrix(block);
                for row in 0..block.nrows() {
                    for col in 0..block.ncols() {
                        indices.push(Pair::new(row_offset + row, col_start + col));
                        values.push(whitened[(row, col)]);
                    }
                }
            }
            let b = noise.whiten(factor.rhs());
            for row in 0..factor.rows() {
                rhs[(row_offset + row, 0)] = b[row];
            }
            row_offset += factor.rows();
        }

        let (pattern, order) =
            SymbolicSparseColMat::try_new_from_indices(total_rows, col_offset, &indices)
                .map_err(|e| {
                    LinAlgError::SparseMatrixCreation(
                        "Failed to build sparse Jacobian pattern".to_string(),
                    )
                    .log_with_source(e)
                })?;
        let jacobian = SparseColMat::new_from_argsort(pattern, &order, values.as_slice())
            .map_err(|e| {
                LinAlgError::SparseMatrixCreation(
                    "Failed to fill sparse Jacobian from argsort".to_string(),
                )
                .log_with_source(e)
            })?;

        Ok(SparseSystem {
            jacobian,
            rhs,
            columns,
        })
    }
}

impl<'a> IntoIterator for &'a GaussianFactorGraph {
    type Item = &'a JacobianFactor;
    type IntoIter = std::slice::Iter<'a, JacobianFactor>;

    fn into_iter(self) -> Self::IntoIter {
        self.factors.iter()
    }
}

impl FromIterator<JacobianFactor> for GaussianFactorGraph {
    fn from_iter<I: IntoIterator<Item = JacobianFactor>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn scaled_identity(scale: f64) -> DMatrix<f64> {
        DMatrix::identity(2, 2) * scale
    }

    fn vec2(x: f64, y: f64) -> DVector<f64> {
        DVector::from_vec(vec![x, y])
    }

    #[test]
    fn test_noise_model_whiten() -> TestResult {
        let v = vec2(2.0, -4.0);

        assert_eq!(NoiseModel::unit(2).whiten(&v), v);

        let iso = NoiseModel::isotropic(2, 0.5)?;
        assert_eq!(iso.whiten(&v), vec2(4.0, -8.0));

        let diag = NoiseModel::diagonal(vec2(1.0, 2.0))?;
        assert_eq!(diag.whiten(&v), vec2(2.0, -2.0));

        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let wa = diag.whiten_matrix(&a);
        assert_eq!(wa, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 1.5, 2.0]));
        Ok(())
    }

    #[test]
    fn test_noise_model_rejects_bad_sigma() {
        assert!(matches!(
            NoiseModel::isotropic(2, 0.0),
            Err(LinAlgError::InvalidNoiseModel(_))
        ));
        assert!(matches!(
            NoiseModel::diagonal(vec2(1.0, f64::NAN)),
            Err(LinAlgError::InvalidNoiseModel(_))
        ));
        assert!(NoiseModel::Isotropic { dim: 2, sigma: -1.0 }.validate().is_err());
    }

    #[test]
    fn test_factor_construction_checks() {
        let bad_rows = JacobianFactor::unary(
            0,
            DMatrix::identity(3, 2),
            vec2(0.0, 0.0),
            NoiseModel::unit(2),
        );
        assert!(matches!(bad_rows, Err(LinAlgError::DimensionMismatch(_))));

        let duplicate = JacobianFactor::binary(
            4,
            scaled_identity(1.0),
            4,
            scaled_identity(1.0),
            vec2(0.0, 0.0),
            NoiseModel::unit(2),
        );
        assert!(matches!(duplicate, Err(LinAlgError::DimensionMismatch(_))));

        let bad_noise = JacobianFactor::unary(
            0,
            scaled_identity(1.0),
            vec2(0.0, 0.0),
            NoiseModel::unit(3),
        );
        assert!(matches!(bad_noise, Err(LinAlgError::InvalidNoiseModel(_))));

        let empty = JacobianFactor::new(vec![], DVector::zeros(0), NoiseModel::unit(0));
        assert!(empty.is_err());
    }

    #[test]
    fn test_factor_error() -> TestResult {
        let factor = JacobianFactor::binary(
            0,
            scaled_identity(10.0),
            2,
            scaled_identity(-10.0),
            vec2(2.0, -1.0),
            NoiseModel::isotropic(2, 2.0)?,
        )?;
        assert_eq!(factor.rows(), 2);
        assert_eq!(factor.keys().collect::<Vec<_>>(), vec![0, 2]);

        let values: VectorValues = [(0, vec2(0.1, -0.2)), (2, vec2(-0.1, -0.1))]
            .into_iter()
            .collect();
        // A x - b = (2, -1) - (2, -1) = 0
        assert!(factor.error(&values)?.abs() < TOLERANCE);

        let zero: VectorValues = [(0, vec2(0.0, 0.0)), (2, vec2(0.0, 0.0))]
            .into_iter()
            .collect();
        // 0.5 * ((-2/2)^2 + (1/2)^2) = 0.625
        assert!((factor.error(&zero)? - 0.625).abs() < TOLERANCE);

        let missing: VectorValues = [(0, vec2(0.0, 0.0))].into_iter().collect();
        assert!(factor.error(&missing).is_err());
        Ok(())
    }

    #[test]
    fn test_graph_keys_and_dimensions() -> TestResult {
        let mut graph = GaussianFactorGraph::new();
        assert!(graph.is_empty());
        graph.add(JacobianFactor::unary(
            5,
            DMatrix::identity(3, 3),
            DVector::zeros(3),
            NoiseModel::unit(3),
        )?);
        graph.add(JacobianFactor::binary(
            5,
            DMatrix::identity(2, 3),
            1,
            DMatrix::identity(2, 2),
            vec2(0.0, 0.0),
            NoiseModel::unit(2),
        )?);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.rows(), 5);
        assert_eq!(graph.keys(), vec![1, 5]);
        let dims = graph.key_dimensions()?;
        assert_eq!(dims.get(&5), Some(&3));
        assert_eq!(dims.get(&1), Some(&2));

        let adjacency = graph.adjacency();
        assert!(adjacency[&1].contains(&5));
        assert!(adjacency[&5].contains(&1));
        assert!(!adjacency[&5].contains(&5));

        graph.add(JacobianFactor::unary(
            1,
            DMatrix::identity(2, 3),
            vec2(0.0, 0.0),
            NoiseModel::unit(2),
        )?);
        assert!(matches!(
            graph.key_dimensions(),
            Err(LinAlgError::DimensionMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn test_sparse_system_layout() -> TestResult {
        let graph: GaussianFactorGraph = [
            JacobianFactor::unary(
                2,
                scaled_identity(10.0),
                vec2(-1.0, -1.0),
                NoiseModel::unit(2),
            )?,
            JacobianFactor::binary(
                0,
                scaled_identity(10.0),
                2,
                scaled_identity(-10.0),
                vec2(2.0, -1.0),
                NoiseModel::isotropic(2, 2.0)?,
            )?,
        ]
        .into_iter()
        .collect();

        let ordering = Ordering::from_keys(vec![2, 0]);
        let system = graph.sparse_system(&ordering)?;

        assert_eq!(system.jacobian.nrows(), 4);
        assert_eq!(system.jacobian.ncols(), 4);
        assert_eq!(system.columns, vec![(2, 0, 2), (0, 2, 2)]);

        let dense = system.jacobian.to_dense();
        assert_eq!(dense[(0, 0)], 10.0);
        assert_eq!(dense[(0, 2)], 0.0);
        // second factor is whitened by sigma = 2
        assert_eq!(dense[(2, 0)], -5.0);
        assert_eq!(dense[(2, 2)], 5.0);
        assert_eq!(system.rhs[(2, 0)], 1.0);
        assert_eq!(system.rhs[(3, 0)], -0.5);

        let solution = Mat::from_fn(4, 1, |i, _| i as f64);
        let scattered = system.scatter(&solution);
        assert_eq!(scattered.get(2), Some(&vec2(0.0, 1.0)));
        assert_eq!(scattered.get(0), Some(&vec2(2.0, 3.0)));
        Ok(())
    }

    #[test]
    fn test_sparse_system_rejects_bad_ordering() -> TestResult {
        let mut graph = GaussianFactorGraph::new();
        graph.add(JacobianFactor::unary(
            0,
            scaled_identity(1.0),
            vec2(0.0, 0.0),
            NoiseModel::unit(2),
        )?);

        let result = graph.sparse_system(&Ordering::from_keys(vec![0, 1]));
        assert!(matches!(result, Err(LinAlgError::InvalidOrdering(_))));
        Ok(())
    }
}
