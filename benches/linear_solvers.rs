//! Benchmark the two linear solver strategies on chain-shaped pose graphs.
//!
//! Each graph is one linearization of an odometry chain with a prior on the first pose
//! and a loop closure every `LOOP_STRIDE` poses, evaluated at a perturbed estimate.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nalgebra::{DMatrix, Matrix3};
use planar_lsq::{
    GaussianFactorGraph, JacobianFactor, Key, LieGroup, LinearSolverParams, LinearSolverType,
    NoiseModel, Ordering, SE2, SE2Tangent, Tangent, linalg::solve,
};
use std::hint::black_box;

const LOOP_STRIDE: usize = 25;

fn to_dmatrix(m: &Matrix3<f64>) -> DMatrix<f64> {
    DMatrix::from_column_slice(3, 3, m.as_slice())
}

/// Linearized between factor `x_from⁻¹ x_to ⊖ measured`.
fn between_factor(
    from: Key,
    x_from: &SE2,
    to: Key,
    x_to: &SE2,
    measured: &SE2,
) -> Option<JacobianFactor> {
    let mut j_from = Matrix3::zeros();
    let mut j_to = Matrix3::zeros();
    let predicted = x_from.between(x_to, Some(&mut j_from), Some(&mut j_to));

    let mut j_r = Matrix3::zeros();
    let residual = predicted.right_minus(measured, Some(&mut j_r), None);

    JacobianFactor::binary(
        from,
        to_dmatrix(&(j_r * j_from)),
        to,
        to_dmatrix(&(j_r * j_to)),
        -residual.to_vector(),
        NoiseModel::isotropic(3, 0.1).ok()?,
    )
    .ok()
}

fn chain_graph(num_poses: usize) -> GaussianFactorGraph {
    let step = SE2::from_xy_angle(1.0, 0.0, 0.1);
    let mut truth = vec![SE2::identity()];
    for i in 1..num_poses {
        truth.push(truth[i - 1].compose(&step, None, None));
    }

    let estimates: Vec<SE2> = truth
        .iter()
        .enumerate()
        .map(|(i, pose)| {
            let t = i as f64;
            let noise = SE2Tangent::new(0.05 * t.sin(), 0.05 * t.cos(), 0.02 * (0.5 * t).sin());
            pose.expmap(&noise)
        })
        .collect();

    let mut graph = GaussianFactorGraph::new();
    let mut prior_jacobian = Matrix3::zeros();
    let prior_residual = estimates[0].right_minus(&truth[0], Some(&mut prior_jacobian), None);
    if let Ok(prior) = JacobianFactor::unary(
        0,
        to_dmatrix(&prior_jacobian),
        -prior_residual.to_vector(),
        NoiseModel::unit(3),
    ) {
        graph.add(prior);
    }

    let mut add_edge = |i: usize, j: usize| {
        let measured = truth[i].between(&truth[j], None, None);
        let factor = between_factor(i as Key, &estimates[i], j as Key, &estimates[j], &measured);
        if let Some(f) = factor {
            graph.add(f);
        }
    };
    for i in 1..num_poses {
        add_edge(i - 1, i);
    }
    for i in (LOOP_STRIDE..num_poses).step_by(LOOP_STRIDE) {
        add_edge(i - LOOP_STRIDE, i);
    }

    graph
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_chain_solve");

    for num_poses in [100, 500, 2000] {
        let graph = chain_graph(num_poses);

        for strategy in [LinearSolverType::SparseCholesky, LinearSolverType::SparseQR] {
            let params = LinearSolverParams::new().with_linear_solver_type(strategy);
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), num_poses),
                &graph,
                |b, graph| {
                    b.iter(|| {
                        let solution = solve(black_box(graph), black_box(&params));
                        black_box(solution)
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_ordering(c: &mut Criterion) {
    let graph = chain_graph(2000);
    c.bench_function("min_degree_ordering_2000_poses", |b| {
        b.iter(|| black_box(Ordering::min_degree(black_box(&graph))))
    });
}

criterion_group!(benches, bench_strategies, bench_ordering);
criterion_main!(benches);
