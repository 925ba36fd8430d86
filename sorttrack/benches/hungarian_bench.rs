use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rand::prelude::*;
use sorttrack::hungarian::HungarianSolver;
use std::hint::black_box;

fn generate_random_iou_matrix(detections: usize, tracks: usize) -> Array2<f32> {
    let mut rng = thread_rng();
    Array2::from_shape_fn((detections, tracks), |_| rng.gen_range(0.0..1.0))
}

fn bench_hungarian_small(c: &mut Criterion) {
    let iou_matrix = generate_random_iou_matrix(10, 10);

    c.bench_function("hungarian_iou_10x10", |b| {
        b.iter(|| HungarianSolver::solve_iou(black_box(iou_matrix.view()), black_box(0.3)))
    });
}

fn bench_hungarian_medium(c: &mut Criterion) {
    let iou_matrix = generate_random_iou_matrix(50, 50);

    c.bench_function("hungarian_iou_50x50", |b| {
        b.iter(|| HungarianSolver::solve_iou(black_box(iou_matrix.view()), black_box(0.3)))
    });
}

fn bench_hungarian_rectangular(c: &mut Criterion) {
    let iou_matrix = generate_random_iou_matrix(40, 15);

    c.bench_function("hungarian_iou_40x15", |b| {
        b.iter(|| HungarianSolver::solve_iou(black_box(iou_matrix.view()), black_box(0.3)))
    });
}

criterion_group!(
    benches,
    bench_hungarian_small,
    bench_hungarian_medium,
    bench_hungarian_rectangular
);
criterion_main!(benches);
