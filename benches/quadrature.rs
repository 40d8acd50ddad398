//! Quadrature and loader benchmarks
//!
//! A typical run records 10^5..10^6 adaptive timesteps; these benchmarks
//! cover the decode and integration cost of one worker task.
//!
//! Run with: cargo bench --bench quadrature

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use richards_batch::loader::{decode_samples, encode_samples};
use richards_batch::quadrature::time_weighted_mean;

const SMALL_SIZE: usize = 1_000;
const MEDIUM_SIZE: usize = 1_000_000;

/// Non-uniform grid with steps growing and shrinking like an adaptive solver
#[allow(clippy::cast_precision_loss)]
fn adaptive_run(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut t = Vec::with_capacity(n);
    let mut acc = 0.0;
    for i in 0..n {
        acc += 1.0 + (i as f64 * 0.01).sin().abs() * 30.0;
        t.push(acc);
    }
    let y = t.iter().map(|s| (s / 86_400.0).cos() * 1e-7).collect();
    (y, t)
}

fn bench_time_weighted_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_weighted_mean");

    for size in [SMALL_SIZE, MEDIUM_SIZE] {
        let (y, t) = adaptive_run(size);
        group.bench_with_input(BenchmarkId::new("trapezoid", size), &(y, t), |b, (y, t)| {
            b.iter(|| time_weighted_mean(black_box(y), black_box(t)));
        });
    }

    group.finish();
}

#[allow(clippy::cast_possible_truncation)]
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_samples");

    let (y, _) = adaptive_run(MEDIUM_SIZE);
    let raw: Vec<f32> = y.iter().map(|&v| v as f32).collect();
    let bytes = encode_samples(&raw);
    group.bench_with_input(BenchmarkId::new("f32_native", MEDIUM_SIZE), &bytes, |b, bytes| {
        b.iter(|| decode_samples(black_box(bytes)));
    });

    group.finish();
}

criterion_group!(benches, bench_time_weighted_mean, bench_decode);
criterion_main!(benches);
