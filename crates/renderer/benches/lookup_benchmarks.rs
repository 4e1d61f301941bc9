//! Benchmarks for nearest-sample lookup.
//!
//! Run with: cargo bench --package renderer --bench lookup_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use current_common::{CurrentSample, GeoPoint};
use rand::Rng;
use renderer::CurrentField;

/// Random samples over a 20x20 degree box.
fn generate_samples(count: usize) -> Vec<CurrentSample> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            CurrentSample::new(
                rng.gen_range(0.0..20.0),
                rng.gen_range(60.0..80.0),
                rng.gen_range(0.0..1.2),
                rng.gen_range(0.0..360.0),
            )
        })
        .collect()
}

/// Query points matching an 800x600 grid walk at 20px spacing.
fn generate_queries() -> Vec<GeoPoint> {
    let mut points = Vec::with_capacity(1200);
    for x in (0..800).step_by(20) {
        for y in (0..600).step_by(20) {
            points.push(GeoPoint::new(20.0 - y as f64 * 0.025, 60.0 + x as f64 * 0.025));
        }
    }
    points
}

// =============================================================================
// LINEAR VS BUCKETED
// =============================================================================

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_sample");
    let queries = generate_queries();
    group.throughput(Throughput::Elements(queries.len() as u64));

    for count in [100, 1_000, 10_000] {
        let samples = generate_samples(count);
        let linear = CurrentField::linear(samples.clone(), 1.0);
        let bucketed = CurrentField::bucketed(samples, 1.0);

        group.bench_with_input(BenchmarkId::new("linear", count), &linear, |b, field| {
            b.iter(|| {
                for point in &queries {
                    black_box(field.nearest(*point));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("buckets", count), &bucketed, |b, field| {
            b.iter(|| {
                for point in &queries {
                    black_box(field.nearest(*point));
                }
            });
        });
    }

    group.finish();
}

fn bench_build_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_buckets");

    for count in [1_000, 10_000] {
        let samples = generate_samples(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &samples, |b, samples| {
            b.iter(|| CurrentField::bucketed(black_box(samples.clone()), 1.0));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nearest, bench_build_buckets);
criterion_main!(benches);
