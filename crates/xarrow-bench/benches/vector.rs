//! `AlignedVector` benchmarks.
//!
//! Benchmarks for:
//! - Element-wise push with geometric growth
//! - Push into pre-reserved storage
//! - Bulk extend from a slice
//! - Resize with a fill value

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xarrow::AlignedVector;
use xarrow_bench::utils::{random_f64, random_i64};

/// Benchmark pushing one element at a time from empty.
fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/push");

    for size in [1000, 10_000, 100_000].iter() {
        let values = random_i64(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut vector = AlignedVector::<i64>::new();
                for value in &values {
                    vector.push(*value).unwrap();
                }
                black_box(vector.len())
            });
        });
    }

    group.finish();
}

/// Benchmark pushing into storage reserved up front.
fn bench_push_reserved(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/push_reserved");

    for size in [1000, 10_000, 100_000].iter() {
        let values = random_i64(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut vector = AlignedVector::<i64>::with_capacity(size).unwrap();
                for value in &values {
                    vector.push(*value).unwrap();
                }
                black_box(vector.len())
            });
        });
    }

    group.finish();
}

/// Benchmark bulk extend from a slice.
fn bench_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/extend_from_slice");

    for size in [1000, 10_000, 100_000].iter() {
        let values = random_f64(*size);

        group.throughput(Throughput::Bytes((*size * 8) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut vector = AlignedVector::<f64>::new();
                vector.extend_from_slice(black_box(&values)).unwrap();
                black_box(vector.len())
            });
        });
    }

    group.finish();
}

/// Benchmark resize with a fill value.
fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/resize");

    for size in [1000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut vector = AlignedVector::<i32>::new();
                vector.resize(size, 7).unwrap();
                black_box(vector.len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_push,
    bench_push_reserved,
    bench_extend,
    bench_resize,
);
criterion_main!(benches);
