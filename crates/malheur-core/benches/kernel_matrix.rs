//! Kernel Matrix and Prototype Extraction Benchmarks
//!
//! Measures row-parallel matrix computation and the sequential prototype
//! pass on synthetic report collections.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use malheur_core::types::{HashAlgorithm, KernelScheme, MetricDirection, Normalization};
use malheur_core::{FeatureArray, FeatureSpace, KernelEngine, PrototypeExtractor};

fn synthetic_array(n: usize, seed: u64) -> FeatureArray {
    let space = FeatureSpace::new(HashAlgorithm::Xxh3, 20, false).unwrap();
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let reports: Vec<(String, Vec<String>)> = (0..n)
        .map(|i| {
            let len = 20 + next() % 80;
            let tokens = (0..len).map(|_| format!("api{}", next() % 500)).collect();
            (format!("r{}", i), tokens)
        })
        .collect();
    FeatureArray::from_tokenized(reports, &space, Normalization::L2).unwrap()
}

// ============================================================================
// Kernel Matrix Benchmarks
// ============================================================================

fn bench_self_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_self_matrix");

    for n in [100usize, 400, 1000] {
        let array = synthetic_array(n, 42);
        group.throughput(Throughput::Elements((n * (n + 1) / 2) as u64));

        for scheme in [KernelScheme::Linear, KernelScheme::Cosine] {
            let engine = KernelEngine::new(scheme);
            group.bench_with_input(
                BenchmarkId::new(scheme.to_string(), n),
                &array,
                |bench, array| {
                    bench.iter(|| engine.compute_self(black_box(array)).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn bench_rectangular_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_rect_matrix");
    let rows = synthetic_array(1000, 7);
    let engine = KernelEngine::new(KernelScheme::Cosine);

    for m in [10usize, 50, 200] {
        let cols = synthetic_array(m, 11);
        group.throughput(Throughput::Elements((1000 * m) as u64));
        group.bench_with_input(BenchmarkId::new("cosine", m), &cols, |bench, cols| {
            bench.iter(|| engine.compute_matrix(black_box(&rows), cols).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Prototype Extraction Benchmarks
// ============================================================================

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prototype_extraction");
    let array = synthetic_array(1000, 3);

    for theta in [0.3f64, 0.6, 0.9] {
        let extractor = PrototypeExtractor::new(
            KernelEngine::new(KernelScheme::Cosine),
            MetricDirection::Similarity,
            theta,
        )
        .unwrap();
        group.bench_with_input(
            BenchmarkId::new("cosine_similarity", theta),
            &array,
            |bench, array| {
                bench.iter(|| extractor.extract(black_box(array)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_self_matrix,
    bench_rectangular_matrix,
    bench_extraction
);
criterion_main!(benches);
