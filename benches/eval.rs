//! Evaluation and Reduction Benchmarks
//!
//! Compares the execution policies on the same data across matrix sizes.
//!
//! # Benchmark Categories
//!
//! ## 1. **Scalar vs SIMD kernels**
//! - Element-wise `a * b + c` with the packed kernels disabled and enabled
//! - `sum` and `norm_l2` reductions with the packed kernels disabled and enabled
//!
//! ## 2. **Linear vs per-column access**
//! - The same expression forced through both drivers on dense operands
//! - A padded (per-column continuous) source, which cannot go linear
//! - A transposed source, read through strides

use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use simdmat::{
    evaluate_with, evaluate_with_policy, reduce, AccessKind, ColsRef, DenseMatrix, EvalConfig,
    KernelKind, Policy, StridedRef,
};

// ================================================================================================
// BENCHMARK CONFIGURATION
// ================================================================================================

/// Square matrix sizes, from L1-resident to main memory.
///
/// - **32 x 32**: 4 KiB of f32, fits in L1
/// - **128 x 128**: 64 KiB, L1 to L2 transition
/// - **512 x 512**: 1 MiB, L2
/// - **2048 x 2048**: 16 MiB, L3 or main memory
const MATRIX_SIZES: &[usize] = &[32, 128, 512, 2048];

// ================================================================================================
// TEST DATA GENERATION
// ================================================================================================

/// Reproducible random matrix with values in [0, 1).
fn random_matrix(rows: usize, cols: usize, seed: u64) -> DenseMatrix<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    DenseMatrix::from_fn(rows, cols, |_, _| rng.random::<f32>())
}

// ================================================================================================
// BENCHMARK IMPLEMENTATIONS
// ================================================================================================

fn benchmark_kernels(c: &mut Criterion) {
    let scalar = EvalConfig::default().with_simd(false);
    let simd = EvalConfig::default();

    for &n in MATRIX_SIZES {
        let mut group = c.benchmark_group(format!("Kernels_{n}x{n}"));
        group.throughput(Throughput::Bytes((n * n * std::mem::size_of::<f32>() * 3) as u64));

        let a = random_matrix(n, n, 1);
        let b = random_matrix(n, n, 2);
        let c_mat = random_matrix(n, n, 3);
        let mut out = DenseMatrix::zeros(n, n);

        for (name, config) in [("scalar", &scalar), ("simd", &simd)] {
            group.bench_function(BenchmarkId::new("fma", name), |bench| {
                bench.iter(|| {
                    evaluate_with(config, black_box(a.ex() * b.ex() + c_mat.ex()), &mut out)
                        .unwrap();
                    black_box(&out);
                })
            });

            group.bench_function(BenchmarkId::new("sum", name), |bench| {
                bench.iter(|| black_box(reduce::sum_with(config, black_box(a.ex())).unwrap()))
            });

            group.bench_function(BenchmarkId::new("norm_l2", name), |bench| {
                bench.iter(|| black_box(reduce::norm_l2_with(config, black_box(a.ex())).unwrap()))
            });
        }

        // ndarray reference
        let a_nd = Array2::from_shape_vec((n, n), a.as_slice().to_vec()).unwrap();
        let b_nd = Array2::from_shape_vec((n, n), b.as_slice().to_vec()).unwrap();
        let c_nd = Array2::from_shape_vec((n, n), c_mat.as_slice().to_vec()).unwrap();
        group.bench_function(BenchmarkId::new("fma", "ndarray"), |bench| {
            bench.iter(|| black_box(&a_nd * &b_nd + &c_nd))
        });

        group.finish();
    }
}

fn benchmark_access(c: &mut Criterion) {
    for &n in MATRIX_SIZES {
        let mut group = c.benchmark_group(format!("Access_{n}x{n}"));
        group.throughput(Throughput::Bytes((n * n * std::mem::size_of::<f32>() * 2) as u64));

        let a = random_matrix(n, n, 4);
        let b = random_matrix(n, n, 5);
        let mut out = DenseMatrix::zeros(n, n);

        for (name, access) in [("linear", AccessKind::Linear), ("percol", AccessKind::PerColumn)] {
            let policy = Policy::new(access, KernelKind::Simd);
            group.bench_function(BenchmarkId::new("dense", name), |bench| {
                bench.iter(|| {
                    evaluate_with_policy(black_box(a.ex() + b.ex()), &mut out, policy).unwrap();
                    black_box(&out);
                })
            });
        }

        // padded columns: one spare row per column
        let padded: Vec<f32> = (0..(n + 1) * n).map(|v| v as f32).collect();
        let cols = ColsRef::new(&padded, n, n, n + 1).unwrap();
        group.bench_function(BenchmarkId::new("padded", "percol"), |bench| {
            bench.iter(|| {
                evaluate_with(&EvalConfig::default(), black_box(cols.ex() + b.ex()), &mut out)
                    .unwrap();
                black_box(&out);
            })
        });

        // transposed source through strides, direct and cached
        let t: StridedRef<'_, f32> = a.view().t();
        for (name, allow_cache) in [("direct", false), ("cached", true)] {
            let config = EvalConfig::default().with_cache(allow_cache).with_shortvec_threshold(n + 1);
            group.bench_function(BenchmarkId::new("transposed", name), |bench| {
                bench.iter(|| {
                    evaluate_with(&config, black_box(t.ex() + b.ex()), &mut out).unwrap();
                    black_box(&out);
                })
            });
        }

        group.finish();
    }
}

// ================================================================================================
// CRITERION INTEGRATION
// ================================================================================================

fn all_benchmarks(c: &mut Criterion) {
    println!("Starting evaluation benchmarks over {} matrix sizes", MATRIX_SIZES.len());
    let start_time = Instant::now();

    benchmark_kernels(c);
    benchmark_access(c);

    println!(
        "Benchmark suite completed in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );
}

criterion_group!(benches, all_benchmarks);
criterion_main!(benches);
