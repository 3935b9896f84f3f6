//! Reductions against naive nested-loop references.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simdmat::reduce::{self, Mean, Sum};
use simdmat::{
    all, amax, any, asum, colwise_all, colwise_count, colwise_maximum, colwise_mean, colwise_sum,
    constant, count, dot, entropy, logsum, maximum, mean, minimum, norm_l2, rowwise_any,
    rowwise_count, rowwise_mean, rowwise_minimum, single, sqsum, sum, DenseMatrix, EvalConfig,
    MatError, WIDTH,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn shapes() -> Vec<(usize, usize)> {
    let n = 2 * WIDTH + 3;
    vec![(1, 1), (1, n), (n, 1), (n, 5), (WIDTH, WIDTH), (0, 3), (3, 0), (0, 0)]
}

#[test]
fn test_sum_of_a_constant_matrix() {
    init_logger();
    for (rows, cols) in shapes() {
        let total = sum(constant(2.0f64, rows, cols)).unwrap();
        assert_eq!(total, 2.0 * (rows * cols) as f64);

        let m = DenseMatrix::from_elem(rows, cols, 0.1f32);
        let total = sum(m.ex()).unwrap();
        let expected = 0.1f32 * (rows * cols) as f32;
        assert!((total - expected).abs() <= 1e-4 * expected.max(1.0), "{total} vs {expected}");
    }
}

#[test]
fn test_maximum_and_minimum_of_a_ramp() {
    for (rows, cols) in shapes() {
        let m = DenseMatrix::from_fn(rows, cols, |i, j| (i + j * rows) as f64);
        let n = rows * cols;
        if n == 0 {
            assert!(matches!(maximum(m.ex()), Err(MatError::EmptyInput { .. })));
            assert!(matches!(minimum(m.ex()), Err(MatError::EmptyInput { .. })));
            assert!(matches!(mean(m.ex()), Err(MatError::EmptyInput { .. })));
            continue;
        }
        assert_eq!(maximum(m.ex()).unwrap(), (n - 1) as f64);
        assert_eq!(minimum(m.ex()).unwrap(), 0.0);
        assert_eq!(maximum(m.view().t().ex()).unwrap(), (n - 1) as f64);
        assert_eq!(minimum(m.view().t().ex()).unwrap(), 0.0);
    }
}

#[test]
fn test_empty_value_table() {
    let empty = DenseMatrix::<f32>::zeros(0, 4);
    assert_eq!(sum(empty.ex()).unwrap(), 0.0);
    assert_eq!(asum(empty.ex()).unwrap(), 0.0);
    assert_eq!(sqsum(empty.ex()).unwrap(), 0.0);
    assert_eq!(norm_l2(empty.ex()).unwrap(), 0.0);
    assert_eq!(amax(empty.ex()).unwrap(), 0.0);
    assert_eq!(logsum(empty.ex()).unwrap(), 0.0);
    assert_eq!(entropy(empty.ex()).unwrap(), 0.0);
    assert_eq!(dot(empty.ex(), empty.ex()).unwrap(), 0.0);

    let mut per_col = [9.0f32; 4];
    assert!(matches!(
        colwise_maximum(empty.ex(), &mut per_col),
        Err(MatError::EmptyInput { .. })
    ));
    colwise_sum(empty.ex(), &mut per_col).unwrap();
    assert_eq!(per_col, [0.0; 4]);

    // no rows at all: nothing to write and nothing to complain about
    let mut per_row: [f32; 0] = [];
    reduce::rowwise_maximum(empty.ex(), &mut per_row).unwrap();
}

#[test]
fn test_oversized_shapes_are_errors() {
    let huge = constant(1.0f64, usize::MAX, 2);
    assert!(matches!(sum(huge), Err(MatError::InvalidArgument { .. })));
    assert!(matches!(maximum(huge), Err(MatError::InvalidArgument { .. })));
    assert!(matches!(
        count(huge.cmp_gt(single(0.0f64))),
        Err(MatError::InvalidArgument { .. })
    ));

    let mut per_col = [0.0f64; 2];
    assert!(matches!(
        colwise_sum(huge, &mut per_col),
        Err(MatError::InvalidArgument { .. })
    ));
}

#[test]
fn test_colwise_and_rowwise_against_loops() {
    let mut rng = StdRng::seed_from_u64(3);
    let (rows, cols) = (2 * WIDTH + 3, 6);
    let m = DenseMatrix::from_fn(rows, cols, |_, _| rng.random_range(-4i32..=4) as f64);

    let mut sums = vec![0.0; cols];
    let mut means = vec![0.0; cols];
    colwise_sum(m.ex(), &mut sums).unwrap();
    colwise_mean(m.ex(), &mut means).unwrap();
    for j in 0..cols {
        let column: f64 = (0..rows).map(|i| m.get(i, j).unwrap()).sum();
        assert_eq!(sums[j], column);
        assert_eq!(means[j], column / rows as f64);
    }

    let mut mins = vec![0.0; rows];
    let mut row_means = vec![0.0; rows];
    rowwise_minimum(m.ex(), &mut mins).unwrap();
    rowwise_mean(m.ex(), &mut row_means).unwrap();
    for i in 0..rows {
        let row: Vec<f64> = (0..cols).map(|j| m.get(i, j).unwrap()).collect();
        assert_eq!(mins[i], row.iter().cloned().fold(f64::INFINITY, f64::min));
        assert_eq!(row_means[i], row.iter().sum::<f64>() / cols as f64);
    }

    let mut wrong = vec![0.0; rows + 1];
    assert!(matches!(
        rowwise_minimum(m.ex(), &mut wrong),
        Err(MatError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_scalar_and_simd_reductions_agree_on_integers() {
    let mut rng = StdRng::seed_from_u64(5);
    let m = DenseMatrix::from_fn(3 * WIDTH + 1, 4, |_, _| rng.random_range(-100i32..100) as f32);
    let scalar = EvalConfig::default().with_simd(false);
    let simd = EvalConfig::default();

    // integer-valued sums are exact in any order
    assert_eq!(
        reduce::sum_with(&scalar, m.ex()).unwrap(),
        reduce::sum_with(&simd, m.ex()).unwrap()
    );
    assert_eq!(
        reduce::amax_with(&scalar, m.ex()).unwrap(),
        reduce::amax_with(&simd, m.ex()).unwrap()
    );
    assert_eq!(
        reduce::reduce_with::<Mean, _>(&scalar, m.view().t().ex()).unwrap(),
        reduce::reduce_with::<Mean, _>(&simd, m.view().t().ex()).unwrap()
    );
    assert_eq!(
        reduce::reduce::<Sum, _>(m.ex() * m.ex()).unwrap(),
        reduce::sqsum_with(&scalar, m.ex()).unwrap()
    );
}

#[test]
fn test_dot_and_entropy() {
    let a = DenseMatrix::from_fn(WIDTH + 2, 3, |i, j| (i + j) as f64);
    let b = DenseMatrix::from_fn(WIDTH + 2, 3, |i, j| (i * j) as f64);
    let expected: f64 = (0..3)
        .flat_map(|j| (0..WIDTH + 2).map(move |i| ((i + j) * (i * j)) as f64))
        .sum();
    assert_eq!(dot(a.ex(), b.ex()).unwrap(), expected);

    let p = DenseMatrix::from_row_major(1, 4, &[0.5f64, 0.25, 0.25, 0.0]).unwrap();
    let h = entropy(p.ex()).unwrap();
    assert!((h - 1.5 * std::f64::consts::LN_2).abs() < 1e-12);
}

/// Naive references for the boolean reductions.
fn naive_tallies(mask: &[bool], rows: usize, cols: usize) -> (bool, bool, usize, Vec<usize>, Vec<bool>) {
    let at = |i: usize, j: usize| mask[i + j * rows];
    let all_true = (0..cols).all(|j| (0..rows).all(|i| at(i, j)));
    let any_true = (0..cols).any(|j| (0..rows).any(|i| at(i, j)));
    let mut total = 0;
    for j in 0..cols {
        for i in 0..rows {
            if at(i, j) {
                total += 1;
            }
        }
    }
    let per_col = (0..cols).map(|j| (0..rows).filter(|&i| at(i, j)).count()).collect();
    let per_row = (0..rows).map(|i| (0..cols).any(|j| at(i, j))).collect();
    (all_true, any_true, total, per_col, per_row)
}

#[test]
fn test_boolean_reductions_against_loops() {
    let mut rng = StdRng::seed_from_u64(17);
    for (rows, cols) in shapes() {
        for threshold in [0.0f64, 0.5, 1.0] {
            let m = DenseMatrix::from_fn(rows, cols, |_, _| rng.random_range(0.0..1.0));
            let expr = m.ex().cmp_ge(single(threshold));
            let mask: Vec<bool> = m.as_slice().iter().map(|&v| v >= threshold).collect();
            let (all_ref, any_ref, count_ref, per_col_ref, per_row_ref) =
                naive_tallies(&mask, rows, cols);

            assert_eq!(all(expr).unwrap(), all_ref, "all over {rows} x {cols}");
            assert_eq!(any(expr).unwrap(), any_ref, "any over {rows} x {cols}");
            assert_eq!(count(expr).unwrap(), count_ref, "count over {rows} x {cols}");

            let mut per_col = vec![0usize; cols];
            colwise_count(expr, &mut per_col).unwrap();
            assert_eq!(per_col, per_col_ref);

            let mut per_row = vec![false; rows];
            rowwise_any(expr, &mut per_row).unwrap();
            assert_eq!(per_row, per_row_ref);

            // the transposed layout walks per column and must agree
            let t = m.view().t();
            assert_eq!(count(t.ex().cmp_ge(single(threshold))).unwrap(), count_ref);
        }
    }

    // vacuous results for zero elements
    let none = DenseMatrix::<f32>::zeros(0, 2);
    let expr = none.ex().cmp_lt(single(1.0f32));
    assert!(all(expr).unwrap());
    assert!(!any(expr).unwrap());
    assert_eq!(count(expr).unwrap(), 0);
    let mut per_col = [false; 2];
    colwise_all(expr, &mut per_col).unwrap();
    assert_eq!(per_col, [true, true]);
    let mut per_row: [usize; 0] = [];
    rowwise_count(expr, &mut per_row).unwrap();
}
