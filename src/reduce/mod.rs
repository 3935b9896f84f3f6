//! Reductions of matrix expressions.
//!
//! Every reduction walks the expression in the same order as evaluation: linearly
//! when the expression is continuous, column by column otherwise. Packed passes keep
//! one accumulator per lane and fold it with a halving ladder before the scalar tail
//! is added, so a given configuration always produces the same bits.
//!
//! | reduction | value | empty input |
//! |-----------|-------|-------------|
//! | `sum` | `Σ x` | `0` |
//! | `mean` | `Σ x / n` | error (not NaN) |
//! | `maximum` / `minimum` | `max x` / `min x` | error |
//! | `asum` | `Σ abs(x)` | `0` |
//! | `sqsum` | `Σ x²` | `0` |
//! | `norm_l2` | `sqrt(Σ x²)` | `0` |
//! | `amax` | `max abs(x)` | `0` |
//! | `logsum` | `Σ ln x` | `0` |
//! | `entropy` | `-Σ x ln x` | `0` |
//! | `all` / `any` / `count` | over `bool` | `true` / `false` / `0` |
//!
//! An empty `mean` is reported as [`EmptyInput`](crate::MatError::EmptyInput) like
//! the order-based reductions instead of producing `0 / 0`.
//!
//! Column-wise forms write one value per column and row-wise forms one value per
//! row into a caller-provided slice.

mod accum;
mod logical;
pub mod reductor;

pub use accum::{reduce_with, colwise_with, rowwise_with, Accumulator, AccumulatorCols};
pub use logical::{
    colwise_tally_with, rowwise_tally_with, tally_with, All, Any, Count, Tally, TallyKernel,
};
pub use reductor::{
    Amax, Asum, Entropy, Logsum, Maximum, Mean, Minimum, NormL2, ReduceKernel, Reductor, Sqsum,
    Sum,
};

use crate::config::EvalConfig;
use crate::element::RealElement;
use crate::error::Result;
use crate::expr::{ops, Binary, MatExpr};

/// Reduces every element of `expr` with `R` under the default configuration.
pub fn reduce<R, E>(expr: E) -> Result<E::Elem>
where
    R: Reductor,
    E: MatExpr,
    E::Elem: RealElement,
{
    reduce_with::<R, E>(&EvalConfig::default(), expr)
}

/// Reduces each column of `expr` into `out`, which must hold one value per column.
pub fn colwise<R, E>(expr: E, out: &mut [E::Elem]) -> Result<()>
where
    R: Reductor,
    E: MatExpr,
    E::Elem: RealElement,
{
    colwise_with::<R, E>(&EvalConfig::default(), expr, out)
}

/// Reduces each row of `expr` into `out`, which must hold one value per row.
pub fn rowwise<R, E>(expr: E, out: &mut [E::Elem]) -> Result<()>
where
    R: Reductor,
    E: MatExpr,
    E::Elem: RealElement,
{
    rowwise_with::<R, E>(&EvalConfig::default(), expr, out)
}

macro_rules! named_reductions {
    ($($reductor:ident => $name:ident, $with:ident, $colwise:ident, $colwise_with:ident, $rowwise:ident, $rowwise_with:ident;)*) => {
        $(
            #[doc = concat!("`", stringify!($name), "` over every element.")]
            pub fn $name<E>(expr: E) -> Result<E::Elem>
            where
                E: MatExpr,
                E::Elem: RealElement,
            {
                reduce::<$reductor, E>(expr)
            }

            pub fn $with<E>(config: &EvalConfig, expr: E) -> Result<E::Elem>
            where
                E: MatExpr,
                E::Elem: RealElement,
            {
                reduce_with::<$reductor, E>(config, expr)
            }

            #[doc = concat!("`", stringify!($name), "` of each column.")]
            pub fn $colwise<E>(expr: E, out: &mut [E::Elem]) -> Result<()>
            where
                E: MatExpr,
                E::Elem: RealElement,
            {
                colwise::<$reductor, E>(expr, out)
            }

            pub fn $colwise_with<E>(config: &EvalConfig, expr: E, out: &mut [E::Elem]) -> Result<()>
            where
                E: MatExpr,
                E::Elem: RealElement,
            {
                colwise_with::<$reductor, E>(config, expr, out)
            }

            #[doc = concat!("`", stringify!($name), "` of each row.")]
            pub fn $rowwise<E>(expr: E, out: &mut [E::Elem]) -> Result<()>
            where
                E: MatExpr,
                E::Elem: RealElement,
            {
                rowwise::<$reductor, E>(expr, out)
            }

            pub fn $rowwise_with<E>(config: &EvalConfig, expr: E, out: &mut [E::Elem]) -> Result<()>
            where
                E: MatExpr,
                E::Elem: RealElement,
            {
                rowwise_with::<$reductor, E>(config, expr, out)
            }
        )*
    };
}

named_reductions! {
    Sum => sum, sum_with, colwise_sum, colwise_sum_with, rowwise_sum, rowwise_sum_with;
    Mean => mean, mean_with, colwise_mean, colwise_mean_with, rowwise_mean, rowwise_mean_with;
    Maximum => maximum, maximum_with, colwise_maximum, colwise_maximum_with, rowwise_maximum, rowwise_maximum_with;
    Minimum => minimum, minimum_with, colwise_minimum, colwise_minimum_with, rowwise_minimum, rowwise_minimum_with;
    Asum => asum, asum_with, colwise_asum, colwise_asum_with, rowwise_asum, rowwise_asum_with;
    Sqsum => sqsum, sqsum_with, colwise_sqsum, colwise_sqsum_with, rowwise_sqsum, rowwise_sqsum_with;
    NormL2 => norm_l2, norm_l2_with, colwise_norm_l2, colwise_norm_l2_with, rowwise_norm_l2, rowwise_norm_l2_with;
    Amax => amax, amax_with, colwise_amax, colwise_amax_with, rowwise_amax, rowwise_amax_with;
    Logsum => logsum, logsum_with, colwise_logsum, colwise_logsum_with, rowwise_logsum, rowwise_logsum_with;
    Entropy => entropy, entropy_with, colwise_entropy, colwise_entropy_with, rowwise_entropy, rowwise_entropy_with;
}

/// Vector norms, seen over all elements of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Norm {
    /// `Σ abs(x)`
    L1,
    /// `sqrt(Σ x²)`
    L2,
    /// `max abs(x)`
    Linf,
}

pub fn norm<E>(expr: E, kind: Norm) -> Result<E::Elem>
where
    E: MatExpr,
    E::Elem: RealElement,
{
    norm_with(&EvalConfig::default(), expr, kind)
}

pub fn norm_with<E>(config: &EvalConfig, expr: E, kind: Norm) -> Result<E::Elem>
where
    E: MatExpr,
    E::Elem: RealElement,
{
    match kind {
        Norm::L1 => reduce_with::<Asum, E>(config, expr),
        Norm::L2 => reduce_with::<NormL2, E>(config, expr),
        Norm::Linf => reduce_with::<Amax, E>(config, expr),
    }
}

/// Norm of each column.
pub fn colwise_norm<E>(expr: E, kind: Norm, out: &mut [E::Elem]) -> Result<()>
where
    E: MatExpr,
    E::Elem: RealElement,
{
    let config = EvalConfig::default();
    match kind {
        Norm::L1 => colwise_with::<Asum, E>(&config, expr, out),
        Norm::L2 => colwise_with::<NormL2, E>(&config, expr, out),
        Norm::Linf => colwise_with::<Amax, E>(&config, expr, out),
    }
}

/// Norm of each row.
pub fn rowwise_norm<E>(expr: E, kind: Norm, out: &mut [E::Elem]) -> Result<()>
where
    E: MatExpr,
    E::Elem: RealElement,
{
    let config = EvalConfig::default();
    match kind {
        Norm::L1 => rowwise_with::<Asum, E>(&config, expr, out),
        Norm::L2 => rowwise_with::<NormL2, E>(&config, expr, out),
        Norm::Linf => rowwise_with::<Amax, E>(&config, expr, out),
    }
}

/// `Σ a ⊙ b`, the Frobenius inner product. Operands of different shapes are a
/// dimension mismatch reported as `dot`.
pub fn dot<A, B>(a: A, b: B) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    dot_with(&EvalConfig::default(), a, b)
}

pub fn dot_with<A, B>(config: &EvalConfig, a: A, b: B) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    a.extent()?.unify(b.extent()?, "dot")?;
    reduce_with::<Sum, _>(config, Binary::<ops::Mul, A, B>::new(a, b))
}

/// Norm of `a - b`.
pub fn diff_norm<A, B>(a: A, b: B, kind: Norm) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    a.extent()?.unify(b.extent()?, "diff_norm")?;
    norm(Binary::<ops::Sub, A, B>::new(a, b), kind)
}

/// `Σ abs(a - b)`
pub fn diff_asum<A, B>(a: A, b: B) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    a.extent()?.unify(b.extent()?, "diff_asum")?;
    asum(Binary::<ops::Sub, A, B>::new(a, b))
}

/// `Σ (a - b)²`
pub fn diff_sqsum<A, B>(a: A, b: B) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    a.extent()?.unify(b.extent()?, "diff_sqsum")?;
    sqsum(Binary::<ops::Sub, A, B>::new(a, b))
}

pub fn diff_norm_l2<A, B>(a: A, b: B) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    diff_norm(a, b, Norm::L2)
}

pub fn diff_norm_linf<A, B>(a: A, b: B) -> Result<A::Elem>
where
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    diff_norm(a, b, Norm::Linf)
}

macro_rules! named_tallies {
    ($($tally:ident: $out:ty => $name:ident, $with:ident, $colwise:ident, $rowwise:ident;)*) => {
        $(
            pub fn $name<E: MatExpr<Elem = bool>>(expr: E) -> Result<$out> {
                tally_with::<$tally, E>(&EvalConfig::default(), expr)
            }

            pub fn $with<E: MatExpr<Elem = bool>>(config: &EvalConfig, expr: E) -> Result<$out> {
                tally_with::<$tally, E>(config, expr)
            }

            pub fn $colwise<E: MatExpr<Elem = bool>>(expr: E, out: &mut [$out]) -> Result<()> {
                colwise_tally_with::<$tally, E>(&EvalConfig::default(), expr, out)
            }

            pub fn $rowwise<E: MatExpr<Elem = bool>>(expr: E, out: &mut [$out]) -> Result<()> {
                rowwise_tally_with::<$tally, E>(&EvalConfig::default(), expr, out)
            }
        )*
    };
}

named_tallies! {
    All: bool => all, all_with, colwise_all, rowwise_all;
    Any: bool => any, any_with, colwise_any, rowwise_any;
    Count: usize => count, count_with, colwise_count, rowwise_count;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatError;
    use crate::matrix::{DenseMatrix, StridedRef};
    use crate::simd::WIDTH;

    fn ramp(rows: usize, cols: usize) -> DenseMatrix<f64> {
        DenseMatrix::from_fn(rows, cols, |i, j| (i + j * rows) as f64 + 1.0)
    }

    #[test]
    fn test_sum_and_mean_of_a_ramp() {
        let a = ramp(WIDTH + 1, 3);
        let n = a.nelems() as f64;
        assert_eq!(sum(a.ex()).unwrap(), n * (n + 1.0) / 2.0);
        assert_eq!(mean(a.ex()).unwrap(), (n + 1.0) / 2.0);
        assert_eq!(maximum(a.ex()).unwrap(), n);
        assert_eq!(minimum(-a.ex()).unwrap(), -n);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = DenseMatrix::<f64>::zeros(0, 3);
        assert_eq!(sum(empty.ex()).unwrap(), 0.0);
        assert_eq!(norm_l2(empty.ex()).unwrap(), 0.0);
        assert_eq!(amax(empty.ex()).unwrap(), 0.0);
        assert!(matches!(mean(empty.ex()), Err(MatError::EmptyInput { .. })));
        assert!(matches!(maximum(empty.ex()), Err(MatError::EmptyInput { .. })));

        let mut out = [1.0f64; 3];
        colwise_sum(empty.ex(), &mut out).unwrap();
        assert_eq!(out, [0.0; 3]);
        assert!(colwise_minimum(empty.ex(), &mut out).is_err());
    }

    #[test]
    fn test_colwise_and_rowwise() {
        let rows = WIDTH + 2;
        let a = ramp(rows, 3);
        let mut cols = [0.0f64; 3];
        colwise_maximum(a.ex(), &mut cols).unwrap();
        assert_eq!(cols, [rows as f64, 2.0 * rows as f64, 3.0 * rows as f64]);

        let mut rows_out = vec![0.0f64; rows];
        rowwise_sum(a.ex(), &mut rows_out).unwrap();
        for (i, value) in rows_out.iter().enumerate() {
            let expected: f64 = (0..3).map(|j| (i + j * rows) as f64 + 1.0).sum();
            assert_eq!(*value, expected);
        }

        let mut wrong = [0.0f64; 2];
        assert!(matches!(
            colwise_sum(a.ex(), &mut wrong),
            Err(MatError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_norms_dot_and_differences() {
        let a = DenseMatrix::from_row_major(2, 2, &[3.0f64, -4.0, 0.0, 0.0]).unwrap();
        assert_eq!(norm(a.ex(), Norm::L1).unwrap(), 7.0);
        assert_eq!(norm(a.ex(), Norm::L2).unwrap(), 5.0);
        assert_eq!(norm(a.ex(), Norm::Linf).unwrap(), 4.0);

        let b = DenseMatrix::from_elem(2, 2, 1.0f64);
        assert_eq!(dot(a.ex(), b.ex()).unwrap(), -1.0);
        assert_eq!(diff_asum(a.ex(), b.ex()).unwrap(), 2.0 + 5.0 + 1.0 + 1.0);
        assert_eq!(diff_sqsum(a.ex(), b.ex()).unwrap(), 4.0 + 25.0 + 1.0 + 1.0);
        assert_eq!(diff_norm_linf(a.ex(), b.ex()).unwrap(), 5.0);

        let c = DenseMatrix::from_elem(2, 3, 1.0f64);
        match dot(a.ex(), c.ex()) {
            Err(MatError::DimensionMismatch { operation, .. }) => assert_eq!(operation, "dot"),
            other => panic!("expected a dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_strided_source_reduces_per_column() {
        let rows = WIDTH + 3;
        let a = ramp(rows, 2);
        let t: StridedRef<'_, f64> = a.view().t();
        let n = a.nelems() as f64;
        assert_eq!(sum(t.ex()).unwrap(), n * (n + 1.0) / 2.0);

        let mut per_row = [0.0f64; 2];
        rowwise_maximum(t.ex(), &mut per_row).unwrap();
        assert_eq!(per_row, [rows as f64, n]);
    }

    #[test]
    fn test_boolean_tallies() {
        let rows = 2 * WIDTH + 1;
        let a = ramp(rows, 3);
        let even = (a.ex() % 2.0f64).cmp_eq(crate::expr::single(0.0f64));
        assert_eq!(count(even).unwrap(), a.nelems() / 2);
        assert!(any(even).unwrap());
        assert!(!all(even).unwrap());
        assert!(all(a.ex().cmp_gt(crate::expr::single(0.0f64))).unwrap());

        let mut per_row = vec![0usize; rows];
        rowwise_count(even, &mut per_row).unwrap();
        for (i, c) in per_row.iter().enumerate() {
            let naive = (0..3).filter(|j| (i + j * rows + 1) % 2 == 0).count();
            assert_eq!(*c, naive);
        }

        let empty = DenseMatrix::<f64>::zeros(3, 0);
        let none = empty.ex().cmp_gt(crate::expr::single(0.0f64));
        assert!(all(none).unwrap());
        assert!(!any(none).unwrap());
        assert_eq!(count(none).unwrap(), 0);
        let mut rows_out = [false; 3];
        rowwise_all(none, &mut rows_out).unwrap();
        assert_eq!(rows_out, [true; 3]);
    }
}
