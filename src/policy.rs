//! Execution policy selection and the evaluation entry points.
//!
//! # Rules
//!
//! 1. Destination and expression continuous: linear access.
//! 2. Otherwise: per-column access.
//! 3. Packed kernels whenever every operation in the expression has a native pack
//!    implementation and the configuration allows them; scalar kernels otherwise.
//!
//! For the per-column case a static cost model decides whether the expression is
//! first materialized into a dense temporary ("cached"):
//!
//! | path | cost |
//! |---|---|
//! | per-column | `cache_cost` if the expression is scattered, plus `shortvec_percol_cost` for short columns |
//! | cached | `cache_cost`, plus `shortvec_percol_cost` for short columns when the destination is not continuous |
//!
//! Columns are short when the row count (compile-time if known) is below
//! `shortvec_threshold`. The cached path is taken only when strictly cheaper. The
//! choice never changes results.

use std::fmt;

use crate::accessor::{Assign, Update, WriteMode};
use crate::config::EvalConfig;
use crate::element::{PackOf, RealElement};
use crate::error::{invalid_argument, Result};
use crate::eval::{
    linear_eval, linear_eval_simd, percol_eval, percol_eval_simd, AccumKernel, CopyKernel, Kernel,
};
use crate::expr::MatExpr;
use crate::matrix::{DenseMatrix, Destination};
use crate::shape::{Continuity, Shape, DYN};

/// How elements are traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// One flat index space over all elements.
    Linear,
    /// Column by column.
    PerColumn,
}

/// Whether elements are processed one at a time or in packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKind {
    Scalar,
    Simd,
}

/// One execution scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Policy {
    pub access: AccessKind,
    pub kernel: KernelKind,
    /// Materialize the expression into a dense temporary first.
    pub cached: bool,
}

impl Policy {
    pub const fn new(access: AccessKind, kernel: KernelKind) -> Self {
        Self {
            access,
            kernel,
            cached: false,
        }
    }

    pub const fn with_cache(self) -> Self {
        Self {
            cached: true,
            ..self
        }
    }

    pub fn is_linear(&self) -> bool {
        self.access == AccessKind::Linear
    }

    pub fn is_simd(&self) -> bool {
        self.kernel == KernelKind::Simd
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            AccessKind::Linear => "linear",
            AccessKind::PerColumn => "per-column",
        };
        let kernel = match self.kernel {
            KernelKind::Scalar => "scalar",
            KernelKind::Simd => "simd",
        };
        write!(f, "{access}/{kernel}")?;
        if self.cached {
            f.write_str(" cached")?;
        }
        Ok(())
    }
}

/// Picks the policy `evaluate_with` would use for `expr` into `dst`.
///
/// Open dimensions of the expression are taken from the destination.
pub fn select_policy<E, D>(expr: &E, dst: &D, config: &EvalConfig) -> Result<Policy>
where
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
{
    let extent = expr.extent()?;
    let current = dst.shape();
    let shape = Shape::new(
        extent.rows.unwrap_or(current.rows),
        extent.cols.unwrap_or(current.cols),
    );
    Ok(choose(expr, dst, shape, config))
}

fn choose<E, D>(expr: &E, dst: &D, shape: Shape, config: &EvalConfig) -> Policy
where
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
{
    let kernel = if config.allow_simd && E::SIMD {
        KernelKind::Simd
    } else {
        KernelKind::Scalar
    };

    let expr_layout = expr.continuity();
    let dst_layout = dst.continuity();
    if expr_layout.is_continuous() && dst_layout.is_continuous() {
        let policy = Policy::new(AccessKind::Linear, kernel);
        log::debug!("policy {policy} for {shape}");
        return policy;
    }

    let rows = if E::CT_ROWS != DYN {
        E::CT_ROWS
    } else if D::CT_ROWS != DYN {
        D::CT_ROWS
    } else {
        shape.rows
    };
    let short = if rows < config.shortvec_threshold {
        config.shortvec_percol_cost
    } else {
        0
    };
    let percol_cost = short
        + if expr_layout == Continuity::Scattered {
            config.cache_cost
        } else {
            0
        };
    let cached_cost = config.cache_cost + if dst_layout.is_continuous() { 0 } else { short };

    let mut policy = Policy::new(AccessKind::PerColumn, kernel);
    if config.allow_cache && cached_cost < percol_cost {
        policy = policy.with_cache();
    }
    log::debug!(
        "policy {policy} for {shape}: expression {expr_layout:?}, destination {dst_layout:?}, \
         per-column cost {percol_cost}, cached cost {cached_cost}"
    );
    policy
}

/// Evaluates `expr` into `dst` with the default configuration.
///
/// Resizable destinations adopt the expression's shape; views must already have it.
pub fn evaluate<E, D>(expr: E, dst: &mut D) -> Result<()>
where
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
{
    evaluate_with(&EvalConfig::default(), expr, dst)
}

pub fn evaluate_with<E, D>(config: &EvalConfig, expr: E, dst: &mut D) -> Result<()>
where
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
{
    let shape = dst.prepare(expr.extent()?, "evaluate")?;
    let policy = choose(&expr, dst, shape, config);
    run::<Assign, _, _, _>(&expr, dst, shape, policy, &CopyKernel)
}

/// Evaluates with a caller-chosen policy.
///
/// Every policy gives the same result; linear access is rejected when the
/// expression or the destination has no flat index space.
pub fn evaluate_with_policy<E, D>(expr: E, dst: &mut D, policy: Policy) -> Result<()>
where
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
{
    let shape = dst.prepare(expr.extent()?, "evaluate")?;
    check_forced(&expr, dst, policy)?;
    log::debug!("forced policy {policy} for {shape}");
    run::<Assign, _, _, _>(&expr, dst, shape, policy, &CopyKernel)
}

/// `dst += expr`, reading and writing the destination in place.
pub fn accum_to<E, D>(dst: &mut D, expr: E) -> Result<()>
where
    E: MatExpr,
    E::Elem: RealElement,
    D: Destination<Elem = E::Elem>,
{
    accum_to_with(&EvalConfig::default(), dst, expr)
}

pub fn accum_to_with<E, D>(config: &EvalConfig, dst: &mut D, expr: E) -> Result<()>
where
    E: MatExpr,
    E::Elem: RealElement,
    D: Destination<Elem = E::Elem>,
{
    let shape = dst.shape();
    expr.extent()?.fits(shape, "accum_to")?;
    let policy = choose(&expr, dst, shape, config);
    run::<Update, _, _, _>(&expr, dst, shape, policy, &AccumKernel)
}

fn check_forced<E, D>(expr: &E, dst: &D, policy: Policy) -> Result<()>
where
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
{
    if policy.is_linear() && !policy.cached {
        let (expr_layout, dst_layout) = (expr.continuity(), dst.continuity());
        if !expr_layout.is_continuous() || !dst_layout.is_continuous() {
            return Err(invalid_argument(format!(
                "linear access needs continuous operands, found expression {expr_layout:?} \
                 and destination {dst_layout:?}"
            )));
        }
    }
    Ok(())
}

fn run<M, E, D, K>(expr: &E, dst: &mut D, shape: Shape, policy: Policy, kernel: &K) -> Result<()>
where
    M: WriteMode,
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
    K: Kernel<E::Elem, E::Elem> + Kernel<PackOf<E::Elem>, PackOf<E::Elem>>,
{
    if shape.is_empty() {
        log::trace!("nothing to evaluate for {shape}");
        return Ok(());
    }

    if policy.cached {
        let mut temp = DenseMatrix::<E::Elem>::zeros(shape.rows, shape.cols);
        let fill = Policy::new(AccessKind::PerColumn, policy.kernel);
        execute::<Assign, _, _, _>(expr, &mut temp, shape, fill, &CopyKernel);

        let access = if dst.continuity().is_continuous() {
            AccessKind::Linear
        } else {
            AccessKind::PerColumn
        };
        execute::<M, _, _, _>(&temp, dst, shape, Policy::new(access, policy.kernel), kernel);
    } else {
        execute::<M, _, _, _>(expr, dst, shape, policy, kernel);
    }
    Ok(())
}

fn execute<M, E, D, K>(expr: &E, dst: &mut D, shape: Shape, policy: Policy, kernel: &K)
where
    M: WriteMode,
    E: MatExpr,
    D: Destination<Elem = E::Elem>,
    K: Kernel<E::Elem, E::Elem> + Kernel<PackOf<E::Elem>, PackOf<E::Elem>>,
{
    // SAFETY: `shape` is the destination's shape after `prepare`/`fits`, and every
    // operand extent was unified with it, so all readers and writers cover it
    unsafe {
        match (policy.access, policy.kernel) {
            (AccessKind::Linear, KernelKind::Scalar) => linear_eval(
                shape.nelems(),
                kernel,
                &mut expr.reader(shape),
                &mut dst.writer::<M>(),
            ),
            (AccessKind::Linear, KernelKind::Simd) => linear_eval_simd(
                shape.nelems(),
                kernel,
                &mut expr.reader(shape),
                &mut dst.writer::<M>(),
            ),
            (AccessKind::PerColumn, KernelKind::Scalar) => {
                percol_eval(shape, kernel, &mut expr.cols(shape), &mut dst.cols::<M>())
            }
            (AccessKind::PerColumn, KernelKind::Simd) => {
                percol_eval_simd(shape, kernel, &mut expr.cols(shape), &mut dst.cols::<M>())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::single;
    use crate::matrix::{ColsMut, ColsRef, StridedMut};
    use crate::MatError;

    #[test]
    fn test_dense_operands_go_linear() {
        let a = DenseMatrix::<f32>::zeros(8, 8);
        let c = DenseMatrix::<f32>::zeros(8, 8);
        let config = EvalConfig::default();

        let policy = select_policy(&(a.ex() + a.ex()), &c, &config).unwrap();
        assert_eq!(policy, Policy::new(AccessKind::Linear, KernelKind::Simd));

        // emulated functions take the scalar kernel
        let policy = select_policy(&a.ex().exp(), &c, &config).unwrap();
        assert_eq!(policy.kernel, KernelKind::Scalar);

        let policy = select_policy(&(a.ex() + a.ex()), &c, &config.with_simd(false)).unwrap();
        assert_eq!(policy.kernel, KernelKind::Scalar);
    }

    #[test]
    fn test_padded_operands_go_per_column() {
        let data = vec![1.0f64; 40];
        let padded = ColsRef::new(&data, 6, 4, 10).unwrap();
        let c = DenseMatrix::<f64>::zeros(6, 4);
        let policy = select_policy(&padded.ex().abs(), &c, &EvalConfig::default()).unwrap();
        assert_eq!(policy, Policy::new(AccessKind::PerColumn, KernelKind::Simd));
    }

    #[test]
    fn test_short_scattered_source_is_cached() {
        let m = DenseMatrix::from_fn(3, 50, |i, j| (i * 50 + j) as f32);
        let c = DenseMatrix::<f32>::zeros(0, 0);
        let config = EvalConfig::default();

        // the transpose of a 3 x 50 matrix has 50 rows: not short
        let policy = select_policy(&m.view().t().ex(), &c, &config).unwrap();
        assert!(!policy.cached);

        let wide = DenseMatrix::from_fn(50, 3, |i, j| (i + j) as f32);
        let policy = select_policy(&wide.view().t().ex(), &c, &config).unwrap();
        assert!(policy.cached);
        assert_eq!(policy.to_string(), "per-column/simd cached");

        let policy = select_policy(&wide.view().t().ex(), &c, &config.with_cache(false)).unwrap();
        assert!(!policy.cached);
    }

    #[test]
    fn test_cached_and_direct_paths_agree() {
        let wide = DenseMatrix::from_fn(50, 3, |i, j| (i as f64).sin() + j as f64);
        let expr = wide.view().t().ex() * 2.0f64;

        let mut cached = DenseMatrix::zeros(0, 0);
        evaluate(expr, &mut cached).unwrap();
        let mut direct = DenseMatrix::zeros(0, 0);
        evaluate_with(&EvalConfig::default().with_cache(false), expr, &mut direct).unwrap();

        assert_eq!(cached.shape(), Shape::new(3, 50));
        assert_eq!(cached, direct);
        assert_eq!(cached.get(2, 7).unwrap(), 2.0 * ((7.0f64).sin() + 2.0));
    }

    #[test]
    fn test_forced_linear_on_padded_destination_is_rejected() {
        let a = DenseMatrix::<f32>::zeros(2, 2);
        let mut data = vec![0.0f32; 6];
        let mut dst = ColsMut::new(&mut data, 2, 2, 3).unwrap();
        let err = evaluate_with_policy(
            a.ex(),
            &mut dst,
            Policy::new(AccessKind::Linear, KernelKind::Scalar),
        )
        .unwrap_err();
        assert!(matches!(err, MatError::InvalidArgument { .. }));
    }

    #[test]
    fn test_accum_to_strided_destination() {
        let a = DenseMatrix::from_fn(2, 3, |i, j| (i + 10 * j) as f64);
        let mut data = vec![1.0f64; 6];
        {
            // row-major storage seen as a column-major 2 x 3 matrix
            let mut dst = StridedMut::new(&mut data, 0, 2, 3, 3, 1).unwrap();
            accum_to(&mut dst, a.ex() + single(1.0f64)).unwrap();
        }
        assert_eq!(data, vec![2.0, 12.0, 22.0, 3.0, 13.0, 23.0]);
    }

    #[test]
    fn test_shape_errors_leave_no_partial_work() {
        let a = DenseMatrix::<f32>::zeros(2, 2);
        let b = DenseMatrix::<f32>::zeros(3, 2);
        let mut c = DenseMatrix::from_elem(1, 1, 7.0f32);
        let err = evaluate(a.ex() + b.ex(), &mut c).unwrap_err();
        assert!(matches!(err, MatError::DimensionMismatch { operation: "add", .. }));
        assert_eq!(c.as_slice(), &[7.0]);

        let mut view_data = vec![0.0f32; 4];
        let mut view = crate::matrix::MatMut::new(&mut view_data, 2, 2).unwrap();
        assert!(accum_to(&mut view, b.ex()).is_err());
    }
}
