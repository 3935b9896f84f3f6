//! # simdmat
//!
//! Evaluation engine for dense matrix expressions, specialized at compile time.
//!
//! Expressions are built lazily from matrices, views, broadcast vectors and scalars
//! with ordinary operators and named functions. Their type records the element type,
//! any compile-time dimensions and whether every operation has a packed kernel. At
//! evaluation time a [`Policy`] is chosen from those facts and the memory layout of
//! the operands:
//!
//! - **linear** when every operand and the destination are continuous, walking
//!   all elements as one flat run;
//! - **per-column** otherwise, walking each column with its own pointer;
//! - **simd** when packed kernels exist, covering full packs of [`WIDTH`] lanes and
//!   finishing the remainder with scalars;
//! - **cached** when materializing a scattered source into a temporary is cheaper
//!   than reading it in place.
//!
//! Every policy produces the same values for element-wise evaluation.
//!
//! ```
//! use simdmat::{evaluate, sum, DenseMatrix};
//!
//! let a = DenseMatrix::from_fn(4, 3, |i, j| (i * 3 + j) as f32);
//! let mut b = DenseMatrix::zeros(0, 0);
//! evaluate(a.ex() * 2.0f32 - 1.0f32, &mut b)?;
//! assert_eq!(b.get(3, 2)?, 21.0);
//! assert_eq!(sum(b.ex())?, 120.0);
//! # Ok::<(), simdmat::MatError>(())
//! ```
//!
//! ## Modules
//!
//! - [`simd`]: pack types per instruction-set kind and their traits
//! - [`accessor`]: readers and writers the drivers work through
//! - [`eval`]: kernels and the linear / per-column drivers
//! - [`expr`]: lazy expression nodes and sources
//! - [`policy`]: policy selection and the evaluation entry points
//! - [`reduce`]: reductions to scalars, columns and rows

pub mod accessor;
pub mod config;
pub mod element;
pub mod error;
pub mod eval;
pub mod expr;
pub mod matrix;
pub mod policy;
pub mod reduce;
pub mod shape;
pub mod simd;

pub use config::EvalConfig;
pub use element::{CastFrom, Element, RealElement};
pub use error::{MatError, Result};
pub use expr::{constant, rep_col, rep_row, select, single, Ex, MatExpr};
pub use matrix::{ColsMut, ColsRef, DenseMatrix, Destination, MatMut, MatRef, StridedMut, StridedRef};
pub use policy::{
    accum_to, accum_to_with, evaluate, evaluate_with, evaluate_with_policy, select_policy,
    AccessKind, KernelKind, Policy,
};
pub use reduce::{
    all, amax, any, asum, colwise_all, colwise_amax, colwise_any, colwise_asum, colwise_count,
    colwise_entropy, colwise_logsum, colwise_maximum, colwise_mean, colwise_minimum,
    colwise_norm, colwise_norm_l2, colwise_sqsum, colwise_sum, count, diff_asum, diff_norm,
    diff_norm_l2, diff_norm_linf, diff_sqsum, dot, entropy, logsum, maximum, mean, minimum, norm,
    norm_l2, rowwise_all, rowwise_amax, rowwise_any, rowwise_asum, rowwise_count,
    rowwise_entropy, rowwise_logsum, rowwise_maximum, rowwise_mean, rowwise_minimum,
    rowwise_norm, rowwise_norm_l2, rowwise_sqsum, rowwise_sum, sqsum, sum, Norm,
};
pub use shape::{Continuity, Extent, Shape, DYN};
pub use simd::WIDTH;
