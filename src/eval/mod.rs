//! Kernels and the drivers that apply them.

pub mod driver;
pub mod kernel;

pub use driver::{linear_eval, linear_eval_simd, percol_eval, percol_eval_simd};
pub use kernel::{AccumKernel, CopyKernel, Kernel};
