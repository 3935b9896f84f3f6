//! AVX pack kind: eight lanes for every element type.

pub mod f32x8;
pub mod f64x4;

use super::pair::Pair;
use super::SimdKind;

pub use f32x8::{F32x8, M32x8};
pub use f64x4::{F64x4, M64x4};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Avx;

impl SimdKind for Avx {
    const NAME: &'static str = "avx";
    const LANES: usize = f32x8::LANE_COUNT;
    const NATIVE_ROUNDING: bool = true;

    type Mask = M32x8;
    type F32 = F32x8;
    type F64 = Pair<F64x4>;
}
