//! NEON pack kind: four lanes for every element type.

pub mod f32x4;
pub mod f64x2;

use super::pair::Pair;
use super::SimdKind;

pub use f32x4::{F32x4, M32x4};
pub use f64x2::{F64x2, M64x2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neon;

impl SimdKind for Neon {
    const NAME: &'static str = "neon";
    const LANES: usize = f32x4::LANE_COUNT;
    const NATIVE_ROUNDING: bool = true;

    type Mask = M32x4;
    type F32 = F32x4;
    type F64 = Pair<F64x2>;
}
