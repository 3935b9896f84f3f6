//! SIMD pack kinds.
//!
//! A [`SimdKind`] names one instruction-set generation and fixes, for that
//! generation, the pack type of every element type. All packs of one kind have the
//! same lane count, so an expression mixing `f32`, `f64` and boolean lanes is walked
//! with a single pack width `W = K::LANES`. Where the hardware register is narrower
//! than `W` (for instance `f64` on SSE), two registers are paired.
//!
//! # Kinds
//!
//! | kind | `f32` pack | `f64` pack | lanes | compiled when |
//! |---|---|---|---|---|
//! | [`Avx`] | `F32x8` | `Pair<F64x4>` | 8 | `cfg(avx)` |
//! | [`Sse`] | `F32x4` | `Pair<F64x2>` | 4 | x86 / x86_64 with SSE2 |
//! | [`Neon`] | `F32x4` | `Pair<F64x2>` | 4 | aarch64 |
//! | [`Emulated`] | `EmuPack<f32, 4>` | `EmuPack<f64, 4>` | 4 | always |
//!
//! [`DefaultKind`] is the widest kind the build host supports, as reported by
//! `build.rs`.
//!
//! # Emulation
//!
//! Functions without a native instruction (transcendentals, `round`, remainders)
//! unpack to scalars, call the scalar function per lane and repack. The result is
//! identical to the scalar path because it is the scalar path.

use std::fmt::Debug;

pub mod emulated;
pub mod pair;
pub mod traits;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub mod sse;

#[cfg(all(avx, any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub mod avx;

#[cfg(target_arch = "aarch64")]
pub mod neon;

pub use emulated::{EmuMask, EmuPack, Emulated};
pub use pair::Pair;
pub use traits::{BoolLanes, BoolPack, Halves, Packed, Real, RealPack};

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub use sse::Sse;

#[cfg(all(avx, any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub use avx::Avx;

#[cfg(target_arch = "aarch64")]
pub use neon::Neon;

/// One instruction-set generation and its pack types.
pub trait SimdKind: Copy + Default + Debug + Send + Sync + 'static {
    const NAME: &'static str;

    /// Pack width shared by every element type of this kind.
    const LANES: usize;

    /// `floor`, `ceil` and `trunc` map to single instructions.
    const NATIVE_ROUNDING: bool;

    /// Canonical boolean pack; comparison results are converted to it.
    type Mask: BoolPack;
    type F32: RealPack<Scalar = f32>;
    type F64: RealPack<Scalar = f64>;
}

#[cfg(all(avx, any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub type DefaultKind = Avx;

#[cfg(all(not(avx), any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
pub type DefaultKind = Sse;

#[cfg(target_arch = "aarch64")]
pub type DefaultKind = Neon;

#[cfg(not(any(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"), target_arch = "aarch64")))]
pub type DefaultKind = Emulated;

/// Pack width of the active kind.
pub const WIDTH: usize = <DefaultKind as SimdKind>::LANES;

#[cfg(test)]
mod tests {
    use super::*;

    fn check_kind<K: SimdKind>() {
        assert_eq!(<K::F32 as Packed>::WIDTH, K::LANES);
        assert_eq!(<K::F64 as Packed>::WIDTH, K::LANES);
        assert_eq!(<K::Mask as Packed>::WIDTH, K::LANES);
    }

    #[test]
    fn test_uniform_lane_counts() {
        check_kind::<Emulated>();
        check_kind::<DefaultKind>();
        #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "sse2"))]
        check_kind::<Sse>();
        assert!(WIDTH.is_power_of_two());
    }
}
