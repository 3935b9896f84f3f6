//! NEON 4-lane f32 pack and its mask.
//!
//! # Architecture Requirements
//!
//! - **Target Architecture**: aarch64, where Advanced SIMD is part of the baseline
//!
//! `min`/`max` are built from a compare and a bit-select rather than `fminq`/`fmaxq`
//! so that NaN and signed-zero handling matches the scalar path and the x86 packs.

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::simd::traits::{BoolLanes, Packed, Real, RealPack};

pub const LANE_COUNT: usize = 4;

#[derive(Copy, Clone, Debug)]
pub struct F32x4 {
    pub elements: float32x4_t,
}

#[derive(Copy, Clone, Debug)]
pub struct M32x4 {
    pub elements: uint32x4_t,
}

impl F32x4 {
    #[inline(always)]
    pub(crate) fn new(elements: float32x4_t) -> Self {
        Self { elements }
    }
}

impl M32x4 {
    #[inline(always)]
    pub(crate) fn new(elements: uint32x4_t) -> Self {
        Self { elements }
    }
}

impl Packed for F32x4 {
    type Scalar = f32;
    type Array = [f32; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        Self::new(unsafe { vdupq_n_f32(value) })
    }

    #[inline(always)]
    fn from_array(lanes: [f32; LANE_COUNT]) -> Self {
        unsafe { Self::load(lanes.as_ptr()) }
    }

    #[inline(always)]
    fn to_array(self) -> [f32; LANE_COUNT] {
        let mut lanes = [0.0f32; LANE_COUNT];
        unsafe { self.store(lanes.as_mut_ptr()) };
        lanes
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> f32>(mut f: F) -> Self {
        Self::from_array([f(0), f(1), f(2), f(3)])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self::new(vld1q_f32(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        vst1q_f32(ptr, self.elements)
    }
}

impl Packed for M32x4 {
    type Scalar = bool;
    type Array = [bool; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: bool) -> Self {
        Self::new(unsafe { vdupq_n_u32(if value { u32::MAX } else { 0 }) })
    }

    #[inline(always)]
    fn from_array(lanes: [bool; LANE_COUNT]) -> Self {
        let words = lanes.map(|v| if v { u32::MAX } else { 0 });
        Self::new(unsafe { vld1q_u32(words.as_ptr()) })
    }

    #[inline(always)]
    fn to_array(self) -> [bool; LANE_COUNT] {
        let mut words = [0u32; LANE_COUNT];
        unsafe { vst1q_u32(words.as_mut_ptr(), self.elements) };
        words.map(|w| w != 0)
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        Self::from_array([f(0), f(1), f(2), f(3)])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const bool) -> Self {
        Self::from_fn(|l| *ptr.add(l))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut bool) {
        for (l, v) in self.to_array().into_iter().enumerate() {
            *ptr.add(l) = v;
        }
    }
}

macro_rules! native_binop {
    ($type:ident, $trait:ident, $method:ident, $intrinsic:ident) => {
        impl $trait for $type {
            type Output = Self;

            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                Self::new(unsafe { $intrinsic(self.elements, rhs.elements) })
            }
        }
    };
}

native_binop!(F32x4, Add, add, vaddq_f32);
native_binop!(F32x4, Sub, sub, vsubq_f32);
native_binop!(F32x4, Mul, mul, vmulq_f32);
native_binop!(F32x4, Div, div, vdivq_f32);
native_binop!(M32x4, BitAnd, bitand, vandq_u32);
native_binop!(M32x4, BitOr, bitor, vorrq_u32);
native_binop!(M32x4, BitXor, bitxor, veorq_u32);

impl Rem for F32x4 {
    type Output = Self;

    #[inline]
    fn rem(self, rhs: Self) -> Self {
        self.zip_lanes(rhs, |a, b| a % b)
    }
}

impl Neg for F32x4 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(unsafe { vnegq_f32(self.elements) })
    }
}

impl Not for M32x4 {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(unsafe { vmvnq_u32(self.elements) })
    }
}

impl BoolLanes for M32x4 {
    #[inline(always)]
    fn all_true(self) -> bool {
        unsafe { vminvq_u32(self.elements) != 0 }
    }

    #[inline(always)]
    fn all_false(self) -> bool {
        unsafe { vmaxvq_u32(self.elements) == 0 }
    }

    #[inline(always)]
    fn count_true(self) -> usize {
        self.to_bits().count_ones() as usize
    }

    #[inline(always)]
    fn to_bits(self) -> u32 {
        self.to_array()
            .iter()
            .enumerate()
            .fold(0, |bits, (l, v)| bits | ((*v as u32) << l))
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        Self::from_fn(|l| (bits >> l) & 1 == 1)
    }
}

macro_rules! native_unary {
    ($($name:ident => $intrinsic:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self) -> Self {
                Self::new(unsafe { $intrinsic(self.elements) })
            }
        )*
    };
}

macro_rules! emulated_unary {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(self) -> Self {
                self.map_lanes(Real::$name)
            }
        )*
    };
}

macro_rules! emulated_binary {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(self, other: Self) -> Self {
                self.zip_lanes(other, Real::$name)
            }
        )*
    };
}

macro_rules! native_compare {
    ($($name:ident => $intrinsic:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self, other: Self) -> M32x4 {
                M32x4::new(unsafe { $intrinsic(self.elements, other.elements) })
            }
        )*
    };
}

impl Real for F32x4 {
    type Mask = M32x4;

    native_unary!(
        abs => vabsq_f32,
        sqrt => vsqrtq_f32,
        floor => vrndmq_f32,
        ceil => vrndpq_f32,
        round => vrndaq_f32,
        trunc => vrndq_f32,
    );

    emulated_unary!(
        exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt, sin, cos, tan, asin, acos, atan, sinh,
        cosh, tanh, asinh, acosh, atanh,
    );

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        Self::select(self.cmp_lt(other), self, other)
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        Self::select(self.cmp_gt(other), self, other)
    }

    emulated_binary!(powf, hypot, atan2);

    native_compare!(
        cmp_eq => vceqq_f32,
        cmp_lt => vcltq_f32,
        cmp_le => vcleq_f32,
        cmp_gt => vcgtq_f32,
        cmp_ge => vcgeq_f32,
    );

    #[inline(always)]
    fn cmp_ne(self, other: Self) -> M32x4 {
        !self.cmp_eq(other)
    }

    #[inline(always)]
    fn signbit(self) -> M32x4 {
        M32x4::new(unsafe {
            vreinterpretq_u32_s32(vshrq_n_s32::<31>(vreinterpretq_s32_f32(self.elements)))
        })
    }

    #[inline(always)]
    fn select(mask: M32x4, a: Self, b: Self) -> Self {
        Self::new(unsafe { vbslq_f32(mask.elements, a.elements, b.elements) })
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::splat(value as f32)
    }
}

impl F32x4 {
    #[inline(always)]
    fn fold_halves(self, combine: impl Fn(f32, f32) -> f32) -> f32 {
        let [a0, a1, a2, a3] = self.to_array();
        combine(combine(a0, a2), combine(a1, a3))
    }
}

impl RealPack for F32x4 {
    #[inline(always)]
    fn sum(self) -> f32 {
        unsafe {
            let folded = vadd_f32(vget_low_f32(self.elements), vget_high_f32(self.elements));
            vget_lane_f32::<0>(folded) + vget_lane_f32::<1>(folded)
        }
    }

    #[inline(always)]
    fn maximum(self) -> f32 {
        self.fold_halves(Real::max)
    }

    #[inline(always)]
    fn minimum(self) -> f32 {
        self.fold_halves(Real::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::emulated::EmuPack;

    #[test]
    fn test_reductions_match_emulation() {
        let lanes = [0.1f32, 1e8, -0.3, 7.7];
        let native = F32x4::from_array(lanes);
        let emulated = EmuPack(lanes);
        assert_eq!(native.sum().to_bits(), emulated.sum().to_bits());
        assert_eq!(native.maximum(), emulated.maximum());
        assert_eq!(native.minimum(), emulated.minimum());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        let lanes = [-2.5f32, -0.5, 0.5, 2.5];
        let rounded = F32x4::from_array(lanes).round().to_array();
        assert_eq!(rounded, lanes.map(f32::round));
    }

    #[test]
    fn test_masks() {
        let m = M32x4::from_bits(0b0101);
        assert_eq!(m.to_bits(), 0b0101);
        assert!(!m.all_true() && !m.all_false());
        assert!((m | !m).all_true());
    }
}
