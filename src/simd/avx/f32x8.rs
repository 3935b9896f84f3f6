//! AVX 8-lane f32 pack and its mask.
//!
//! `F32x8` wraps an `__m256` register holding eight single-precision values.
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: processors with AVX (Sandy Bridge and later)
//! - **Compilation**: only compiled when `build.rs` detects AVX (`cfg(avx)`)
//!
//! # Horizontal Reductions
//!
//! The high 128-bit half is folded onto the low half with one vertical operation;
//! the resulting `F32x4` finishes with its own SSE reduction. The lane order is
//! therefore `((a0 ∘ a4) ∘ (a2 ∘ a6)) ∘ ((a1 ∘ a5) ∘ (a3 ∘ a7))`, the same ladder
//! the emulated 8-lane pack walks.
//!
//! # Mask Predicates
//!
//! `all_true` / `all_false` use `vtestps` against an all-ones register instead of
//! extracting the sign bits.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::simd::sse::F32x4;
use crate::simd::traits::{BoolLanes, Packed, Real, RealPack};

/// Number of f32 elements in an AVX 256-bit register.
pub(crate) const LANE_COUNT: usize = 8;

/// Eight packed f32 values.
#[derive(Copy, Clone, Debug)]
pub struct F32x8 {
    pub elements: __m256,
}

/// Eight boolean lanes stored as all-ones / all-zeros f32 lanes.
#[derive(Copy, Clone, Debug)]
pub struct M32x8 {
    pub elements: __m256,
}

impl F32x8 {
    #[inline(always)]
    pub(crate) fn new(elements: __m256) -> Self {
        Self { elements }
    }

    /// Low and high 128-bit halves.
    #[inline(always)]
    fn halves(self) -> (__m128, __m128) {
        unsafe {
            (
                _mm256_castps256_ps128(self.elements),
                _mm256_extractf128_ps::<1>(self.elements),
            )
        }
    }
}

impl M32x8 {
    #[inline(always)]
    pub(crate) fn new(elements: __m256) -> Self {
        Self { elements }
    }

    #[inline(always)]
    fn ones() -> __m256 {
        unsafe { _mm256_castsi256_ps(_mm256_set1_epi32(-1)) }
    }
}

impl Packed for F32x8 {
    type Scalar = f32;
    type Array = [f32; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        Self::new(unsafe { _mm256_set1_ps(value) })
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
        let mut lanes = [0.0f32; LANE_COUNT];
        for (l, v) in lanes.iter_mut().enumerate() {
            *v = f(l);
        }
        Self::from_array(lanes)
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self::new(_mm256_loadu_ps(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        _mm256_storeu_ps(ptr, self.elements)
    }
}

impl Packed for M32x8 {
    type Scalar = bool;
    type Array = [bool; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: bool) -> Self {
        Self::from_bits(if value { 0xFF } else { 0 })
    }

    #[inline(always)]
    fn from_array(lanes: [bool; LANE_COUNT]) -> Self {
        Self::from_fn(|l| lanes[l])
    }

    #[inline(always)]
    fn to_array(self) -> [bool; LANE_COUNT] {
        let bits = self.to_bits();
        std::array::from_fn(|l| (bits >> l) & 1 == 1)
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        let bits = (0..LANE_COUNT).fold(0u32, |bits, l| bits | ((f(l) as u32) << l));
        Self::from_bits(bits)
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

native_binop!(F32x8, Add, add, _mm256_add_ps);
native_binop!(F32x8, Sub, sub, _mm256_sub_ps);
native_binop!(F32x8, Mul, mul, _mm256_mul_ps);
native_binop!(F32x8, Div, div, _mm256_div_ps);
native_binop!(M32x8, BitAnd, bitand, _mm256_and_ps);
native_binop!(M32x8, BitOr, bitor, _mm256_or_ps);
native_binop!(M32x8, BitXor, bitxor, _mm256_xor_ps);

impl Rem for F32x8 {
    type Output = Self;

    #[inline]
    fn rem(self, rhs: Self) -> Self {
        self.zip_lanes(rhs, |a, b| a % b)
    }
}

impl Neg for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(unsafe { _mm256_xor_ps(self.elements, _mm256_set1_ps(-0.0)) })
    }
}

impl Not for M32x8 {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(unsafe { _mm256_xor_ps(self.elements, Self::ones()) })
    }
}

impl BoolLanes for M32x8 {
    #[inline(always)]
    fn all_true(self) -> bool {
        unsafe { _mm256_testc_ps(self.elements, Self::ones()) != 0 }
    }

    #[inline(always)]
    fn all_false(self) -> bool {
        unsafe { _mm256_testz_ps(self.elements, self.elements) != 0 }
    }

    #[inline(always)]
    fn count_true(self) -> usize {
        self.to_bits().count_ones() as usize
    }

    #[inline(always)]
    fn to_bits(self) -> u32 {
        unsafe { _mm256_movemask_ps(self.elements) as u32 }
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        let lane = |l: u32| -(((bits >> l) & 1) as i32);
        Self::new(unsafe {
            _mm256_castsi256_ps(_mm256_setr_epi32(
                lane(0),
                lane(1),
                lane(2),
                lane(3),
                lane(4),
                lane(5),
                lane(6),
                lane(7),
            ))
        })
    }
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
    ($($name:ident => $predicate:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self, other: Self) -> M32x8 {
                M32x8::new(unsafe { _mm256_cmp_ps::<$predicate>(self.elements, other.elements) })
            }
        )*
    };
}

impl Real for F32x8 {
    type Mask = M32x8;

    #[inline(always)]
    fn abs(self) -> Self {
        Self::new(unsafe { _mm256_andnot_ps(_mm256_set1_ps(-0.0), self.elements) })
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Self::new(unsafe { _mm256_sqrt_ps(self.elements) })
    }

    #[inline(always)]
    fn floor(self) -> Self {
        Self::new(unsafe { _mm256_floor_ps(self.elements) })
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        Self::new(unsafe { _mm256_ceil_ps(self.elements) })
    }

    #[inline(always)]
    fn trunc(self) -> Self {
        Self::new(unsafe {
            _mm256_round_ps::<{ _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC }>(self.elements)
        })
    }

    // vroundps has no half-away-from-zero mode
    emulated_unary!(
        round, exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt, sin, cos, tan, asin, acos, atan,
        sinh, cosh, tanh, asinh, acosh, atanh,
    );

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        Self::new(unsafe { _mm256_min_ps(self.elements, other.elements) })
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        Self::new(unsafe { _mm256_max_ps(self.elements, other.elements) })
    }

    emulated_binary!(powf, hypot, atan2);

    native_compare!(
        cmp_eq => _CMP_EQ_OQ,
        cmp_ne => _CMP_NEQ_UQ,
        cmp_lt => _CMP_LT_OQ,
        cmp_le => _CMP_LE_OQ,
        cmp_gt => _CMP_GT_OQ,
        cmp_ge => _CMP_GE_OQ,
    );

    // movemask gathers exactly the sign bits
    #[inline(always)]
    fn signbit(self) -> M32x8 {
        M32x8::from_bits(unsafe { _mm256_movemask_ps(self.elements) as u32 })
    }

    #[inline(always)]
    fn select(mask: M32x8, a: Self, b: Self) -> Self {
        // blendv picks its second operand where the mask is set
        Self::new(unsafe { _mm256_blendv_ps(b.elements, a.elements, mask.elements) })
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::splat(value as f32)
    }
}

impl RealPack for F32x8 {
    #[inline(always)]
    fn sum(self) -> f32 {
        let (lo, hi) = self.halves();
        F32x4::new(unsafe { _mm_add_ps(lo, hi) }).sum()
    }

    #[inline(always)]
    fn maximum(self) -> f32 {
        let (lo, hi) = self.halves();
        F32x4::new(unsafe { _mm_max_ps(lo, hi) }).maximum()
    }

    #[inline(always)]
    fn minimum(self) -> f32 {
        let (lo, hi) = self.halves();
        F32x4::new(unsafe { _mm_min_ps(lo, hi) }).minimum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::emulated::EmuPack;

    #[test]
    fn test_reductions_match_emulation() {
        let lanes = [3.0f32, -1e7, 0.25, 1e7, 9.5, -4.0, 1e-3, 2.0];
        let native = F32x8::from_array(lanes);
        let emulated = EmuPack(lanes);
        assert_eq!(native.sum().to_bits(), emulated.sum().to_bits());
        assert_eq!(native.maximum(), 1e7);
        assert_eq!(native.minimum(), -1e7);
    }

    #[test]
    fn test_mask_tests() {
        assert!(M32x8::splat(true).all_true());
        assert!(M32x8::splat(false).all_false());
        let m = M32x8::from_bits(0b1000_0001);
        assert!(!m.all_true());
        assert!(!m.all_false());
        assert_eq!(m.count_true(), 2);
        assert_eq!((!m).to_bits(), 0b0111_1110);
    }

    #[test]
    fn test_select_and_compare() {
        let a = F32x8::from_fn(|l| l as f32);
        let m = a.cmp_ge(F32x8::splat(4.0));
        assert_eq!(m.to_bits(), 0b1111_0000);
        let s = F32x8::select(m, a, F32x8::splat(-1.0)).to_array();
        assert_eq!(s, [-1.0, -1.0, -1.0, -1.0, 4.0, 5.0, 6.0, 7.0]);
    }
}
