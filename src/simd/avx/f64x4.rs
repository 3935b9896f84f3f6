//! AVX 4-lane f64 pack and its mask.
//!
//! The AVX kind pairs two of these (`Pair<F64x4>`) to reach eight lanes. Horizontal
//! reductions fold the 128-bit halves and finish with the SSE2 `F64x2` reduction.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::simd::sse::F64x2;
use crate::simd::traits::{BoolLanes, Halves, Packed, Real, RealPack};

pub(crate) const LANE_COUNT: usize = 4;

/// Four packed f64 values.
#[derive(Copy, Clone, Debug)]
pub struct F64x4 {
    pub elements: __m256d,
}

/// Four boolean lanes stored as all-ones / all-zeros f64 lanes.
#[derive(Copy, Clone, Debug)]
pub struct M64x4 {
    pub elements: __m256d,
}

impl F64x4 {
    #[inline(always)]
    pub(crate) fn new(elements: __m256d) -> Self {
        Self { elements }
    }

    #[inline(always)]
    fn halves(self) -> (__m128d, __m128d) {
        unsafe {
            (
                _mm256_castpd256_pd128(self.elements),
                _mm256_extractf128_pd::<1>(self.elements),
            )
        }
    }
}

impl M64x4 {
    #[inline(always)]
    pub(crate) fn new(elements: __m256d) -> Self {
        Self { elements }
    }

    #[inline(always)]
    fn ones() -> __m256d {
        unsafe { _mm256_castsi256_pd(_mm256_set1_epi64x(-1)) }
    }
}

impl Packed for F64x4 {
    type Scalar = f64;
    type Array = [f64; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        Self::new(unsafe { _mm256_set1_pd(value) })
    }

    #[inline(always)]
    fn from_array(lanes: [f64; LANE_COUNT]) -> Self {
        unsafe { Self::load(lanes.as_ptr()) }
    }

    #[inline(always)]
    fn to_array(self) -> [f64; LANE_COUNT] {
        let mut lanes = [0.0f64; LANE_COUNT];
        unsafe { self.store(lanes.as_mut_ptr()) };
        lanes
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> f64>(mut f: F) -> Self {
        Self::from_array([f(0), f(1), f(2), f(3)])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f64) -> Self {
        Self::new(_mm256_loadu_pd(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f64) {
        _mm256_storeu_pd(ptr, self.elements)
    }
}

impl Halves for F64x4 {
    type Doubled = [f64; 2 * LANE_COUNT];

    #[inline(always)]
    fn join(lo: [f64; LANE_COUNT], hi: [f64; LANE_COUNT]) -> [f64; 2 * LANE_COUNT] {
        [lo[0], lo[1], lo[2], lo[3], hi[0], hi[1], hi[2], hi[3]]
    }

    #[inline(always)]
    fn split(lanes: [f64; 2 * LANE_COUNT]) -> ([f64; LANE_COUNT], [f64; LANE_COUNT]) {
        (
            [lanes[0], lanes[1], lanes[2], lanes[3]],
            [lanes[4], lanes[5], lanes[6], lanes[7]],
        )
    }
}

impl Packed for M64x4 {
    type Scalar = bool;
    type Array = [bool; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: bool) -> Self {
        Self::from_bits(if value { 0b1111 } else { 0 })
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

native_binop!(F64x4, Add, add, _mm256_add_pd);
native_binop!(F64x4, Sub, sub, _mm256_sub_pd);
native_binop!(F64x4, Mul, mul, _mm256_mul_pd);
native_binop!(F64x4, Div, div, _mm256_div_pd);
native_binop!(M64x4, BitAnd, bitand, _mm256_and_pd);
native_binop!(M64x4, BitOr, bitor, _mm256_or_pd);
native_binop!(M64x4, BitXor, bitxor, _mm256_xor_pd);

impl Rem for F64x4 {
    type Output = Self;

    #[inline]
    fn rem(self, rhs: Self) -> Self {
        self.zip_lanes(rhs, |a, b| a % b)
    }
}

impl Neg for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(unsafe { _mm256_xor_pd(self.elements, _mm256_set1_pd(-0.0)) })
    }
}

impl Not for M64x4 {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(unsafe { _mm256_xor_pd(self.elements, Self::ones()) })
    }
}

impl BoolLanes for M64x4 {
    #[inline(always)]
    fn all_true(self) -> bool {
        unsafe { _mm256_testc_pd(self.elements, Self::ones()) != 0 }
    }

    #[inline(always)]
    fn all_false(self) -> bool {
        unsafe { _mm256_testz_pd(self.elements, self.elements) != 0 }
    }

    #[inline(always)]
    fn count_true(self) -> usize {
        self.to_bits().count_ones() as usize
    }

    #[inline(always)]
    fn to_bits(self) -> u32 {
        unsafe { _mm256_movemask_pd(self.elements) as u32 }
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        let lane = |l: u32| -(((bits >> l) & 1) as i64);
        Self::new(unsafe {
            _mm256_castsi256_pd(_mm256_setr_epi64x(lane(0), lane(1), lane(2), lane(3)))
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
            fn $name(self, other: Self) -> M64x4 {
                M64x4::new(unsafe { _mm256_cmp_pd::<$predicate>(self.elements, other.elements) })
            }
        )*
    };
}

impl Real for F64x4 {
    type Mask = M64x4;

    #[inline(always)]
    fn abs(self) -> Self {
        Self::new(unsafe { _mm256_andnot_pd(_mm256_set1_pd(-0.0), self.elements) })
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Self::new(unsafe { _mm256_sqrt_pd(self.elements) })
    }

    #[inline(always)]
    fn floor(self) -> Self {
        Self::new(unsafe { _mm256_floor_pd(self.elements) })
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        Self::new(unsafe { _mm256_ceil_pd(self.elements) })
    }

    #[inline(always)]
    fn trunc(self) -> Self {
        Self::new(unsafe {
            _mm256_round_pd::<{ _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC }>(self.elements)
        })
    }

    emulated_unary!(
        round, exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt, sin, cos, tan, asin, acos, atan,
        sinh, cosh, tanh, asinh, acosh, atanh,
    );

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        Self::new(unsafe { _mm256_min_pd(self.elements, other.elements) })
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        Self::new(unsafe { _mm256_max_pd(self.elements, other.elements) })
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
    fn signbit(self) -> M64x4 {
        M64x4::from_bits(unsafe { _mm256_movemask_pd(self.elements) as u32 })
    }

    #[inline(always)]
    fn select(mask: M64x4, a: Self, b: Self) -> Self {
        Self::new(unsafe { _mm256_blendv_pd(b.elements, a.elements, mask.elements) })
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::splat(value)
    }
}

impl RealPack for F64x4 {
    #[inline(always)]
    fn sum(self) -> f64 {
        let (lo, hi) = self.halves();
        F64x2::new(unsafe { _mm_add_pd(lo, hi) }).sum()
    }

    #[inline(always)]
    fn maximum(self) -> f64 {
        let (lo, hi) = self.halves();
        F64x2::new(unsafe { _mm_max_pd(lo, hi) }).maximum()
    }

    #[inline(always)]
    fn minimum(self) -> f64 {
        let (lo, hi) = self.halves();
        F64x2::new(unsafe { _mm_min_pd(lo, hi) }).minimum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::emulated::EmuPack;
    use crate::simd::pair::Pair;

    #[test]
    fn test_pair_of_quads_matches_emulation() {
        let lanes = [1.0f64, 1e300, -2.5, 7.0, -1e300, 0.5, 3.0, 11.0];
        let pair = Pair::<F64x4>::from_array(lanes);
        let emulated = EmuPack(lanes);
        assert_eq!(pair.sum().to_bits(), emulated.sum().to_bits());
        assert_eq!(pair.maximum(), emulated.maximum());
        assert_eq!(pair.minimum(), emulated.minimum());
    }

    #[test]
    fn test_mask_tests() {
        let a = F64x4::from_array([1.0, 2.0, 3.0, 4.0]);
        assert!(a.cmp_gt(F64x4::splat(0.0)).all_true());
        assert!(a.cmp_lt(F64x4::splat(0.0)).all_false());
        assert_eq!(a.cmp_le(F64x4::splat(2.0)).to_bits(), 0b0011);
    }
}
