//! SSE2 2-lane f64 pack and its mask.
//!
//! The SSE kind pairs two of these registers (`Pair<F64x2>`) so that `f64`
//! expressions advance four lanes at a time, like `f32` ones.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::simd::traits::{BoolLanes, Halves, Packed, Real, RealPack};

pub(crate) const LANE_COUNT: usize = 2;

/// Two packed f64 values.
#[derive(Copy, Clone, Debug)]
pub struct F64x2 {
    pub elements: __m128d,
}

/// Two boolean lanes stored as all-ones / all-zeros f64 lanes.
#[derive(Copy, Clone, Debug)]
pub struct M64x2 {
    pub elements: __m128d,
}

impl F64x2 {
    #[inline(always)]
    pub(crate) fn new(elements: __m128d) -> Self {
        Self { elements }
    }
}

impl M64x2 {
    #[inline(always)]
    pub(crate) fn new(elements: __m128d) -> Self {
        Self { elements }
    }
}

impl Packed for F64x2 {
    type Scalar = f64;
    type Array = [f64; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        Self::new(unsafe { _mm_set1_pd(value) })
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
        Self::from_array([f(0), f(1)])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f64) -> Self {
        Self::new(_mm_loadu_pd(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f64) {
        _mm_storeu_pd(ptr, self.elements)
    }
}

impl Halves for F64x2 {
    type Doubled = [f64; 2 * LANE_COUNT];

    #[inline(always)]
    fn join(lo: [f64; LANE_COUNT], hi: [f64; LANE_COUNT]) -> [f64; 2 * LANE_COUNT] {
        [lo[0], lo[1], hi[0], hi[1]]
    }

    #[inline(always)]
    fn split(lanes: [f64; 2 * LANE_COUNT]) -> ([f64; LANE_COUNT], [f64; LANE_COUNT]) {
        ([lanes[0], lanes[1]], [lanes[2], lanes[3]])
    }
}

impl Packed for M64x2 {
    type Scalar = bool;
    type Array = [bool; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: bool) -> Self {
        Self::from_bits(if value { 0b11 } else { 0 })
    }

    #[inline(always)]
    fn from_array(lanes: [bool; LANE_COUNT]) -> Self {
        Self::from_bits(lanes[0] as u32 | (lanes[1] as u32) << 1)
    }

    #[inline(always)]
    fn to_array(self) -> [bool; LANE_COUNT] {
        let bits = self.to_bits();
        [bits & 1 == 1, bits & 2 == 2]
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> bool>(mut f: F) -> Self {
        Self::from_array([f(0), f(1)])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const bool) -> Self {
        Self::from_array([*ptr, *ptr.add(1)])
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut bool) {
        let [a, b] = self.to_array();
        *ptr = a;
        *ptr.add(1) = b;
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

native_binop!(F64x2, Add, add, _mm_add_pd);
native_binop!(F64x2, Sub, sub, _mm_sub_pd);
native_binop!(F64x2, Mul, mul, _mm_mul_pd);
native_binop!(F64x2, Div, div, _mm_div_pd);
native_binop!(M64x2, BitAnd, bitand, _mm_and_pd);
native_binop!(M64x2, BitOr, bitor, _mm_or_pd);
native_binop!(M64x2, BitXor, bitxor, _mm_xor_pd);

impl Rem for F64x2 {
    type Output = Self;

    #[inline]
    fn rem(self, rhs: Self) -> Self {
        self.zip_lanes(rhs, |a, b| a % b)
    }
}

impl Neg for F64x2 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(unsafe { _mm_xor_pd(self.elements, _mm_set1_pd(-0.0)) })
    }
}

impl Not for M64x2 {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(unsafe { _mm_xor_pd(self.elements, _mm_castsi128_pd(_mm_set1_epi32(-1))) })
    }
}

impl BoolLanes for M64x2 {
    #[inline(always)]
    fn all_true(self) -> bool {
        self.to_bits() == 0b11
    }

    #[inline(always)]
    fn all_false(self) -> bool {
        self.to_bits() == 0
    }

    #[inline(always)]
    fn count_true(self) -> usize {
        self.to_bits().count_ones() as usize
    }

    #[inline(always)]
    fn to_bits(self) -> u32 {
        unsafe { _mm_movemask_pd(self.elements) as u32 }
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        let lane = |l: u32| -(((bits >> l) & 1) as i64);
        Self::new(unsafe { _mm_castsi128_pd(_mm_set_epi64x(lane(1), lane(0))) })
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
    ($($name:ident => $intrinsic:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self, other: Self) -> M64x2 {
                M64x2::new(unsafe { $intrinsic(self.elements, other.elements) })
            }
        )*
    };
}

impl Real for F64x2 {
    type Mask = M64x2;

    #[inline(always)]
    fn abs(self) -> Self {
        Self::new(unsafe { _mm_andnot_pd(_mm_set1_pd(-0.0), self.elements) })
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Self::new(unsafe { _mm_sqrt_pd(self.elements) })
    }

    #[cfg(any(sse, avx))]
    #[inline(always)]
    fn floor(self) -> Self {
        Self::new(unsafe { _mm_floor_pd(self.elements) })
    }

    #[cfg(any(sse, avx))]
    #[inline(always)]
    fn ceil(self) -> Self {
        Self::new(unsafe { _mm_ceil_pd(self.elements) })
    }

    #[cfg(any(sse, avx))]
    #[inline(always)]
    fn trunc(self) -> Self {
        Self::new(unsafe { _mm_round_pd::<{ _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC }>(self.elements) })
    }

    #[cfg(not(any(sse, avx)))]
    emulated_unary!(floor, ceil, trunc);

    emulated_unary!(
        round, exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt, sin, cos, tan, asin, acos, atan,
        sinh, cosh, tanh, asinh, acosh, atanh,
    );

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        Self::new(unsafe { _mm_min_pd(self.elements, other.elements) })
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        Self::new(unsafe { _mm_max_pd(self.elements, other.elements) })
    }

    emulated_binary!(powf, hypot, atan2);

    native_compare!(
        cmp_eq => _mm_cmpeq_pd,
        cmp_ne => _mm_cmpneq_pd,
        cmp_lt => _mm_cmplt_pd,
        cmp_le => _mm_cmple_pd,
        cmp_gt => _mm_cmpgt_pd,
        cmp_ge => _mm_cmpge_pd,
    );

    // movemask gathers exactly the sign bits
    #[inline(always)]
    fn signbit(self) -> M64x2 {
        M64x2::from_bits(unsafe { _mm_movemask_pd(self.elements) as u32 })
    }

    #[inline(always)]
    fn select(mask: M64x2, a: Self, b: Self) -> Self {
        Self::new(unsafe {
            _mm_or_pd(
                _mm_and_pd(mask.elements, a.elements),
                _mm_andnot_pd(mask.elements, b.elements),
            )
        })
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::splat(value)
    }
}

impl RealPack for F64x2 {
    #[inline(always)]
    fn sum(self) -> f64 {
        unsafe {
            let a = self.elements;
            _mm_cvtsd_f64(_mm_add_sd(a, _mm_unpackhi_pd(a, a)))
        }
    }

    #[inline(always)]
    fn maximum(self) -> f64 {
        unsafe {
            let a = self.elements;
            _mm_cvtsd_f64(_mm_max_sd(a, _mm_unpackhi_pd(a, a)))
        }
    }

    #[inline(always)]
    fn minimum(self) -> f64 {
        unsafe {
            let a = self.elements;
            _mm_cvtsd_f64(_mm_min_sd(a, _mm_unpackhi_pd(a, a)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::emulated::EmuPack;
    use crate::simd::pair::Pair;

    #[test]
    fn test_pair_reduction_matches_emulation() {
        let lanes = [1e16f64, 1.0, -1e16, 3.0];
        let pair = Pair::<F64x2>::from_array(lanes);
        let emulated = EmuPack(lanes);
        assert_eq!(pair.sum().to_bits(), emulated.sum().to_bits());
        assert_eq!(pair.maximum(), 1e16);
        assert_eq!(pair.minimum(), -1e16);
        assert_eq!(pair.to_array(), lanes);
    }

    #[test]
    fn test_masks_round_trip_bits() {
        for bits in 0..4u32 {
            let m = M64x2::from_bits(bits);
            assert_eq!(m.to_bits(), bits);
            assert_eq!(m.count_true(), bits.count_ones() as usize);
        }
        let a = F64x2::from_array([1.0, -1.0]);
        let m = a.cmp_gt(F64x2::splat(0.0));
        assert_eq!(m.to_array(), [true, false]);
        assert_eq!(F64x2::select(m, a, -a).to_array(), [1.0, 1.0]);
    }
}
