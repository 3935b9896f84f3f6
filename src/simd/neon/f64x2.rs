//! NEON 2-lane f64 pack and its mask, paired by the NEON kind to four lanes.

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::simd::traits::{BoolLanes, Halves, Packed, Real, RealPack};

pub const LANE_COUNT: usize = 2;

#[derive(Copy, Clone, Debug)]
pub struct F64x2 {
    pub elements: float64x2_t,
}

#[derive(Copy, Clone, Debug)]
pub struct M64x2 {
    pub elements: uint64x2_t,
}

impl F64x2 {
    #[inline(always)]
    pub(crate) fn new(elements: float64x2_t) -> Self {
        Self { elements }
    }
}

impl M64x2 {
    #[inline(always)]
    pub(crate) fn new(elements: uint64x2_t) -> Self {
        Self { elements }
    }
}

impl Packed for F64x2 {
    type Scalar = f64;
    type Array = [f64; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        Self::new(unsafe { vdupq_n_f64(value) })
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
        Self::new(vld1q_f64(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f64) {
        vst1q_f64(ptr, self.elements)
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
        Self::new(unsafe { vdupq_n_u64(if value { u64::MAX } else { 0 }) })
    }

    #[inline(always)]
    fn from_array(lanes: [bool; LANE_COUNT]) -> Self {
        let words = lanes.map(|v| if v { u64::MAX } else { 0 });
        Self::new(unsafe { vld1q_u64(words.as_ptr()) })
    }

    #[inline(always)]
    fn to_array(self) -> [bool; LANE_COUNT] {
        unsafe {
            [
                vgetq_lane_u64::<0>(self.elements) != 0,
                vgetq_lane_u64::<1>(self.elements) != 0,
            ]
        }
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

native_binop!(F64x2, Add, add, vaddq_f64);
native_binop!(F64x2, Sub, sub, vsubq_f64);
native_binop!(F64x2, Mul, mul, vmulq_f64);
native_binop!(F64x2, Div, div, vdivq_f64);
native_binop!(M64x2, BitAnd, bitand, vandq_u64);
native_binop!(M64x2, BitOr, bitor, vorrq_u64);
native_binop!(M64x2, BitXor, bitxor, veorq_u64);

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
        Self::new(unsafe { vnegq_f64(self.elements) })
    }
}

impl Not for M64x2 {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(unsafe { veorq_u64(self.elements, vdupq_n_u64(u64::MAX)) })
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
        let [a, b] = self.to_array();
        a as u32 | (b as u32) << 1
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        Self::from_array([bits & 1 == 1, bits & 2 == 2])
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
            fn $name(self, other: Self) -> M64x2 {
                M64x2::new(unsafe { $intrinsic(self.elements, other.elements) })
            }
        )*
    };
}

impl Real for F64x2 {
    type Mask = M64x2;

    native_unary!(
        abs => vabsq_f64,
        sqrt => vsqrtq_f64,
        floor => vrndmq_f64,
        ceil => vrndpq_f64,
        round => vrndaq_f64,
        trunc => vrndq_f64,
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
        cmp_eq => vceqq_f64,
        cmp_lt => vcltq_f64,
        cmp_le => vcleq_f64,
        cmp_gt => vcgtq_f64,
        cmp_ge => vcgeq_f64,
    );

    #[inline(always)]
    fn cmp_ne(self, other: Self) -> M64x2 {
        !self.cmp_eq(other)
    }

    #[inline(always)]
    fn signbit(self) -> M64x2 {
        M64x2::new(unsafe {
            vreinterpretq_u64_s64(vshrq_n_s64::<63>(vreinterpretq_s64_f64(self.elements)))
        })
    }

    #[inline(always)]
    fn select(mask: M64x2, a: Self, b: Self) -> Self {
        Self::new(unsafe { vbslq_f64(mask.elements, a.elements, b.elements) })
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::splat(value)
    }
}

impl RealPack for F64x2 {
    #[inline(always)]
    fn sum(self) -> f64 {
        let [a0, a1] = self.to_array();
        a0 + a1
    }

    #[inline(always)]
    fn maximum(self) -> f64 {
        let [a0, a1] = self.to_array();
        Real::max(a0, a1)
    }

    #[inline(always)]
    fn minimum(self) -> f64 {
        let [a0, a1] = self.to_array();
        Real::min(a0, a1)
    }
}
