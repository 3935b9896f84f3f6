//! SSE 4-lane f32 pack and its mask.
//!
//! `F32x4` wraps an `__m128` register holding four single-precision values. The
//! matching mask `M32x4` keeps all-ones / all-zeros lanes in the same register type,
//! as produced by the `cmpps` family.
//!
//! # Architecture Requirements
//!
//! - **Target Architecture**: x86 / x86_64 with SSE2 (always present on x86_64)
//! - **Optional**: SSE4.1 (`cfg(sse)` from `build.rs`) turns `floor`, `ceil` and
//!   `trunc` into single `roundps` instructions; otherwise they are emulated
//!
//! # Horizontal Reductions
//!
//! `sum`, `maximum` and `minimum` fold the high half onto the low half
//! (`movhlps`), then lane 1 onto lane 0, i.e. `(a0 ∘ a2) ∘ (a1 ∘ a3)`.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::simd::traits::{BoolLanes, Packed, Real, RealPack};

/// Number of f32 elements in an SSE 128-bit register.
pub(crate) const LANE_COUNT: usize = 4;

/// Four packed f32 values.
#[derive(Copy, Clone, Debug)]
pub struct F32x4 {
    pub elements: __m128,
}

/// Four boolean lanes stored as all-ones / all-zeros f32 lanes.
#[derive(Copy, Clone, Debug)]
pub struct M32x4 {
    pub elements: __m128,
}

impl F32x4 {
    #[inline(always)]
    pub(crate) fn new(elements: __m128) -> Self {
        Self { elements }
    }
}

impl M32x4 {
    #[inline(always)]
    pub(crate) fn new(elements: __m128) -> Self {
        Self { elements }
    }
}

impl Packed for F32x4 {
    type Scalar = f32;
    type Array = [f32; LANE_COUNT];

    const WIDTH: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        Self::new(unsafe { _mm_set1_ps(value) })
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
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self::new(_mm_loadu_ps(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        _mm_storeu_ps(ptr, self.elements)
    }
}

impl Packed for M32x4 {
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

native_binop!(F32x4, Add, add, _mm_add_ps);
native_binop!(F32x4, Sub, sub, _mm_sub_ps);
native_binop!(F32x4, Mul, mul, _mm_mul_ps);
native_binop!(F32x4, Div, div, _mm_div_ps);
native_binop!(M32x4, BitAnd, bitand, _mm_and_ps);
native_binop!(M32x4, BitOr, bitor, _mm_or_ps);
native_binop!(M32x4, BitXor, bitxor, _mm_xor_ps);

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
        Self::new(unsafe { _mm_xor_ps(self.elements, _mm_set1_ps(-0.0)) })
    }
}

impl Not for M32x4 {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(unsafe { _mm_xor_ps(self.elements, _mm_castsi128_ps(_mm_set1_epi32(-1))) })
    }
}

impl BoolLanes for M32x4 {
    #[inline(always)]
    fn all_true(self) -> bool {
        self.to_bits() == 0b1111
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
        unsafe { _mm_movemask_ps(self.elements) as u32 }
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        let lane = |l: u32| -(((bits >> l) & 1) as i32);
        Self::new(unsafe { _mm_castsi128_ps(_mm_setr_epi32(lane(0), lane(1), lane(2), lane(3))) })
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
            fn $name(self, other: Self) -> M32x4 {
                M32x4::new(unsafe { $intrinsic(self.elements, other.elements) })
            }
        )*
    };
}

impl Real for F32x4 {
    type Mask = M32x4;

    #[inline(always)]
    fn abs(self) -> Self {
        Self::new(unsafe { _mm_andnot_ps(_mm_set1_ps(-0.0), self.elements) })
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Self::new(unsafe { _mm_sqrt_ps(self.elements) })
    }

    #[cfg(any(sse, avx))]
    #[inline(always)]
    fn floor(self) -> Self {
        Self::new(unsafe { _mm_floor_ps(self.elements) })
    }

    #[cfg(any(sse, avx))]
    #[inline(always)]
    fn ceil(self) -> Self {
        Self::new(unsafe { _mm_ceil_ps(self.elements) })
    }

    #[cfg(any(sse, avx))]
    #[inline(always)]
    fn trunc(self) -> Self {
        Self::new(unsafe { _mm_round_ps::<{ _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC }>(self.elements) })
    }

    #[cfg(not(any(sse, avx)))]
    emulated_unary!(floor, ceil, trunc);

    // roundps rounds half to even, the scalar path rounds half away from zero
    emulated_unary!(
        round, exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt, sin, cos, tan, asin, acos, atan,
        sinh, cosh, tanh, asinh, acosh, atanh,
    );

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        Self::new(unsafe { _mm_min_ps(self.elements, other.elements) })
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        Self::new(unsafe { _mm_max_ps(self.elements, other.elements) })
    }

    emulated_binary!(powf, hypot, atan2);

    native_compare!(
        cmp_eq => _mm_cmpeq_ps,
        cmp_ne => _mm_cmpneq_ps,
        cmp_lt => _mm_cmplt_ps,
        cmp_le => _mm_cmple_ps,
        cmp_gt => _mm_cmpgt_ps,
        cmp_ge => _mm_cmpge_ps,
    );

    // movemask gathers exactly the sign bits
    #[inline(always)]
    fn signbit(self) -> M32x4 {
        M32x4::from_bits(unsafe { _mm_movemask_ps(self.elements) as u32 })
    }

    #[inline(always)]
    fn select(mask: M32x4, a: Self, b: Self) -> Self {
        Self::new(unsafe {
            _mm_or_ps(
                _mm_and_ps(mask.elements, a.elements),
                _mm_andnot_ps(mask.elements, b.elements),
            )
        })
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::splat(value as f32)
    }
}

impl RealPack for F32x4 {
    #[inline(always)]
    fn sum(self) -> f32 {
        unsafe {
            let a = self.elements;
            let folded = _mm_add_ps(a, _mm_movehl_ps(a, a));
            _mm_cvtss_f32(_mm_add_ss(folded, _mm_shuffle_ps::<0b01>(folded, folded)))
        }
    }

    #[inline(always)]
    fn maximum(self) -> f32 {
        unsafe {
            let a = self.elements;
            let folded = _mm_max_ps(a, _mm_movehl_ps(a, a));
            _mm_cvtss_f32(_mm_max_ss(folded, _mm_shuffle_ps::<0b01>(folded, folded)))
        }
    }

    #[inline(always)]
    fn minimum(self) -> f32 {
        unsafe {
            let a = self.elements;
            let folded = _mm_min_ps(a, _mm_movehl_ps(a, a));
            _mm_cvtss_f32(_mm_min_ss(folded, _mm_shuffle_ps::<0b01>(folded, folded)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::emulated::EmuPack;

    #[test]
    fn test_arithmetic_matches_scalar() {
        let a = [1.5f32, -2.0, 3.25, 8.0];
        let b = [0.5f32, 4.0, -1.0, 2.0];
        let (pa, pb) = (F32x4::from_array(a), F32x4::from_array(b));
        let sum = (pa + pb).to_array();
        let quo = (pa / pb).to_array();
        let rem = (pa % pb).to_array();
        for l in 0..LANE_COUNT {
            assert_eq!(sum[l], a[l] + b[l]);
            assert_eq!(quo[l], a[l] / b[l]);
            assert_eq!(rem[l], a[l] % b[l]);
        }
        assert_eq!((-pa).to_array(), [-1.5, 2.0, -3.25, -8.0]);
        assert_eq!(pa.abs().to_array(), [1.5, 2.0, 3.25, 8.0]);
    }

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
    fn test_rounding_matches_scalar() {
        let lanes = [-1.5f32, -0.5, 0.5, 2.5];
        let p = F32x4::from_array(lanes);
        for (l, v) in lanes.iter().enumerate() {
            assert_eq!(p.floor().extract(l), v.floor());
            assert_eq!(p.ceil().extract(l), v.ceil());
            assert_eq!(p.trunc().extract(l), v.trunc());
            assert_eq!(p.round().extract(l), v.round());
        }
    }

    #[test]
    fn test_masks() {
        let a = F32x4::from_array([1.0, 2.0, f32::NAN, 4.0]);
        let b = F32x4::splat(2.0);
        assert_eq!(a.cmp_lt(b).to_array(), [true, false, false, false]);
        assert_eq!(a.cmp_ne(b).to_array(), [true, false, true, true]);
        assert_eq!(a.cmp_ge(b).to_bits(), 0b1010);

        let m = M32x4::from_bits(0b0110);
        assert_eq!(m.count_true(), 2);
        assert!(m.any_true() && m.any_false());
        assert!((m | !m).all_true());
        assert!((m & !m).all_false());
        assert_eq!(F32x4::select(m, a, b).to_array()[1], 2.0);
        assert!(F32x4::select(m, a, b).to_array()[2].is_nan());
    }
}
