//! Capability traits shared by scalars and SIMD packs.
//!
//! [`Real`] and [`BoolLanes`] are implemented both by plain scalars (`f32`, `f64`,
//! `bool`) and by every pack type, so one kernel body serves the scalar tail and the
//! packed majority of a traversal. [`Packed`] adds what only packs have: a lane
//! count and memory transfer.

use std::fmt::Debug;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use num::Float;

/// Fixed-width group of scalars processed by one instruction.
pub trait Packed: Copy + Debug {
    type Scalar: Copy;
    /// Plain array with the same lanes, used for lane-wise fallbacks.
    type Array: Copy + AsRef<[Self::Scalar]> + AsMut<[Self::Scalar]>;

    const WIDTH: usize;

    fn splat(value: Self::Scalar) -> Self;

    fn from_array(lanes: Self::Array) -> Self;

    fn to_array(self) -> Self::Array;

    fn from_fn<F: FnMut(usize) -> Self::Scalar>(f: F) -> Self;

    /// Loads `WIDTH` consecutive scalars.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `WIDTH` elements. No alignment is required.
    unsafe fn load(ptr: *const Self::Scalar) -> Self;

    /// Stores all lanes to `WIDTH` consecutive scalars.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `WIDTH` elements. No alignment is required.
    unsafe fn store(self, ptr: *mut Self::Scalar);

    /// Loads lanes that are `step` elements apart.
    ///
    /// # Safety
    ///
    /// Every `ptr.offset(l * step)` for `l < WIDTH` must be valid for reads.
    #[inline]
    unsafe fn gather(ptr: *const Self::Scalar, step: isize) -> Self {
        Self::from_fn(|l| *ptr.offset(l as isize * step))
    }

    /// Stores lanes `step` elements apart.
    ///
    /// # Safety
    ///
    /// Every `ptr.offset(l * step)` for `l < WIDTH` must be valid for writes.
    #[inline]
    unsafe fn scatter(self, ptr: *mut Self::Scalar, step: isize) {
        for (l, v) in self.to_array().as_ref().iter().enumerate() {
            *ptr.offset(l as isize * step) = *v;
        }
    }

    #[inline]
    fn extract(self, lane: usize) -> Self::Scalar {
        self.to_array().as_ref()[lane]
    }

    /// Applies a scalar function to every lane.
    #[inline]
    fn map_lanes<F: Fn(Self::Scalar) -> Self::Scalar>(self, f: F) -> Self {
        let mut lanes = self.to_array();
        for v in lanes.as_mut() {
            *v = f(*v);
        }
        Self::from_array(lanes)
    }

    /// Applies a scalar function to every pair of lanes.
    #[inline]
    fn zip_lanes<F: Fn(Self::Scalar, Self::Scalar) -> Self::Scalar>(self, other: Self, f: F) -> Self {
        let mut lanes = self.to_array();
        let rhs = other.to_array();
        for (v, r) in lanes.as_mut().iter_mut().zip(rhs.as_ref()) {
            *v = f(*v, *r);
        }
        Self::from_array(lanes)
    }
}

/// Boolean lanes: a single `bool` or a packed mask.
pub trait BoolLanes:
    Copy
    + Debug
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    fn all_true(self) -> bool;
    fn all_false(self) -> bool;

    #[inline]
    fn any_true(self) -> bool {
        !self.all_false()
    }

    #[inline]
    fn any_false(self) -> bool {
        !self.all_true()
    }

    fn count_true(self) -> usize;

    /// Lane `l` becomes bit `l`.
    fn to_bits(self) -> u32;

    fn from_bits(bits: u32) -> Self;

    /// Reinterprets the lanes as another mask type with the same lane count.
    #[inline]
    fn cast_mask<M: BoolLanes>(self) -> M {
        M::from_bits(self.to_bits())
    }
}

/// A packed mask.
pub trait BoolPack: Packed<Scalar = bool> + BoolLanes {}

impl<T: Packed<Scalar = bool> + BoolLanes> BoolPack for T {}

/// Real arithmetic shared by `f32`, `f64` and their packs.
///
/// `min`/`max` follow the x86 convention `if a < b { a } else { b }`, which makes the
/// scalar path and every pack path agree bit for bit, NaN and signed zeros included.
pub trait Real:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
    + Neg<Output = Self>
{
    type Mask: BoolLanes;

    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    fn round(self) -> Self;
    fn trunc(self) -> Self;
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;

    fn exp(self) -> Self;
    fn exp2(self) -> Self;
    fn exp_m1(self) -> Self;
    fn ln(self) -> Self;
    fn log2(self) -> Self;
    fn log10(self) -> Self;
    fn ln_1p(self) -> Self;
    fn cbrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn sinh(self) -> Self;
    fn cosh(self) -> Self;
    fn tanh(self) -> Self;
    fn asinh(self) -> Self;
    fn acosh(self) -> Self;
    fn atanh(self) -> Self;
    fn powf(self, other: Self) -> Self;
    fn hypot(self, other: Self) -> Self;
    fn atan2(self, other: Self) -> Self;

    fn cmp_eq(self, other: Self) -> Self::Mask;
    fn cmp_ne(self, other: Self) -> Self::Mask;
    fn cmp_lt(self, other: Self) -> Self::Mask;
    fn cmp_le(self, other: Self) -> Self::Mask;
    fn cmp_gt(self, other: Self) -> Self::Mask;
    fn cmp_ge(self, other: Self) -> Self::Mask;

    /// Sign bit of every lane, set for `-0.0` and negative NaNs too.
    fn signbit(self) -> Self::Mask;

    /// Lane-wise `if mask { a } else { b }`.
    fn select(mask: Self::Mask, a: Self, b: Self) -> Self;

    fn from_f64(value: f64) -> Self;
}

/// A real-valued pack with horizontal reductions.
pub trait RealPack: Packed + Real {
    /// Sum of all lanes, combining halves until one lane remains.
    fn sum(self) -> Self::Scalar;
    fn maximum(self) -> Self::Scalar;
    fn minimum(self) -> Self::Scalar;
}

/// Packs that can be split into and joined from two halves of equal width.
///
/// Used by [`Pair`](super::pair::Pair) to build a wide pack out of two narrow ones.
pub trait Halves: Packed {
    type Doubled: Copy + AsRef<[Self::Scalar]> + AsMut<[Self::Scalar]>;

    fn join(lo: Self::Array, hi: Self::Array) -> Self::Doubled;

    fn split(lanes: Self::Doubled) -> (Self::Array, Self::Array);
}

impl BoolLanes for bool {
    #[inline(always)]
    fn all_true(self) -> bool {
        self
    }

    #[inline(always)]
    fn all_false(self) -> bool {
        !self
    }

    #[inline(always)]
    fn count_true(self) -> usize {
        self as usize
    }

    #[inline(always)]
    fn to_bits(self) -> u32 {
        self as u32
    }

    #[inline(always)]
    fn from_bits(bits: u32) -> Self {
        bits & 1 == 1
    }
}

/// Scalars route through `num::Float`, the scalar math library every emulated
/// pack function falls back to.
impl<T: Float + Debug> Real for T {
    type Mask = bool;

    #[inline(always)]
    fn abs(self) -> Self {
        Float::abs(self)
    }
    #[inline(always)]
    fn sqrt(self) -> Self {
        Float::sqrt(self)
    }
    #[inline(always)]
    fn floor(self) -> Self {
        Float::floor(self)
    }
    #[inline(always)]
    fn ceil(self) -> Self {
        Float::ceil(self)
    }
    #[inline(always)]
    fn round(self) -> Self {
        Float::round(self)
    }
    #[inline(always)]
    fn trunc(self) -> Self {
        Float::trunc(self)
    }
    #[inline(always)]
    fn min(self, other: Self) -> Self {
        if self < other {
            self
        } else {
            other
        }
    }
    #[inline(always)]
    fn max(self, other: Self) -> Self {
        if self > other {
            self
        } else {
            other
        }
    }

    #[inline(always)]
    fn exp(self) -> Self {
        Float::exp(self)
    }
    #[inline(always)]
    fn exp2(self) -> Self {
        Float::exp2(self)
    }
    #[inline(always)]
    fn exp_m1(self) -> Self {
        Float::exp_m1(self)
    }
    #[inline(always)]
    fn ln(self) -> Self {
        Float::ln(self)
    }
    #[inline(always)]
    fn log2(self) -> Self {
        Float::log2(self)
    }
    #[inline(always)]
    fn log10(self) -> Self {
        Float::log10(self)
    }
    #[inline(always)]
    fn ln_1p(self) -> Self {
        Float::ln_1p(self)
    }
    #[inline(always)]
    fn cbrt(self) -> Self {
        Float::cbrt(self)
    }
    #[inline(always)]
    fn sin(self) -> Self {
        Float::sin(self)
    }
    #[inline(always)]
    fn cos(self) -> Self {
        Float::cos(self)
    }
    #[inline(always)]
    fn tan(self) -> Self {
        Float::tan(self)
    }
    #[inline(always)]
    fn asin(self) -> Self {
        Float::asin(self)
    }
    #[inline(always)]
    fn acos(self) -> Self {
        Float::acos(self)
    }
    #[inline(always)]
    fn atan(self) -> Self {
        Float::atan(self)
    }
    #[inline(always)]
    fn sinh(self) -> Self {
        Float::sinh(self)
    }
    #[inline(always)]
    fn cosh(self) -> Self {
        Float::cosh(self)
    }
    #[inline(always)]
    fn tanh(self) -> Self {
        Float::tanh(self)
    }
    #[inline(always)]
    fn asinh(self) -> Self {
        Float::asinh(self)
    }
    #[inline(always)]
    fn acosh(self) -> Self {
        Float::acosh(self)
    }
    #[inline(always)]
    fn atanh(self) -> Self {
        Float::atanh(self)
    }
    #[inline(always)]
    fn powf(self, other: Self) -> Self {
        Float::powf(self, other)
    }
    #[inline(always)]
    fn hypot(self, other: Self) -> Self {
        Float::hypot(self, other)
    }
    #[inline(always)]
    fn atan2(self, other: Self) -> Self {
        Float::atan2(self, other)
    }

    #[inline(always)]
    fn cmp_eq(self, other: Self) -> bool {
        self == other
    }
    #[inline(always)]
    fn cmp_ne(self, other: Self) -> bool {
        self != other
    }
    #[inline(always)]
    fn cmp_lt(self, other: Self) -> bool {
        self < other
    }
    #[inline(always)]
    fn cmp_le(self, other: Self) -> bool {
        self <= other
    }
    #[inline(always)]
    fn cmp_gt(self, other: Self) -> bool {
        self > other
    }
    #[inline(always)]
    fn cmp_ge(self, other: Self) -> bool {
        self >= other
    }

    #[inline(always)]
    fn signbit(self) -> bool {
        self.is_sign_negative()
    }

    #[inline(always)]
    fn select(mask: bool, a: Self, b: Self) -> Self {
        if mask {
            a
        } else {
            b
        }
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        // every Float can represent (a rounding of) any f64
        <T as num::NumCast>::from(value).unwrap_or_else(T::nan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_min_max_follow_x86_order() {
        // second operand wins on ties and NaN, like minps/maxps
        assert!(Real::min(f32::NAN, 1.0f32) == 1.0);
        assert!(Real::min(1.0f32, f32::NAN).is_nan());
        assert!(Real::max(0.0f64, -0.0f64).is_sign_negative());
        assert_eq!(Real::max(2.0f64, 1.0), 2.0);
    }

    #[test]
    fn test_bool_lanes() {
        assert!(true.all_true());
        assert!(false.all_false());
        assert!(true.any_true());
        assert!(false.any_false());
        assert_eq!(true.count_true(), 1);
        assert_eq!(bool::from_bits(true.to_bits()), true);
        assert_eq!(false.cast_mask::<bool>(), false);
    }

    #[test]
    fn test_scalar_select_and_compare() {
        assert_eq!(<f32 as Real>::select(2.0f32.cmp_gt(1.0), 5.0, 6.0), 5.0);
        assert!(f64::NAN.cmp_ne(f64::NAN));
        assert!(!f64::NAN.cmp_eq(f64::NAN));
        assert_eq!(<f64 as Real>::from_f64(0.5), 0.5);
    }
}
