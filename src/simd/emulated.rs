//! Portable packs built from plain arrays.
//!
//! `EmuPack<T, N>` performs every operation lane by lane through the scalar
//! implementation. Horizontal reductions walk the same halving ladder as the native
//! packs (lane `i` combined with lane `i + N/2`, then again on the lower half), so a
//! reduction over an emulated pack is bit-identical to the native one.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use super::traits::{BoolLanes, Packed, Real, RealPack};
use super::SimdKind;

/// Kind used where no native instruction set is available, and as a reference
/// implementation in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emulated;

impl SimdKind for Emulated {
    const NAME: &'static str = "emulated";
    const LANES: usize = 4;
    const NATIVE_ROUNDING: bool = false;

    type Mask = EmuMask<4>;
    type F32 = EmuPack<f32, 4>;
    type F64 = EmuPack<f64, 4>;
}

/// `N` lanes of `T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmuPack<T, const N: usize>(pub [T; N]);

/// `N` boolean lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmuMask<const N: usize>(pub [bool; N]);

impl<T: Copy + std::fmt::Debug, const N: usize> Packed for EmuPack<T, N> {
    type Scalar = T;
    type Array = [T; N];

    const WIDTH: usize = N;

    #[inline(always)]
    fn splat(value: T) -> Self {
        Self([value; N])
    }

    #[inline(always)]
    fn from_array(lanes: [T; N]) -> Self {
        Self(lanes)
    }

    #[inline(always)]
    fn to_array(self) -> [T; N] {
        self.0
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> T>(f: F) -> Self {
        Self(std::array::from_fn(f))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const T) -> Self {
        Self(std::array::from_fn(|l| *ptr.add(l)))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut T) {
        for (l, v) in self.0.iter().enumerate() {
            *ptr.add(l) = *v;
        }
    }
}

impl<const N: usize> Packed for EmuMask<N> {
    type Scalar = bool;
    type Array = [bool; N];

    const WIDTH: usize = N;

    #[inline(always)]
    fn splat(value: bool) -> Self {
        Self([value; N])
    }

    #[inline(always)]
    fn from_array(lanes: [bool; N]) -> Self {
        Self(lanes)
    }

    #[inline(always)]
    fn to_array(self) -> [bool; N] {
        self.0
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> bool>(f: F) -> Self {
        Self(std::array::from_fn(f))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const bool) -> Self {
        Self(std::array::from_fn(|l| *ptr.add(l)))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut bool) {
        for (l, v) in self.0.iter().enumerate() {
            *ptr.add(l) = *v;
        }
    }
}

macro_rules! lanewise_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<T: Real<Mask = bool>, const N: usize> $trait for EmuPack<T, N> {
            type Output = Self;

            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                Self(std::array::from_fn(|l| self.0[l] $op rhs.0[l]))
            }
        }
    };
}

lanewise_binop!(Add, add, +);
lanewise_binop!(Sub, sub, -);
lanewise_binop!(Mul, mul, *);
lanewise_binop!(Div, div, /);
lanewise_binop!(Rem, rem, %);

impl<T: Real<Mask = bool>, const N: usize> Neg for EmuPack<T, N> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self(self.0.map(|v| -v))
    }
}

impl<const N: usize> BitAnd for EmuMask<N> {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|l| self.0[l] & rhs.0[l]))
    }
}

impl<const N: usize> BitOr for EmuMask<N> {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|l| self.0[l] | rhs.0[l]))
    }
}

impl<const N: usize> BitXor for EmuMask<N> {
    type Output = Self;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|l| self.0[l] ^ rhs.0[l]))
    }
}

impl<const N: usize> Not for EmuMask<N> {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self(self.0.map(|v| !v))
    }
}

impl<const N: usize> BoolLanes for EmuMask<N> {
    #[inline]
    fn all_true(self) -> bool {
        self.0.iter().all(|v| *v)
    }

    #[inline]
    fn all_false(self) -> bool {
        !self.0.iter().any(|v| *v)
    }

    #[inline]
    fn count_true(self) -> usize {
        self.0.iter().filter(|v| **v).count()
    }

    #[inline]
    fn to_bits(self) -> u32 {
        debug_assert!(N <= 32);
        self.0
            .iter()
            .enumerate()
            .fold(0, |bits, (l, v)| bits | ((*v as u32) << l))
    }

    #[inline]
    fn from_bits(bits: u32) -> Self {
        Self(std::array::from_fn(|l| (bits >> l) & 1 == 1))
    }
}

macro_rules! lanewise_unary {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(self) -> Self {
                Self(self.0.map(Real::$name))
            }
        )*
    };
}

macro_rules! lanewise_binary {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(self, other: Self) -> Self {
                Self(std::array::from_fn(|l| Real::$name(self.0[l], other.0[l])))
            }
        )*
    };
}

macro_rules! lanewise_compare {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(self, other: Self) -> EmuMask<N> {
                EmuMask(std::array::from_fn(|l| Real::$name(self.0[l], other.0[l])))
            }
        )*
    };
}

impl<T: Real<Mask = bool>, const N: usize> Real for EmuPack<T, N> {
    type Mask = EmuMask<N>;

    lanewise_unary!(
        abs, sqrt, floor, ceil, round, trunc, exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt,
        sin, cos, tan, asin, acos, atan, sinh, cosh, tanh, asinh, acosh, atanh,
    );

    lanewise_binary!(min, max, powf, hypot, atan2);

    lanewise_compare!(cmp_eq, cmp_ne, cmp_lt, cmp_le, cmp_gt, cmp_ge);

    #[inline]
    fn signbit(self) -> EmuMask<N> {
        EmuMask(std::array::from_fn(|l| Real::signbit(self.0[l])))
    }

    #[inline]
    fn select(mask: EmuMask<N>, a: Self, b: Self) -> Self {
        Self(std::array::from_fn(|l| if mask.0[l] { a.0[l] } else { b.0[l] }))
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        Self([T::from_f64(value); N])
    }
}

impl<T: Real<Mask = bool>, const N: usize> EmuPack<T, N> {
    // lane i folds lane i + half until one lane is left
    #[inline]
    fn halving(self, combine: impl Fn(T, T) -> T) -> T {
        debug_assert!(N.is_power_of_two());
        let mut lanes = self.0;
        let mut width = N;
        while width > 1 {
            let half = width / 2;
            for i in 0..half {
                lanes[i] = combine(lanes[i], lanes[i + half]);
            }
            width = half;
        }
        lanes[0]
    }
}

impl<T: Real<Mask = bool>, const N: usize> RealPack for EmuPack<T, N> {
    #[inline]
    fn sum(self) -> T {
        self.halving(|a, b| a + b)
    }

    #[inline]
    fn maximum(self) -> T {
        self.halving(Real::max)
    }

    #[inline]
    fn minimum(self) -> T {
        self.halving(Real::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halving_order() {
        let p = EmuPack([1.0f32, 2.0, 3.0, 4.0]);
        // (1 + 3) + (2 + 4)
        assert_eq!(p.sum(), 10.0);
        assert_eq!(p.maximum(), 4.0);
        assert_eq!(p.minimum(), 1.0);

        let wide = EmuPack::<f64, 8>::from_fn(|l| l as f64 - 3.0);
        assert_eq!(wide.sum(), 4.0);
        assert_eq!(wide.maximum(), 4.0);
        assert_eq!(wide.minimum(), -3.0);
    }

    #[test]
    fn test_mask_predicates() {
        let m = EmuMask([true, false, true, true]);
        assert!(!m.all_true());
        assert!(!m.all_false());
        assert!(m.any_true());
        assert!(m.any_false());
        assert_eq!(m.count_true(), 3);
        assert_eq!(m.to_bits(), 0b1101);
        assert_eq!(EmuMask::<4>::from_bits(0b1101), m);
        assert!((!m ^ m).all_true());
    }

    #[test]
    fn test_compare_and_select() {
        let a = EmuPack([1.0f64, 5.0, -2.0, 0.0]);
        let b = EmuPack::splat(1.0f64);
        let m = a.cmp_gt(b);
        assert_eq!(m, EmuMask([false, true, false, false]));
        let s = EmuPack::select(m, a, b);
        assert_eq!(s.0, [1.0, 5.0, 1.0, 1.0]);
    }

    #[test]
    fn test_load_store_gather() {
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let p = unsafe { EmuPack::<f32, 4>::load(data.as_ptr().add(2)) };
        assert_eq!(p.0, [3.0, 4.0, 5.0, 6.0]);

        let g = unsafe { EmuPack::<f32, 4>::gather(data.as_ptr(), 2) };
        assert_eq!(g.0, [1.0, 3.0, 5.0, 7.0]);

        let mut out = [0.0f32; 8];
        unsafe { g.scatter(out.as_mut_ptr().add(1), 2) };
        assert_eq!(out, [0.0, 1.0, 0.0, 3.0, 0.0, 5.0, 0.0, 7.0]);
    }
}
