//! Two registers acting as one pack.
//!
//! Kinds whose `f64` register holds half as many lanes as their `f32` register pair
//! two `f64` registers, so every element type of the kind shares one lane count.
//! Horizontal reductions combine the low and high half with one vertical operation
//! and then reduce the half, which is the first step of the halving ladder.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use super::traits::{BoolLanes, Halves, Packed, Real, RealPack};

#[derive(Debug, Clone, Copy)]
pub struct Pair<P> {
    pub lo: P,
    pub hi: P,
}

impl<P> Pair<P> {
    #[inline(always)]
    pub fn new(lo: P, hi: P) -> Self {
        Self { lo, hi }
    }
}

impl<P: Halves> Packed for Pair<P> {
    type Scalar = P::Scalar;
    type Array = P::Doubled;

    const WIDTH: usize = 2 * P::WIDTH;

    #[inline(always)]
    fn splat(value: P::Scalar) -> Self {
        Self::new(P::splat(value), P::splat(value))
    }

    #[inline(always)]
    fn from_array(lanes: P::Doubled) -> Self {
        let (lo, hi) = P::split(lanes);
        Self::new(P::from_array(lo), P::from_array(hi))
    }

    #[inline(always)]
    fn to_array(self) -> P::Doubled {
        P::join(self.lo.to_array(), self.hi.to_array())
    }

    #[inline(always)]
    fn from_fn<F: FnMut(usize) -> P::Scalar>(mut f: F) -> Self {
        let lo = P::from_fn(&mut f);
        let hi = P::from_fn(|l| f(l + P::WIDTH));
        Self::new(lo, hi)
    }

    #[inline(always)]
    unsafe fn load(ptr: *const P::Scalar) -> Self {
        Self::new(P::load(ptr), P::load(ptr.add(P::WIDTH)))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut P::Scalar) {
        self.lo.store(ptr);
        self.hi.store(ptr.add(P::WIDTH));
    }
}

macro_rules! halfwise_binop {
    ($trait:ident, $method:ident, $bound:ident) => {
        impl<P: $bound> $trait for Pair<P> {
            type Output = Self;

            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                Self::new(self.lo.$method(rhs.lo), self.hi.$method(rhs.hi))
            }
        }
    };
}

halfwise_binop!(Add, add, Real);
halfwise_binop!(Sub, sub, Real);
halfwise_binop!(Mul, mul, Real);
halfwise_binop!(Div, div, Real);
halfwise_binop!(Rem, rem, Real);
halfwise_binop!(BitAnd, bitand, BoolLanes);
halfwise_binop!(BitOr, bitor, BoolLanes);
halfwise_binop!(BitXor, bitxor, BoolLanes);

impl<P: Real> Neg for Pair<P> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.lo, -self.hi)
    }
}

impl<M: BoolLanes> Not for Pair<M> {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::new(!self.lo, !self.hi)
    }
}

impl<M: BoolLanes + Packed> BoolLanes for Pair<M> {
    #[inline]
    fn all_true(self) -> bool {
        self.lo.all_true() && self.hi.all_true()
    }

    #[inline]
    fn all_false(self) -> bool {
        self.lo.all_false() && self.hi.all_false()
    }

    #[inline]
    fn count_true(self) -> usize {
        self.lo.count_true() + self.hi.count_true()
    }

    #[inline]
    fn to_bits(self) -> u32 {
        self.lo.to_bits() | (self.hi.to_bits() << M::WIDTH)
    }

    #[inline]
    fn from_bits(bits: u32) -> Self {
        Self::new(M::from_bits(bits), M::from_bits(bits >> M::WIDTH))
    }
}

macro_rules! halfwise_unary {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self) -> Self {
                Self::new(self.lo.$name(), self.hi.$name())
            }
        )*
    };
}

macro_rules! halfwise_binary {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self, other: Self) -> Self {
                Self::new(self.lo.$name(other.lo), self.hi.$name(other.hi))
            }
        )*
    };
}

macro_rules! halfwise_compare {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline(always)]
            fn $name(self, other: Self) -> Self::Mask {
                Pair::new(self.lo.$name(other.lo), self.hi.$name(other.hi))
            }
        )*
    };
}

impl<P> Real for Pair<P>
where
    P: Real + Packed,
    P::Mask: Packed,
{
    type Mask = Pair<P::Mask>;

    halfwise_unary!(
        abs, sqrt, floor, ceil, round, trunc, exp, exp2, exp_m1, ln, log2, log10, ln_1p, cbrt,
        sin, cos, tan, asin, acos, atan, sinh, cosh, tanh, asinh, acosh, atanh,
    );

    halfwise_binary!(min, max, powf, hypot, atan2);

    halfwise_compare!(cmp_eq, cmp_ne, cmp_lt, cmp_le, cmp_gt, cmp_ge);

    #[inline(always)]
    fn signbit(self) -> Self::Mask {
        Pair::new(self.lo.signbit(), self.hi.signbit())
    }

    #[inline(always)]
    fn select(mask: Self::Mask, a: Self, b: Self) -> Self {
        Self::new(P::select(mask.lo, a.lo, b.lo), P::select(mask.hi, a.hi, b.hi))
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        Self::new(P::from_f64(value), P::from_f64(value))
    }
}

impl<P> RealPack for Pair<P>
where
    P: RealPack + Halves,
    P::Mask: Packed,
{
    #[inline]
    fn sum(self) -> P::Scalar {
        (self.lo + self.hi).sum()
    }

    #[inline]
    fn maximum(self) -> P::Scalar {
        self.lo.max(self.hi).maximum()
    }

    #[inline]
    fn minimum(self) -> P::Scalar {
        self.lo.min(self.hi).minimum()
    }
}
