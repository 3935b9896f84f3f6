//! Reductors: term, combine, post and empty value of one reduction.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::element::{PackOf, RealElement};
use crate::eval::Kernel;
use crate::simd::{Packed, Real, RealPack};

/// Definition of a real-valued reduction.
///
/// Elements are mapped by [`term`](Self::term) and folded with
/// [`combine`](Self::combine) in traversal order, starting from
/// [`init`](Self::init). [`post`](Self::post) is applied once to the final value
/// with the element count.
pub trait Reductor: Copy + Default + Debug + 'static {
    const NAME: &'static str;

    /// `term` has a native pack implementation.
    const NATIVE_TERM: bool = true;

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        x
    }

    #[inline(always)]
    fn combine<V: Real>(acc: V, x: V) -> V {
        acc + x
    }

    #[inline(always)]
    fn init<T: RealElement>() -> T {
        T::ZERO
    }

    #[inline(always)]
    fn post<T: RealElement>(acc: T, _count: usize) -> T {
        acc
    }

    /// Result for zero elements; `None` makes the reduction an error.
    fn empty<T: RealElement>() -> Option<T> {
        Some(Self::post(Self::init(), 0))
    }

    /// Folds the lanes of a pack accumulator into one value by repeatedly
    /// combining the low half with the high half.
    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        let mut lanes = pack.to_array();
        let lanes = lanes.as_mut();
        let mut width = lanes.len();
        while width > 1 {
            width /= 2;
            for l in 0..width {
                lanes[l] = Self::combine(lanes[l], lanes[l + width]);
            }
        }
        lanes[0]
    }
}

/// `Σ x`
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Reductor for Sum {
    const NAME: &'static str = "sum";

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

/// `Σ x / n`
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Reductor for Mean {
    const NAME: &'static str = "mean";

    #[inline]
    fn post<T: RealElement>(acc: T, count: usize) -> T {
        acc / T::from_usize(count)
    }

    // 0 / 0 would be NaN; callers get EmptyInput instead
    fn empty<T: RealElement>() -> Option<T> {
        None
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Maximum;

impl Reductor for Maximum {
    const NAME: &'static str = "maximum";

    #[inline(always)]
    fn combine<V: Real>(acc: V, x: V) -> V {
        acc.max(x)
    }

    #[inline(always)]
    fn init<T: RealElement>() -> T {
        T::NEG_INFINITY
    }

    fn empty<T: RealElement>() -> Option<T> {
        None
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.maximum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Minimum;

impl Reductor for Minimum {
    const NAME: &'static str = "minimum";

    #[inline(always)]
    fn combine<V: Real>(acc: V, x: V) -> V {
        acc.min(x)
    }

    #[inline(always)]
    fn init<T: RealElement>() -> T {
        T::INFINITY
    }

    fn empty<T: RealElement>() -> Option<T> {
        None
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.minimum()
    }
}

/// `Σ |x|`, the L1 norm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Asum;

impl Reductor for Asum {
    const NAME: &'static str = "asum";

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        x.abs()
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

/// `Σ x²`
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqsum;

impl Reductor for Sqsum {
    const NAME: &'static str = "sqsum";

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        x * x
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

/// `sqrt(Σ x²)`
#[derive(Debug, Clone, Copy, Default)]
pub struct NormL2;

impl Reductor for NormL2 {
    const NAME: &'static str = "norm_l2";

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        x * x
    }

    #[inline]
    fn post<T: RealElement>(acc: T, _count: usize) -> T {
        acc.sqrt()
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

/// `max |x|`, the infinity norm. Zero for an empty input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Amax;

impl Reductor for Amax {
    const NAME: &'static str = "amax";

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        x.abs()
    }

    #[inline(always)]
    fn combine<V: Real>(acc: V, x: V) -> V {
        acc.max(x)
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.maximum()
    }
}

/// `Σ ln x`
#[derive(Debug, Clone, Copy, Default)]
pub struct Logsum;

impl Reductor for Logsum {
    const NAME: &'static str = "logsum";
    const NATIVE_TERM: bool = false;

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        x.ln()
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

/// `-Σ x ln x`, with `0 ln 0 = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Entropy;

impl Reductor for Entropy {
    const NAME: &'static str = "entropy";
    const NATIVE_TERM: bool = false;

    #[inline(always)]
    fn term<V: Real>(x: V) -> V {
        let zero = V::from_f64(0.0);
        V::select(x.cmp_eq(zero), zero, x * x.ln())
    }

    #[inline]
    fn post<T: RealElement>(acc: T, _count: usize) -> T {
        -acc
    }

    fn empty<T: RealElement>() -> Option<T> {
        Some(T::ZERO)
    }

    #[inline]
    fn fold<T: RealElement>(pack: PackOf<T>) -> T {
        pack.sum()
    }
}

/// `out = combine(out, term(x))`, for scalars and packs alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceKernel<R> {
    _reductor: PhantomData<R>,
}

impl<R: Reductor, V: Real> Kernel<V, V> for ReduceKernel<R> {
    #[inline(always)]
    fn apply(&self, out: &mut V, x: V) {
        *out = R::combine(*out, R::term(x));
    }
}
