//! Element types and their packs.
//!
//! The set of element types is closed: `f32`, `f64` and `bool`. Each one names its
//! pack type for the active [`DefaultKind`], so asking for a pack of an unsupported
//! type is a missing trait implementation, caught at compile time.

use std::fmt::Debug;

use crate::simd::{DefaultKind, Packed, Real, RealPack, SimdKind};

/// A scalar type that can be stored in a matrix and processed in packs.
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const NAME: &'static str;

    /// Pack of [`WIDTH`](crate::simd::WIDTH) lanes of this type.
    type Pack: Packed<Scalar = Self>;
}

/// Pack type of `T` for the active kind.
pub type PackOf<T> = <T as Element>::Pack;

/// Canonical boolean pack, the result type of packed comparisons.
pub type MaskPack = <DefaultKind as SimdKind>::Mask;

impl Element for f32 {
    const NAME: &'static str = "f32";
    type Pack = <DefaultKind as SimdKind>::F32;
}

impl Element for f64 {
    const NAME: &'static str = "f64";
    type Pack = <DefaultKind as SimdKind>::F64;
}

impl Element for bool {
    const NAME: &'static str = "bool";
    type Pack = MaskPack;
}

/// Floating-point element types.
pub trait RealElement: Element<Pack: RealPack<Scalar = Self>> + Real<Mask = bool> + PartialOrd {
    const ZERO: Self;
    const ONE: Self;
    const INFINITY: Self;
    const NEG_INFINITY: Self;

    fn from_usize(n: usize) -> Self;
}

impl RealElement for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const INFINITY: Self = f32::INFINITY;
    const NEG_INFINITY: Self = f32::NEG_INFINITY;

    #[inline]
    fn from_usize(n: usize) -> Self {
        n as f32
    }
}

impl RealElement for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const INFINITY: Self = f64::INFINITY;
    const NEG_INFINITY: Self = f64::NEG_INFINITY;

    #[inline]
    fn from_usize(n: usize) -> Self {
        n as f64
    }
}

/// Value conversion between element types, lane by lane for packs.
///
/// `bool` converts to `1`/`0`, and a real converts to `bool` as `x != 0`.
pub trait CastFrom<U: Element>: Element {
    fn cast_scalar(value: U) -> Self;

    #[inline]
    fn cast_pack(pack: PackOf<U>) -> PackOf<Self> {
        let lanes = pack.to_array();
        <PackOf<Self>>::from_fn(|l| Self::cast_scalar(lanes.as_ref()[l]))
    }
}

macro_rules! identity_cast {
    ($($type:ty),*) => {
        $(
            impl CastFrom<$type> for $type {
                #[inline(always)]
                fn cast_scalar(value: $type) -> $type {
                    value
                }

                #[inline(always)]
                fn cast_pack(pack: PackOf<$type>) -> PackOf<$type> {
                    pack
                }
            }
        )*
    };
}

identity_cast!(f32, f64, bool);

impl CastFrom<f64> for f32 {
    #[inline(always)]
    fn cast_scalar(value: f64) -> f32 {
        value as f32
    }
}

impl CastFrom<f32> for f64 {
    #[inline(always)]
    fn cast_scalar(value: f32) -> f64 {
        value as f64
    }
}

impl CastFrom<bool> for f32 {
    #[inline(always)]
    fn cast_scalar(value: bool) -> f32 {
        if value {
            1.0
        } else {
            0.0
        }
    }
}

impl CastFrom<bool> for f64 {
    #[inline(always)]
    fn cast_scalar(value: bool) -> f64 {
        if value {
            1.0
        } else {
            0.0
        }
    }
}

impl CastFrom<f32> for bool {
    #[inline(always)]
    fn cast_scalar(value: f32) -> bool {
        value != 0.0
    }
}

impl CastFrom<f64> for bool {
    #[inline(always)]
    fn cast_scalar(value: f64) -> bool {
        value != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{BoolLanes, WIDTH};

    #[test]
    fn test_uniform_pack_width() {
        assert_eq!(<PackOf<f32>>::WIDTH, WIDTH);
        assert_eq!(<PackOf<f64>>::WIDTH, WIDTH);
        assert_eq!(<PackOf<bool>>::WIDTH, WIDTH);
    }

    #[test]
    fn test_scalar_casts() {
        assert_eq!(<f64 as CastFrom<f32>>::cast_scalar(1.5f32), 1.5f64);
        assert_eq!(<f32 as CastFrom<bool>>::cast_scalar(true), 1.0f32);
        assert!(!<bool as CastFrom<f64>>::cast_scalar(0.0));
        assert!(<bool as CastFrom<f64>>::cast_scalar(f64::NAN));
    }

    #[test]
    fn test_pack_casts_are_lanewise() {
        let pack = <PackOf<f32>>::from_fn(|l| l as f32 - 1.0);
        let wide = <f64 as CastFrom<f32>>::cast_pack(pack);
        let mask = <bool as CastFrom<f64>>::cast_pack(wide);
        for l in 0..WIDTH {
            assert_eq!(wide.extract(l), l as f64 - 1.0);
            assert_eq!(mask.extract(l), l != 1);
        }
        assert_eq!(mask.count_true(), WIDTH - 1);
    }
}
