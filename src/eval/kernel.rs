//! Kernels applied by the drivers to every element or pack.
//!
//! A kernel writes into the slot an output accessor hands out. The same kernel value
//! serves the scalar tail and the packed majority, so each kernel implements
//! [`Kernel`] once for scalars and once for packs (usually through one generic impl).

use std::ops::Add;

/// Applies one input value to one output slot.
pub trait Kernel<In, Out> {
    fn apply(&self, out: &mut Out, x: In);
}

/// `out = x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyKernel;

impl<V> Kernel<V, V> for CopyKernel {
    #[inline(always)]
    fn apply(&self, out: &mut V, x: V) {
        *out = x;
    }
}

/// `out = out + x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumKernel;

impl<V: Copy + Add<Output = V>> Kernel<V, V> for AccumKernel {
    #[inline(always)]
    fn apply(&self, out: &mut V, x: V) {
        *out = *out + x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PackOf;
    use crate::simd::{Packed, WIDTH};

    #[test]
    fn test_kernels_on_scalars_and_packs() {
        let mut out = 1.0f32;
        AccumKernel.apply(&mut out, 2.0);
        assert_eq!(out, 3.0);
        CopyKernel.apply(&mut out, 5.0);
        assert_eq!(out, 5.0);

        let mut pack = <PackOf<f64>>::splat(1.0);
        AccumKernel.apply(&mut pack, <PackOf<f64>>::from_fn(|l| l as f64));
        for l in 0..WIDTH {
            assert_eq!(pack.extract(l), 1.0 + l as f64);
        }
    }
}
