//! Boolean reductions: `all`, `any` and `count`.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::accessor::{AccessorHooks, MultiColWriter, VecWriter};
use crate::config::EvalConfig;
use crate::element::MaskPack;
use crate::error::{dimension_mismatch, Result};
use crate::eval::{linear_eval, linear_eval_simd, percol_eval, percol_eval_simd, Kernel};
use crate::expr::MatExpr;
use crate::reduce::accum::concrete_shape;
use crate::simd::{BoolLanes, Packed, WIDTH};

/// Definition of a reduction over boolean elements.
pub trait Tally: Copy + Default + Debug + 'static {
    type Out: Copy + Debug + PartialEq;

    const NAME: &'static str;

    /// Starting value, also the result for zero elements.
    const INIT: Self::Out;

    fn scalar(acc: Self::Out, x: bool) -> Self::Out;

    fn pack(acc: Self::Out, x: MaskPack) -> Self::Out;

    fn combine(a: Self::Out, b: Self::Out) -> Self::Out;
}

/// Every element is true. Vacuously true for zero elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

/// Some element is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct Any;

/// Number of true elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Tally for All {
    type Out = bool;

    const NAME: &'static str = "all";
    const INIT: bool = true;

    #[inline(always)]
    fn scalar(acc: bool, x: bool) -> bool {
        acc && x
    }

    #[inline(always)]
    fn pack(acc: bool, x: MaskPack) -> bool {
        acc && x.all_true()
    }

    #[inline(always)]
    fn combine(a: bool, b: bool) -> bool {
        a && b
    }
}

impl Tally for Any {
    type Out = bool;

    const NAME: &'static str = "any";
    const INIT: bool = false;

    #[inline(always)]
    fn scalar(acc: bool, x: bool) -> bool {
        acc || x
    }

    #[inline(always)]
    fn pack(acc: bool, x: MaskPack) -> bool {
        acc || x.any_true()
    }

    #[inline(always)]
    fn combine(a: bool, b: bool) -> bool {
        a || b
    }
}

impl Tally for Count {
    type Out = usize;

    const NAME: &'static str = "count";
    const INIT: usize = 0;

    #[inline(always)]
    fn scalar(acc: usize, x: bool) -> usize {
        acc + x as usize
    }

    #[inline(always)]
    fn pack(acc: usize, x: MaskPack) -> usize {
        acc + x.count_true()
    }

    #[inline(always)]
    fn combine(a: usize, b: usize) -> usize {
        a + b
    }
}

/// Folds booleans and masks into one tally.
#[derive(Debug, Clone, Copy, Default)]
pub struct TallyKernel<G> {
    _tally: PhantomData<G>,
}

impl<G: Tally> Kernel<bool, G::Out> for TallyKernel<G> {
    #[inline(always)]
    fn apply(&self, out: &mut G::Out, x: bool) {
        *out = G::scalar(*out, x);
    }
}

impl<G: Tally> Kernel<MaskPack, G::Out> for TallyKernel<G> {
    #[inline(always)]
    fn apply(&self, out: &mut G::Out, x: MaskPack) {
        *out = G::pack(*out, x);
    }
}

/// Updates one tally per lane; the row-wise counterpart of [`TallyKernel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneTallyKernel<G> {
    _tally: PhantomData<G>,
}

impl<G: Tally> Kernel<bool, G::Out> for LaneTallyKernel<G> {
    #[inline(always)]
    fn apply(&self, out: &mut G::Out, x: bool) {
        *out = G::scalar(*out, x);
    }
}

impl<G: Tally> Kernel<MaskPack, [G::Out; WIDTH]> for LaneTallyKernel<G> {
    #[inline(always)]
    fn apply(&self, out: &mut [G::Out; WIDTH], x: MaskPack) {
        for (l, slot) in out.iter_mut().enumerate() {
            *slot = G::scalar(*slot, x.extract(l));
        }
    }
}

/// Writer folding every slot into one tally cell on `finalize`.
pub struct TallyAccumulator<G: Tally> {
    acc: G::Out,
    cell: *mut G::Out,
}

impl<G: Tally> TallyAccumulator<G> {
    /// # Safety
    ///
    /// `cell` must be valid for reads and writes until `finalize`.
    #[inline(always)]
    pub unsafe fn new(cell: *mut G::Out) -> Self {
        debug_assert!(!cell.is_null(), "Pointer must not be null");
        Self { acc: G::INIT, cell }
    }
}

impl<G: Tally> AccessorHooks for TallyAccumulator<G> {
    #[inline(always)]
    fn finalize(&mut self) {
        unsafe { *self.cell = G::combine(*self.cell, self.acc) };
        self.acc = G::INIT;
    }
}

impl<G: Tally> VecWriter for TallyAccumulator<G> {
    type Slot = G::Out;
    type PackSlot = G::Out;

    #[inline(always)]
    unsafe fn scalar(&mut self, _i: usize) -> &mut G::Out {
        &mut self.acc
    }

    #[inline(always)]
    unsafe fn pack(&mut self, _i: usize) -> &mut G::Out {
        &mut self.acc
    }
}

/// Column-wise tallies: column `j` folds into `cells + j * step`.
pub struct TallyCols<G: Tally> {
    cells: *mut G::Out,
    step: usize,
}

impl<G: Tally> MultiColWriter for TallyCols<G> {
    type Slot = G::Out;
    type PackSlot = G::Out;
    type Col = TallyAccumulator<G>;

    #[inline(always)]
    fn col(&mut self, j: usize) -> TallyAccumulator<G> {
        unsafe { TallyAccumulator::new(self.cells.wrapping_add(j * self.step)) }
    }
}

/// One tally per row, updated lane by lane.
///
/// Packs are staged in `temp` between `pack(i)` and `done_pack(i)`.
pub struct LaneCells<G: Tally> {
    cells: *mut G::Out,
    temp: [G::Out; WIDTH],
}

impl<G: Tally> AccessorHooks for LaneCells<G> {
    #[inline(always)]
    fn done_pack(&mut self, i: usize) {
        for (l, value) in self.temp.iter().enumerate() {
            unsafe { *self.cells.add(i + l) = *value };
        }
    }
}

impl<G: Tally> VecWriter for LaneCells<G> {
    type Slot = G::Out;
    type PackSlot = [G::Out; WIDTH];

    #[inline(always)]
    unsafe fn scalar(&mut self, i: usize) -> &mut G::Out {
        &mut *self.cells.add(i)
    }

    #[inline(always)]
    unsafe fn pack(&mut self, i: usize) -> &mut [G::Out; WIDTH] {
        for (l, slot) in self.temp.iter_mut().enumerate() {
            *slot = *self.cells.add(i + l);
        }
        &mut self.temp
    }
}

/// Row tallies under the broadcast-column tag: every column updates the same cells.
pub struct LaneCellCols<G: Tally> {
    cells: *mut G::Out,
}

impl<G: Tally> MultiColWriter for LaneCellCols<G> {
    type Slot = G::Out;
    type PackSlot = [G::Out; WIDTH];
    type Col = LaneCells<G>;

    #[inline(always)]
    fn col(&mut self, _j: usize) -> LaneCells<G> {
        LaneCells {
            cells: self.cells,
            temp: [G::INIT; WIDTH],
        }
    }
}

/// Tallies every element of a boolean expression.
pub fn tally_with<G, E>(config: &EvalConfig, expr: E) -> Result<G::Out>
where
    G: Tally,
    E: MatExpr<Elem = bool>,
{
    let shape = concrete_shape(&expr, G::NAME)?;
    let mut total = G::INIT;
    if shape.is_empty() {
        return Ok(total);
    }

    let simd = config.allow_simd && E::SIMD;
    let kernel = TallyKernel::<G>::default();
    log::debug!("{} over {shape}", G::NAME);

    // SAFETY: the readers cover `shape` and `total` outlives the accumulators
    unsafe {
        if expr.continuity().is_continuous() {
            let mut input = expr.reader(shape);
            let mut output = TallyAccumulator::<G>::new(&mut total);
            if simd {
                linear_eval_simd(shape.nelems(), &kernel, &mut input, &mut output);
            } else {
                linear_eval(shape.nelems(), &kernel, &mut input, &mut output);
            }
        } else {
            let mut input = expr.cols(shape);
            let mut output = TallyCols::<G> {
                cells: &mut total,
                step: 0,
            };
            if simd {
                percol_eval_simd(shape, &kernel, &mut input, &mut output);
            } else {
                percol_eval(shape, &kernel, &mut input, &mut output);
            }
        }
    }
    Ok(total)
}

/// Tallies each column into `out[j]`.
pub fn colwise_tally_with<G, E>(config: &EvalConfig, expr: E, out: &mut [G::Out]) -> Result<()>
where
    G: Tally,
    E: MatExpr<Elem = bool>,
{
    let shape = concrete_shape(&expr, G::NAME)?;
    if out.len() != shape.cols {
        return Err(dimension_mismatch(G::NAME, shape.cols, out.len()));
    }
    out.fill(G::INIT);
    if shape.is_empty() {
        return Ok(());
    }

    let kernel = TallyKernel::<G>::default();
    // SAFETY: `out` has one cell per column
    unsafe {
        let mut input = expr.cols(shape);
        let mut output = TallyCols::<G> {
            cells: out.as_mut_ptr(),
            step: 1,
        };
        if config.allow_simd && E::SIMD {
            percol_eval_simd(shape, &kernel, &mut input, &mut output);
        } else {
            percol_eval(shape, &kernel, &mut input, &mut output);
        }
    }
    Ok(())
}

/// Tallies each row into `out[i]`.
pub fn rowwise_tally_with<G, E>(config: &EvalConfig, expr: E, out: &mut [G::Out]) -> Result<()>
where
    G: Tally,
    E: MatExpr<Elem = bool>,
{
    let shape = concrete_shape(&expr, G::NAME)?;
    if out.len() != shape.rows {
        return Err(dimension_mismatch(G::NAME, shape.rows, out.len()));
    }
    out.fill(G::INIT);
    if shape.is_empty() {
        return Ok(());
    }

    let kernel = LaneTallyKernel::<G>::default();
    // SAFETY: `out` holds one column of the shape
    unsafe {
        let mut input = expr.cols(shape);
        let mut output = LaneCellCols::<G> {
            cells: out.as_mut_ptr(),
        };
        if config.allow_simd && E::SIMD {
            percol_eval_simd(shape, &kernel, &mut input, &mut output);
        } else {
            percol_eval(shape, &kernel, &mut input, &mut output);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PackOf;

    #[test]
    fn test_pack_tallies_agree_with_lanes() {
        let mask = <PackOf<bool>>::from_fn(|l| l % 2 == 0);
        assert_eq!(Count::pack(1, mask), 1 + WIDTH.div_ceil(2));
        assert!(Any::pack(false, mask));
        assert!(!All::pack(true, mask));
        assert!(All::pack(true, <PackOf<bool>>::splat(true)));
    }

    #[test]
    fn test_lane_kernel_updates_each_lane() {
        let mut cells = [0usize; WIDTH];
        let kernel = LaneTallyKernel::<Count>::default();
        let mask = <PackOf<bool>>::from_fn(|l| l == 0);
        kernel.apply(&mut cells, mask);
        kernel.apply(&mut cells, mask);
        assert_eq!(cells[0], 2);
        assert!(cells[1..].iter().all(|&c| c == 0));
    }
}
