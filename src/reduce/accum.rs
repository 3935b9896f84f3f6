//! Accumulating writers and the real-valued reduction engine.

use std::marker::PhantomData;

use crate::accessor::{AccessorHooks, ColsWriter, MultiColWriter, Update, VecWriter};
use crate::config::EvalConfig;
use crate::element::{PackOf, RealElement};
use crate::error::{dimension_mismatch, empty_input, invalid_argument, Result};
use crate::eval::{linear_eval, linear_eval_simd, percol_eval, percol_eval_simd};
use crate::expr::MatExpr;
use crate::reduce::reductor::{ReduceKernel, Reductor};
use crate::shape::Shape;
use crate::simd::Packed;

/// Writer that folds everything written to it into one cell.
///
/// Packs accumulate lane-wise between `begin_packs` and `end_packs`, then the pack
/// is folded into the scalar accumulator; the scalar tail follows. `finalize`
/// combines the result into the cell, so several runs may share one cell.
pub struct Accumulator<T: RealElement, R> {
    pack: PackOf<T>,
    scalar: T,
    cell: *mut T,
    _reductor: PhantomData<R>,
}

impl<T: RealElement, R: Reductor> Accumulator<T, R> {
    /// # Safety
    ///
    /// `cell` must be valid for reads and writes until `finalize`.
    #[inline(always)]
    pub unsafe fn new(cell: *mut T) -> Self {
        debug_assert!(!cell.is_null(), "Pointer must not be null");
        Self {
            pack: <PackOf<T>>::splat(R::init()),
            scalar: R::init(),
            cell,
            _reductor: PhantomData,
        }
    }
}

impl<T: RealElement, R: Reductor> AccessorHooks for Accumulator<T, R> {
    #[inline(always)]
    fn begin_packs(&mut self) {
        self.pack = <PackOf<T>>::splat(R::init());
    }

    #[inline(always)]
    fn end_packs(&mut self) {
        self.scalar = R::combine(self.scalar, R::fold::<T>(self.pack));
    }

    #[inline(always)]
    fn finalize(&mut self) {
        unsafe { *self.cell = R::combine(*self.cell, self.scalar) };
        self.scalar = R::init();
    }
}

impl<T: RealElement, R: Reductor> VecWriter for Accumulator<T, R> {
    type Slot = T;
    type PackSlot = PackOf<T>;

    #[inline(always)]
    unsafe fn scalar(&mut self, _i: usize) -> &mut T {
        &mut self.scalar
    }

    #[inline(always)]
    unsafe fn pack(&mut self, _i: usize) -> &mut PackOf<T> {
        &mut self.pack
    }
}

/// Column-wise accumulators: column `j` folds into `cells + j * step`.
///
/// A step of zero folds every column into the same cell.
pub struct AccumulatorCols<T, R> {
    cells: *mut T,
    step: usize,
    _reductor: PhantomData<R>,
}

impl<T: RealElement, R: Reductor> AccumulatorCols<T, R> {
    /// # Safety
    ///
    /// `cells + j * step` must be valid for every column later requested.
    pub unsafe fn new(cells: *mut T, step: usize) -> Self {
        Self {
            cells,
            step,
            _reductor: PhantomData,
        }
    }
}

impl<T: RealElement, R: Reductor> MultiColWriter for AccumulatorCols<T, R> {
    type Slot = T;
    type PackSlot = PackOf<T>;
    type Col = Accumulator<T, R>;

    #[inline(always)]
    fn col(&mut self, j: usize) -> Accumulator<T, R> {
        unsafe { Accumulator::new(self.cells.wrapping_add(j * self.step)) }
    }
}

pub(crate) fn concrete_shape<E: MatExpr>(expr: &E, operation: &'static str) -> Result<Shape> {
    let shape = expr.extent()?.shape().ok_or_else(|| {
        invalid_argument(format!(
            "{operation}: the expression has no shape of its own"
        ))
    })?;
    shape.checked_nelems(operation)?;
    Ok(shape)
}

fn packed<R: Reductor, E: MatExpr>(config: &EvalConfig) -> bool {
    config.allow_simd && E::SIMD && R::NATIVE_TERM
}

/// Reduces every element of `expr` to one value.
pub fn reduce_with<R, E>(config: &EvalConfig, expr: E) -> Result<E::Elem>
where
    R: Reductor,
    E: MatExpr,
    E::Elem: RealElement,
{
    let shape = concrete_shape(&expr, R::NAME)?;
    let count = shape.nelems();
    if count == 0 {
        return R::empty().ok_or_else(|| empty_input(R::NAME));
    }

    let simd = packed::<R, E>(config);
    let kernel = ReduceKernel::<R>::default();
    let mut total = R::init::<E::Elem>();
    log::debug!(
        "{} over {shape}: {}, {}",
        R::NAME,
        if expr.continuity().is_continuous() { "linear" } else { "per-column" },
        if simd { "simd" } else { "scalar" }
    );

    // SAFETY: the readers cover `shape` and `total` outlives the accumulators
    unsafe {
        if expr.continuity().is_continuous() {
            let mut input = expr.reader(shape);
            let mut output = Accumulator::<E::Elem, R>::new(&mut total);
            if simd {
                linear_eval_simd(count, &kernel, &mut input, &mut output);
            } else {
                linear_eval(count, &kernel, &mut input, &mut output);
            }
        } else {
            let mut input = expr.cols(shape);
            let mut output = AccumulatorCols::<E::Elem, R>::new(&mut total, 0);
            if simd {
                percol_eval_simd(shape, &kernel, &mut input, &mut output);
            } else {
                percol_eval(shape, &kernel, &mut input, &mut output);
            }
        }
    }
    Ok(R::post(total, count))
}

/// Reduces each column of `expr` into `out[j]`.
pub fn colwise_with<R, E>(config: &EvalConfig, expr: E, out: &mut [E::Elem]) -> Result<()>
where
    R: Reductor,
    E: MatExpr,
    E::Elem: RealElement,
{
    let shape = concrete_shape(&expr, R::NAME)?;
    if out.len() != shape.cols {
        return Err(dimension_mismatch(R::NAME, shape.cols, out.len()));
    }
    if shape.cols == 0 {
        return Ok(());
    }
    if shape.rows == 0 {
        let empty = R::empty().ok_or_else(|| empty_input(R::NAME))?;
        out.fill(empty);
        return Ok(());
    }

    out.fill(R::init());
    let kernel = ReduceKernel::<R>::default();
    // SAFETY: `out` has one cell per column
    unsafe {
        let mut input = expr.cols(shape);
        let mut output = AccumulatorCols::<E::Elem, R>::new(out.as_mut_ptr(), 1);
        if packed::<R, E>(config) {
            percol_eval_simd(shape, &kernel, &mut input, &mut output);
        } else {
            percol_eval(shape, &kernel, &mut input, &mut output);
        }
    }
    for value in out.iter_mut() {
        *value = R::post(*value, shape.rows);
    }
    Ok(())
}

/// Reduces each row of `expr` into `out[i]`.
///
/// The columns are walked in order with `out` as an in-out destination seen under
/// the broadcast-column tag, so every column updates the same vector.
pub fn rowwise_with<R, E>(config: &EvalConfig, expr: E, out: &mut [E::Elem]) -> Result<()>
where
    R: Reductor,
    E: MatExpr,
    E::Elem: RealElement,
{
    let shape = concrete_shape(&expr, R::NAME)?;
    if out.len() != shape.rows {
        return Err(dimension_mismatch(R::NAME, shape.rows, out.len()));
    }
    if shape.rows == 0 {
        return Ok(());
    }
    if shape.cols == 0 {
        let empty = R::empty().ok_or_else(|| empty_input(R::NAME))?;
        out.fill(empty);
        return Ok(());
    }

    out.fill(R::init());
    let kernel = ReduceKernel::<R>::default();
    // SAFETY: `out` holds one column of the shape
    unsafe {
        let mut input = expr.cols(shape);
        let mut output = ColsWriter::<E::Elem, Update>::broadcast_col(out.as_mut_ptr());
        if packed::<R, E>(config) {
            percol_eval_simd(shape, &kernel, &mut input, &mut output);
        } else {
            percol_eval(shape, &kernel, &mut input, &mut output);
        }
    }
    for value in out.iter_mut() {
        *value = R::post(*value, shape.cols);
    }
    Ok(())
}
