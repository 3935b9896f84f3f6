//! Accessors: the uniform read/write contract the evaluation drivers work through.
//!
//! An accessor is bound to one operand for the duration of one evaluation call. It
//! owns no data and holds raw pointers into the operand, which is why reads and
//! writes are `unsafe`: the caller guarantees the operand outlives the accessor and
//! that every index is inside the evaluated shape.
//!
//! # Contract
//!
//! - [`VecReader`]: flat source, `scalar(i)` and `pack(i)` for `i` in `0..len`.
//! - [`MultiColReader`]: column-wise source, `col_state(j)` once per column and
//!   `get(i, state)` / `get_pack(i, state)` inside that column. [`ColReader`] turns a
//!   column into a [`VecReader`].
//! - [`VecWriter`] / [`MultiColWriter`]: the destination side. Writers hand out a
//!   mutable slot; buffered writers flush it in [`AccessorHooks::done_pack`].
//! - [`AccessorHooks`]: lifecycle events raised by the drivers. All default to no-ops.
//!
//! # Access tags
//!
//! How an operand degenerates when iterated is fixed at compile time by a zero-sized
//! [`Tag`] type. [`make_accessor`] picks the flat and column-wise reader from it.

mod input;
mod output;

use std::fmt;

pub use input::{
    ColsReader, ContReader, DivReader, SplatReader, StepReader, StridedColsReader, WrapReader,
};
pub use output::{Assign, ColsWriter, ContWriter, StepWriter, StridedColsWriter, Update, WriteMode};

use crate::element::{Element, PackOf};
use crate::shape::Shape;

/// How an operand's values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTag {
    /// Element `(i, j)` is read from `(i, j)`.
    Normal,
    /// Every element is the same scalar.
    Single,
    /// Element `(i, j)` is `row[j]`.
    BroadcastRow,
    /// Element `(i, j)` is `col[i]`.
    BroadcastCol,
}

impl fmt::Display for AccessTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessTag::Normal => "normal",
            AccessTag::Single => "single",
            AccessTag::BroadcastRow => "broadcast-row",
            AccessTag::BroadcastCol => "broadcast-col",
        };
        f.write_str(name)
    }
}

/// Lifecycle events raised by the drivers.
///
/// For a flat run of `len` elements the order is: `begin_packs`, then `done_pack(i)`
/// after every pack, `end_packs` (all three skipped when no full pack fits), then
/// `done_scalar(i)` after every tail element, and `finalize` exactly once.
pub trait AccessorHooks {
    #[inline(always)]
    fn begin_packs(&mut self) {}

    #[inline(always)]
    fn done_pack(&mut self, _i: usize) {}

    #[inline(always)]
    fn end_packs(&mut self) {}

    #[inline(always)]
    fn done_scalar(&mut self, _i: usize) {}

    #[inline(always)]
    fn finalize(&mut self) {}
}

/// Flat-index source.
pub trait VecReader: AccessorHooks {
    type Value: Element;

    /// # Safety
    ///
    /// `i` must be inside the run the reader was created for.
    unsafe fn scalar(&self, i: usize) -> Self::Value;

    /// Lanes `i..i + WIDTH`.
    ///
    /// # Safety
    ///
    /// `i + WIDTH` must not exceed the run the reader was created for.
    unsafe fn pack(&self, i: usize) -> PackOf<Self::Value>;
}

/// Column-wise source.
///
/// The per-column state is computed once per column (typically a pointer already
/// advanced to the column start) and threaded through every read in that column.
pub trait MultiColReader: Copy {
    type Value: Element;
    type State: Copy;

    fn col_state(&self, j: usize) -> Self::State;

    /// # Safety
    ///
    /// `state` must come from `col_state(j)` for a column inside the shape and `i`
    /// must be below the row count.
    unsafe fn get(&self, i: usize, state: Self::State) -> Self::Value;

    /// # Safety
    ///
    /// As [`get`](Self::get), with `i + WIDTH` not above the row count.
    unsafe fn get_pack(&self, i: usize, state: Self::State) -> PackOf<Self::Value>;

    #[inline(always)]
    fn col(&self, j: usize) -> ColReader<Self> {
        ColReader {
            source: *self,
            state: self.col_state(j),
        }
    }

    #[inline(always)]
    fn finalize(&mut self) {}
}

/// One column of a [`MultiColReader`], read as a flat run.
#[derive(Clone, Copy)]
pub struct ColReader<M: MultiColReader> {
    source: M,
    state: M::State,
}

impl<M: MultiColReader> AccessorHooks for ColReader<M> {}

impl<M: MultiColReader> VecReader for ColReader<M> {
    type Value = M::Value;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> M::Value {
        self.source.get(i, self.state)
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<M::Value> {
        self.source.get_pack(i, self.state)
    }
}

/// Flat destination.
///
/// `Slot` and `PackSlot` are what a kernel writes into. For plain destinations they
/// are the element and its pack; reductions use accumulators instead.
pub trait VecWriter: AccessorHooks {
    type Slot;
    type PackSlot;

    /// # Safety
    ///
    /// `i` must be inside the run the writer was created for.
    unsafe fn scalar(&mut self, i: usize) -> &mut Self::Slot;

    /// Slot for lanes `i..i + WIDTH`, flushed by `done_pack(i)`.
    ///
    /// # Safety
    ///
    /// `i + WIDTH` must not exceed the run the writer was created for.
    unsafe fn pack(&mut self, i: usize) -> &mut Self::PackSlot;
}

/// Column-wise destination.
pub trait MultiColWriter {
    type Slot;
    type PackSlot;
    type Col: VecWriter<Slot = Self::Slot, PackSlot = Self::PackSlot>;

    fn col(&mut self, j: usize) -> Self::Col;

    #[inline(always)]
    fn finalize(&mut self) {}
}

/// Compile-time access tag.
pub trait Tag: Copy + Default + fmt::Debug + 'static {
    const TAG: AccessTag;

    /// Flat reader for this tag.
    type Flat<T: Element>: VecReader<Value = T> + Copy;

    /// # Safety
    ///
    /// `ptr` must be valid for every read the tag implies over `shape`: the whole
    /// matrix for `Normal`, `shape.cols` elements for `BroadcastRow`, `shape.rows`
    /// for `BroadcastCol` and one for `Single`.
    unsafe fn flat<T: Element>(ptr: *const T, shape: Shape) -> Self::Flat<T>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normal;

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleTag;

#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastRow;

#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastCol;

impl Tag for Normal {
    const TAG: AccessTag = AccessTag::Normal;
    type Flat<T: Element> = ContReader<T>;

    #[inline(always)]
    unsafe fn flat<T: Element>(ptr: *const T, _shape: Shape) -> ContReader<T> {
        ContReader::new(ptr)
    }
}

impl Tag for SingleTag {
    const TAG: AccessTag = AccessTag::Single;
    type Flat<T: Element> = SplatReader<T>;

    #[inline(always)]
    unsafe fn flat<T: Element>(ptr: *const T, _shape: Shape) -> SplatReader<T> {
        SplatReader::new(*ptr)
    }
}

impl Tag for BroadcastRow {
    const TAG: AccessTag = AccessTag::BroadcastRow;
    type Flat<T: Element> = DivReader<T>;

    #[inline(always)]
    unsafe fn flat<T: Element>(ptr: *const T, shape: Shape) -> DivReader<T> {
        DivReader::new(ptr, shape.rows)
    }
}

impl Tag for BroadcastCol {
    const TAG: AccessTag = AccessTag::BroadcastCol;
    type Flat<T: Element> = WrapReader<T>;

    #[inline(always)]
    unsafe fn flat<T: Element>(ptr: *const T, shape: Shape) -> WrapReader<T> {
        WrapReader::new(ptr, shape.rows)
    }
}

/// Builds the flat and the column-wise reader of an operand under tag `G`.
///
/// `lead` is the distance between column starts and only matters for `Normal`.
///
/// # Safety
///
/// See [`Tag::flat`].
#[inline]
pub unsafe fn make_accessor<G: Tag, T: Element>(
    ptr: *const T,
    lead: usize,
    shape: Shape,
) -> (G::Flat<T>, ColsReader<T, G>) {
    (G::flat(ptr, shape), ColsReader::new(ptr, lead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{Packed, WIDTH};

    // every accessor of one operand agrees on what (i, j) means

    #[test]
    fn test_tags_degenerate_as_described() {
        let rows = WIDTH + 1;
        let data: Vec<f64> = (0..rows * 3).map(|v| v as f64).collect();
        let shape = Shape::new(rows, 3);
        unsafe {
            let (flat, cols) = make_accessor::<Normal, f64>(data.as_ptr(), rows, shape);
            assert_eq!(flat.scalar(rows + 1), (rows + 1) as f64);
            assert_eq!(cols.col(2).scalar(1), (2 * rows + 1) as f64);

            let (flat, cols) = make_accessor::<BroadcastCol, f64>(data.as_ptr(), 0, shape);
            assert_eq!(flat.scalar(rows + 1), 1.0);
            assert_eq!(cols.col(2).scalar(1), 1.0);
            assert_eq!(
                cols.col(1).pack(0).to_array().as_ref(),
                cols.col(0).pack(0).to_array().as_ref()
            );

            let row = [7.0f64, 8.0, 9.0];
            let (flat, cols) = make_accessor::<BroadcastRow, f64>(row.as_ptr(), 0, shape);
            assert_eq!(flat.scalar(rows + 1), 8.0);
            assert_eq!(cols.col(2).pack(0).to_array().as_ref(), &[9.0; WIDTH][..]);

            let one = [4.0f64];
            let (flat, cols) = make_accessor::<SingleTag, f64>(one.as_ptr(), 0, shape);
            assert_eq!(flat.scalar(5), 4.0);
            assert_eq!(cols.col(2).scalar(3), 4.0);
        }
        assert_eq!(AccessTag::BroadcastRow.to_string(), "broadcast-row");
    }
}
