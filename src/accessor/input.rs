//! Readers over memory.

use std::marker::PhantomData;

use super::{AccessTag, AccessorHooks, MultiColReader, Tag, VecReader};
use crate::element::{Element, PackOf};
use crate::simd::{Packed, WIDTH};

/// Flat reader over consecutive elements.
#[derive(Debug, Clone, Copy)]
pub struct ContReader<T> {
    ptr: *const T,
}

impl<T> ContReader<T> {
    /// # Safety
    ///
    /// `ptr` must stay valid for every index later read.
    #[inline(always)]
    pub unsafe fn new(ptr: *const T) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self { ptr }
    }
}

impl<T> AccessorHooks for ContReader<T> {}

impl<T: Element> VecReader for ContReader<T> {
    type Value = T;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> T {
        *self.ptr.add(i)
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<T> {
        <PackOf<T>>::load(self.ptr.add(i))
    }
}

/// Flat reader over elements `step` apart.
#[derive(Debug, Clone, Copy)]
pub struct StepReader<T> {
    ptr: *const T,
    step: isize,
}

impl<T> StepReader<T> {
    /// # Safety
    ///
    /// `ptr.offset(i * step)` must stay valid for every index later read.
    #[inline(always)]
    pub unsafe fn new(ptr: *const T, step: isize) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self { ptr, step }
    }
}

impl<T> AccessorHooks for StepReader<T> {}

impl<T: Element> VecReader for StepReader<T> {
    type Value = T;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> T {
        *self.ptr.offset(i as isize * self.step)
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<T> {
        let start = self.ptr.offset(i as isize * self.step);
        if self.step == 1 {
            <PackOf<T>>::load(start)
        } else {
            <PackOf<T>>::gather(start, self.step)
        }
    }
}

/// The same value at every index, in every column.
#[derive(Debug, Clone, Copy)]
pub struct SplatReader<T: Element> {
    value: T,
    pack: PackOf<T>,
}

impl<T: Element> SplatReader<T> {
    #[inline(always)]
    pub fn new(value: T) -> Self {
        Self {
            value,
            pack: <PackOf<T>>::splat(value),
        }
    }
}

impl<T: Element> AccessorHooks for SplatReader<T> {}

impl<T: Element> VecReader for SplatReader<T> {
    type Value = T;

    #[inline(always)]
    unsafe fn scalar(&self, _i: usize) -> T {
        self.value
    }

    #[inline(always)]
    unsafe fn pack(&self, _i: usize) -> PackOf<T> {
        self.pack
    }
}

impl<T: Element> MultiColReader for SplatReader<T> {
    type Value = T;
    type State = ();

    #[inline(always)]
    fn col_state(&self, _j: usize) {}

    #[inline(always)]
    unsafe fn get(&self, _i: usize, _state: ()) -> T {
        self.value
    }

    #[inline(always)]
    unsafe fn get_pack(&self, _i: usize, _state: ()) -> PackOf<T> {
        self.pack
    }
}

/// Flat reader of a repeated row: flat index `i` reads `row[i / rows]`.
#[derive(Debug, Clone, Copy)]
pub struct DivReader<T> {
    ptr: *const T,
    rows: usize,
}

impl<T> DivReader<T> {
    /// # Safety
    ///
    /// `ptr` must be valid for `len / rows` reads, rounded up.
    #[inline(always)]
    pub unsafe fn new(ptr: *const T, rows: usize) -> Self {
        Self {
            ptr,
            rows: rows.max(1),
        }
    }
}

impl<T> AccessorHooks for DivReader<T> {}

impl<T: Element> VecReader for DivReader<T> {
    type Value = T;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> T {
        *self.ptr.add(i / self.rows)
    }

    #[inline]
    unsafe fn pack(&self, i: usize) -> PackOf<T> {
        <PackOf<T>>::from_fn(|l| *self.ptr.add((i + l) / self.rows))
    }
}

/// Flat reader of a repeated column: flat index `i` reads `col[i % rows]`.
#[derive(Debug, Clone, Copy)]
pub struct WrapReader<T> {
    ptr: *const T,
    rows: usize,
}

impl<T> WrapReader<T> {
    /// # Safety
    ///
    /// `ptr` must be valid for `rows` reads.
    #[inline(always)]
    pub unsafe fn new(ptr: *const T, rows: usize) -> Self {
        Self {
            ptr,
            rows: rows.max(1),
        }
    }
}

impl<T> AccessorHooks for WrapReader<T> {}

impl<T: Element> VecReader for WrapReader<T> {
    type Value = T;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> T {
        *self.ptr.add(i % self.rows)
    }

    #[inline]
    unsafe fn pack(&self, i: usize) -> PackOf<T> {
        let start = i % self.rows;
        if start + WIDTH <= self.rows {
            <PackOf<T>>::load(self.ptr.add(start))
        } else {
            <PackOf<T>>::from_fn(|l| *self.ptr.add((i + l) % self.rows))
        }
    }
}

/// Column-wise reader of row-contiguous storage under access tag `G`.
///
/// | tag | column `j` starts at | reads inside a column |
/// |---|---|---|
/// | `Normal` | `ptr + j * lead` | consecutive |
/// | `BroadcastCol` | `ptr` | consecutive |
/// | `BroadcastRow` | `ptr + j` | the start, splatted |
/// | `Single` | `ptr` | the start, splatted |
#[derive(Debug)]
pub struct ColsReader<T, G> {
    ptr: *const T,
    lead: usize,
    _tag: PhantomData<G>,
}

impl<T, G> Clone for ColsReader<T, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, G> Copy for ColsReader<T, G> {}

impl<T, G: Tag> ColsReader<T, G> {
    /// # Safety
    ///
    /// `ptr` must be valid for every read the tag implies, see [`Tag::flat`].
    #[inline(always)]
    pub unsafe fn new(ptr: *const T, lead: usize) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            ptr,
            lead,
            _tag: PhantomData,
        }
    }
}

impl<T: Element, G: Tag> MultiColReader for ColsReader<T, G> {
    type Value = T;
    type State = *const T;

    #[inline(always)]
    fn col_state(&self, j: usize) -> *const T {
        match G::TAG {
            AccessTag::Normal => self.ptr.wrapping_add(j * self.lead),
            AccessTag::BroadcastRow => self.ptr.wrapping_add(j),
            AccessTag::BroadcastCol | AccessTag::Single => self.ptr,
        }
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, state: *const T) -> T {
        match G::TAG {
            AccessTag::Normal | AccessTag::BroadcastCol => *state.add(i),
            AccessTag::BroadcastRow | AccessTag::Single => *state,
        }
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, state: *const T) -> PackOf<T> {
        match G::TAG {
            AccessTag::Normal | AccessTag::BroadcastCol => <PackOf<T>>::load(state.add(i)),
            AccessTag::BroadcastRow | AccessTag::Single => <PackOf<T>>::splat(*state),
        }
    }
}

/// Column-wise reader over arbitrary signed strides.
#[derive(Debug, Clone, Copy)]
pub struct StridedColsReader<T> {
    ptr: *const T,
    row_stride: isize,
    col_stride: isize,
}

impl<T> StridedColsReader<T> {
    /// # Safety
    ///
    /// `ptr.offset(i * row_stride + j * col_stride)` must be valid for every
    /// `(i, j)` later read.
    #[inline(always)]
    pub unsafe fn new(ptr: *const T, row_stride: isize, col_stride: isize) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            ptr,
            row_stride,
            col_stride,
        }
    }
}

impl<T: Element> MultiColReader for StridedColsReader<T> {
    type Value = T;
    type State = *const T;

    #[inline(always)]
    fn col_state(&self, j: usize) -> *const T {
        self.ptr.wrapping_offset(j as isize * self.col_stride)
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, state: *const T) -> T {
        *state.offset(i as isize * self.row_stride)
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, state: *const T) -> PackOf<T> {
        let start = state.offset(i as isize * self.row_stride);
        if self.row_stride == 1 {
            <PackOf<T>>::load(start)
        } else {
            <PackOf<T>>::gather(start, self.row_stride)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_reader_gathers() {
        let data: Vec<f32> = (0..4 * WIDTH).map(|v| v as f32).collect();
        let reader = unsafe { StepReader::new(data.as_ptr(), 3) };
        let pack = unsafe { reader.pack(1) };
        for l in 0..WIDTH {
            assert_eq!(pack.extract(l), (3 * (1 + l)) as f32);
        }
    }

    #[test]
    fn test_wrap_reader_crosses_column_boundary() {
        let col = [1.0f64, 2.0, 3.0];
        let reader = unsafe { WrapReader::new(col.as_ptr(), 3) };
        let pack = unsafe { reader.pack(2) };
        for l in 0..WIDTH {
            assert_eq!(pack.extract(l), col[(2 + l) % 3]);
        }
    }

    #[test]
    fn test_strided_cols_negative_strides() {
        // 2 x 2 matrix stored row-major and walked backwards along columns
        let data = [1.0f32, 2.0, 3.0, 4.0];
        let reader = unsafe { StridedColsReader::new(data.as_ptr().add(1), 2, -1) };
        unsafe {
            assert_eq!(reader.get(1, reader.col_state(0)), 4.0);
            assert_eq!(reader.get(0, reader.col_state(1)), 1.0);
        }
    }
}
