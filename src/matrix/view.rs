//! Borrowed views with explicit layouts.
//!
//! | view | row stride | column stride | continuity |
//! |---|---|---|---|
//! | [`MatRef`] / [`MatMut`] | 1 | rows | continuous |
//! | [`ColsRef`] / [`ColsMut`] | 1 | lead | per-column (continuous when `lead == rows`) |
//! | [`StridedRef`] / [`StridedMut`] | any | any | from the strides |
//!
//! Views from `ndarray` convert with `From` (strided, always possible) or `TryFrom`
//! (dense and per-column views, [`MatError::InvalidArgument`] when the strides do
//! not permit it).
//!
//! [`MatError::InvalidArgument`]: crate::MatError::InvalidArgument

use std::marker::PhantomData;

use ndarray::{ArrayView2, ArrayViewMut2};

use crate::error::{dimension_mismatch, invalid_argument, MatError, Result};
use crate::shape::{Continuity, Shape};

/// Continuous read-only view.
#[derive(Debug, Clone, Copy)]
pub struct MatRef<'a, T> {
    data: &'a [T],
    shape: Shape,
}

impl<'a, T> MatRef<'a, T> {
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        let len = shape.checked_nelems("MatRef::new")?;
        if data.len() != len {
            return Err(dimension_mismatch("MatRef::new", len, data.len()));
        }
        Ok(Self { data, shape })
    }

    pub(crate) fn from_parts(data: &'a [T], shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.nelems());
        Self { data, shape }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Transposed view; rows become columns.
    pub fn t(&self) -> StridedRef<'a, T> {
        StridedRef {
            ptr: self.data.as_ptr(),
            shape: Shape::new(self.shape.cols, self.shape.rows),
            row_stride: self.shape.rows as isize,
            col_stride: 1,
            _marker: PhantomData,
        }
    }
}

/// Continuous mutable view.
#[derive(Debug)]
pub struct MatMut<'a, T> {
    data: &'a mut [T],
    shape: Shape,
}

impl<'a, T> MatMut<'a, T> {
    pub fn new(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        let len = shape.checked_nelems("MatMut::new")?;
        if data.len() != len {
            return Err(dimension_mismatch("MatMut::new", len, data.len()));
        }
        Ok(Self { data, shape })
    }

    pub(crate) fn from_parts(data: &'a mut [T], shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.nelems());
        Self { data, shape }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }
}

/// Read-only view whose columns are `lead` elements apart.
#[derive(Debug, Clone, Copy)]
pub struct ColsRef<'a, T> {
    data: &'a [T],
    shape: Shape,
    lead: usize,
}

fn check_lead(operation: &'static str, shape: Shape, lead: usize, len: usize) -> Result<()> {
    if lead < shape.rows {
        return Err(invalid_argument(format!(
            "{operation}: lead dimension {lead} is below the row count {}",
            shape.rows
        )));
    }
    let needed = match shape.cols {
        0 => Some(0),
        cols => (cols - 1)
            .checked_mul(lead)
            .and_then(|n| n.checked_add(shape.rows)),
    };
    let needed = needed.ok_or_else(|| {
        invalid_argument(format!(
            "{operation}: {shape} with lead dimension {lead} overflows usize"
        ))
    })?;
    if len < needed {
        return Err(dimension_mismatch(operation, needed, len));
    }
    Ok(())
}

impl<'a, T> ColsRef<'a, T> {
    pub fn new(data: &'a [T], rows: usize, cols: usize, lead: usize) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        check_lead("ColsRef::new", shape, lead, data.len())?;
        Ok(Self { data, shape, lead })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn lead(&self) -> usize {
        self.lead
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn continuity(&self) -> Continuity {
        Continuity::of_strides(self.shape, 1, self.lead as isize)
    }
}

/// Mutable view whose columns are `lead` elements apart.
#[derive(Debug)]
pub struct ColsMut<'a, T> {
    data: &'a mut [T],
    shape: Shape,
    lead: usize,
}

impl<'a, T> ColsMut<'a, T> {
    pub fn new(data: &'a mut [T], rows: usize, cols: usize, lead: usize) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        check_lead("ColsMut::new", shape, lead, data.len())?;
        Ok(Self { data, shape, lead })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn lead(&self) -> usize {
        self.lead
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    pub fn continuity(&self) -> Continuity {
        Continuity::of_strides(self.shape, 1, self.lead as isize)
    }
}

/// Smallest and largest element offset reached by a strided layout, `None` on overflow.
fn offset_span(shape: Shape, row_stride: isize, col_stride: isize) -> Option<(isize, isize)> {
    if shape.is_empty() {
        return Some((0, 0));
    }
    let last_row = isize::try_from(shape.rows - 1).ok()?.checked_mul(row_stride)?;
    let last_col = isize::try_from(shape.cols - 1).ok()?.checked_mul(col_stride)?;
    Some((
        last_row.min(0).checked_add(last_col.min(0))?,
        last_row.max(0).checked_add(last_col.max(0))?,
    ))
}

fn check_strided(
    operation: &'static str,
    len: usize,
    offset: usize,
    shape: Shape,
    row_stride: isize,
    col_stride: isize,
) -> Result<()> {
    let bounds = offset_span(shape, row_stride, col_stride).and_then(|(low, high)| {
        let base = isize::try_from(offset).ok()?;
        Some((base.checked_add(low)?, base.checked_add(high)?))
    });
    let Some((first, last)) = bounds else {
        return Err(invalid_argument(format!(
            "{operation}: strides ({row_stride}, {col_stride}) overflow for shape {shape}"
        )));
    };
    if !shape.is_empty() && (first < 0 || last >= len as isize) {
        return Err(invalid_argument(format!(
            "{operation}: strides ({row_stride}, {col_stride}) from offset {offset} leave a buffer of {len} elements"
        )));
    }
    Ok(())
}

/// Read-only view with arbitrary signed strides, in elements.
#[derive(Debug, Clone, Copy)]
pub struct StridedRef<'a, T> {
    ptr: *const T,
    shape: Shape,
    row_stride: isize,
    col_stride: isize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> StridedRef<'a, T> {
    /// View of `data` where element `(i, j)` sits at
    /// `offset + i * row_stride + j * col_stride`.
    pub fn new(
        data: &'a [T],
        offset: usize,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        check_strided("StridedRef::new", data.len(), offset, shape, row_stride, col_stride)?;
        Ok(Self {
            ptr: data.as_ptr().wrapping_add(offset),
            shape,
            row_stride,
            col_stride,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn strides(&self) -> (isize, isize) {
        (self.row_stride, self.col_stride)
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    pub fn continuity(&self) -> Continuity {
        Continuity::of_strides(self.shape, self.row_stride, self.col_stride)
    }
}

/// Mutable view with arbitrary signed strides, in elements.
///
/// Distinct `(i, j)` must reach distinct elements, so the strides are checked for
/// overlap on construction.
#[derive(Debug)]
pub struct StridedMut<'a, T> {
    ptr: *mut T,
    shape: Shape,
    row_stride: isize,
    col_stride: isize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> StridedMut<'a, T> {
    pub fn new(
        data: &'a mut [T],
        offset: usize,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        check_strided("StridedMut::new", data.len(), offset, shape, row_stride, col_stride)?;
        let (rs, cs) = (row_stride.unsigned_abs(), col_stride.unsigned_abs());
        let rows_apart = shape.rows <= 1 || rs >= 1;
        let cols_apart = shape.cols <= 1 || cs >= 1;
        let disjoint = shape.rows <= 1
            || shape.cols <= 1
            || shape.rows.checked_mul(rs).is_some_and(|span| cs >= span)
            || shape.cols.checked_mul(cs).is_some_and(|span| rs >= span);
        if !(rows_apart && cols_apart && disjoint) {
            return Err(invalid_argument(format!(
                "StridedMut::new: strides ({row_stride}, {col_stride}) overlap for shape {shape}"
            )));
        }
        Ok(Self {
            ptr: data.as_mut_ptr().wrapping_add(offset),
            shape,
            row_stride,
            col_stride,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn strides(&self) -> (isize, isize) {
        (self.row_stride, self.col_stride)
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    pub fn continuity(&self) -> Continuity {
        Continuity::of_strides(self.shape, self.row_stride, self.col_stride)
    }
}

fn ndarray_layout<T>(view: &ArrayView2<'_, T>) -> (Shape, isize, isize) {
    let (rows, cols) = view.dim();
    let strides = view.strides();
    (Shape::new(rows, cols), strides[0], strides[1])
}

impl<'a, T> From<ArrayView2<'a, T>> for StridedRef<'a, T> {
    fn from(view: ArrayView2<'a, T>) -> Self {
        let (shape, row_stride, col_stride) = ndarray_layout(&view);
        Self {
            ptr: view.as_ptr(),
            shape,
            row_stride,
            col_stride,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> From<ArrayViewMut2<'a, T>> for StridedMut<'a, T> {
    fn from(mut view: ArrayViewMut2<'a, T>) -> Self {
        let (rows, cols) = view.dim();
        let (row_stride, col_stride) = (view.strides()[0], view.strides()[1]);
        Self {
            ptr: view.as_mut_ptr(),
            shape: Shape::new(rows, cols),
            row_stride,
            col_stride,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> TryFrom<ArrayView2<'a, T>> for MatRef<'a, T> {
    type Error = MatError;

    fn try_from(view: ArrayView2<'a, T>) -> Result<Self> {
        let (shape, row_stride, col_stride) = ndarray_layout(&view);
        if !Continuity::of_strides(shape, row_stride, col_stride).is_continuous() {
            return Err(invalid_argument(format!(
                "strides ({row_stride}, {col_stride}) are not column-major continuous for {shape}"
            )));
        }
        // SAFETY: continuous strides reach exactly `nelems` consecutive elements
        // starting at the view's first element, all borrowed for 'a.
        let data = unsafe { std::slice::from_raw_parts(view.as_ptr(), shape.nelems()) };
        Ok(Self { data, shape })
    }
}

impl<'a, T> TryFrom<ArrayView2<'a, T>> for ColsRef<'a, T> {
    type Error = MatError;

    fn try_from(view: ArrayView2<'a, T>) -> Result<Self> {
        let (shape, row_stride, col_stride) = ndarray_layout(&view);
        let continuity = Continuity::of_strides(shape, row_stride, col_stride);
        let lead = if shape.cols <= 1 { shape.rows } else { col_stride.max(0) as usize };
        if !continuity.is_percol() || lead < shape.rows {
            return Err(invalid_argument(format!(
                "strides ({row_stride}, {col_stride}) do not give unit-stride columns for {shape}"
            )));
        }
        let len = match shape.cols {
            0 => 0,
            cols => (cols - 1) * lead + shape.rows,
        };
        // SAFETY: unit row stride and a non-negative lead keep every element of the
        // view inside `len` elements from its first one.
        let data = unsafe { std::slice::from_raw_parts(view.as_ptr(), len) };
        Ok(Self { data, shape, lead })
    }
}

impl<'a, T> TryFrom<ArrayViewMut2<'a, T>> for MatMut<'a, T> {
    type Error = MatError;

    fn try_from(mut view: ArrayViewMut2<'a, T>) -> Result<Self> {
        let (rows, cols) = view.dim();
        let shape = Shape::new(rows, cols);
        let (row_stride, col_stride) = (view.strides()[0], view.strides()[1]);
        if !Continuity::of_strides(shape, row_stride, col_stride).is_continuous() {
            return Err(invalid_argument(format!(
                "strides ({row_stride}, {col_stride}) are not column-major continuous for {shape}"
            )));
        }
        // SAFETY: as for `MatRef`, and the mutable view guarantees exclusive access.
        let data = unsafe { std::slice::from_raw_parts_mut(view.as_mut_ptr(), shape.nelems()) };
        Ok(Self { data, shape })
    }
}
