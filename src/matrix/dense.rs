//! Owned column-major storage.

use std::fmt;

use crate::element::Element;
use crate::error::{dimension_mismatch, index_out_of_range, Result};
use crate::matrix::view::{MatMut, MatRef};
use crate::shape::Shape;

/// Dense matrix stored column by column in a `Vec`.
#[derive(Clone, PartialEq)]
pub struct DenseMatrix<T> {
    data: Vec<T>,
    shape: Shape,
}

impl<T: Element> DenseMatrix<T> {
    /// Matrix of `T::default()` (zero, or `false`).
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`, like `Vec::with_capacity`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_elem(rows, cols, T::default())
    }

    pub fn from_elem(rows: usize, cols: usize, value: T) -> Self {
        let shape = Shape::new(rows, cols);
        Self {
            data: vec![value; shape.nelems()],
            shape,
        }
    }

    /// Builds a matrix from `f(i, j)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let shape = Shape::new(rows, cols);
        let mut data = Vec::with_capacity(shape.nelems());
        for j in 0..cols {
            for i in 0..rows {
                data.push(f(i, j));
            }
        }
        Self { data, shape }
    }

    /// Takes ownership of column-major data.
    pub fn from_col_major(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        let len = shape.checked_nelems("from_col_major")?;
        if data.len() != len {
            return Err(dimension_mismatch("from_col_major", len, data.len()));
        }
        Ok(Self { data, shape })
    }

    /// Copies row-major data into column-major storage.
    pub fn from_row_major(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        let len = shape.checked_nelems("from_row_major")?;
        if data.len() != len {
            return Err(dimension_mismatch("from_row_major", len, data.len()));
        }
        Ok(Self::from_fn(rows, cols, |i, j| data[i * cols + j]))
    }

    /// Resizes to `rows x cols` when the shape differs. Contents are unspecified
    /// afterwards, as with any evaluation destination.
    pub fn require_size(&mut self, rows: usize, cols: usize) -> Result<()> {
        let shape = Shape::new(rows, cols);
        if shape != self.shape {
            let len = shape.checked_nelems("require_size")?;
            self.data.clear();
            self.data.resize(len, T::default());
            self.shape = shape;
        }
        Ok(())
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.shape.rows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.shape.cols
    }

    #[inline]
    pub fn nelems(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Checked element access.
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.checked_offset(i, j).map(|k| self.data[k])
    }

    /// Checked mutable element access.
    pub fn get_mut(&mut self, i: usize, j: usize) -> Result<&mut T> {
        let k = self.checked_offset(i, j)?;
        Ok(&mut self.data[k])
    }

    fn checked_offset(&self, i: usize, j: usize) -> Result<usize> {
        if i >= self.shape.rows {
            return Err(index_out_of_range(i, self.shape.rows));
        }
        if j >= self.shape.cols {
            return Err(index_out_of_range(j, self.shape.cols));
        }
        Ok(self.shape.offset(i, j))
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `j` is out of range.
    pub fn col(&self, j: usize) -> &[T] {
        let rows = self.shape.rows;
        &self.data[j * rows..(j + 1) * rows]
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn view(&self) -> MatRef<'_, T> {
        MatRef::from_parts(&self.data, self.shape)
    }

    pub fn view_mut(&mut self) -> MatMut<'_, T> {
        MatMut::from_parts(&mut self.data, self.shape)
    }
}

impl<T: Element> fmt::Debug for DenseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DenseMatrix<{}> {}", T::NAME, self.shape)?;
        for i in 0..self.shape.rows {
            let row: Vec<T> = (0..self.shape.cols)
                .map(|j| self.data[self.shape.offset(i, j)])
                .collect();
            writeln!(f, "  {row:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatError;

    #[test]
    fn test_layouts_agree() {
        let rm = DenseMatrix::from_row_major(2, 3, &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let cm = DenseMatrix::from_col_major(2, 3, vec![1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
        let f = DenseMatrix::from_fn(2, 3, |i, j| (i * 3 + j + 1) as f32);
        assert_eq!(rm, cm);
        assert_eq!(rm, f);
        assert_eq!(rm.get(1, 2).unwrap(), 6.0);
        assert_eq!(rm.col(1), &[2.0, 5.0]);
    }

    #[test]
    fn test_checked_access() {
        let mut m = DenseMatrix::<f64>::zeros(2, 2);
        *m.get_mut(1, 0).unwrap() = 3.0;
        assert_eq!(m.as_slice(), &[0.0, 3.0, 0.0, 0.0]);
        assert_eq!(m.get(2, 0).unwrap_err(), MatError::IndexOutOfRange { index: 2, len: 2 });
        assert!(m.get(0, 5).is_err());
    }

    #[test]
    fn test_require_size() {
        let mut m = DenseMatrix::from_elem(2, 2, true);
        m.require_size(3, 1).unwrap();
        assert_eq!(m.shape(), Shape::new(3, 1));
        assert_eq!(m.nelems(), 3);
        m.require_size(0, 4).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn test_length_is_checked() {
        let err = DenseMatrix::from_col_major(2, 2, vec![1.0f32; 3]).unwrap_err();
        assert!(matches!(err, MatError::DimensionMismatch { .. }));
    }
}
