//! Expression leaves: stored matrices, views and broadcast sources.

use crate::accessor::{
    make_accessor, AccessTag, BroadcastCol, BroadcastRow, ColsReader, ContReader, DivReader,
    Normal, SplatReader, StridedColsReader, WrapReader,
};
use crate::element::Element;
use crate::error::Result;
use crate::expr::{Ex, MatExpr};
use crate::matrix::{ColsRef, DenseMatrix, MatRef, StridedRef};
use crate::shape::{Continuity, Extent, Shape, DYN};

// Leaf readers point into borrowed storage. They are created by `reader`/`cols`
// and only read while the leaf is borrowed by the evaluation call.

impl<T: Element> MatExpr for MatRef<'_, T> {
    type Elem = T;
    type Reader = ContReader<T>;
    type Cols = ColsReader<T, Normal>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent::from_shape(self.shape()))
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn reader(&self, shape: Shape) -> ContReader<T> {
        let lead = self.shape().rows;
        unsafe { make_accessor::<Normal, T>(self.as_slice().as_ptr(), lead, shape).0 }
    }

    fn cols(&self, shape: Shape) -> ColsReader<T, Normal> {
        let lead = self.shape().rows;
        unsafe { make_accessor::<Normal, T>(self.as_slice().as_ptr(), lead, shape).1 }
    }
}

impl<T: Element> MatExpr for DenseMatrix<T> {
    type Elem = T;
    type Reader = ContReader<T>;
    type Cols = ColsReader<T, Normal>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent::from_shape(self.shape()))
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn reader(&self, shape: Shape) -> ContReader<T> {
        self.view().reader(shape)
    }

    fn cols(&self, shape: Shape) -> ColsReader<T, Normal> {
        self.view().cols(shape)
    }
}

impl<T: Element> MatExpr for ColsRef<'_, T> {
    type Elem = T;
    type Reader = ContReader<T>;
    type Cols = ColsReader<T, Normal>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent::from_shape(self.shape()))
    }

    fn continuity(&self) -> Continuity {
        ColsRef::continuity(self)
    }

    // flat reads are only issued when the lead equals the row count
    fn reader(&self, shape: Shape) -> ContReader<T> {
        unsafe { make_accessor::<Normal, T>(self.as_ptr(), self.lead(), shape).0 }
    }

    fn cols(&self, shape: Shape) -> ColsReader<T, Normal> {
        unsafe { make_accessor::<Normal, T>(self.as_ptr(), self.lead(), shape).1 }
    }
}

impl<T: Element> MatExpr for StridedRef<'_, T> {
    type Elem = T;
    type Reader = ContReader<T>;
    type Cols = StridedColsReader<T>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent::from_shape(self.shape()))
    }

    fn continuity(&self) -> Continuity {
        StridedRef::continuity(self)
    }

    // flat reads are only issued for continuous strides
    fn reader(&self, _shape: Shape) -> ContReader<T> {
        unsafe { ContReader::new(self.as_ptr()) }
    }

    fn cols(&self, _shape: Shape) -> StridedColsReader<T> {
        let (row_stride, col_stride) = self.strides();
        unsafe { StridedColsReader::new(self.as_ptr(), row_stride, col_stride) }
    }
}

/// One scalar standing for a matrix of any shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Single<T> {
    value: T,
}

impl<T: Element> Single<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Element> MatExpr for Single<T> {
    type Elem = T;
    type Reader = SplatReader<T>;
    type Cols = SplatReader<T>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent::ANY)
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn access_tag(&self) -> AccessTag {
        AccessTag::Single
    }

    fn reader(&self, _shape: Shape) -> SplatReader<T> {
        SplatReader::new(self.value)
    }

    fn cols(&self, _shape: Shape) -> SplatReader<T> {
        SplatReader::new(self.value)
    }
}

/// A `rows x cols` matrix with every element equal to `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstMatrix<T> {
    value: T,
    shape: Shape,
}

impl<T: Element> ConstMatrix<T> {
    pub fn new(value: T, rows: usize, cols: usize) -> Self {
        Self {
            value,
            shape: Shape::new(rows, cols),
        }
    }
}

impl<T: Element> MatExpr for ConstMatrix<T> {
    type Elem = T;
    type Reader = SplatReader<T>;
    type Cols = SplatReader<T>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        self.shape.checked_nelems("constant")?;
        Ok(Extent::from_shape(self.shape))
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn access_tag(&self) -> AccessTag {
        AccessTag::Single
    }

    fn reader(&self, _shape: Shape) -> SplatReader<T> {
        SplatReader::new(self.value)
    }

    fn cols(&self, _shape: Shape) -> SplatReader<T> {
        SplatReader::new(self.value)
    }
}

/// A row repeated down every row of the result: element `(i, j)` is `row[j]`.
///
/// The row count comes from the other operands or the destination.
#[derive(Debug, Clone, Copy)]
pub struct RepRow<'a, T> {
    row: &'a [T],
}

impl<'a, T: Element> RepRow<'a, T> {
    pub fn new(row: &'a [T]) -> Self {
        Self { row }
    }
}

impl<T: Element> MatExpr for RepRow<'_, T> {
    type Elem = T;
    type Reader = DivReader<T>;
    type Cols = ColsReader<T, BroadcastRow>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent {
            rows: None,
            cols: Some(self.row.len()),
        })
    }

    // flat index i maps to row[i / rows], so the flat space is complete
    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn access_tag(&self) -> AccessTag {
        AccessTag::BroadcastRow
    }

    fn reader(&self, shape: Shape) -> DivReader<T> {
        unsafe { make_accessor::<BroadcastRow, T>(self.row.as_ptr(), 0, shape).0 }
    }

    fn cols(&self, shape: Shape) -> ColsReader<T, BroadcastRow> {
        unsafe { make_accessor::<BroadcastRow, T>(self.row.as_ptr(), 0, shape).1 }
    }
}

/// A column repeated across every column of the result: element `(i, j)` is `col[i]`.
#[derive(Debug, Clone, Copy)]
pub struct RepCol<'a, T> {
    col: &'a [T],
}

impl<'a, T: Element> RepCol<'a, T> {
    pub fn new(col: &'a [T]) -> Self {
        Self { col }
    }
}

impl<T: Element> MatExpr for RepCol<'_, T> {
    type Elem = T;
    type Reader = WrapReader<T>;
    type Cols = ColsReader<T, BroadcastCol>;

    const SIMD: bool = true;

    fn extent(&self) -> Result<Extent> {
        Ok(Extent {
            rows: Some(self.col.len()),
            cols: None,
        })
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn access_tag(&self) -> AccessTag {
        AccessTag::BroadcastCol
    }

    fn reader(&self, shape: Shape) -> WrapReader<T> {
        unsafe { make_accessor::<BroadcastCol, T>(self.col.as_ptr(), 0, shape).0 }
    }

    fn cols(&self, shape: Shape) -> ColsReader<T, BroadcastCol> {
        unsafe { make_accessor::<BroadcastCol, T>(self.col.as_ptr(), 0, shape).1 }
    }
}

/// Pins compile-time dimensions on an expression. `DYN` leaves a dimension dynamic.
///
/// The runtime shape is checked against `M x N` when the expression is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Fixed<E, const M: usize, const N: usize> {
    inner: E,
}

impl<E, const M: usize, const N: usize> Fixed<E, M, N> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: MatExpr, const M: usize, const N: usize> MatExpr for Fixed<E, M, N> {
    type Elem = E::Elem;
    type Reader = E::Reader;
    type Cols = E::Cols;

    const CT_ROWS: usize = M;
    const CT_COLS: usize = N;
    const SIMD: bool = E::SIMD;

    fn extent(&self) -> Result<Extent> {
        let fixed = Extent {
            rows: (M != DYN).then_some(M),
            cols: (N != DYN).then_some(N),
        };
        self.inner.extent()?.unify(fixed, "fixed")
    }

    fn continuity(&self) -> Continuity {
        self.inner.continuity()
    }

    fn access_tag(&self) -> AccessTag {
        self.inner.access_tag()
    }

    fn reader(&self, shape: Shape) -> E::Reader {
        self.inner.reader(shape)
    }

    fn cols(&self, shape: Shape) -> E::Cols {
        self.inner.cols(shape)
    }
}

impl<T: Element> DenseMatrix<T> {
    /// The matrix as an expression operand.
    pub fn ex(&self) -> Ex<MatRef<'_, T>> {
        Ex(self.view())
    }
}

impl<'a, T: Element> MatRef<'a, T> {
    pub fn ex(self) -> Ex<MatRef<'a, T>> {
        Ex(self)
    }
}

impl<'a, T: Element> ColsRef<'a, T> {
    pub fn ex(self) -> Ex<ColsRef<'a, T>> {
        Ex(self)
    }
}

impl<'a, T: Element> StridedRef<'a, T> {
    pub fn ex(self) -> Ex<StridedRef<'a, T>> {
        Ex(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{MultiColReader, VecReader};
    use crate::MatError;

    #[test]
    fn test_broadcast_extents_stay_open() {
        let row = [1.0f32, 2.0, 3.0];
        let col = [4.0f32, 5.0];
        assert_eq!(
            RepRow::new(&row).extent().unwrap(),
            Extent { rows: None, cols: Some(3) }
        );
        let both = RepRow::new(&row)
            .extent()
            .unwrap()
            .unify(RepCol::new(&col).extent().unwrap(), "add")
            .unwrap();
        assert_eq!(both, Extent::exact(2, 3));
        assert_eq!(Single::new(1.0f64).extent().unwrap(), Extent::ANY);
        assert_eq!(Single::new(1.0f64).access_tag(), AccessTag::Single);
    }

    #[test]
    fn test_broadcast_readers() {
        let row = [1.0f64, 2.0, 3.0];
        let shape = Shape::new(2, 3);
        let source = RepRow::new(&row);
        unsafe {
            // flat order walks down each column
            let flat: Vec<f64> = (0..6).map(|i| source.reader(shape).scalar(i)).collect();
            assert_eq!(flat, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
            let cols = source.cols(shape);
            assert_eq!(cols.get(1, cols.col_state(2)), 3.0);
        }

        let col = [7.0f64, 8.0];
        let source = RepCol::new(&col);
        unsafe {
            let flat: Vec<f64> = (0..6).map(|i| source.reader(shape).scalar(i)).collect();
            assert_eq!(flat, vec![7.0, 8.0, 7.0, 8.0, 7.0, 8.0]);
        }
    }

    #[test]
    fn test_fixed_dimensions_are_checked() {
        let m = DenseMatrix::<f32>::zeros(2, 3);
        assert_eq!(<Fixed<MatRef<'_, f32>, 2, 3> as MatExpr>::CT_ROWS, 2);
        assert!(Fixed::<_, 2, 3>::new(m.view()).extent().is_ok());
        assert!(Fixed::<_, DYN, 3>::new(m.view()).extent().is_ok());
        let err = Fixed::<_, 4, 3>::new(m.view()).extent().unwrap_err();
        assert!(matches!(err, MatError::DimensionMismatch { operation: "fixed", .. }));
    }

    #[test]
    fn test_strided_columns_of_a_transpose() {
        let m = DenseMatrix::from_fn(2, 3, |i, j| (10 * i + j) as f32);
        let t = m.view().t();
        assert_eq!(t.shape(), Shape::new(3, 2));
        let cols = t.cols(t.shape());
        unsafe {
            // t(i, j) = m(j, i)
            assert_eq!(cols.get(2, cols.col_state(1)), 12.0);
            assert_eq!(cols.get(1, cols.col_state(0)), 1.0);
        }
        assert_eq!(MatExpr::continuity(&t), Continuity::Scattered);
    }
}
