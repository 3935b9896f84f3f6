//! Matrix storage, views and evaluation destinations.

mod dense;
mod view;

pub use dense::DenseMatrix;
pub use view::{ColsMut, ColsRef, MatMut, MatRef, StridedMut, StridedRef};

use crate::accessor::{
    ColsWriter, ContWriter, MultiColWriter, StridedColsWriter, VecWriter, WriteMode,
};
use crate::element::{Element, PackOf};
use crate::error::Result;
use crate::shape::{Continuity, Extent, Shape, DYN};

/// Something an expression can be evaluated into.
///
/// The flat writer is only requested when [`continuity`](Self::continuity) is
/// continuous; the column-wise writer is always available.
pub trait Destination {
    type Elem: Element;
    type Writer<M: WriteMode>: VecWriter<Slot = Self::Elem, PackSlot = PackOf<Self::Elem>>;
    type Cols<M: WriteMode>: MultiColWriter<Slot = Self::Elem, PackSlot = PackOf<Self::Elem>>;

    const CT_ROWS: usize = DYN;
    const CT_COLS: usize = DYN;

    fn shape(&self) -> Shape;

    fn continuity(&self) -> Continuity;

    /// Reconciles the destination with an expression extent and returns the shape
    /// to evaluate over. Resizable destinations adopt the extent; views must match it.
    fn prepare(&mut self, extent: Extent, operation: &'static str) -> Result<Shape>;

    fn writer<M: WriteMode>(&mut self) -> Self::Writer<M>;

    fn cols<M: WriteMode>(&mut self) -> Self::Cols<M>;
}

impl<T: Element> Destination for DenseMatrix<T> {
    type Elem = T;
    type Writer<M: WriteMode> = ContWriter<T, M>;
    type Cols<M: WriteMode> = ColsWriter<T, M>;

    fn shape(&self) -> Shape {
        DenseMatrix::shape(self)
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn prepare(&mut self, extent: Extent, _operation: &'static str) -> Result<Shape> {
        let shape = Shape::new(
            extent.rows.unwrap_or(self.nrows()),
            extent.cols.unwrap_or(self.ncols()),
        );
        self.require_size(shape.rows, shape.cols)?;
        Ok(shape)
    }

    fn writer<M: WriteMode>(&mut self) -> ContWriter<T, M> {
        unsafe { ContWriter::new(self.as_mut_slice().as_mut_ptr()) }
    }

    fn cols<M: WriteMode>(&mut self) -> ColsWriter<T, M> {
        let lead = self.nrows();
        unsafe { ColsWriter::new(self.as_mut_slice().as_mut_ptr(), lead) }
    }
}

impl<T: Element> Destination for MatMut<'_, T> {
    type Elem = T;
    type Writer<M: WriteMode> = ContWriter<T, M>;
    type Cols<M: WriteMode> = ColsWriter<T, M>;

    fn shape(&self) -> Shape {
        MatMut::shape(self)
    }

    fn continuity(&self) -> Continuity {
        Continuity::Continuous
    }

    fn prepare(&mut self, extent: Extent, operation: &'static str) -> Result<Shape> {
        extent.fits(self.shape(), operation)?;
        Ok(self.shape())
    }

    fn writer<M: WriteMode>(&mut self) -> ContWriter<T, M> {
        unsafe { ContWriter::new(self.as_mut_ptr()) }
    }

    fn cols<M: WriteMode>(&mut self) -> ColsWriter<T, M> {
        let lead = self.shape().rows;
        unsafe { ColsWriter::new(self.as_mut_ptr(), lead) }
    }
}

impl<T: Element> Destination for ColsMut<'_, T> {
    type Elem = T;
    type Writer<M: WriteMode> = ContWriter<T, M>;
    type Cols<M: WriteMode> = ColsWriter<T, M>;

    fn shape(&self) -> Shape {
        ColsMut::shape(self)
    }

    fn continuity(&self) -> Continuity {
        ColsMut::continuity(self)
    }

    fn prepare(&mut self, extent: Extent, operation: &'static str) -> Result<Shape> {
        extent.fits(self.shape(), operation)?;
        Ok(self.shape())
    }

    fn writer<M: WriteMode>(&mut self) -> ContWriter<T, M> {
        unsafe { ContWriter::new(self.as_mut_ptr()) }
    }

    fn cols<M: WriteMode>(&mut self) -> ColsWriter<T, M> {
        let lead = self.lead();
        unsafe { ColsWriter::new(self.as_mut_ptr(), lead) }
    }
}

impl<T: Element> Destination for StridedMut<'_, T> {
    type Elem = T;
    type Writer<M: WriteMode> = ContWriter<T, M>;
    type Cols<M: WriteMode> = StridedColsWriter<T, M>;

    fn shape(&self) -> Shape {
        StridedMut::shape(self)
    }

    fn continuity(&self) -> Continuity {
        StridedMut::continuity(self)
    }

    fn prepare(&mut self, extent: Extent, operation: &'static str) -> Result<Shape> {
        extent.fits(self.shape(), operation)?;
        Ok(self.shape())
    }

    // only requested for continuous strides, where flat index i sits at offset i
    fn writer<M: WriteMode>(&mut self) -> ContWriter<T, M> {
        debug_assert!(self.continuity().is_continuous());
        unsafe { ContWriter::new(self.as_mut_ptr()) }
    }

    fn cols<M: WriteMode>(&mut self) -> StridedColsWriter<T, M> {
        let (row_stride, col_stride) = self.strides();
        unsafe { StridedColsWriter::new(self.as_mut_ptr(), row_stride, col_stride) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatError;

    #[test]
    fn test_dense_destination_adopts_extent() {
        let mut m = DenseMatrix::<f32>::zeros(1, 1);
        let shape = m.prepare(Extent::exact(3, 2), "assign").unwrap();
        assert_eq!(shape, Shape::new(3, 2));
        assert_eq!(m.shape(), shape);

        // open dimensions keep the current size
        let shape = m
            .prepare(Extent { rows: None, cols: Some(5) }, "assign")
            .unwrap();
        assert_eq!(shape, Shape::new(3, 5));
        assert_eq!(m.prepare(Extent::ANY, "assign").unwrap(), Shape::new(3, 5));
    }

    #[test]
    fn test_view_destination_must_match() {
        let mut data = vec![0.0f64; 6];
        let mut view = MatMut::new(&mut data, 2, 3).unwrap();
        assert!(view.prepare(Extent::exact(2, 3), "assign").is_ok());
        let err = view.prepare(Extent::exact(3, 2), "assign").unwrap_err();
        assert!(matches!(err, MatError::DimensionMismatch { operation: "assign", .. }));
    }
}
