//! Shapes, partial extents and memory continuity.
//!
//! Matrices are strictly two-dimensional and column-major. A dimension is either
//! fixed at compile time (a non-zero `const`) or dynamic ([`DYN`]). Broadcast sources
//! leave one or both dimensions open; the open dimensions are filled in when the
//! expression meets its destination.

use std::fmt;

use crate::error::{dimension_mismatch, invalid_argument, Result};

/// Marker for a dimension that is only known at runtime.
pub const DYN: usize = 0;

/// Concrete (rows, columns) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of elements, `rows * cols`.
    ///
    /// Shapes coming from callers are validated with
    /// [`checked_nelems`](Self::checked_nelems) before evaluation.
    ///
    /// # Panics
    ///
    /// Panics if the element count overflows `usize`.
    #[inline]
    pub fn nelems(&self) -> usize {
        match self.rows.checked_mul(self.cols) {
            Some(n) => n,
            None => panic!("shape {self} overflows the index type"),
        }
    }

    /// Number of elements, or `InvalidArgument` when `rows * cols` overflows `usize`.
    #[inline]
    pub fn checked_nelems(&self, operation: &'static str) -> Result<usize> {
        self.rows.checked_mul(self.cols).ok_or_else(|| {
            invalid_argument(format!(
                "{operation}: shape {self} has more elements than fit in usize"
            ))
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Column-major linear index of `(i, j)`.
    #[inline]
    pub fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.cols);
        i + j * self.rows
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.rows, self.cols)
    }
}

/// Partially known shape of an expression.
///
/// `None` means the operand adapts to whatever the other operands (or the
/// destination) require along that dimension: a single scalar has neither
/// dimension, a repeated row has only its column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub rows: Option<usize>,
    pub cols: Option<usize>,
}

impl Extent {
    pub const ANY: Extent = Extent {
        rows: None,
        cols: None,
    };

    pub const fn exact(rows: usize, cols: usize) -> Self {
        Self {
            rows: Some(rows),
            cols: Some(cols),
        }
    }

    pub const fn from_shape(shape: Shape) -> Self {
        Self::exact(shape.rows, shape.cols)
    }

    /// Merges two extents, failing when both fix the same dimension differently.
    pub fn unify(self, other: Extent, operation: &'static str) -> Result<Extent> {
        let rows = unify_dim(self.rows, other.rows).ok_or_else(|| {
            dimension_mismatch(operation, self, other)
        })?;
        let cols = unify_dim(self.cols, other.cols).ok_or_else(|| {
            dimension_mismatch(operation, self, other)
        })?;
        Ok(Extent { rows, cols })
    }

    /// Checks that this extent fits a concrete shape.
    pub fn fits(&self, shape: Shape, operation: &'static str) -> Result<()> {
        self.unify(Extent::from_shape(shape), operation).map(|_| ())
    }

    /// Concrete shape when both dimensions are known.
    ///
    /// The element count is not checked here, see [`Shape::checked_nelems`].
    pub fn shape(&self) -> Option<Shape> {
        match (self.rows, self.cols) {
            (Some(rows), Some(cols)) => Some(Shape::new(rows, cols)),
            _ => None,
        }
    }
}

// Some(None) keeps the dimension open, None is a conflict
fn unify_dim(a: Option<usize>, b: Option<usize>) -> Option<Option<usize>> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => None,
        (Some(x), _) | (_, Some(x)) => Some(Some(x)),
        (None, None) => Some(None),
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dim = |d: Option<usize>| d.map_or_else(|| "*".to_string(), |v| v.to_string());
        write!(f, "{} x {}", dim(self.rows), dim(self.cols))
    }
}

/// How far an operand's memory layout allows flat traversal.
///
/// The variants are ordered: a compound expression is as continuous as its least
/// continuous operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Continuity {
    /// Neither flat nor per-column flat; elements are reached through strides.
    Scattered,
    /// Row stride is 1: every column is a flat run, columns are apart.
    PerColumn,
    /// Row stride is 1 and column stride equals the row count.
    Continuous,
}

impl Continuity {
    /// Classifies a layout from its strides (in elements).
    pub fn of_strides(shape: Shape, row_stride: isize, col_stride: isize) -> Self {
        // degenerate single-row or single-column layouts ignore the unused stride
        let row_unit = row_stride == 1 || shape.rows <= 1;
        let col_packed = col_stride == shape.rows as isize || shape.cols <= 1;
        match (row_unit, col_packed) {
            (true, true) => Continuity::Continuous,
            (true, false) => Continuity::PerColumn,
            _ => Continuity::Scattered,
        }
    }

    #[inline]
    pub fn is_continuous(self) -> bool {
        self == Continuity::Continuous
    }

    #[inline]
    pub fn is_percol(self) -> bool {
        self >= Continuity::PerColumn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatError;

    #[test]
    fn test_shape_basics() {
        let shape = Shape::new(3, 4);
        assert_eq!(shape.nelems(), 12);
        assert!(!shape.is_empty());
        assert_eq!(shape.offset(2, 1), 5);
        assert!(Shape::new(0, 7).is_empty());
        assert!(Shape::new(7, 0).is_empty());
        assert_eq!(shape.to_string(), "3 x 4");
    }

    #[test]
    fn test_checked_nelems_reports_overflow() {
        assert_eq!(Shape::new(3, 4).checked_nelems("test").unwrap(), 12);
        assert_eq!(Shape::new(usize::MAX, 0).checked_nelems("test").unwrap(), 0);
        let err = Shape::new(usize::MAX, 2).checked_nelems("sum").unwrap_err();
        assert!(matches!(err, MatError::InvalidArgument { .. }));
        assert!(err.to_string().contains("sum"));
    }

    #[test]
    fn test_unify_open_dimensions() {
        let row = Extent {
            rows: None,
            cols: Some(5),
        };
        let full = Extent::exact(3, 5);
        assert_eq!(row.unify(full, "add").unwrap(), full);
        assert_eq!(Extent::ANY.unify(row, "add").unwrap(), row);
        assert_eq!(Extent::ANY.unify(Extent::ANY, "add").unwrap().shape(), None);
    }

    #[test]
    fn test_unify_conflict() {
        let err = Extent::exact(3, 5)
            .unify(Extent::exact(5, 3), "mul")
            .unwrap_err();
        match err {
            MatError::DimensionMismatch {
                operation,
                expected,
                found,
            } => {
                assert_eq!(operation, "mul");
                assert_eq!(expected, "3 x 5");
                assert_eq!(found, "5 x 3");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_continuity_from_strides() {
        let shape = Shape::new(4, 3);
        assert_eq!(Continuity::of_strides(shape, 1, 4), Continuity::Continuous);
        assert_eq!(Continuity::of_strides(shape, 1, 6), Continuity::PerColumn);
        assert_eq!(Continuity::of_strides(shape, 2, 8), Continuity::Scattered);
        // a single column never needs its column stride
        assert_eq!(
            Continuity::of_strides(Shape::new(4, 1), 1, 100),
            Continuity::Continuous
        );
        assert!(Continuity::Continuous.is_percol());
        assert!(!Continuity::Scattered.is_percol());
        assert_eq!(
            Continuity::Continuous.min(Continuity::PerColumn),
            Continuity::PerColumn
        );
    }
}
