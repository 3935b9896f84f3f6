//! Lazy matrix expressions.
//!
//! Building an expression computes nothing. Operators and named functions on
//! [`Ex`] nest node types; the element type, compile-time dimensions and whether a
//! packed kernel exists are all known from the resulting type. Work happens when the
//! expression is handed to [`evaluate`](crate::evaluate) or a reduction.
//!
//! ```
//! use simdmat::{evaluate, DenseMatrix};
//!
//! let a = DenseMatrix::from_fn(3, 2, |i, j| (i + j) as f64);
//! let b = DenseMatrix::from_elem(3, 2, 0.5f64);
//! let mut c = DenseMatrix::zeros(0, 0);
//! evaluate((a.ex() * b.ex() + 1.0f64).sqrt(), &mut c).unwrap();
//! assert_eq!(c.get(2, 1).unwrap(), 2.5f64.sqrt());
//! ```

pub mod node;
pub mod ops;
mod source;

pub use node::{Binary, Cast, Compare, Logical, Not, Predicate, Select, Unary};
pub use source::{ConstMatrix, Fixed, RepCol, RepRow, Single};

use crate::accessor::{AccessTag, MultiColReader, VecReader};
use crate::element::{CastFrom, Element, RealElement};
use crate::error::Result;
use crate::shape::{Continuity, Extent, Shape, DYN};

/// A matrix-valued expression.
///
/// Implementors describe their value through two readers: a flat one, only used
/// when [`continuity`](Self::continuity) is continuous, and a column-wise one that
/// is always valid. Readers borrow the expression's storage through raw pointers
/// and must not outlive the borrow they were created from.
pub trait MatExpr {
    type Elem: Element;
    type Reader: VecReader<Value = Self::Elem>;
    type Cols: MultiColReader<Value = Self::Elem>;

    /// Row count fixed at compile time, or [`DYN`].
    const CT_ROWS: usize = DYN;
    /// Column count fixed at compile time, or [`DYN`].
    const CT_COLS: usize = DYN;

    /// Every operation in the expression has a native pack implementation.
    const SIMD: bool;

    /// Shape as far as the operands determine it. Conflicting operands are a
    /// [`DimensionMismatch`](crate::MatError::DimensionMismatch).
    fn extent(&self) -> Result<Extent>;

    /// The least continuous operand.
    fn continuity(&self) -> Continuity;

    fn access_tag(&self) -> AccessTag {
        AccessTag::Normal
    }

    fn reader(&self, shape: Shape) -> Self::Reader;

    fn cols(&self, shape: Shape) -> Self::Cols;
}

impl<E: MatExpr + ?Sized> MatExpr for &E {
    type Elem = E::Elem;
    type Reader = E::Reader;
    type Cols = E::Cols;

    const CT_ROWS: usize = E::CT_ROWS;
    const CT_COLS: usize = E::CT_COLS;
    const SIMD: bool = E::SIMD;

    fn extent(&self) -> Result<Extent> {
        (**self).extent()
    }

    fn continuity(&self) -> Continuity {
        (**self).continuity()
    }

    fn access_tag(&self) -> AccessTag {
        (**self).access_tag()
    }

    fn reader(&self, shape: Shape) -> E::Reader {
        (**self).reader(shape)
    }

    fn cols(&self, shape: Shape) -> E::Cols {
        (**self).cols(shape)
    }
}

/// Expression wrapper carrying the operator overloads and named functions.
#[derive(Debug, Clone, Copy)]
pub struct Ex<E>(pub E);

impl<E: MatExpr> MatExpr for Ex<E> {
    type Elem = E::Elem;
    type Reader = E::Reader;
    type Cols = E::Cols;

    const CT_ROWS: usize = E::CT_ROWS;
    const CT_COLS: usize = E::CT_COLS;
    const SIMD: bool = E::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.0.extent()
    }

    fn continuity(&self) -> Continuity {
        self.0.continuity()
    }

    fn access_tag(&self) -> AccessTag {
        self.0.access_tag()
    }

    fn reader(&self, shape: Shape) -> E::Reader {
        self.0.reader(shape)
    }

    fn cols(&self, shape: Shape) -> E::Cols {
        self.0.cols(shape)
    }
}

macro_rules! arith_operators {
    ($($trait:ident, $method:ident => $op:ident;)*) => {
        $(
            impl<A, B> std::ops::$trait<Ex<B>> for Ex<A>
            where
                A: MatExpr,
                B: MatExpr<Elem = A::Elem>,
                A::Elem: RealElement,
            {
                type Output = Ex<Binary<ops::$op, A, B>>;

                fn $method(self, rhs: Ex<B>) -> Self::Output {
                    Ex(Binary::new(self.0, rhs.0))
                }
            }

            arith_operators!(@scalar $trait, $method => $op, f32);
            arith_operators!(@scalar $trait, $method => $op, f64);
        )*
    };
    (@scalar $trait:ident, $method:ident => $op:ident, $scalar:ty) => {
        impl<A: MatExpr<Elem = $scalar>> std::ops::$trait<$scalar> for Ex<A> {
            type Output = Ex<Binary<ops::$op, A, Single<$scalar>>>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                Ex(Binary::new(self.0, Single::new(rhs)))
            }
        }

        impl<B: MatExpr<Elem = $scalar>> std::ops::$trait<Ex<B>> for $scalar {
            type Output = Ex<Binary<ops::$op, Single<$scalar>, B>>;

            fn $method(self, rhs: Ex<B>) -> Self::Output {
                Ex(Binary::new(Single::new(self), rhs.0))
            }
        }
    };
}

arith_operators! {
    Add, add => Add;
    Sub, sub => Sub;
    Mul, mul => Mul;
    Div, div => Div;
    Rem, rem => Rem;
}

macro_rules! logic_operators {
    ($($trait:ident, $method:ident => $op:ident;)*) => {
        $(
            impl<A, B> std::ops::$trait<Ex<B>> for Ex<A>
            where
                A: MatExpr<Elem = bool>,
                B: MatExpr<Elem = bool>,
            {
                type Output = Ex<Logical<ops::$op, A, B>>;

                fn $method(self, rhs: Ex<B>) -> Self::Output {
                    Ex(Logical::new(self.0, rhs.0))
                }
            }
        )*
    };
}

logic_operators! {
    BitAnd, bitand => And;
    BitOr, bitor => Or;
    BitXor, bitxor => Xor;
}

impl<A: MatExpr> std::ops::Neg for Ex<A>
where
    A::Elem: RealElement,
{
    type Output = Ex<Unary<ops::Neg, A>>;

    fn neg(self) -> Self::Output {
        Ex(Unary::new(self.0))
    }
}

impl<A: MatExpr<Elem = bool>> std::ops::Not for Ex<A> {
    type Output = Ex<Not<A>>;

    fn not(self) -> Self::Output {
        Ex(Not::new(self.0))
    }
}

macro_rules! unary_methods {
    ($($method:ident => $op:ident),* $(,)?) => {
        impl<E: MatExpr> Ex<E>
        where
            E::Elem: RealElement,
        {
            $(
                pub fn $method(self) -> Ex<Unary<ops::$op, E>> {
                    Ex(Unary::new(self.0))
                }
            )*
        }
    };
}

unary_methods! {
    abs => Abs, sqr => Sqr, cube => Cube, rcp => Rcp,
    sqrt => Sqrt, rsqrt => Rsqrt, cbrt => Cbrt,
    exp => Exp, exp2 => Exp2, expm1 => Expm1,
    ln => Ln, log2 => Log2, log10 => Log10, log1p => Log1p,
    sin => Sin, cos => Cos, tan => Tan, asin => Asin, acos => Acos, atan => Atan,
    sinh => Sinh, cosh => Cosh, tanh => Tanh, asinh => Asinh, acosh => Acosh, atanh => Atanh,
    floor => Floor, ceil => Ceil, round => Round, trunc => Trunc,
}

macro_rules! binary_methods {
    ($($method:ident => $op:ident),* $(,)?) => {
        impl<E: MatExpr> Ex<E>
        where
            E::Elem: RealElement,
        {
            $(
                pub fn $method<B: MatExpr<Elem = E::Elem>>(self, rhs: B) -> Ex<Binary<ops::$op, E, B>> {
                    Ex(Binary::new(self.0, rhs))
                }
            )*
        }
    };
}

binary_methods! {
    min => Min, max => Max, pow => Pow, hypot => Hypot, atan2 => Atan2,
}

macro_rules! compare_methods {
    ($($method:ident => $op:ident),* $(,)?) => {
        impl<E: MatExpr> Ex<E>
        where
            E::Elem: RealElement,
        {
            $(
                pub fn $method<B: MatExpr<Elem = E::Elem>>(self, rhs: B) -> Ex<Compare<ops::$op, E, B>> {
                    Ex(Compare::new(self.0, rhs))
                }
            )*
        }
    };
}

compare_methods! {
    cmp_eq => Eq, cmp_ne => Ne, cmp_lt => Lt, cmp_le => Le, cmp_gt => Gt, cmp_ge => Ge,
}

macro_rules! predicate_methods {
    ($($method:ident => $op:ident),* $(,)?) => {
        impl<E: MatExpr> Ex<E>
        where
            E::Elem: RealElement,
        {
            $(
                pub fn $method(self) -> Ex<Predicate<ops::$op, E>> {
                    Ex(Predicate::new(self.0))
                }
            )*
        }
    };
}

predicate_methods! {
    signbit => Signbit, is_nan => IsNan, is_inf => IsInf, is_finite => IsFinite,
}

impl<E: MatExpr<Elem = bool>> Ex<E> {
    /// `true` where both operands agree.
    pub fn eqv<B: MatExpr<Elem = bool>>(self, rhs: B) -> Ex<Logical<ops::Eqv, E, B>> {
        Ex(Logical::new(self.0, rhs))
    }

    /// `true` where the operands differ.
    pub fn neqv<B: MatExpr<Elem = bool>>(self, rhs: B) -> Ex<Logical<ops::Neqv, E, B>> {
        Ex(Logical::new(self.0, rhs))
    }
}

impl<E: MatExpr> Ex<E> {
    /// Converts every element to `U`.
    pub fn cast<U: CastFrom<E::Elem>>(self) -> Ex<Cast<U, E>> {
        Ex(Cast::new(self.0))
    }

    /// Pins compile-time dimensions; see [`Fixed`].
    pub fn fixed<const M: usize, const N: usize>(self) -> Ex<Fixed<E, M, N>> {
        Ex(Fixed::new(self.0))
    }

    /// Borrows the wrapped expression, so it can be evaluated more than once.
    pub fn by_ref(&self) -> Ex<&E> {
        Ex(&self.0)
    }
}

/// `cond ? a : b` element by element.
pub fn select<C, A, B>(cond: C, a: A, b: B) -> Ex<Select<C, A, B>>
where
    C: MatExpr<Elem = bool>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    Ex(Select::new(cond, a, b))
}

/// A scalar operand that adapts to any shape.
pub fn single<T: Element>(value: T) -> Ex<Single<T>> {
    Ex(Single::new(value))
}

/// A `rows x cols` matrix of `value`.
pub fn constant<T: Element>(value: T, rows: usize, cols: usize) -> Ex<ConstMatrix<T>> {
    Ex(ConstMatrix::new(value, rows, cols))
}

/// `row` repeated down every row.
pub fn rep_row<T: Element>(row: &[T]) -> Ex<RepRow<'_, T>> {
    Ex(RepRow::new(row))
}

/// `col` repeated across every column.
pub fn rep_col<T: Element>(col: &[T]) -> Ex<RepCol<'_, T>> {
    Ex(RepCol::new(col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DenseMatrix;

    fn read_all<E: MatExpr>(expr: &E) -> Vec<E::Elem> {
        let shape = expr.extent().unwrap().shape().unwrap();
        let reader = expr.reader(shape);
        (0..shape.nelems()).map(|i| unsafe { reader.scalar(i) }).collect()
    }

    #[test]
    fn test_operators_build_the_expected_tree() {
        let a = DenseMatrix::from_col_major(2, 2, vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let b = DenseMatrix::from_elem(2, 2, 2.0f32);

        assert_eq!(read_all(&(a.ex() + b.ex())), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(read_all(&(10.0f32 - a.ex())), vec![9.0, 8.0, 7.0, 6.0]);
        assert_eq!(read_all(&(a.ex() % 2.0f32)), vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(read_all(&(-a.ex()).abs()), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(read_all(&a.ex().max(b.ex())), vec![2.0, 2.0, 3.0, 4.0]);

        let mask = a.ex().cmp_gt(b.ex()) | a.ex().cmp_eq(single(1.0f32));
        assert_eq!(read_all(&mask), vec![true, false, true, true]);
        assert_eq!(read_all(&(!mask)), vec![false, true, false, false]);
        assert_eq!(read_all(&mask.cast::<f64>()), vec![1.0, 0.0, 1.0, 1.0]);

        let picked = select(mask, a.ex(), b.ex().sqr());
        assert_eq!(read_all(&picked), vec![1.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn test_predicates_and_boolean_equality() {
        let a = DenseMatrix::from_col_major(
            3,
            2,
            vec![-0.0f64, 1.0, f64::NAN, f64::NEG_INFINITY, -3.0, f64::INFINITY],
        )
        .unwrap();

        assert_eq!(read_all(&a.ex().signbit()), vec![true, false, false, true, true, false]);
        assert_eq!(read_all(&a.ex().is_nan()), vec![false, false, true, false, false, false]);
        assert_eq!(read_all(&a.ex().is_inf()), vec![false, false, false, true, false, true]);
        assert_eq!(read_all(&a.ex().is_finite()), vec![true, true, false, false, true, false]);

        let neg = a.ex().signbit();
        let small = a.ex().cmp_lt(single(0.5f64));
        assert_eq!(read_all(&neg.eqv(small)), vec![true, false, true, true, true, true]);
        assert_eq!(read_all(&neg.neqv(small)), vec![false, true, false, false, false, false]);
    }

    #[test]
    fn test_scalar_operand_needs_a_shape() {
        let lone = single(3.0f64) + 1.0f64;
        assert_eq!(lone.extent().unwrap(), Extent::ANY);
        let sized = lone + constant(0.0f64, 2, 5);
        assert_eq!(sized.extent().unwrap(), Extent::exact(2, 5));
    }

    #[test]
    fn test_compile_time_dimensions_propagate() {
        let a = DenseMatrix::<f64>::zeros(3, 4);
        let expr = a.ex().fixed::<3, DYN>() + a.ex().fixed::<DYN, 4>();
        fn dims<E: MatExpr>(_: &E) -> (usize, usize) {
            (E::CT_ROWS, E::CT_COLS)
        }
        assert_eq!(dims(&expr), (3, 4));
        assert_eq!(dims(&a.ex()), (DYN, DYN));
    }
}
