//! Lazy expression nodes and their readers.
//!
//! A node stores its operands and builds, on request, a reader that computes the
//! node's value from the operands' readers. The same reader type serves the flat
//! and the column-wise traversal: as a [`VecReader`] it wraps the operands' flat
//! readers, as a [`MultiColReader`] it wraps their column-wise readers and carries
//! their column states as a tuple.

use std::marker::PhantomData;

use crate::accessor::{AccessorHooks, MultiColReader, VecReader};
use crate::element::{CastFrom, MaskPack, PackOf, RealElement};
use crate::error::Result;
use crate::expr::ops::{BinaryFn, CmpFn, LogicFn, PredFn, UnaryFn};
use crate::expr::MatExpr;
use crate::shape::{Continuity, Extent, Shape, DYN};
use crate::simd::{BoolLanes, Real};

/// First known compile-time dimension of two operands.
pub(crate) const fn ct_dim(a: usize, b: usize) -> usize {
    if a != DYN {
        a
    } else {
        b
    }
}

// readers forward every lifecycle event to all of their operands
macro_rules! forward_hooks {
    (impl[$($gen:tt)*] $reader:ty => $($field:ident),+) => {
        impl<$($gen)*> AccessorHooks for $reader {
            #[inline(always)]
            fn begin_packs(&mut self) {
                $(self.$field.begin_packs();)+
            }

            #[inline(always)]
            fn done_pack(&mut self, i: usize) {
                $(self.$field.done_pack(i);)+
            }

            #[inline(always)]
            fn end_packs(&mut self) {
                $(self.$field.end_packs();)+
            }

            #[inline(always)]
            fn done_scalar(&mut self, i: usize) {
                $(self.$field.done_scalar(i);)+
            }

            #[inline(always)]
            fn finalize(&mut self) {
                $(AccessorHooks::finalize(&mut self.$field);)+
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════
// Unary
// ═══════════════════════════════════════════════════════════════════════

/// `Op(arg)` element by element.
#[derive(Debug, Clone, Copy)]
pub struct Unary<Op, A> {
    arg: A,
    _op: PhantomData<Op>,
}

impl<Op, A> Unary<Op, A> {
    pub fn new(arg: A) -> Self {
        Self {
            arg,
            _op: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryReader<Op, R> {
    inner: R,
    _op: PhantomData<Op>,
}

forward_hooks!(impl[Op, R: AccessorHooks] UnaryReader<Op, R> => inner);

impl<Op: UnaryFn, R: VecReader> VecReader for UnaryReader<Op, R>
where
    R::Value: RealElement,
{
    type Value = R::Value;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> R::Value {
        Op::apply(self.inner.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<R::Value> {
        Op::apply(self.inner.pack(i))
    }
}

impl<Op: UnaryFn, R: MultiColReader> MultiColReader for UnaryReader<Op, R>
where
    R::Value: RealElement,
{
    type Value = R::Value;
    type State = R::State;

    #[inline(always)]
    fn col_state(&self, j: usize) -> R::State {
        self.inner.col_state(j)
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, state: R::State) -> R::Value {
        Op::apply(self.inner.get(i, state))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, state: R::State) -> PackOf<R::Value> {
        Op::apply(self.inner.get_pack(i, state))
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.inner);
    }
}

impl<Op: UnaryFn, A: MatExpr> MatExpr for Unary<Op, A>
where
    A::Elem: RealElement,
{
    type Elem = A::Elem;
    type Reader = UnaryReader<Op, A::Reader>;
    type Cols = UnaryReader<Op, A::Cols>;

    const CT_ROWS: usize = A::CT_ROWS;
    const CT_COLS: usize = A::CT_COLS;
    const SIMD: bool = Op::NATIVE && A::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.arg.extent()
    }

    fn continuity(&self) -> Continuity {
        self.arg.continuity()
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        UnaryReader {
            inner: self.arg.reader(shape),
            _op: PhantomData,
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        UnaryReader {
            inner: self.arg.cols(shape),
            _op: PhantomData,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Binary
// ═══════════════════════════════════════════════════════════════════════

/// `Op(a, b)` element by element.
#[derive(Debug, Clone, Copy)]
pub struct Binary<Op, A, B> {
    a: A,
    b: B,
    _op: PhantomData<Op>,
}

impl<Op, A, B> Binary<Op, A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            _op: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryReader<Op, RA, RB> {
    a: RA,
    b: RB,
    _op: PhantomData<Op>,
}

forward_hooks!(impl[Op, RA: AccessorHooks, RB: AccessorHooks] BinaryReader<Op, RA, RB> => a, b);

impl<Op, RA, RB> VecReader for BinaryReader<Op, RA, RB>
where
    Op: BinaryFn,
    RA: VecReader,
    RB: VecReader<Value = RA::Value>,
    RA::Value: RealElement,
{
    type Value = RA::Value;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> RA::Value {
        Op::apply(self.a.scalar(i), self.b.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<RA::Value> {
        Op::apply(self.a.pack(i), self.b.pack(i))
    }
}

impl<Op, RA, RB> MultiColReader for BinaryReader<Op, RA, RB>
where
    Op: BinaryFn,
    RA: MultiColReader,
    RB: MultiColReader<Value = RA::Value>,
    RA::Value: RealElement,
{
    type Value = RA::Value;
    type State = (RA::State, RB::State);

    #[inline(always)]
    fn col_state(&self, j: usize) -> Self::State {
        (self.a.col_state(j), self.b.col_state(j))
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, (sa, sb): Self::State) -> RA::Value {
        Op::apply(self.a.get(i, sa), self.b.get(i, sb))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, (sa, sb): Self::State) -> PackOf<RA::Value> {
        Op::apply(self.a.get_pack(i, sa), self.b.get_pack(i, sb))
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.a);
        MultiColReader::finalize(&mut self.b);
    }
}

impl<Op, A, B> MatExpr for Binary<Op, A, B>
where
    Op: BinaryFn,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    type Elem = A::Elem;
    type Reader = BinaryReader<Op, A::Reader, B::Reader>;
    type Cols = BinaryReader<Op, A::Cols, B::Cols>;

    const CT_ROWS: usize = ct_dim(A::CT_ROWS, B::CT_ROWS);
    const CT_COLS: usize = ct_dim(A::CT_COLS, B::CT_COLS);
    const SIMD: bool = Op::NATIVE && A::SIMD && B::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.a.extent()?.unify(self.b.extent()?, Op::NAME)
    }

    fn continuity(&self) -> Continuity {
        self.a.continuity().min(self.b.continuity())
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        BinaryReader {
            a: self.a.reader(shape),
            b: self.b.reader(shape),
            _op: PhantomData,
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        BinaryReader {
            a: self.a.cols(shape),
            b: self.b.cols(shape),
            _op: PhantomData,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Compare
// ═══════════════════════════════════════════════════════════════════════

/// Boolean result of comparing `a` and `b` element by element.
#[derive(Debug, Clone, Copy)]
pub struct Compare<Op, A, B> {
    a: A,
    b: B,
    _op: PhantomData<Op>,
}

impl<Op, A, B> Compare<Op, A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            _op: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompareReader<Op, RA, RB> {
    a: RA,
    b: RB,
    _op: PhantomData<Op>,
}

forward_hooks!(impl[Op, RA: AccessorHooks, RB: AccessorHooks] CompareReader<Op, RA, RB> => a, b);

impl<Op, RA, RB> VecReader for CompareReader<Op, RA, RB>
where
    Op: CmpFn,
    RA: VecReader,
    RB: VecReader<Value = RA::Value>,
    RA::Value: RealElement,
{
    type Value = bool;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> bool {
        Op::apply(self.a.scalar(i), self.b.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> MaskPack {
        Op::apply(self.a.pack(i), self.b.pack(i)).cast_mask()
    }
}

impl<Op, RA, RB> MultiColReader for CompareReader<Op, RA, RB>
where
    Op: CmpFn,
    RA: MultiColReader,
    RB: MultiColReader<Value = RA::Value>,
    RA::Value: RealElement,
{
    type Value = bool;
    type State = (RA::State, RB::State);

    #[inline(always)]
    fn col_state(&self, j: usize) -> Self::State {
        (self.a.col_state(j), self.b.col_state(j))
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, (sa, sb): Self::State) -> bool {
        Op::apply(self.a.get(i, sa), self.b.get(i, sb))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, (sa, sb): Self::State) -> MaskPack {
        Op::apply(self.a.get_pack(i, sa), self.b.get_pack(i, sb)).cast_mask()
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.a);
        MultiColReader::finalize(&mut self.b);
    }
}

impl<Op, A, B> MatExpr for Compare<Op, A, B>
where
    Op: CmpFn,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    type Elem = bool;
    type Reader = CompareReader<Op, A::Reader, B::Reader>;
    type Cols = CompareReader<Op, A::Cols, B::Cols>;

    const CT_ROWS: usize = ct_dim(A::CT_ROWS, B::CT_ROWS);
    const CT_COLS: usize = ct_dim(A::CT_COLS, B::CT_COLS);
    const SIMD: bool = A::SIMD && B::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.a.extent()?.unify(self.b.extent()?, Op::NAME)
    }

    fn continuity(&self) -> Continuity {
        self.a.continuity().min(self.b.continuity())
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        CompareReader {
            a: self.a.reader(shape),
            b: self.b.reader(shape),
            _op: PhantomData,
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        CompareReader {
            a: self.a.cols(shape),
            b: self.b.cols(shape),
            _op: PhantomData,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Predicate
// ═══════════════════════════════════════════════════════════════════════

/// Boolean test of `arg` element by element (sign bit, NaN, infinity).
#[derive(Debug, Clone, Copy)]
pub struct Predicate<Op, A> {
    arg: A,
    _op: PhantomData<Op>,
}

impl<Op, A> Predicate<Op, A> {
    pub fn new(arg: A) -> Self {
        Self {
            arg,
            _op: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PredicateReader<Op, R> {
    inner: R,
    _op: PhantomData<Op>,
}

forward_hooks!(impl[Op, R: AccessorHooks] PredicateReader<Op, R> => inner);

impl<Op: PredFn, R: VecReader> VecReader for PredicateReader<Op, R>
where
    R::Value: RealElement,
{
    type Value = bool;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> bool {
        Op::apply(self.inner.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> MaskPack {
        Op::apply(self.inner.pack(i)).cast_mask()
    }
}

impl<Op: PredFn, R: MultiColReader> MultiColReader for PredicateReader<Op, R>
where
    R::Value: RealElement,
{
    type Value = bool;
    type State = R::State;

    #[inline(always)]
    fn col_state(&self, j: usize) -> R::State {
        self.inner.col_state(j)
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, state: R::State) -> bool {
        Op::apply(self.inner.get(i, state))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, state: R::State) -> MaskPack {
        Op::apply(self.inner.get_pack(i, state)).cast_mask()
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.inner);
    }
}

impl<Op: PredFn, A: MatExpr> MatExpr for Predicate<Op, A>
where
    A::Elem: RealElement,
{
    type Elem = bool;
    type Reader = PredicateReader<Op, A::Reader>;
    type Cols = PredicateReader<Op, A::Cols>;

    const CT_ROWS: usize = A::CT_ROWS;
    const CT_COLS: usize = A::CT_COLS;
    const SIMD: bool = A::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.arg.extent()
    }

    fn continuity(&self) -> Continuity {
        self.arg.continuity()
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        PredicateReader {
            inner: self.arg.reader(shape),
            _op: PhantomData,
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        PredicateReader {
            inner: self.arg.cols(shape),
            _op: PhantomData,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Logical
// ═══════════════════════════════════════════════════════════════════════

/// `Op(a, b)` over boolean operands.
#[derive(Debug, Clone, Copy)]
pub struct Logical<Op, A, B> {
    a: A,
    b: B,
    _op: PhantomData<Op>,
}

impl<Op, A, B> Logical<Op, A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            _op: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LogicalReader<Op, RA, RB> {
    a: RA,
    b: RB,
    _op: PhantomData<Op>,
}

forward_hooks!(impl[Op, RA: AccessorHooks, RB: AccessorHooks] LogicalReader<Op, RA, RB> => a, b);

impl<Op, RA, RB> VecReader for LogicalReader<Op, RA, RB>
where
    Op: LogicFn,
    RA: VecReader<Value = bool>,
    RB: VecReader<Value = bool>,
{
    type Value = bool;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> bool {
        Op::apply(self.a.scalar(i), self.b.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> MaskPack {
        Op::apply(self.a.pack(i), self.b.pack(i))
    }
}

impl<Op, RA, RB> MultiColReader for LogicalReader<Op, RA, RB>
where
    Op: LogicFn,
    RA: MultiColReader<Value = bool>,
    RB: MultiColReader<Value = bool>,
{
    type Value = bool;
    type State = (RA::State, RB::State);

    #[inline(always)]
    fn col_state(&self, j: usize) -> Self::State {
        (self.a.col_state(j), self.b.col_state(j))
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, (sa, sb): Self::State) -> bool {
        Op::apply(self.a.get(i, sa), self.b.get(i, sb))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, (sa, sb): Self::State) -> MaskPack {
        Op::apply(self.a.get_pack(i, sa), self.b.get_pack(i, sb))
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.a);
        MultiColReader::finalize(&mut self.b);
    }
}

impl<Op, A, B> MatExpr for Logical<Op, A, B>
where
    Op: LogicFn,
    A: MatExpr<Elem = bool>,
    B: MatExpr<Elem = bool>,
{
    type Elem = bool;
    type Reader = LogicalReader<Op, A::Reader, B::Reader>;
    type Cols = LogicalReader<Op, A::Cols, B::Cols>;

    const CT_ROWS: usize = ct_dim(A::CT_ROWS, B::CT_ROWS);
    const CT_COLS: usize = ct_dim(A::CT_COLS, B::CT_COLS);
    const SIMD: bool = A::SIMD && B::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.a.extent()?.unify(self.b.extent()?, Op::NAME)
    }

    fn continuity(&self) -> Continuity {
        self.a.continuity().min(self.b.continuity())
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        LogicalReader {
            a: self.a.reader(shape),
            b: self.b.reader(shape),
            _op: PhantomData,
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        LogicalReader {
            a: self.a.cols(shape),
            b: self.b.cols(shape),
            _op: PhantomData,
        }
    }
}

/// Boolean negation.
#[derive(Debug, Clone, Copy)]
pub struct Not<A> {
    arg: A,
}

impl<A> Not<A> {
    pub fn new(arg: A) -> Self {
        Self { arg }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NotReader<R> {
    inner: R,
}

forward_hooks!(impl[R: AccessorHooks] NotReader<R> => inner);

impl<R: VecReader<Value = bool>> VecReader for NotReader<R> {
    type Value = bool;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> bool {
        !self.inner.scalar(i)
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> MaskPack {
        !self.inner.pack(i)
    }
}

impl<R: MultiColReader<Value = bool>> MultiColReader for NotReader<R> {
    type Value = bool;
    type State = R::State;

    #[inline(always)]
    fn col_state(&self, j: usize) -> R::State {
        self.inner.col_state(j)
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, state: R::State) -> bool {
        !self.inner.get(i, state)
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, state: R::State) -> MaskPack {
        !self.inner.get_pack(i, state)
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.inner);
    }
}

impl<A: MatExpr<Elem = bool>> MatExpr for Not<A> {
    type Elem = bool;
    type Reader = NotReader<A::Reader>;
    type Cols = NotReader<A::Cols>;

    const CT_ROWS: usize = A::CT_ROWS;
    const CT_COLS: usize = A::CT_COLS;
    const SIMD: bool = A::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.arg.extent()
    }

    fn continuity(&self) -> Continuity {
        self.arg.continuity()
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        NotReader {
            inner: self.arg.reader(shape),
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        NotReader {
            inner: self.arg.cols(shape),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Select
// ═══════════════════════════════════════════════════════════════════════

/// `cond ? a : b` element by element. Both branches are evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Select<C, A, B> {
    cond: C,
    a: A,
    b: B,
}

impl<C, A, B> Select<C, A, B> {
    pub fn new(cond: C, a: A, b: B) -> Self {
        Self { cond, a, b }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectReader<RC, RA, RB> {
    cond: RC,
    a: RA,
    b: RB,
}

forward_hooks!(
    impl[RC: AccessorHooks, RA: AccessorHooks, RB: AccessorHooks] SelectReader<RC, RA, RB> => cond, a, b
);

impl<RC, RA, RB> VecReader for SelectReader<RC, RA, RB>
where
    RC: VecReader<Value = bool>,
    RA: VecReader,
    RB: VecReader<Value = RA::Value>,
    RA::Value: RealElement,
{
    type Value = RA::Value;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> RA::Value {
        <RA::Value as Real>::select(self.cond.scalar(i), self.a.scalar(i), self.b.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<RA::Value> {
        let mask = self.cond.pack(i).cast_mask();
        <PackOf<RA::Value> as Real>::select(mask, self.a.pack(i), self.b.pack(i))
    }
}

impl<RC, RA, RB> MultiColReader for SelectReader<RC, RA, RB>
where
    RC: MultiColReader<Value = bool>,
    RA: MultiColReader,
    RB: MultiColReader<Value = RA::Value>,
    RA::Value: RealElement,
{
    type Value = RA::Value;
    type State = (RC::State, RA::State, RB::State);

    #[inline(always)]
    fn col_state(&self, j: usize) -> Self::State {
        (
            self.cond.col_state(j),
            self.a.col_state(j),
            self.b.col_state(j),
        )
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, (sc, sa, sb): Self::State) -> RA::Value {
        <RA::Value as Real>::select(self.cond.get(i, sc), self.a.get(i, sa), self.b.get(i, sb))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, (sc, sa, sb): Self::State) -> PackOf<RA::Value> {
        let mask = self.cond.get_pack(i, sc).cast_mask();
        <PackOf<RA::Value> as Real>::select(mask, self.a.get_pack(i, sa), self.b.get_pack(i, sb))
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.cond);
        MultiColReader::finalize(&mut self.a);
        MultiColReader::finalize(&mut self.b);
    }
}

impl<C, A, B> MatExpr for Select<C, A, B>
where
    C: MatExpr<Elem = bool>,
    A: MatExpr,
    B: MatExpr<Elem = A::Elem>,
    A::Elem: RealElement,
{
    type Elem = A::Elem;
    type Reader = SelectReader<C::Reader, A::Reader, B::Reader>;
    type Cols = SelectReader<C::Cols, A::Cols, B::Cols>;

    const CT_ROWS: usize = ct_dim(C::CT_ROWS, ct_dim(A::CT_ROWS, B::CT_ROWS));
    const CT_COLS: usize = ct_dim(C::CT_COLS, ct_dim(A::CT_COLS, B::CT_COLS));
    const SIMD: bool = C::SIMD && A::SIMD && B::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.cond
            .extent()?
            .unify(self.a.extent()?, "select")?
            .unify(self.b.extent()?, "select")
    }

    fn continuity(&self) -> Continuity {
        self.cond
            .continuity()
            .min(self.a.continuity())
            .min(self.b.continuity())
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        SelectReader {
            cond: self.cond.reader(shape),
            a: self.a.reader(shape),
            b: self.b.reader(shape),
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        SelectReader {
            cond: self.cond.cols(shape),
            a: self.a.cols(shape),
            b: self.b.cols(shape),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Cast
// ═══════════════════════════════════════════════════════════════════════

/// Value conversion to `U`.
#[derive(Debug, Clone, Copy)]
pub struct Cast<U, A> {
    arg: A,
    _to: PhantomData<U>,
}

impl<U, A> Cast<U, A> {
    pub fn new(arg: A) -> Self {
        Self {
            arg,
            _to: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CastReader<U, R> {
    inner: R,
    _to: PhantomData<U>,
}

forward_hooks!(impl[U, R: AccessorHooks] CastReader<U, R> => inner);

impl<U: CastFrom<R::Value>, R: VecReader> VecReader for CastReader<U, R> {
    type Value = U;

    #[inline(always)]
    unsafe fn scalar(&self, i: usize) -> U {
        U::cast_scalar(self.inner.scalar(i))
    }

    #[inline(always)]
    unsafe fn pack(&self, i: usize) -> PackOf<U> {
        U::cast_pack(self.inner.pack(i))
    }
}

impl<U: CastFrom<R::Value>, R: MultiColReader> MultiColReader for CastReader<U, R> {
    type Value = U;
    type State = R::State;

    #[inline(always)]
    fn col_state(&self, j: usize) -> R::State {
        self.inner.col_state(j)
    }

    #[inline(always)]
    unsafe fn get(&self, i: usize, state: R::State) -> U {
        U::cast_scalar(self.inner.get(i, state))
    }

    #[inline(always)]
    unsafe fn get_pack(&self, i: usize, state: R::State) -> PackOf<U> {
        U::cast_pack(self.inner.get_pack(i, state))
    }

    #[inline(always)]
    fn finalize(&mut self) {
        MultiColReader::finalize(&mut self.inner);
    }
}

impl<U: CastFrom<A::Elem>, A: MatExpr> MatExpr for Cast<U, A> {
    type Elem = U;
    type Reader = CastReader<U, A::Reader>;
    type Cols = CastReader<U, A::Cols>;

    const CT_ROWS: usize = A::CT_ROWS;
    const CT_COLS: usize = A::CT_COLS;
    const SIMD: bool = A::SIMD;

    fn extent(&self) -> Result<Extent> {
        self.arg.extent()
    }

    fn continuity(&self) -> Continuity {
        self.arg.continuity()
    }

    fn reader(&self, shape: Shape) -> Self::Reader {
        CastReader {
            inner: self.arg.reader(shape),
            _to: PhantomData,
        }
    }

    fn cols(&self, shape: Shape) -> Self::Cols {
        CastReader {
            inner: self.arg.cols(shape),
            _to: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ops::{Add, Gt, Mul, Or, Sqrt};
    use crate::matrix::DenseMatrix;

    #[test]
    fn test_nodes_read_what_they_compute() {
        let a = DenseMatrix::from_fn(3, 2, |i, j| (i + 3 * j) as f64);
        let b = DenseMatrix::from_elem(3, 2, 2.0f64);
        let shape = Shape::new(3, 2);

        let sum = Binary::<Add, _, _>::new(a.view(), b.view());
        let root = Unary::<Sqrt, _>::new(Binary::<Mul, _, _>::new(a.view(), b.view()));
        let big = Compare::<Gt, _, _>::new(a.view(), b.view());
        let either = Logical::<Or, _, _>::new(big, Not::new(big));
        let flag = Cast::<f32, _>::new(big);

        unsafe {
            assert_eq!(sum.reader(shape).scalar(4), 6.0);
            assert_eq!(root.reader(shape).scalar(2), 2.0);
            assert!(big.reader(shape).scalar(3));
            assert!(!big.cols(shape).col(0).scalar(1));
            assert!(either.reader(shape).scalar(0));
            assert_eq!(flag.cols(shape).col(1).scalar(0), 1.0);
        }
    }

    #[test]
    fn test_extent_conflicts_name_the_operation() {
        let a = DenseMatrix::<f32>::zeros(2, 2);
        let b = DenseMatrix::<f32>::zeros(2, 3);
        let err = Binary::<Add, _, _>::new(a.view(), b.view())
            .extent()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::MatError::DimensionMismatch { operation: "add", .. }
        ));
    }

    #[test]
    fn test_simd_flag_follows_operands() {
        type Native<'a> = Binary<Add, crate::matrix::MatRef<'a, f32>, crate::matrix::MatRef<'a, f32>>;
        type Emulated<'a> = Unary<crate::expr::ops::Exp, Native<'a>>;
        assert!(<Native<'static> as MatExpr>::SIMD);
        assert!(!<Emulated<'static> as MatExpr>::SIMD);
    }
}
