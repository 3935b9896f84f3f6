//! Evaluation drivers: the loops that walk a run or a shape through accessors.
//!
//! # Traversal Order
//!
//! Elements are visited in strictly increasing flat index. The SIMD driver covers the
//! largest multiple of [`WIDTH`] with packs first and finishes the remainder one
//! element at a time. The per-column drivers visit columns left to right and each
//! column top to bottom. Reductions rely on this order to be reproducible.
//!
//! # Performance Characteristics
//!
//! - The hooks of non-buffering accessors are empty and inline away
//! - Column state is computed once per column, never per element

use crate::accessor::{MultiColReader, MultiColWriter, VecReader, VecWriter};
use crate::element::PackOf;
use crate::eval::kernel::Kernel;
use crate::shape::Shape;
use crate::simd::WIDTH;

/// Scalar pass over `len` elements.
///
/// # Safety
///
/// `input` and `output` must be valid for every index in `0..len`.
pub unsafe fn linear_eval<R, W, K>(len: usize, kernel: &K, input: &mut R, output: &mut W)
where
    R: VecReader,
    W: VecWriter,
    K: Kernel<R::Value, W::Slot>,
{
    log::trace!("linear scalar pass: {len} elements");

    for i in 0..len {
        kernel.apply(output.scalar(i), input.scalar(i));
        input.done_scalar(i);
        output.done_scalar(i);
    }

    input.finalize();
    output.finalize();
}

/// Packed pass over `len` elements with a scalar tail.
///
/// # Safety
///
/// `input` and `output` must be valid for every index in `0..len`.
pub unsafe fn linear_eval_simd<R, W, K>(len: usize, kernel: &K, input: &mut R, output: &mut W)
where
    R: VecReader,
    W: VecWriter,
    K: Kernel<R::Value, W::Slot> + Kernel<PackOf<R::Value>, W::PackSlot>,
{
    let maj_len = len - len % WIDTH;
    log::trace!("linear simd pass: {maj_len} packed + {} tail elements", len - maj_len);

    if maj_len > 0 {
        input.begin_packs();
        output.begin_packs();

        let mut i = 0;
        while i < maj_len {
            <K as Kernel<PackOf<R::Value>, W::PackSlot>>::apply(
                kernel,
                output.pack(i),
                input.pack(i),
            );
            input.done_pack(i);
            output.done_pack(i);
            i += WIDTH;
        }

        input.end_packs();
        output.end_packs();
    }

    for i in maj_len..len {
        <K as Kernel<R::Value, W::Slot>>::apply(kernel, output.scalar(i), input.scalar(i));
        input.done_scalar(i);
        output.done_scalar(i);
    }

    input.finalize();
    output.finalize();
}

/// Scalar pass over every column of `shape`.
///
/// # Safety
///
/// `input` and `output` must be valid for every `(i, j)` inside `shape`.
pub unsafe fn percol_eval<R, W, K>(shape: Shape, kernel: &K, input: &mut R, output: &mut W)
where
    R: MultiColReader,
    W: MultiColWriter,
    K: Kernel<R::Value, W::Slot>,
{
    log::trace!("per-column scalar pass: {shape}");

    for j in 0..shape.cols {
        let mut column_in = input.col(j);
        let mut column_out = output.col(j);
        linear_eval(shape.rows, kernel, &mut column_in, &mut column_out);
    }

    input.finalize();
    output.finalize();
}

/// Packed pass over every column of `shape`.
///
/// # Safety
///
/// `input` and `output` must be valid for every `(i, j)` inside `shape`.
pub unsafe fn percol_eval_simd<R, W, K>(shape: Shape, kernel: &K, input: &mut R, output: &mut W)
where
    R: MultiColReader,
    W: MultiColWriter,
    K: Kernel<R::Value, W::Slot> + Kernel<PackOf<R::Value>, W::PackSlot>,
{
    log::trace!("per-column simd pass: {shape}");

    for j in 0..shape.cols {
        let mut column_in = input.col(j);
        let mut column_out = output.col(j);
        linear_eval_simd(shape.rows, kernel, &mut column_in, &mut column_out);
    }

    input.finalize();
    output.finalize();
}
