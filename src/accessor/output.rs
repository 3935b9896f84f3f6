//! Writers into memory.
//!
//! A packed slot cannot alias unaligned element memory, so writers keep one pack
//! of scratch space: `pack(i)` hands it out (loaded first in [`Update`] mode) and
//! `done_pack(i)` stores it back. Scalar slots point straight into the destination.

use std::marker::PhantomData;

use super::{AccessorHooks, MultiColWriter, VecWriter};
use crate::element::{Element, PackOf};
use crate::simd::Packed;

/// Whether a writer reads the destination before handing out a slot.
pub trait WriteMode: Copy + Default + 'static {
    const LOAD: bool;
}

/// Output only: slots start with unspecified contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assign;

/// In-out: slots start with the current destination value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Update;

impl WriteMode for Assign {
    const LOAD: bool = false;
}

impl WriteMode for Update {
    const LOAD: bool = true;
}

/// Flat writer over consecutive elements.
pub struct ContWriter<T: Element, M> {
    ptr: *mut T,
    temp: PackOf<T>,
    _mode: PhantomData<M>,
}

impl<T: Element, M: WriteMode> ContWriter<T, M> {
    /// # Safety
    ///
    /// `ptr` must stay valid for every index later written.
    #[inline(always)]
    pub unsafe fn new(ptr: *mut T) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            ptr,
            temp: <PackOf<T>>::splat(T::default()),
            _mode: PhantomData,
        }
    }
}

impl<T: Element, M: WriteMode> AccessorHooks for ContWriter<T, M> {
    #[inline(always)]
    fn done_pack(&mut self, i: usize) {
        unsafe { self.temp.store(self.ptr.add(i)) }
    }
}

impl<T: Element, M: WriteMode> VecWriter for ContWriter<T, M> {
    type Slot = T;
    type PackSlot = PackOf<T>;

    #[inline(always)]
    unsafe fn scalar(&mut self, i: usize) -> &mut T {
        &mut *self.ptr.add(i)
    }

    #[inline(always)]
    unsafe fn pack(&mut self, i: usize) -> &mut PackOf<T> {
        if M::LOAD {
            self.temp = <PackOf<T>>::load(self.ptr.add(i));
        }
        &mut self.temp
    }
}

/// Flat writer over elements `step` apart.
pub struct StepWriter<T: Element, M> {
    ptr: *mut T,
    step: isize,
    temp: PackOf<T>,
    _mode: PhantomData<M>,
}

impl<T: Element, M: WriteMode> StepWriter<T, M> {
    /// # Safety
    ///
    /// `ptr.offset(i * step)` must stay valid for every index later written.
    #[inline(always)]
    pub unsafe fn new(ptr: *mut T, step: isize) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            ptr,
            step,
            temp: <PackOf<T>>::splat(T::default()),
            _mode: PhantomData,
        }
    }
}

impl<T: Element, M: WriteMode> AccessorHooks for StepWriter<T, M> {
    #[inline(always)]
    fn done_pack(&mut self, i: usize) {
        unsafe {
            let start = self.ptr.offset(i as isize * self.step);
            if self.step == 1 {
                self.temp.store(start)
            } else {
                self.temp.scatter(start, self.step)
            }
        }
    }
}

impl<T: Element, M: WriteMode> VecWriter for StepWriter<T, M> {
    type Slot = T;
    type PackSlot = PackOf<T>;

    #[inline(always)]
    unsafe fn scalar(&mut self, i: usize) -> &mut T {
        &mut *self.ptr.offset(i as isize * self.step)
    }

    #[inline(always)]
    unsafe fn pack(&mut self, i: usize) -> &mut PackOf<T> {
        if M::LOAD {
            let start = self.ptr.offset(i as isize * self.step);
            self.temp = if self.step == 1 {
                <PackOf<T>>::load(start)
            } else {
                <PackOf<T>>::gather(start, self.step)
            };
        }
        &mut self.temp
    }
}

/// Column-wise writer of row-contiguous storage.
///
/// A lead of zero makes every column the same one: the destination is accessed
/// under the broadcast-column tag, which is how row-wise reductions accumulate.
pub struct ColsWriter<T, M> {
    ptr: *mut T,
    lead: usize,
    _mode: PhantomData<M>,
}

impl<T: Element, M: WriteMode> ColsWriter<T, M> {
    /// # Safety
    ///
    /// `ptr + j * lead + i` must be valid for every `(i, j)` later written.
    #[inline(always)]
    pub unsafe fn new(ptr: *mut T, lead: usize) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            ptr,
            lead,
            _mode: PhantomData,
        }
    }

    /// Writer that presents one column for every column index.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for one column of writes.
    #[inline(always)]
    pub unsafe fn broadcast_col(ptr: *mut T) -> Self {
        Self::new(ptr, 0)
    }
}

impl<T: Element, M: WriteMode> MultiColWriter for ColsWriter<T, M> {
    type Slot = T;
    type PackSlot = PackOf<T>;
    type Col = ContWriter<T, M>;

    #[inline(always)]
    fn col(&mut self, j: usize) -> ContWriter<T, M> {
        unsafe { ContWriter::new(self.ptr.wrapping_add(j * self.lead)) }
    }
}

/// Column-wise writer over arbitrary signed strides.
pub struct StridedColsWriter<T, M> {
    ptr: *mut T,
    row_stride: isize,
    col_stride: isize,
    _mode: PhantomData<M>,
}

impl<T: Element, M: WriteMode> StridedColsWriter<T, M> {
    /// # Safety
    ///
    /// `ptr.offset(i * row_stride + j * col_stride)` must be valid for every
    /// `(i, j)` later written.
    #[inline(always)]
    pub unsafe fn new(ptr: *mut T, row_stride: isize, col_stride: isize) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            ptr,
            row_stride,
            col_stride,
            _mode: PhantomData,
        }
    }
}

impl<T: Element, M: WriteMode> MultiColWriter for StridedColsWriter<T, M> {
    type Slot = T;
    type PackSlot = PackOf<T>;
    type Col = StepWriter<T, M>;

    #[inline(always)]
    fn col(&mut self, j: usize) -> StepWriter<T, M> {
        let start = self.ptr.wrapping_offset(j as isize * self.col_stride);
        unsafe { StepWriter::new(start, self.row_stride) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::WIDTH;

    #[test]
    fn test_pack_slot_is_flushed_on_done_pack() {
        let mut data = vec![0.0f32; WIDTH];
        let mut writer = unsafe { ContWriter::<f32, Assign>::new(data.as_mut_ptr()) };
        unsafe { *writer.pack(0) = <PackOf<f32>>::splat(2.0) };
        assert_eq!(data, vec![0.0; WIDTH]);
        writer.done_pack(0);
        assert_eq!(data, vec![2.0; WIDTH]);
    }

    #[test]
    fn test_update_mode_loads_current_values() {
        let mut data: Vec<f64> = (0..2 * WIDTH).map(|v| v as f64).collect();
        let mut writer = unsafe { StepWriter::<f64, Update>::new(data.as_mut_ptr(), 2) };
        unsafe {
            let slot = writer.pack(0);
            *slot = *slot + <PackOf<f64>>::splat(0.5);
        }
        writer.done_pack(0);
        for (k, v) in data.iter().enumerate() {
            let expected = if k % 2 == 0 { k as f64 + 0.5 } else { k as f64 };
            assert_eq!(*v, expected);
        }
    }

    #[test]
    fn test_broadcast_col_writer_repeats_column() {
        let mut data = vec![0.0f64; 3];
        let mut writer = unsafe { ColsWriter::<f64, Update>::broadcast_col(data.as_mut_ptr()) };
        for j in 0..4 {
            let mut col = writer.col(j);
            for i in 0..3 {
                unsafe { *col.scalar(i) += (i + j) as f64 };
            }
        }
        assert_eq!(data, vec![6.0, 10.0, 14.0]);
    }
}
