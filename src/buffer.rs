//! Fixed-capacity INT8 buffers and the bounds-checked views handed out over them.
//!
//! The engine owns every [`QuantizedBuffer`]; the pipeline only ever sees a
//! [`BufferView`] or [`BufferViewMut`] borrowed for the duration of one run.

use std::ops::Index;

/// Engine-owned INT8 storage whose capacity is fixed at allocation time.
#[derive(Debug, Clone)]
pub struct QuantizedBuffer {
    data: Box<[i8]>,
}

impl QuantizedBuffer {
    pub fn new(capacity: usize) -> Self {
        QuantizedBuffer {
            data: vec![0i8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn view(&self) -> BufferView<'_> {
        BufferView { data: &self.data }
    }

    pub fn view_mut(&mut self) -> BufferViewMut<'_> {
        BufferViewMut { data: &mut self.data }
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [i8] {
        &mut self.data
    }
}

/// Read-only, non-owning view of a [`QuantizedBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    data: &'a [i8],
}

impl<'a> BufferView<'a> {
    pub fn new(data: &'a [i8]) -> Self {
        BufferView { data }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, idx: usize) -> Option<i8> {
        self.data.get(idx).copied()
    }

    /// The first `len` values, or `None` if the view is shorter than that.
    pub fn prefix(&self, len: usize) -> Option<&'a [i8]> {
        self.data.get(..len)
    }

    pub fn as_slice(&self) -> &'a [i8] {
        self.data
    }
}

impl Index<usize> for BufferView<'_> {
    type Output = i8;

    fn index(&self, idx: usize) -> &i8 {
        &self.data[idx]
    }
}

/// Writable, non-owning view of a [`QuantizedBuffer`].
#[derive(Debug)]
pub struct BufferViewMut<'a> {
    data: &'a mut [i8],
}

impl<'a> BufferViewMut<'a> {
    pub fn new(data: &'a mut [i8]) -> Self {
        BufferViewMut { data }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Writes `val` at `idx`. Returns `false` without writing when `idx` is out of range.
    pub fn set(&mut self, idx: usize, val: i8) -> bool {
        match self.data.get_mut(idx) {
            Some(slot) => {
                *slot = val;
                true
            }
            None => false,
        }
    }

    pub fn prefix_mut(&mut self, len: usize) -> Option<&mut [i8]> {
        self.data.get_mut(..len)
    }

    pub fn as_mut_slice(&mut self) -> &mut [i8] {
        &mut *self.data
    }
}
