use std::fmt;

use super::Shape;

/// A 3D INT8 activation tensor (CHW layout) with a fixed backing allocation.
///
/// The backing vector is sized once; [`TensorI8::reshape`] reuses it, so activations
/// can be ping-ponged between two scratch tensors without reallocating.
#[derive(Clone)]
pub struct TensorI8 {
    pub c: usize,
    pub h: usize,
    pub w: usize,
    data: Vec<i8>,
}

impl TensorI8 {
    pub fn new(c: usize, h: usize, w: usize) -> Self {
        TensorI8 {
            c,
            h,
            w,
            data: vec![0i8; c * h * w],
        }
    }

    pub fn new1(c: usize) -> Self {
        Self::new(c, 1, 1)
    }

    /// An empty tensor that can later hold up to `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        TensorI8 {
            c: 0,
            h: 0,
            w: 0,
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn from_vec(shape: Shape, data: Vec<i8>) -> Option<Self> {
        if shape.checked_len()? != data.len() {
            return None;
        }
        Some(TensorI8 {
            c: shape.c,
            h: shape.h,
            w: shape.w,
            data,
        })
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.c, self.h, self.w)
    }

    /// Change the logical shape, zero-filling. Returns `false` when the new shape
    /// would not fit in the reserved capacity; the tensor is left untouched then.
    pub fn reshape(&mut self, shape: Shape) -> bool {
        let len = shape.len();
        if len > self.data.capacity() {
            return false;
        }
        self.data.clear();
        self.data.resize(len, 0);
        self.c = shape.c;
        self.h = shape.h;
        self.w = shape.w;
        true
    }

    pub fn get(&self, c: usize, h: usize, w: usize) -> i8 {
        self.data[c * self.h * self.w + h * self.w + w]
    }

    pub fn set(&mut self, c: usize, h: usize, w: usize, val: i8) {
        let idx = c * self.h * self.w + h * self.w + w;
        self.data[idx] = val;
    }

    pub fn fill(&mut self, val: i8) {
        self.data.fill(val);
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [i8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn memory_bytes(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Display for TensorI8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{} (i8)", self.c, self.h, self.w)
    }
}
