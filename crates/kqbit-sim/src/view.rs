//! Strided windows into amplitude buffers.
//!
//! A view of length `len` over `data` addresses `data[offset + k * stride]`
//! for `k < len`. Sub-views ("fibers") compose offsets and strides, so the
//! evaluator can hand a tensor factor exactly the amplitudes it acts on
//! without copying.
//!
//! Input views are shared borrows and output views are exclusive borrows, so
//! an evaluation can never read from the buffer it is writing.

use num_complex::Complex64;

/// Read-only strided view.
#[derive(Debug, Clone, Copy)]
pub struct StridedView<'a> {
    data: &'a [Complex64],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a> StridedView<'a> {
    /// Contiguous view of a whole buffer.
    pub fn new(data: &'a [Complex64]) -> Self {
        Self {
            data,
            offset: 0,
            stride: 1,
            len: data.len(),
        }
    }

    /// Number of addressable elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view addresses nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element `k`.
    #[inline]
    pub fn get(&self, k: usize) -> Complex64 {
        debug_assert!(k < self.len, "index {k} out of view of length {}", self.len);
        self.data[self.offset + k * self.stride]
    }

    /// The sub-view `self[base + j * stride]` for `j < len`.
    #[inline]
    pub fn fiber(&self, base: usize, stride: usize, len: usize) -> StridedView<'a> {
        debug_assert!(len == 0 || base + (len - 1) * stride < self.len);
        StridedView {
            data: self.data,
            offset: self.offset + base * self.stride,
            stride: self.stride * stride,
            len,
        }
    }

    /// Iterate over the addressed elements.
    pub fn iter(&self) -> impl Iterator<Item = Complex64> + '_ {
        (0..self.len).map(move |k| self.get(k))
    }
}

/// Exclusive strided view.
#[derive(Debug)]
pub struct StridedViewMut<'a> {
    data: &'a mut [Complex64],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a> StridedViewMut<'a> {
    /// Contiguous view of a whole buffer.
    pub fn new(data: &'a mut [Complex64]) -> Self {
        let len = data.len();
        Self {
            data,
            offset: 0,
            stride: 1,
            len,
        }
    }

    /// Number of addressable elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view addresses nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn index(&self, k: usize) -> usize {
        debug_assert!(k < self.len, "index {k} out of view of length {}", self.len);
        self.offset + k * self.stride
    }

    /// Element `k`.
    #[inline]
    pub fn get(&self, k: usize) -> Complex64 {
        self.data[self.index(k)]
    }

    /// Overwrite element `k`.
    #[inline]
    pub fn set(&mut self, k: usize, value: Complex64) {
        let i = self.index(k);
        self.data[i] = value;
    }

    /// Add `value` to element `k`.
    #[inline]
    pub fn add(&mut self, k: usize, value: Complex64) {
        let i = self.index(k);
        self.data[i] += value;
    }

    /// Set or accumulate element `k`.
    #[inline]
    pub fn write(&mut self, k: usize, value: Complex64, accumulate: bool) {
        if accumulate {
            self.add(k, value);
        } else {
            self.set(k, value);
        }
    }

    /// Overwrite every addressed element.
    pub fn fill(&mut self, value: Complex64) {
        for k in 0..self.len {
            self.set(k, value);
        }
    }

    /// A shorter-lived view of the same elements.
    #[inline]
    pub fn reborrow(&mut self) -> StridedViewMut<'_> {
        StridedViewMut {
            data: &mut *self.data,
            offset: self.offset,
            stride: self.stride,
            len: self.len,
        }
    }

    /// The exclusive sub-view `self[base + j * stride]` for `j < len`.
    #[inline]
    pub fn fiber_mut(&mut self, base: usize, stride: usize, len: usize) -> StridedViewMut<'_> {
        debug_assert!(len == 0 || base + (len - 1) * stride < self.len);
        StridedViewMut {
            data: &mut *self.data,
            offset: self.offset + base * self.stride,
            stride: self.stride * stride,
            len,
        }
    }

    /// Read-only view of the same elements.
    pub fn as_view(&self) -> StridedView<'_> {
        StridedView {
            data: &*self.data,
            offset: self.offset,
            stride: self.stride,
            len: self.len,
        }
    }
}
