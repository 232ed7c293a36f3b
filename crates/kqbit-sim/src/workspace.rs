//! Scratch buffer pool for evaluation.

use num_complex::Complex64;

use crate::error::{SimError, SimResult};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Allocates a zeroed amplitude buffer without aborting on exhaustion.
pub(crate) fn zeroed(len: usize, purpose: &'static str) -> SimResult<Vec<Complex64>> {
    let mut buffer = Vec::new();
    reserve(&mut buffer, len, purpose)?;
    buffer.resize(len, ZERO);
    Ok(buffer)
}

fn reserve(buffer: &mut Vec<Complex64>, len: usize, purpose: &'static str) -> SimResult<()> {
    let additional = len.saturating_sub(buffer.len());
    buffer
        .try_reserve_exact(additional)
        .map_err(|_| SimError::AllocationFailed {
            purpose,
            bytes: len.saturating_mul(std::mem::size_of::<Complex64>()),
        })
}

/// A pool of amplitude buffers lent out during evaluation.
///
/// Products and tensors need intermediate vectors between factors. Buffers
/// are taken from the pool, filled, and given back, so a whole evaluation
/// reuses a handful of allocations.
#[derive(Debug, Default)]
pub struct Workspace {
    pool: Vec<Vec<Complex64>>,
    allocated: usize,
}

impl Workspace {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool pre-seeded with `count` buffers of `len` amplitudes.
    pub fn with_buffers(len: usize, count: usize) -> SimResult<Self> {
        let mut workspace = Self::new();
        let buffers = (0..count)
            .map(|_| workspace.take(len))
            .collect::<SimResult<Vec<_>>>()?;
        for buffer in buffers {
            workspace.give(buffer);
        }
        Ok(workspace)
    }

    /// Borrow a zeroed buffer of exactly `len` amplitudes.
    pub fn take(&mut self, len: usize) -> SimResult<Vec<Complex64>> {
        let mut buffer = match self.pool.pop() {
            Some(buffer) => buffer,
            None => {
                self.allocated += 1;
                Vec::new()
            }
        };
        buffer.clear();
        reserve(&mut buffer, len, "scratch buffer")?;
        buffer.resize(len, ZERO);
        Ok(buffer)
    }

    /// Return a buffer to the pool.
    pub fn give(&mut self, buffer: Vec<Complex64>) {
        if buffer.capacity() > 0 {
            self.pool.push(buffer);
        }
    }

    /// Number of distinct buffers this pool has created.
    pub fn buffers_allocated(&self) -> usize {
        self.allocated
    }

    /// Number of buffers currently waiting in the pool.
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_returns_zeroed_buffers() {
        let mut ws = Workspace::new();
        let mut buffer = ws.take(4).unwrap();
        buffer[2] = Complex64::new(3.0, 0.0);
        ws.give(buffer);

        let again = ws.take(4).unwrap();
        assert!(again.iter().all(|c| *c == ZERO));
        assert_eq!(ws.buffers_allocated(), 1);
    }

    #[test]
    fn test_pool_reuses_buffers() {
        let mut ws = Workspace::with_buffers(8, 2).unwrap();
        assert_eq!(ws.pooled(), 2);
        assert_eq!(ws.buffers_allocated(), 2);

        let a = ws.take(8).unwrap();
        let b = ws.take(8).unwrap();
        assert_eq!(ws.buffers_allocated(), 2);
        ws.give(a);
        ws.give(b);
        assert_eq!(ws.pooled(), 2);
    }

    #[test]
    fn test_oversized_request_fails_cleanly() {
        let mut ws = Workspace::new();
        let err = ws.take(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, SimError::AllocationFailed { .. }));
    }

    #[test]
    fn test_zeroed() {
        let buffer = zeroed(16, "test").unwrap();
        assert_eq!(buffer.len(), 16);
        assert!(zeroed(usize::MAX / 4, "test").is_err());
    }
}
