//! Growable single-stream sample buffer.

use super::grow_vec;
use crate::error::MixerResult;
use num_traits::Zero;
use std::ops::{Index, IndexMut};

/// A contiguous, growable run of samples.
///
/// Indexing past the end is redirected to index 0 instead of panicking, so a
/// stray index from a misconfigured block size reads (or overwrites) the first
/// sample. Use [`Buffer::get`] for checked access.
///
/// # Panics
///
/// Indexing an empty buffer panics, since there is no index 0 to fall back to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buffer<T> {
    data: Vec<T>,
}

impl<T: Copy + Zero> Buffer<T> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates a zero-filled buffer of `len` samples.
    pub fn with_len(len: usize) -> MixerResult<Self> {
        let mut buffer = Self::new();
        buffer.resize(len)?;
        Ok(buffer)
    }

    /// Sets the length to `len`, preserving the first `min(old, new)` samples.
    ///
    /// Storage only ever grows; shrinking keeps the allocation.
    pub fn resize(&mut self, len: usize) -> MixerResult<()> {
        grow_vec(&mut self.data, len, "buffer")
    }

    /// Zero-fills the buffer without changing its length.
    pub fn clear(&mut self) {
        self.data.fill(T::zero());
    }

    /// Replaces the contents with `samples`, resizing as needed.
    pub fn push(&mut self, samples: &[T]) -> MixerResult<()> {
        self.resize(samples.len())?;
        self.data.copy_from_slice(samples);
        Ok(())
    }

    /// Releases the storage.
    pub fn free(&mut self) {
        self.data = Vec::new();
    }

    /// Checked access.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable sample data.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn clamp_index(&self, index: usize) -> usize {
        if index < self.data.len() { index } else { 0 }
    }
}

impl<T: Copy + Zero> Index<usize> for Buffer<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the buffer is empty.
    fn index(&self, index: usize) -> &T {
        &self.data[self.clamp_index(index)]
    }
}

impl<T: Copy + Zero> IndexMut<usize> for Buffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let index = self.clamp_index(index);
        &mut self.data[index]
    }
}
