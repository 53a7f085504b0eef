//! Ring of fixed-size slots rendered ahead of the consumer.

use super::Buffer;
use crate::error::{MixerError, MixerResult};
use num_traits::Zero;

/// A fixed count of fixed-size slots with separate write and read cursors.
///
/// The producer fills one whole slot with [`RingBuffer::push_buffer`] and then
/// moves the write cursor with [`RingBuffer::next_buffer`]. The consumer drains
/// samples with [`RingBuffer::read_data`], which never blocks and never reads
/// past the slots that hold data.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Buffer<T>>,
    buffers_size: usize,
    buffers_left: usize,
    write_index: usize,
    read_index: usize,
    buffer_position: usize,
}

impl<T: Copy + Zero> Default for RingBuffer<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            buffers_size: 0,
            buffers_left: 0,
            write_index: 0,
            read_index: 0,
            buffer_position: 0,
        }
    }
}

impl<T: Copy + Zero> RingBuffer<T> {
    /// Creates a ring of `count` slots holding `size` samples each.
    pub fn new(count: usize, size: usize) -> MixerResult<Self> {
        let mut ring = Self::default();
        ring.set_buffers_count(count)?;
        ring.resize(size)?;
        Ok(ring)
    }

    /// Sets the number of slots. Pending data is discarded when the count changes.
    pub fn set_buffers_count(&mut self, count: usize) -> MixerResult<()> {
        if count == self.slots.len() {
            return Ok(());
        }
        self.slots
            .try_reserve_exact(count.saturating_sub(self.slots.len()))
            .map_err(|e| MixerError::allocation("ring buffer", e.to_string()))?;
        self.slots.resize_with(count, Buffer::new);
        for slot in &mut self.slots {
            slot.resize(self.buffers_size)?;
        }
        self.reset();
        Ok(())
    }

    /// Sets the slot size in samples. Pending data is discarded when the size changes.
    pub fn resize(&mut self, size: usize) -> MixerResult<()> {
        if size == self.buffers_size {
            return Ok(());
        }
        for slot in &mut self.slots {
            slot.resize(size)?;
        }
        self.buffers_size = size;
        self.reset();
        Ok(())
    }

    /// Drops all pending data and rewinds both cursors.
    pub fn reset(&mut self) {
        self.buffers_left = 0;
        self.write_index = 0;
        self.read_index = 0;
        self.buffer_position = 0;
    }

    /// Copies one slot's worth of samples into the slot under the write cursor.
    ///
    /// Short input is zero-padded; excess input is ignored. Fails without
    /// touching any slot when every slot already holds unread data.
    pub fn push_buffer(&mut self, data: &[T]) -> MixerResult<()> {
        if self.slots.is_empty() {
            return Err(MixerError::invalid_parameter("ring buffer", "no slots allocated"));
        }
        if self.buffers_left >= self.slots.len() {
            return Err(MixerError::buffer_overrun(format!(
                "all {} slots hold unread data",
                self.slots.len()
            )));
        }
        let slot = self.slots[self.write_index].as_mut_slice();
        let count = data.len().min(slot.len());
        slot[..count].copy_from_slice(&data[..count]);
        slot[count..].fill(T::zero());
        self.buffers_left += 1;
        Ok(())
    }

    /// Advances the write cursor to the next slot.
    pub fn next_buffer(&mut self) {
        if !self.slots.is_empty() {
            self.write_index = (self.write_index + 1) % self.slots.len();
        }
    }

    /// Drains up to `out.len()` samples, returning how many were copied.
    pub fn read_data(&mut self, out: &mut [T]) -> usize {
        let mut written = 0;
        while written < out.len() && self.buffers_left > 0 {
            let slot = self.slots[self.read_index].as_slice();
            let count = (self.buffers_size - self.buffer_position).min(out.len() - written);
            out[written..written + count]
                .copy_from_slice(&slot[self.buffer_position..self.buffer_position + count]);
            written += count;
            self.buffer_position += count;

            if self.buffer_position >= self.buffers_size {
                self.buffer_position = 0;
                self.read_index = (self.read_index + 1) % self.slots.len();
                self.buffers_left -= 1;
            }
        }
        written
    }

    /// Slots holding unread data.
    pub const fn left_buffers(&self) -> usize {
        self.buffers_left
    }

    /// Unread samples across all pending slots.
    pub const fn left_samples(&self) -> usize {
        self.buffers_left * self.buffers_size - self.buffer_position
    }

    /// Number of slots.
    pub fn buffers_count(&self) -> usize {
        self.slots.len()
    }

    /// Samples per slot.
    pub const fn buffers_size(&self) -> usize {
        self.buffers_size
    }

    /// Index of the slot the next push writes to.
    pub const fn write_cursor(&self) -> usize {
        self.write_index
    }

    /// Read offset within the current slot.
    pub const fn buffer_position(&self) -> usize {
        self.buffer_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_ring(count: usize, size: usize) -> RingBuffer<f32> {
        let mut ring = RingBuffer::new(count, size).unwrap();
        for slot in 0..count {
            let data: Vec<f32> = (0..size).map(|i| (slot * size + i) as f32).collect();
            ring.push_buffer(&data).unwrap();
            ring.next_buffer();
        }
        ring
    }

    #[test]
    fn test_read_across_slot_boundaries_conserves_samples() {
        let mut ring = filled_ring(2, 8);
        assert_eq!(ring.left_buffers(), 2);
        assert_eq!(ring.left_samples(), 16);

        let mut collected = Vec::new();
        let mut chunk = [0.0f32; 3];
        loop {
            let read = ring.read_data(&mut chunk);
            collected.extend_from_slice(&chunk[..read]);
            if read < chunk.len() {
                break;
            }
        }

        let expected: Vec<f32> = (0..16).map(|i| i as f32).collect();
        assert_eq!(collected, expected);
        assert_eq!(ring.left_buffers(), 0);
        assert_eq!(ring.left_samples(), 0);
    }

    #[test]
    fn test_short_read_never_exceeds_available() {
        let mut ring = RingBuffer::<f32>::new(2, 4).unwrap();
        ring.push_buffer(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        ring.next_buffer();

        let mut out = [0.0f32; 10];
        assert_eq!(ring.read_data(&mut out), 4);
        assert_eq!(&out[..4], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ring.read_data(&mut out), 0);
    }

    #[test]
    fn test_left_samples_decreases_monotonically() {
        let mut ring = filled_ring(3, 5);
        let mut previous = ring.left_samples();
        let mut out = [0.0f32; 2];
        while ring.read_data(&mut out) > 0 {
            let current = ring.left_samples();
            assert!(current < previous);
            previous = current;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_push_fails_when_full_without_moving_cursor() {
        let mut ring = filled_ring(2, 4);
        let cursor = ring.write_cursor();
        assert!(ring.push_buffer(&[9.0; 4]).is_err());
        assert_eq!(ring.write_cursor(), cursor);
        assert_eq!(ring.left_buffers(), 2);

        let mut out = [0.0f32; 4];
        ring.read_data(&mut out);
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_short_push_is_zero_padded() {
        let mut ring = RingBuffer::<i16>::new(1, 4).unwrap();
        ring.push_buffer(&[7, 7]).unwrap();
        let mut out = [1i16; 4];
        assert_eq!(ring.read_data(&mut out), 4);
        assert_eq!(out, [7, 7, 0, 0]);
    }

    #[test]
    fn test_reconfigure_discards_pending() {
        let mut ring = filled_ring(2, 4);
        ring.resize(8).unwrap();
        assert_eq!(ring.left_buffers(), 0);
        assert_eq!(ring.buffers_size(), 8);

        ring.set_buffers_count(3).unwrap();
        assert_eq!(ring.buffers_count(), 3);
        assert_eq!(ring.left_samples(), 0);
    }
}
