//! Per-channel (planar) sample storage.

use super::grow_vec;
use crate::error::MixerResult;
use num_traits::Zero;
use std::ops::{Index, IndexMut};

/// N channel buffers of equal length.
///
/// Effects and emitters always see audio in this layout, never interleaved.
/// [`PlanarBuffer::resize`] only grows, so a buffer sized for the largest block
/// can be reused for smaller ones without reallocating on the audio thread.
///
/// Indexing by channel redirects an out-of-range channel to channel 0. Use
/// [`PlanarBuffer::channel`] for checked access.
///
/// # Panics
///
/// Indexing a buffer with no channels panics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanarBuffer<T> {
    channels: Vec<Vec<T>>,
    frames: usize,
}

impl<T: Copy + Zero> PlanarBuffer<T> {
    /// Creates a buffer with no channels.
    pub const fn new() -> Self {
        Self {
            channels: Vec::new(),
            frames: 0,
        }
    }

    /// Creates a zero-filled buffer of `channels` x `frames`.
    pub fn with_shape(channels: usize, frames: usize) -> MixerResult<Self> {
        let mut buffer = Self::new();
        buffer.resize(channels, frames)?;
        Ok(buffer)
    }

    /// Builds a buffer from owned channel data, padding short channels with zeros.
    pub fn from_channels(channels: Vec<Vec<T>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        let channels = channels
            .into_iter()
            .map(|mut channel| {
                channel.resize(frames, T::zero());
                channel
            })
            .collect();
        Self { channels, frames }
    }

    /// Grows to at least `channels` x `frames`. Never shrinks either dimension.
    pub fn resize(&mut self, channels: usize, frames: usize) -> MixerResult<()> {
        let frames = frames.max(self.frames);
        if channels > self.channels.len() {
            self.channels
                .try_reserve_exact(channels - self.channels.len())
                .map_err(|e| crate::MixerError::allocation("planar buffer", e.to_string()))?;
            self.channels.resize_with(channels, Vec::new);
        }
        for channel in &mut self.channels {
            grow_vec(channel, frames, "planar buffer")?;
        }
        self.frames = frames;
        Ok(())
    }

    /// Zero-fills every channel.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(T::zero());
        }
    }

    /// Zero-fills `frames` frames of every channel starting at `offset`.
    pub fn clear_range(&mut self, offset: usize, frames: usize) {
        for channel in &mut self.channels {
            let start = offset.min(channel.len());
            let end = (offset + frames).min(channel.len());
            channel[start..end].fill(T::zero());
        }
    }

    /// Deinterleaves `frames` frames of `data` (with `channels` channels) into
    /// this buffer, growing it as needed.
    pub fn push_interleaved(
        &mut self,
        data: &[T],
        frames: usize,
        channels: usize,
    ) -> MixerResult<()> {
        self.resize(channels, frames)?;
        super::interleaved_to_planar(data, self, frames, channels);
        Ok(())
    }

    /// Copies the same mono signal into every channel.
    pub fn push_mono(&mut self, data: &[T]) -> MixerResult<()> {
        let channels = self.channels.len().max(1);
        self.resize(channels, data.len())?;
        for channel in &mut self.channels {
            channel[..data.len()].copy_from_slice(data);
        }
        Ok(())
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// One channel's samples, or `None` if out of range.
    pub fn channel(&self, index: usize) -> Option<&[T]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// One channel's samples, mutably.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [T]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }

    /// All channels.
    pub fn channels(&self) -> &[Vec<T>] {
        &self.channels
    }

    /// All channels, mutably.
    pub fn channels_mut(&mut self) -> &mut [Vec<T>] {
        &mut self.channels
    }

    /// Sample at `frame` of `channel`, with both indices clamped to 0 when out
    /// of range.
    ///
    /// # Panics
    ///
    /// Panics if the buffer has no channels or no frames.
    pub fn frame(&self, channel: usize, frame: usize) -> T {
        let data = &self[channel];
        if frame < data.len() { data[frame] } else { data[0] }
    }

    fn clamp_channel(&self, channel: usize) -> usize {
        if channel < self.channels.len() { channel } else { 0 }
    }
}

impl<T: Copy + Zero> Index<usize> for PlanarBuffer<T> {
    type Output = [T];

    fn index(&self, channel: usize) -> &[T] {
        &self.channels[self.clamp_channel(channel)]
    }
}

impl<T: Copy + Zero> IndexMut<usize> for PlanarBuffer<T> {
    fn index_mut(&mut self, channel: usize) -> &mut [T] {
        let channel = self.clamp_channel(channel);
        &mut self.channels[channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_only_grows() {
        let mut buffer = PlanarBuffer::<f32>::with_shape(2, 8).unwrap();
        buffer[1][7] = 1.0;

        buffer.resize(1, 4).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 8);
        assert_eq!(buffer[1][7], 1.0);

        buffer.resize(4, 16).unwrap();
        assert_eq!(buffer.channel_count(), 4);
        assert_eq!(buffer.frames(), 16);
        assert_eq!(buffer[1][7], 1.0);
        assert!(buffer.channels().iter().all(|c| c.len() == 16));
    }

    #[test]
    fn test_push_interleaved_deinterleaves() {
        let mut buffer = PlanarBuffer::<i16>::new();
        buffer.push_interleaved(&[1, -1, 2, -2, 3, -3], 3, 2).unwrap();
        assert_eq!(&buffer[0][..3], &[1, 2, 3]);
        assert_eq!(&buffer[1][..3], &[-1, -2, -3]);
    }

    #[test]
    fn test_push_mono_fills_every_channel() {
        let mut buffer = PlanarBuffer::<f32>::with_shape(3, 2).unwrap();
        buffer.push_mono(&[0.5, 0.25]).unwrap();
        for channel in buffer.channels() {
            assert_eq!(&channel[..2], &[0.5, 0.25]);
        }
    }

    #[test]
    fn test_out_of_range_access() {
        let mut buffer = PlanarBuffer::<f32>::with_shape(2, 4).unwrap();
        buffer[0][0] = 9.0;
        buffer[1][2] = 3.0;

        assert!(buffer.channel(2).is_none());
        assert_eq!(buffer[5][0], 9.0);
        assert_eq!(buffer.frame(7, 0), 9.0);
        assert_eq!(buffer.frame(1, 2), 3.0);
        assert_eq!(buffer.frame(1, 100), 0.0);
        assert_eq!(buffer.frame(0, 100), 9.0);
    }

    #[test]
    fn test_clear_range() {
        let mut buffer = PlanarBuffer::from_channels(vec![vec![1.0f32; 6], vec![2.0; 6]]);
        buffer.clear_range(4, 10);
        assert_eq!(&buffer[0][..], &[1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(&buffer[1][..], &[2.0, 2.0, 2.0, 2.0, 0.0, 0.0]);
    }
}
