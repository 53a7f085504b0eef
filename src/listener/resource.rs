//! Decoded media sources.

use crate::buffers::PlanarBuffer;
use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;

/// A pull-style reader over a decoded PCM stream in its native format.
///
/// Reads never block: a source that has nothing left returns fewer frames than
/// requested and the caller treats the short count as end of stream.
pub trait MediaResource: Send {
    /// Opens the resource named by `locator`.
    fn open_resource(&mut self, locator: &str) -> MixerResult<()>;

    /// Native format of the decoded stream.
    fn format(&self) -> PcmFormat;

    /// Reads up to `frames` frames into `out` starting at frame `offset` of
    /// each channel. `out` must hold at least `format().channels` channels of
    /// `offset + frames` frames. Returns the number of frames read.
    fn process(&mut self, out: &mut PlanarBuffer<f32>, offset: usize, frames: usize) -> usize;

    /// Current read position in frames.
    fn position(&self) -> usize;

    /// Seeks to `frame`, clamped to the stream length. Returns the new position.
    fn set_position(&mut self, frame: usize) -> usize;

    /// Total length in frames.
    fn full_frames(&self) -> usize;
}

/// A fully decoded stream held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResource {
    data: PlanarBuffer<f32>,
    sample_rate: u32,
    position: usize,
}

impl MemoryResource {
    /// Wraps planar data at the given sample rate.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            data: PlanarBuffer::from_channels(channels),
            sample_rate,
            position: 0,
        }
    }

    /// Wraps interleaved data.
    pub fn from_interleaved(data: &[f32], channels: usize, sample_rate: u32) -> MixerResult<Self> {
        if channels == 0 {
            return Err(MixerError::invalid_format("channel count must be non-zero"));
        }
        let frames = data.len() / channels;
        let mut planar = PlanarBuffer::new();
        planar.push_interleaved(data, frames, channels)?;
        Ok(Self {
            data: planar,
            sample_rate,
            position: 0,
        })
    }
}

impl MediaResource for MemoryResource {
    fn open_resource(&mut self, locator: &str) -> MixerResult<()> {
        if self.data.channel_count() == 0 {
            return Err(MixerError::resource_open(locator, "no decoded data"));
        }
        if self.sample_rate == 0 {
            return Err(MixerError::resource_open(locator, "sample rate is zero"));
        }
        Ok(())
    }

    fn format(&self) -> PcmFormat {
        PcmFormat::float(self.data.channel_count(), self.sample_rate, self.data.frames())
    }

    fn process(&mut self, out: &mut PlanarBuffer<f32>, offset: usize, frames: usize) -> usize {
        let available = self.data.frames().saturating_sub(self.position);
        let count = frames.min(available);
        for (source, target) in self.data.channels().iter().zip(out.channels_mut()) {
            let end = (offset + count).min(target.len());
            let copied = end.saturating_sub(offset);
            if copied > 0 {
                target[offset..end].copy_from_slice(&source[self.position..self.position + copied]);
            }
        }
        self.position += count;
        count
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, frame: usize) -> usize {
        self.position = frame.min(self.data.frames());
        self.position
    }

    fn full_frames(&self) -> usize {
        self.data.frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_resource_reads_and_seeks() {
        let mut resource = MemoryResource::new(vec![(0..10).map(|i| i as f32).collect()], 8000);
        resource.open_resource("memory").unwrap();
        assert_eq!(resource.full_frames(), 10);

        let mut out = PlanarBuffer::with_shape(1, 8).unwrap();
        assert_eq!(resource.process(&mut out, 2, 4), 4);
        assert_eq!(&out[0][..], &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0]);
        assert_eq!(resource.position(), 4);

        assert_eq!(resource.set_position(8), 8);
        assert_eq!(resource.process(&mut out, 0, 8), 2);
        assert_eq!(&out[0][..2], &[8.0, 9.0]);
        assert_eq!(resource.set_position(100), 10);
    }

    #[test]
    fn test_from_interleaved() {
        let resource = MemoryResource::from_interleaved(&[1.0, -1.0, 2.0, -2.0], 2, 44100).unwrap();
        let format = resource.format();
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(resource.full_frames(), 2);
    }

    #[test]
    fn test_open_rejects_empty_data() {
        let mut resource = MemoryResource::default();
        assert!(matches!(
            resource.open_resource("empty"),
            Err(MixerError::ResourceOpen { .. })
        ));
    }
}
