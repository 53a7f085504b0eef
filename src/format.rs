//! PCM format descriptors and small sample/level conversion helpers.

use crate::error::{MixerError, MixerResult};

/// Description of a PCM stream shared by every component in a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct PcmFormat {
    /// Bits per sample
    pub bits: u16,
    /// Whether samples are IEEE float
    pub is_float: bool,
    /// Number of channels
    pub channels: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per processing block
    pub frames: usize,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::stereo_f32(48000, 480)
    }
}

impl PcmFormat {
    /// 32-bit float stereo at the given rate and block size.
    pub const fn stereo_f32(sample_rate: u32, frames: usize) -> Self {
        Self {
            bits: 32,
            is_float: true,
            channels: 2,
            sample_rate,
            frames,
        }
    }

    /// 32-bit float with an arbitrary channel count.
    pub const fn float(channels: usize, sample_rate: u32, frames: usize) -> Self {
        Self {
            bits: 32,
            is_float: true,
            channels,
            sample_rate,
            frames,
        }
    }

    /// Rejects formats with zero channels or a zero sample rate.
    pub fn validate(&self) -> MixerResult<()> {
        if self.channels == 0 {
            return Err(MixerError::invalid_format("channel count must be non-zero"));
        }
        if self.sample_rate == 0 {
            return Err(MixerError::invalid_format("sample rate must be non-zero"));
        }
        if self.bits == 0 {
            return Err(MixerError::invalid_format("bit depth must be non-zero"));
        }
        Ok(())
    }

    /// Interleaved sample count of one block.
    pub const fn block_samples(&self) -> usize {
        self.frames * self.channels
    }
}

/// Direction of a hardware endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum EndpointType {
    /// Unknown or unopened endpoint
    #[default]
    None,
    /// Output device
    Render,
    /// Input device
    Capture,
    /// Virtual endpoint forwarding to another one
    Proxy,
}

/// Device-level descriptor supplied by a hardware endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct EndpointInformation {
    /// Endpoint direction
    pub endpoint_type: EndpointType,
    /// Backend-specific numeric id
    pub id: u32,
    /// Format the device is running at
    pub format: PcmFormat,
    /// Human readable device name
    pub name: String,
    /// Stable device identifier
    pub uuid: String,
}

/// Scales a frame count from one sample rate to another.
///
/// Returns 0 when `in_rate` is zero.
pub const fn calculate_frames(frames: usize, in_rate: u32, out_rate: u32) -> usize {
    if in_rate == 0 {
        return 0;
    }
    ((frames as u64 * out_rate as u64) / in_rate as u64) as usize
}

/// Decibels to linear amplitude.
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Linear amplitude to decibels. Silence maps to `-3.4e38`.
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        return -3.4e38;
    }
    20.0 * linear.log10()
}

/// Converts a 16-bit integer sample to float in [-1.0, 1.0).
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Converts a float sample to 16-bit, clamping out-of-range input.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}
