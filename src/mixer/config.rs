//! Mixer configuration.

use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;
use std::time::Duration;

/// Configuration for the [`Mixer`](super::Mixer).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct MixerConfig {
    /// Ring buffer slots rendered ahead of the consumer
    pub ring_buffers: usize,

    /// Frames per ring buffer slot; `format.frames` replaces it on `set_mix_format`
    pub buffer_frames: usize,

    /// Initial mix format
    pub format: PcmFormat,

    /// Use the long linear-phase resampling filter for listeners
    pub linear_phase_resampling: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            ring_buffers: 2,
            buffer_frames: 480,
            format: PcmFormat::stereo_f32(48000, 480),
            linear_phase_resampling: false,
        }
    }
}

impl MixerConfig {
    /// Create a low-latency mixer configuration
    pub fn low_latency() -> Self {
        Self {
            ring_buffers: 2,
            buffer_frames: 128,
            format: PcmFormat::stereo_f32(48000, 128),
            linear_phase_resampling: false,
        }
    }

    /// Create a high-quality mixer configuration
    pub fn high_quality() -> Self {
        Self {
            ring_buffers: 3,
            buffer_frames: 1024,
            format: PcmFormat::stereo_f32(96000, 1024),
            linear_phase_resampling: true,
        }
    }

    /// Rejects configurations the mixer cannot run with.
    pub fn validate(&self) -> MixerResult<()> {
        if self.ring_buffers == 0 {
            return Err(MixerError::invalid_parameter("ring_buffers", "must be at least 1"));
        }
        if self.buffer_frames == 0 {
            return Err(MixerError::invalid_parameter("buffer_frames", "must be non-zero"));
        }
        self.format.validate()
    }

    /// Time covered by one ring slot.
    pub fn slot_duration(&self) -> Duration {
        let rate = f64::from(self.format.sample_rate.max(1));
        Duration::from_secs_f64(self.buffer_frames as f64 / rate)
    }
}

/// Configuration for the [`RenderThread`](super::RenderThread).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderThreadConfig {
    /// Frames per rendered slot
    pub frames: usize,
    /// Output channels
    pub channels: usize,
    /// Output sample rate
    pub sample_rate: u32,
    /// Longest sleep between occupancy checks when no wake-up arrives
    pub poll_interval: Duration,
    /// Longest time `update` waits for the mixer lock before giving up
    pub lock_timeout: Duration,
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        Self {
            frames: 480,
            channels: 2,
            sample_rate: 48000,
            poll_interval: Duration::from_millis(5),
            lock_timeout: Duration::from_micros(500),
        }
    }
}

impl RenderThreadConfig {
    /// Matches a mixer configuration's block size and format.
    pub fn for_mixer(config: &MixerConfig) -> Self {
        Self {
            frames: config.buffer_frames,
            channels: config.format.channels,
            sample_rate: config.format.sample_rate,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(MixerConfig::default().validate().is_ok());
        assert!(MixerConfig::low_latency().validate().is_ok());
        assert!(MixerConfig::high_quality().validate().is_ok());
        assert_eq!(MixerConfig::default().ring_buffers, 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MixerConfig {
            ring_buffers: 0,
            ..MixerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MixerConfig {
            buffer_frames: 0,
            ..MixerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_slot_duration() {
        let config = MixerConfig::default();
        assert_eq!(config.slot_duration(), Duration::from_millis(10));

        let thread = RenderThreadConfig::for_mixer(&MixerConfig::low_latency());
        assert_eq!(thread.frames, 128);
        assert_eq!(thread.channels, 2);
    }
}
