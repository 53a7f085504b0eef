//! Hardware endpoint seam: the callback contract between a device pull loop
//! and the mixer.
//!
//! An [`AudioEndpoint`] owns a device and a dedicated pull loop. On start it
//! calls [`AudioCallback::flush`] and [`AudioCallback::format_changed`] once,
//! then [`AudioCallback::endpoint_callback`] for every device buffer followed by
//! [`AudioCallback::render_callback`]. A failed endpoint callback means the
//! endpoint writes silence for that buffer.
//!
//! [`MixerCallback`] adapts a [`SharedMixer`] to this contract.
//! [`OfflineEndpoint`] drives a callback without hardware, and
//! `CpalEndpoint` (feature `playback`) drives one from the system's default
//! output device.

#[cfg(feature = "playback")]
pub mod cpal_backend;
pub mod offline;

#[cfg(feature = "playback")]
pub use cpal_backend::CpalEndpoint;
pub use offline::OfflineEndpoint;

use crate::error::{MixerError, MixerResult};
use crate::format::{EndpointInformation, EndpointType, PcmFormat};
use crate::mixer::SharedMixer;
use std::time::Duration;
use tracing::{debug, trace};

/// Callbacks invoked by an endpoint's pull loop.
pub trait AudioCallback: Send {
    /// Drops any audio buffered ahead of the device.
    fn flush(&mut self) -> MixerResult<()>;

    /// The device (re)opened at `format`.
    fn format_changed(&mut self, format: &PcmFormat) -> MixerResult<()>;

    /// Fills (render) or consumes (capture) one interleaved device buffer.
    fn endpoint_callback(
        &mut self,
        data: &mut [f32],
        frames: usize,
        channels: usize,
        sample_rate: u32,
        endpoint: EndpointType,
    ) -> MixerResult<()>;

    /// Called after the device accepted a buffer; a hook for rendering ahead.
    fn render_callback(
        &mut self,
        _frames: usize,
        _channels: usize,
        _sample_rate: u32,
    ) -> MixerResult<()> {
        Ok(())
    }
}

/// A device endpoint driving an [`AudioCallback`].
pub trait AudioEndpoint {
    /// Descriptor of the device as currently opened.
    fn info(&self) -> &EndpointInformation;

    /// Installs the callback, replacing any previous one.
    fn set_callback(&mut self, callback: Box<dyn AudioCallback>);

    /// Opens the device with roughly `delay` of buffering.
    fn open(&mut self, delay: Duration) -> MixerResult<()>;

    /// Starts the pull loop.
    fn start(&mut self) -> MixerResult<()>;

    /// Pauses the pull loop.
    fn stop(&mut self) -> MixerResult<()>;

    /// Releases the device.
    fn close(&mut self) -> MixerResult<()>;
}

/// Frames of buffering `delay` represents at `sample_rate`, at least one.
pub fn delay_frames(delay: Duration, sample_rate: u32) -> usize {
    ((delay.as_secs_f64() * f64::from(sample_rate)).round() as usize).max(1)
}

/// [`AudioCallback`] serving render requests from a [`SharedMixer`].
#[derive(Debug, Clone)]
pub struct MixerCallback {
    mixer: SharedMixer,
    lock_timeout: Duration,
    underruns: u64,
}

impl MixerCallback {
    /// Wraps `mixer`; the audio thread waits at most 2 ms for its lock.
    pub fn new(mixer: SharedMixer) -> Self {
        Self {
            mixer,
            lock_timeout: Duration::from_millis(2),
            underruns: 0,
        }
    }

    /// Sets how long the audio thread may wait for the mixer lock.
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Device buffers that were replaced by silence.
    pub const fn underruns(&self) -> u64 {
        self.underruns
    }

    fn silence(&mut self, data: &mut [f32], error: MixerError) -> MixerResult<()> {
        data.fill(0.0);
        self.underruns += 1;
        trace!(%error, underruns = self.underruns, "putting empty buffer to output");
        Err(error)
    }
}

impl AudioCallback for MixerCallback {
    fn flush(&mut self) -> MixerResult<()> {
        self.mixer.lock().flush();
        Ok(())
    }

    fn format_changed(&mut self, format: &PcmFormat) -> MixerResult<()> {
        match self.mixer.lock().set_mix_format(format) {
            Err(MixerError::NoListeners) => {
                debug!("format change with no listeners attached");
                Ok(())
            }
            result => result,
        }
    }

    fn endpoint_callback(
        &mut self,
        data: &mut [f32],
        frames: usize,
        channels: usize,
        sample_rate: u32,
        endpoint: EndpointType,
    ) -> MixerResult<()> {
        let Some(mut mixer) = self.mixer.try_lock_for(self.lock_timeout) else {
            return self.silence(data, MixerError::buffer_underrun("mixer lock timed out"));
        };
        let result = match endpoint {
            EndpointType::Render | EndpointType::Proxy => {
                mixer.update(data, frames, channels, sample_rate)
            }
            EndpointType::Capture => mixer.record(data, frames, channels, sample_rate),
            EndpointType::None => Err(MixerError::invalid_parameter(
                "endpoint",
                "endpoint is not opened",
            )),
        };
        drop(mixer);

        match result {
            Ok(()) => Ok(()),
            Err(error) if endpoint == EndpointType::Capture => Err(error),
            Err(error) => self.silence(data, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{BasicEmitter, Emitter, EmitterState, PlaybackMode};
    use crate::listener::MemoryResource;
    use crate::mixer::{Mixer, MixerConfig};

    fn shared_mixer(with_source: bool) -> SharedMixer {
        let config = MixerConfig {
            buffer_frames: 4,
            format: PcmFormat::float(2, 48000, 4),
            ..MixerConfig::default()
        };
        let mut mixer = Mixer::new(config).unwrap();
        if with_source {
            let resource = MemoryResource::new(vec![vec![0.5; 32]; 2], 48000);
            let listener = mixer
                .create_listener_from_resource(Box::new(resource), None)
                .unwrap();
            let mut emitter = BasicEmitter::new();
            emitter.set_mode(PlaybackMode::Loop);
            emitter.set_state(EmitterState::Playing);
            mixer.add_emitter_to_listener(listener, Box::new(emitter)).unwrap();
        }
        mixer.into_shared()
    }

    #[test]
    fn test_callback_serves_mixer_output() {
        let mut callback = MixerCallback::new(shared_mixer(true));
        let mut data = [0.0f32; 8];
        callback
            .endpoint_callback(&mut data, 4, 2, 48000, EndpointType::Render)
            .unwrap();
        assert!(data.iter().all(|&s| s == 0.5));
        assert_eq!(callback.underruns(), 0);
    }

    #[test]
    fn test_callback_failure_writes_silence() {
        let mut callback = MixerCallback::new(shared_mixer(false));
        let mut data = [1.0f32; 8];
        let result = callback.endpoint_callback(&mut data, 4, 2, 48000, EndpointType::Render);
        assert!(matches!(result, Err(MixerError::NoListeners)));
        assert!(data.iter().all(|&s| s == 0.0));
        assert_eq!(callback.underruns(), 1);
    }

    #[test]
    fn test_capture_is_rejected_without_touching_input() {
        let mut callback = MixerCallback::new(shared_mixer(true));
        let mut data = [0.25f32; 8];
        let result = callback.endpoint_callback(&mut data, 4, 2, 48000, EndpointType::Capture);
        assert!(matches!(result, Err(MixerError::Unsupported(_))));
        assert!(data.iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_format_change_without_listeners_is_accepted() {
        let mut callback = MixerCallback::new(shared_mixer(false));
        assert!(callback.format_changed(&PcmFormat::stereo_f32(44100, 441)).is_ok());
        assert!(callback.flush().is_ok());
    }

    #[test]
    fn test_delay_frames() {
        assert_eq!(delay_frames(Duration::from_millis(10), 48000), 480);
        assert_eq!(delay_frames(Duration::ZERO, 48000), 1);
    }
}
