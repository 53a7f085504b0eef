//! [`AudioEndpoint`] on the system's default output device through CPAL.

use super::{AudioCallback, AudioEndpoint, delay_frames};
use crate::error::{MixerError, MixerResult};
use crate::format::{EndpointInformation, EndpointType, PcmFormat};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use cpal::{
    BufferSize, Device, SampleRate, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};

type SharedCallback = Arc<Mutex<Option<Box<dyn AudioCallback>>>>;

/// Render endpoint backed by a CPAL output stream.
///
/// Only 32-bit float devices are driven; the stream callback hands each device
/// buffer to the installed [`AudioCallback`] and writes silence when the
/// callback fails or is busy.
pub struct CpalEndpoint {
    info: EndpointInformation,
    device: Device,
    callback: SharedCallback,
    stream: Option<Stream>,
}

impl std::fmt::Debug for CpalEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalEndpoint")
            .field("info", &self.info)
            .field("open", &self.stream.is_some())
            .finish()
    }
}

impl CpalEndpoint {
    /// Binds the default output device of the default host.
    pub fn default_output() -> MixerResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| MixerError::backend("cpal", "no default output device"))?;
        Self::with_device(device)
    }

    /// Binds a specific CPAL device.
    pub fn with_device(device: Device) -> MixerResult<Self> {
        let name = device.name()?;
        let config = device.default_output_config()?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(MixerError::invalid_format(format!(
                "device '{name}' runs at {:?}, only f32 output is supported",
                config.sample_format()
            )));
        }

        let format = PcmFormat::float(usize::from(config.channels()), config.sample_rate().0, 0);
        info!(
            device = %name,
            channels = format.channels,
            sample_rate = format.sample_rate,
            "output device selected"
        );
        Ok(Self {
            info: EndpointInformation {
                endpoint_type: EndpointType::Render,
                id: 0,
                format,
                uuid: name.clone(),
                name,
            },
            device,
            callback: Arc::new(Mutex::new(None)),
            stream: None,
        })
    }

    fn data_callback(
        callback: &SharedCallback,
        data: &mut [f32],
        channels: usize,
        sample_rate: u32,
    ) {
        let Some(mut guard) = callback.try_lock() else {
            data.fill(0.0);
            return;
        };
        let Some(callback) = guard.as_mut() else {
            data.fill(0.0);
            return;
        };

        let frames = data.len() / channels.max(1);
        let served =
            callback.endpoint_callback(data, frames, channels, sample_rate, EndpointType::Render);
        if let Err(error) = served {
            trace!(%error, "putting empty buffer to output");
            data.fill(0.0);
        }
        if let Err(error) = callback.render_callback(frames, channels, sample_rate) {
            trace!(%error, "render callback failed");
        }
    }
}

impl AudioEndpoint for CpalEndpoint {
    fn info(&self) -> &EndpointInformation {
        &self.info
    }

    fn set_callback(&mut self, callback: Box<dyn AudioCallback>) {
        *self.callback.lock() = Some(callback);
    }

    fn open(&mut self, delay: Duration) -> MixerResult<()> {
        if self.stream.is_some() {
            self.close()?;
        }
        let format = self.info.format;
        let frames = delay_frames(delay, format.sample_rate);
        let channels = format.channels;
        let sample_rate = format.sample_rate;

        let stream_config = StreamConfig {
            channels: channels as cpal::ChannelCount,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Fixed(frames as u32),
        };

        let callback = Arc::clone(&self.callback);
        let stream = self.device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                Self::data_callback(&callback, data, channels, sample_rate);
            },
            |err| {
                error!(%err, "audio stream error");
            },
            None,
        )?;

        self.info.format.frames = frames;
        self.stream = Some(stream);
        debug!(frames, "cpal endpoint opened");
        Ok(())
    }

    fn start(&mut self) -> MixerResult<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| MixerError::invalid_parameter("endpoint", "not opened"))?;
        if let Some(callback) = self.callback.lock().as_mut() {
            callback.flush()?;
            callback.format_changed(&self.info.format)?;
        }
        stream.play()?;
        Ok(())
    }

    fn stop(&mut self) -> MixerResult<()> {
        match self.stream.as_ref() {
            Some(stream) => Ok(stream.pause()?),
            None => {
                warn!("stop called on a closed endpoint");
                Ok(())
            }
        }
    }

    fn close(&mut self) -> MixerResult<()> {
        if self.stream.take().is_some() {
            debug!("cpal endpoint closed");
        }
        self.info.format.frames = 0;
        Ok(())
    }
}
