//! Endpoint without a device, pumped by the caller.

use super::{AudioCallback, AudioEndpoint, delay_frames};
use crate::buffers::Buffer;
use crate::error::{MixerError, MixerResult};
use crate::format::{EndpointInformation, EndpointType, PcmFormat};
use std::time::Duration;
use tracing::{debug, warn};

/// Runs the endpoint contract against an in-memory buffer.
///
/// Each [`OfflineEndpoint::pump`] stands in for one device period, so the
/// mixer can be rendered faster than real time (to a file, or in tests).
pub struct OfflineEndpoint {
    info: EndpointInformation,
    callback: Option<Box<dyn AudioCallback>>,
    buffer: Buffer<f32>,
    opened: bool,
    running: bool,
}

impl std::fmt::Debug for OfflineEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineEndpoint")
            .field("info", &self.info)
            .field("has_callback", &self.callback.is_some())
            .field("opened", &self.opened)
            .field("running", &self.running)
            .finish()
    }
}

impl OfflineEndpoint {
    /// Creates a closed render endpoint running at `format`'s rate and layout.
    pub fn new(format: PcmFormat) -> Self {
        Self {
            info: EndpointInformation {
                endpoint_type: EndpointType::Render,
                id: 0,
                format,
                name: "Offline".to_string(),
                uuid: "offline".to_string(),
            },
            callback: None,
            buffer: Buffer::new(),
            opened: false,
            running: false,
        }
    }

    /// Whether the pull loop is started.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Runs one device period and returns the interleaved buffer handed to the
    /// callback. A failing callback leaves the period silent.
    pub fn pump(&mut self) -> MixerResult<&[f32]> {
        if !self.running {
            return Err(MixerError::invalid_parameter("endpoint", "not started"));
        }
        let format = self.info.format;
        let callback = self
            .callback
            .as_mut()
            .ok_or_else(|| MixerError::invalid_parameter("endpoint", "no callback installed"))?;

        let data = self.buffer.as_mut_slice();
        if let Err(error) = callback.endpoint_callback(
            data,
            format.frames,
            format.channels,
            format.sample_rate,
            self.info.endpoint_type,
        ) {
            debug!(%error, "putting empty buffer to output");
            data.fill(0.0);
        }
        let rendered =
            callback.render_callback(format.frames, format.channels, format.sample_rate);
        if let Err(error) = rendered {
            warn!(%error, "render callback failed");
        }
        Ok(self.buffer.as_slice())
    }

    /// Pumps `periods` device periods and concatenates them.
    pub fn render_periods(&mut self, periods: usize) -> MixerResult<Vec<f32>> {
        let mut out = Vec::new();
        out.try_reserve_exact(periods * self.buffer.len())
            .map_err(|e| MixerError::allocation("offline render", e.to_string()))?;
        for _ in 0..periods {
            out.extend_from_slice(self.pump()?);
        }
        Ok(out)
    }
}

impl AudioEndpoint for OfflineEndpoint {
    fn info(&self) -> &EndpointInformation {
        &self.info
    }

    fn set_callback(&mut self, callback: Box<dyn AudioCallback>) {
        self.callback = Some(callback);
    }

    fn open(&mut self, delay: Duration) -> MixerResult<()> {
        self.info.format.validate()?;
        let frames = delay_frames(delay, self.info.format.sample_rate);
        self.info.format.frames = frames;
        self.buffer.resize(frames * self.info.format.channels)?;
        self.opened = true;
        debug!(frames, "offline endpoint opened");
        Ok(())
    }

    fn start(&mut self) -> MixerResult<()> {
        if !self.opened {
            return Err(MixerError::invalid_parameter("endpoint", "not opened"));
        }
        if let Some(callback) = self.callback.as_mut() {
            callback.flush()?;
            callback.format_changed(&self.info.format)?;
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> MixerResult<()> {
        self.running = false;
        Ok(())
    }

    fn close(&mut self) -> MixerResult<()> {
        self.running = false;
        self.opened = false;
        self.buffer.free();
        Ok(())
    }
}
