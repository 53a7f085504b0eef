//! Listeners: decoded media sources adapted to the mix format.
//!
//! A [`Listener`] wraps a [`MediaResource`] and serves frames in whatever format
//! the mixer asks for. When the source sample rate differs from the requested
//! one it converts through a [`SincResampler`], whose output is frame-aligned
//! with the source, so a seek only has to flush the filter. Channel counts
//! are reconciled by duplicating mono sources, dropping surplus source channels
//! and leaving missing channels silent.
//!
//! Positions and lengths reported by a listener are always in output frames.

pub mod registry;
pub mod resource;

pub use registry::{ResourceFactory, ResourceRegistry};
pub use resource::{MediaResource, MemoryResource};

use crate::buffers::PlanarBuffer;
use crate::error::MixerResult;
use crate::format::{PcmFormat, calculate_frames};
use crate::resampler::{Resampler, ResamplerSettings, SincResampler};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// A listener shared between the mixer and the emitters bound to it.
pub type SharedListener = Arc<Mutex<Listener>>;

const MIN_RESAMPLE_CHUNK: usize = 256;

/// A decoded media source served in the mix format.
pub struct Listener {
    resource: Box<dyn MediaResource>,
    format: PcmFormat,
    linear_phase: bool,
    resampler: Option<SincResampler>,
    source: PlanarBuffer<f32>,
    converted: PlanarBuffer<f32>,
    pending_start: usize,
    pending_len: usize,
    position: usize,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("format", &self.format)
            .field("native_format", &self.resource.format())
            .field("resampling", &self.resampler.is_some())
            .field("position", &self.position)
            .finish()
    }
}

impl Listener {
    /// Wraps an opened resource. The initial format is the resource's native one.
    pub fn new(resource: Box<dyn MediaResource>, linear_phase: bool) -> Self {
        let format = resource.format();
        Self {
            position: resource.position(),
            resource,
            format,
            linear_phase,
            resampler: None,
            source: PlanarBuffer::new(),
            converted: PlanarBuffer::new(),
            pending_start: 0,
            pending_len: 0,
        }
    }

    /// Wraps the listener for sharing with emitters.
    pub fn into_shared(self) -> SharedListener {
        Arc::new(Mutex::new(self))
    }

    /// Fails if the listener cannot serve `format`. Changes nothing.
    pub fn check_format(&self, format: &PcmFormat) -> MixerResult<()> {
        format.validate()?;
        self.resource.format().validate()
    }

    /// Sets the output format, (re)building the resampler when rates differ.
    ///
    /// The current position is kept.
    pub fn set_format(&mut self, format: &PcmFormat) -> MixerResult<()> {
        self.check_format(format)?;
        let native = self.resource.format();

        if native.sample_rate == format.sample_rate {
            self.resampler = None;
        } else {
            let block = calculate_frames(format.frames, format.sample_rate, native.sample_rate);
            let settings = ResamplerSettings {
                max_buffer_frames: block.max(MIN_RESAMPLE_CHUNK),
                in_rate: native.sample_rate,
                out_rate: format.sample_rate,
                channels: native.channels,
                linear_phase: self.linear_phase,
            };
            match self.resampler.as_mut() {
                Some(resampler) => resampler.reset(settings)?,
                None => self.resampler = Some(SincResampler::new(settings)?),
            }
        }

        let position = self.position.min(calculate_frames(
            self.resource.full_frames(),
            native.sample_rate,
            format.sample_rate,
        ));
        self.format = *format;
        debug!(
            native_rate = native.sample_rate,
            rate = format.sample_rate,
            channels = format.channels,
            resampling = self.resampler.is_some(),
            "listener format set"
        );
        self.seek(position);
        Ok(())
    }

    /// Output format.
    pub const fn format(&self) -> PcmFormat {
        self.format
    }

    /// Native format of the wrapped resource.
    pub fn native_format(&self) -> PcmFormat {
        self.resource.format()
    }

    /// Whether sample-rate conversion is active.
    pub const fn is_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// Stream length in output frames.
    pub fn full_frames(&self) -> usize {
        let native = self.resource.format();
        if self.resampler.is_some() {
            calculate_frames(
                self.resource.full_frames(),
                native.sample_rate,
                self.format.sample_rate,
            )
        } else {
            self.resource.full_frames()
        }
    }

    /// Current position in output frames.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Seeks to `frame` (clamped to the stream length). Seeking to the current
    /// position is a no-op, so a caller that re-seeks before every read does not
    /// disturb the resampler.
    pub fn set_position(&mut self, frame: usize) -> usize {
        let frame = frame.min(self.full_frames());
        if frame == self.position {
            return frame;
        }
        self.seek(frame)
    }

    fn seek(&mut self, frame: usize) -> usize {
        match self.resampler.as_mut() {
            None => {
                self.position = self.resource.set_position(frame);
            }
            Some(resampler) => {
                let native = self.resource.format();
                let source_frame =
                    calculate_frames(frame, self.format.sample_rate, native.sample_rate);
                self.resource.set_position(source_frame);
                resampler.flush();
                self.pending_start = 0;
                self.pending_len = 0;
                self.position = frame;
            }
        }
        self.position
    }

    /// Reads up to `frames` output frames into `out` starting at frame `offset`.
    ///
    /// `out` grows to the output channel count if needed. Returns the number of
    /// frames written; a short count means the end of the stream was reached.
    pub fn process(&mut self, out: &mut PlanarBuffer<f32>, offset: usize, frames: usize) -> usize {
        let channels = self.format.channels;
        if let Err(error) = out.resize(channels, offset + frames) {
            warn!(%error, "listener output buffer could not grow");
            return 0;
        }

        let written = if self.resampler.is_some() {
            self.process_resampled(out, offset, frames)
        } else {
            self.process_direct(out, offset, frames)
        };
        self.position += written;
        written
    }

    fn process_direct(
        &mut self,
        out: &mut PlanarBuffer<f32>,
        offset: usize,
        frames: usize,
    ) -> usize {
        let native_channels = self.resource.format().channels;
        if native_channels == self.format.channels {
            return self.resource.process(out, offset, frames);
        }
        if let Err(error) = self.source.resize(native_channels, frames) {
            warn!(%error, "listener scratch buffer could not grow");
            return 0;
        }
        let read = self.resource.process(&mut self.source, 0, frames);
        map_channels(&self.source, 0, out, offset, read, self.format.channels);
        read
    }

    fn process_resampled(
        &mut self,
        out: &mut PlanarBuffer<f32>,
        offset: usize,
        frames: usize,
    ) -> usize {
        let wanted = frames.min(self.full_frames().saturating_sub(self.position));
        let native_channels = self.resource.format().channels;
        let out_channels = self.format.channels;
        let Self {
            resource,
            resampler,
            source,
            converted,
            pending_start,
            pending_len,
            ..
        } = self;
        let Some(resampler) = resampler.as_mut() else {
            return 0;
        };
        let chunk = resampler
            .settings()
            .map_or(MIN_RESAMPLE_CHUNK, |s| s.max_buffer_frames);

        let mut written = 0;
        while written < wanted {
            if *pending_len > 0 {
                let count = (*pending_len).min(wanted - written);
                map_channels(
                    converted,
                    *pending_start,
                    out,
                    offset + written,
                    count,
                    out_channels,
                );
                *pending_start += count;
                *pending_len -= count;
                written += count;
                continue;
            }

            if let Err(error) = source.resize(native_channels, chunk) {
                warn!(%error, "listener scratch buffer could not grow");
                break;
            }
            source.clear();
            // Past the end of the source the zero padding flushes the filter tail.
            let read = resource.process(source, 0, chunk);
            let produced = match resampler.resample(chunk, source, converted) {
                Ok(produced) => produced,
                Err(error) => {
                    warn!(%error, "listener resampling failed");
                    break;
                }
            };
            *pending_start = 0;
            *pending_len = produced;
            if read == 0 && produced == 0 {
                break;
            }
        }
        written
    }
}

/// Copies `frames` frames from `source` into the first `channels` channels of
/// `out`. Mono sources feed every channel; other sources map channel to channel
/// and leave channels they lack untouched.
fn map_channels(
    source: &PlanarBuffer<f32>,
    source_offset: usize,
    out: &mut PlanarBuffer<f32>,
    out_offset: usize,
    frames: usize,
    channels: usize,
) {
    let source_channels = source.channel_count();
    for (index, target) in out.channels_mut().iter_mut().take(channels).enumerate() {
        let source_index = if source_channels == 1 { 0 } else { index };
        let Some(samples) = source.channel(source_index) else {
            continue;
        };
        target[out_offset..out_offset + frames]
            .copy_from_slice(&samples[source_offset..source_offset + frames]);
    }
}
