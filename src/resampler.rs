//! Sample-rate conversion for listeners whose source rate differs from the mix rate.
//!
//! [`SincResampler`] runs one `rubato` windowed-sinc engine per channel in double
//! precision. Input of any length is accepted: frames are queued per channel and
//! converted in whole chunks of `max_buffer_frames`, so the output stream is
//! continuous across calls.
//!
//! Produced frames line up with the input: output frame `n` sits at source time
//! `n / ratio`, so nothing has to be discarded after a flush. The filter does
//! read half its length ahead, and those source frames only turn into output
//! once more input (or zero padding) arrives. [`Resampler::delay_time`] reports
//! that lookahead.

use crate::buffers::{PlanarBuffer, double_to_float, float_to_double};
use crate::error::{MixerError, MixerResult};
use crate::format::calculate_frames;
use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Configuration of a resampler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ResamplerSettings {
    /// Input frames converted per engine call
    pub max_buffer_frames: usize,
    /// Source sample rate
    pub in_rate: u32,
    /// Destination sample rate
    pub out_rate: u32,
    /// Number of channels
    pub channels: usize,
    /// Long sinc filter (256 taps, cubic interpolation) instead of the short one
    /// (64 taps, linear interpolation). Both filters are symmetric, so both are
    /// linear phase; the short one trades stopband rejection for a quarter of the
    /// lookahead.
    pub linear_phase: bool,
}

impl ResamplerSettings {
    /// Destination/source rate ratio.
    pub fn ratio(&self) -> f64 {
        f64::from(self.out_rate) / f64::from(self.in_rate)
    }

    /// Source frames the filter reads ahead of the frame it produces.
    pub fn lookahead(&self) -> usize {
        self.interpolation().sinc_len / 2
    }

    fn validate(&self) -> MixerResult<()> {
        if self.max_buffer_frames == 0 {
            return Err(MixerError::invalid_parameter(
                "max_buffer_frames",
                "must be non-zero",
            ));
        }
        if self.in_rate == 0 || self.out_rate == 0 {
            return Err(MixerError::invalid_format("sample rates must be non-zero"));
        }
        if self.channels == 0 {
            return Err(MixerError::invalid_format("channel count must be non-zero"));
        }
        Ok(())
    }

    fn interpolation(&self) -> SincInterpolationParameters {
        if self.linear_phase {
            SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            }
        } else {
            SincInterpolationParameters {
                sinc_len: 64,
                f_cutoff: 0.925,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 128,
                window: WindowFunction::Hann2,
            }
        }
    }
}

/// Streaming planar sample-rate converter.
pub trait Resampler: Send {
    /// Allocates engines and scratch space for `settings`.
    fn initialize(&mut self, settings: ResamplerSettings) -> MixerResult<()>;

    /// Releases engines and scratch space.
    fn destroy(&mut self);

    /// Reinitializes only if `settings` differ from the current ones.
    fn reset(&mut self, settings: ResamplerSettings) -> MixerResult<()>;

    /// Drops queued input and filter history, keeping the configuration.
    fn flush(&mut self);

    /// Converts `frames` frames of `input`, writing produced frames to the start
    /// of `output`. Returns the number of frames produced.
    fn resample(
        &mut self,
        frames: usize,
        input: &PlanarBuffer<f32>,
        output: &mut PlanarBuffer<f32>,
    ) -> MixerResult<usize>;

    /// Double-precision variant of [`Resampler::resample`].
    fn resample_double(
        &mut self,
        frames: usize,
        input: &PlanarBuffer<f64>,
        output: &mut PlanarBuffer<f64>,
    ) -> MixerResult<usize>;

    /// Filter lookahead in source frames: the trailing input that only shows up
    /// in the output after more input arrives. Output is not shifted by it.
    fn delay_time(&self) -> usize;

    /// [`Resampler::delay_time`] in destination frames.
    fn output_delay(&self) -> usize;
}

struct ChannelState {
    engine: SincFixedIn<f64>,
    pending: Vec<f64>,
    scratch: Vec<f64>,
}

/// [`Resampler`] built on `rubato::SincFixedIn`, one engine per channel.
#[derive(Default)]
pub struct SincResampler {
    settings: Option<ResamplerSettings>,
    channels: Vec<ChannelState>,
    wide_in: PlanarBuffer<f64>,
    wide_out: PlanarBuffer<f64>,
}

impl std::fmt::Debug for SincResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SincResampler")
            .field("settings", &self.settings)
            .field("delay_time", &self.delay_time())
            .finish()
    }
}

impl SincResampler {
    /// Creates and initializes a resampler.
    pub fn new(settings: ResamplerSettings) -> MixerResult<Self> {
        let mut resampler = Self::default();
        resampler.initialize(settings)?;
        Ok(resampler)
    }

    /// Current configuration, if initialized.
    pub const fn settings(&self) -> Option<&ResamplerSettings> {
        self.settings.as_ref()
    }

    fn run(
        channels: &mut [ChannelState],
        chunk: usize,
        frames: usize,
        input: &PlanarBuffer<f64>,
        output: &mut PlanarBuffer<f64>,
    ) -> MixerResult<usize> {
        if input.channel_count() < channels.len() {
            return Err(MixerError::invalid_parameter(
                "input",
                format!(
                    "{} channels supplied, {} configured",
                    input.channel_count(),
                    channels.len()
                ),
            ));
        }
        if frames > input.frames() {
            return Err(MixerError::buffer_underrun(format!(
                "{frames} frames requested from a {}-frame input",
                input.frames()
            )));
        }

        for (state, samples) in channels.iter_mut().zip(input.channels()) {
            state.pending.extend_from_slice(&samples[..frames]);
        }

        let channel_count = channels.len();
        let mut produced = 0;
        while channels.first().is_some_and(|c| c.pending.len() >= chunk) {
            let mut written = 0;
            for (index, state) in channels.iter_mut().enumerate() {
                let (_, out_frames) = state.engine.process_into_buffer(
                    &[&state.pending[..chunk]],
                    std::slice::from_mut(&mut state.scratch),
                    None,
                )?;
                output.resize(channel_count, produced + out_frames)?;
                output[index][produced..produced + out_frames]
                    .copy_from_slice(&state.scratch[..out_frames]);
                state.pending.drain(..chunk);
                written = out_frames;
            }
            produced += written;
        }
        Ok(produced)
    }
}

impl Resampler for SincResampler {
    fn initialize(&mut self, settings: ResamplerSettings) -> MixerResult<()> {
        settings.validate()?;
        self.destroy();

        let mut channels = Vec::with_capacity(settings.channels);
        for _ in 0..settings.channels {
            let engine = SincFixedIn::<f64>::new(
                settings.ratio(),
                1.1,
                settings.interpolation(),
                settings.max_buffer_frames,
                1,
            )?;
            let scratch = vec![0.0; engine.output_frames_max()];
            channels.push(ChannelState {
                engine,
                pending: Vec::with_capacity(settings.max_buffer_frames * 2),
                scratch,
            });
        }
        self.channels = channels;
        self.wide_in.resize(settings.channels, settings.max_buffer_frames)?;
        self.settings = Some(settings);

        debug!(
            in_rate = settings.in_rate,
            out_rate = settings.out_rate,
            channels = settings.channels,
            linear_phase = settings.linear_phase,
            delay = self.delay_time(),
            "resampler initialized"
        );
        Ok(())
    }

    fn destroy(&mut self) {
        self.channels.clear();
        self.settings = None;
    }

    fn reset(&mut self, settings: ResamplerSettings) -> MixerResult<()> {
        if self.settings == Some(settings) {
            return Ok(());
        }
        self.destroy();
        self.initialize(settings)
    }

    fn flush(&mut self) {
        for state in &mut self.channels {
            state.engine.reset();
            state.pending.clear();
        }
    }

    fn resample(
        &mut self,
        frames: usize,
        input: &PlanarBuffer<f32>,
        output: &mut PlanarBuffer<f32>,
    ) -> MixerResult<usize> {
        let settings = self
            .settings
            .ok_or_else(|| MixerError::resampler("resampler is not initialized"))?;
        if input.channel_count() < settings.channels || frames > input.frames() {
            return Err(MixerError::invalid_parameter(
                "input",
                format!(
                    "{}x{} buffer cannot supply {}x{frames}",
                    input.channel_count(),
                    input.frames(),
                    settings.channels
                ),
            ));
        }

        self.wide_in.resize(settings.channels, frames)?;
        for (wide, narrow) in self.wide_in.channels_mut().iter_mut().zip(input.channels()) {
            float_to_double(&narrow[..frames], &mut wide[..frames]);
        }

        let chunk = settings.max_buffer_frames;
        let produced = Self::run(
            &mut self.channels,
            chunk,
            frames,
            &self.wide_in,
            &mut self.wide_out,
        )?;

        output.resize(settings.channels, produced)?;
        for (narrow, wide) in output.channels_mut().iter_mut().zip(self.wide_out.channels()) {
            double_to_float(&wide[..produced], &mut narrow[..produced]);
        }
        Ok(produced)
    }

    fn resample_double(
        &mut self,
        frames: usize,
        input: &PlanarBuffer<f64>,
        output: &mut PlanarBuffer<f64>,
    ) -> MixerResult<usize> {
        let settings = self
            .settings
            .ok_or_else(|| MixerError::resampler("resampler is not initialized"))?;
        Self::run(&mut self.channels, settings.max_buffer_frames, frames, input, output)
    }

    fn delay_time(&self) -> usize {
        self.settings.map_or(0, |settings| settings.lookahead())
    }

    fn output_delay(&self) -> usize {
        self.settings.map_or(0, |settings| {
            calculate_frames(settings.lookahead(), settings.in_rate, settings.out_rate)
        })
    }
}
