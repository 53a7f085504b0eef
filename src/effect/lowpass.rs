//! One-pole low-pass filter.

use super::Effect;
use crate::buffers::PlanarBuffer;
use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;
use crate::plugin::{
    EffectType, KnobType, ParameterInfo, Plugin, PluginCategory, PluginInfo, check_parameter,
};

const INFO: PluginInfo = PluginInfo {
    category: PluginCategory::Effect,
    effect_type: EffectType::SoundEffect,
    name: "Low Pass Filter",
    vendor: "audio_mixer",
    description: "One-pole low-pass filter",
};

const PARAMETERS: [ParameterInfo; 1] = [ParameterInfo::scalar(
    "cutoff_hz",
    "Cutoff frequency in Hz",
    KnobType::Circle,
)];

/// First-order IIR low-pass, `y[n] = y[n-1] + a * (x[n] - y[n-1])`.
#[derive(Debug, Clone)]
pub struct LowPassEffect {
    cutoff_hz: f32,
    coefficient: f32,
    history: Vec<f32>,
    format: PcmFormat,
}

impl LowPassEffect {
    /// Creates a filter with the given cutoff.
    pub fn new(cutoff_hz: f32) -> Self {
        let mut effect = Self {
            cutoff_hz: cutoff_hz.max(0.0),
            coefficient: 1.0,
            history: Vec::new(),
            format: PcmFormat::default(),
        };
        effect.update_coefficient();
        effect.history = vec![0.0; effect.format.channels];
        effect
    }

    /// Cutoff frequency in Hz.
    pub const fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    fn update_coefficient(&mut self) {
        let sample_rate = self.format.sample_rate.max(1) as f32;
        let omega = 2.0 * std::f32::consts::PI * self.cutoff_hz / sample_rate;
        self.coefficient = (1.0 - (-omega).exp()).clamp(0.0, 1.0);
    }
}

impl Plugin for LowPassEffect {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &PARAMETERS
    }

    fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, value.len())?;
        if value[0] < 0.0 {
            return Err(MixerError::invalid_parameter("cutoff_hz", "must not be negative"));
        }
        self.cutoff_hz = value[0];
        self.update_coefficient();
        Ok(())
    }

    fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, out.len())?;
        out[0] = self.cutoff_hz;
        Ok(())
    }
}

impl Effect for LowPassEffect {
    fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<()> {
        let a = self.coefficient;
        for (channel, state) in buffers.channels_mut().iter_mut().zip(&mut self.history) {
            for sample in channel.iter_mut().take(frames) {
                *state += a * (*sample - *state);
                *sample = *state;
            }
        }
        Ok(())
    }

    fn set_format(&mut self, format: &PcmFormat) {
        self.format = *format;
        self.history.resize(format.channels, 0.0);
        self.update_coefficient();
    }

    fn format(&self) -> PcmFormat {
        self.format
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}
