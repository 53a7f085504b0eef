//! Linear gain.

use super::Effect;
use crate::buffers::PlanarBuffer;
use crate::error::MixerResult;
use crate::format::{PcmFormat, db_to_linear};
use crate::plugin::{
    EffectType, KnobType, ParameterInfo, Plugin, PluginCategory, PluginInfo, check_parameter,
};

const INFO: PluginInfo = PluginInfo {
    category: PluginCategory::Effect,
    effect_type: EffectType::SoundEffect,
    name: "Gain",
    vendor: "audio_mixer",
    description: "Scales every channel by a linear factor",
};

const PARAMETERS: [ParameterInfo; 1] = [ParameterInfo::scalar(
    "gain",
    "Linear gain factor",
    KnobType::Circle,
)];

/// Multiplies every sample by a constant factor.
#[derive(Debug, Clone)]
pub struct GainEffect {
    gain: f32,
    format: PcmFormat,
}

impl GainEffect {
    /// Gain from a linear factor.
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            format: PcmFormat::default(),
        }
    }

    /// Gain from decibels.
    pub fn from_db(gain_db: f32) -> Self {
        Self::new(db_to_linear(gain_db))
    }

    /// Current linear gain.
    pub const fn gain(&self) -> f32 {
        self.gain
    }

    /// Sets the linear gain.
    pub const fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}

impl Default for GainEffect {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Plugin for GainEffect {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &PARAMETERS
    }

    fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, value.len())?;
        self.gain = value[0];
        Ok(())
    }

    fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, out.len())?;
        out[0] = self.gain;
        Ok(())
    }
}

impl Effect for GainEffect {
    fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<()> {
        for channel in buffers.channels_mut() {
            let frames = frames.min(channel.len());
            for sample in &mut channel[..frames] {
                *sample *= self.gain;
            }
        }
        Ok(())
    }

    fn set_format(&mut self, format: &PcmFormat) {
        self.format = *format;
    }

    fn format(&self) -> PcmFormat {
        self.format
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}
