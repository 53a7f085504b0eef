//! Feedback delay (echo).

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
    name: "Delay",
    vendor: "audio_mixer",
    description: "Feedback delay line per channel",
};

const PARAMETERS: [ParameterInfo; 3] = [
    ParameterInfo::scalar("delay_ms", "Delay time in milliseconds", KnobType::Circle),
    ParameterInfo::scalar("feedback", "Feedback amount (0 to 0.95)", KnobType::Circle),
    ParameterInfo::scalar("wet", "Wet level (0 to 1)", KnobType::Line),
];

const MAX_FEEDBACK: f32 = 0.95;

/// Echo with one delay line per channel.
#[derive(Debug, Clone)]
pub struct DelayEffect {
    delay_ms: f32,
    feedback: f32,
    wet_level: f32,
    format: PcmFormat,
    delay_lines: Vec<Vec<f32>>,
    write_index: usize,
}

impl DelayEffect {
    /// Creates a delay of `delay_ms` with the given feedback and wet level.
    pub fn new(delay_ms: f32, feedback: f32, wet_level: f32) -> Self {
        let mut effect = Self {
            delay_ms: delay_ms.max(0.0),
            feedback: feedback.clamp(0.0, MAX_FEEDBACK),
            wet_level: wet_level.clamp(0.0, 1.0),
            format: PcmFormat::default(),
            delay_lines: Vec::new(),
            write_index: 0,
        };
        effect.rebuild();
        effect
    }

    /// Delay length in frames at the current sample rate.
    pub fn delay_frames(&self) -> usize {
        (self.delay_ms * self.format.sample_rate as f32 / 1000.0) as usize
    }

    fn rebuild(&mut self) {
        let length = self.delay_frames().max(1);
        self.delay_lines = vec![vec![0.0; length]; self.format.channels];
        self.write_index = 0;
    }
}

impl Plugin for DelayEffect {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &PARAMETERS
    }

    fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, value.len())?;
        let value = value[0];
        match index {
            0 => {
                if value < 0.0 {
                    return Err(MixerError::invalid_parameter("delay_ms", "must not be negative"));
                }
                self.delay_ms = value;
                self.rebuild();
            }
            1 => self.feedback = value.clamp(0.0, MAX_FEEDBACK),
            _ => self.wet_level = value.clamp(0.0, 1.0),
        }
        Ok(())
    }

    fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, out.len())?;
        out[0] = match index {
            0 => self.delay_ms,
            1 => self.feedback,
            _ => self.wet_level,
        };
        Ok(())
    }
}

impl Effect for DelayEffect {
    fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<()> {
        let delay = self.delay_frames();
        if delay == 0 || self.wet_level <= 0.0 {
            return Ok(());
        }

        let length = self.delay_lines.first().map_or(1, Vec::len);
        let mut write_index = self.write_index;
        for (channel, line) in buffers.channels_mut().iter_mut().zip(&mut self.delay_lines) {
            write_index = self.write_index;
            for sample in channel.iter_mut().take(frames) {
                let delayed = line[write_index];
                line[write_index] = *sample + delayed * self.feedback;
                *sample += delayed * self.wet_level;
                write_index = (write_index + 1) % length;
            }
        }
        self.write_index = write_index;
        Ok(())
    }

    fn set_format(&mut self, format: &PcmFormat) {
        let reshaped = format.sample_rate != self.format.sample_rate
            || format.channels != self.format.channels;
        self.format = *format;
        if reshaped {
            self.rebuild();
        }
    }

    fn format(&self) -> PcmFormat {
        self.format
    }

    fn reset(&mut self) {
        for line in &mut self.delay_lines {
            line.fill(0.0);
        }
        self.write_index = 0;
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(delay_frames: usize) -> DelayEffect {
        let mut effect = DelayEffect::new(0.0, 0.0, 1.0);
        effect.set_format(&PcmFormat::float(1, 1000, 16));
        effect.set_parameter(0, &[delay_frames as f32]).unwrap();
        effect
    }

    #[test]
    fn test_impulse_echoes_after_delay() {
        let mut delay = effect(3);
        assert_eq!(delay.delay_frames(), 3);

        let mut impulse = vec![0.0f32; 8];
        impulse[0] = 1.0;
        let mut buffers = PlanarBuffer::from_channels(vec![impulse]);
        delay.process(&mut buffers, 8).unwrap();
        assert_eq!(&buffers[0][..], &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_echo_carries_across_blocks() {
        let mut delay = effect(3);
        let mut first = PlanarBuffer::from_channels(vec![vec![0.0f32, 0.0, 1.0]]);
        delay.process(&mut first, 3).unwrap();

        let mut second = PlanarBuffer::from_channels(vec![vec![0.0f32; 3]]);
        delay.process(&mut second, 3).unwrap();
        assert_eq!(&second[0][..], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut delay = effect(2);
        let mut buffers = PlanarBuffer::from_channels(vec![vec![1.0f32, 1.0]]);
        delay.process(&mut buffers, 2).unwrap();
        delay.reset();

        let mut silent = PlanarBuffer::from_channels(vec![vec![0.0f32; 2]]);
        delay.process(&mut silent, 2).unwrap();
        assert_eq!(&silent[0][..], &[0.0, 0.0]);
    }

    #[test]
    fn test_feedback_is_clamped() {
        let mut delay = DelayEffect::new(10.0, 0.2, 0.5);
        delay.set_parameter(1, &[3.0]).unwrap();
        let mut out = [0.0f32];
        delay.parameter(1, &mut out).unwrap();
        assert_eq!(out[0], MAX_FEEDBACK);
        assert!(delay.set_parameter(0, &[-1.0]).is_err());
    }
}
