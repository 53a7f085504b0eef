//! Distance-attenuated, azimuth-panned emitter.

use super::{Emitter, EmitterCore, EmitterKind};
use crate::buffers::PlanarBuffer;
use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;
use crate::plugin::{
    EffectType, KnobType, ParameterInfo, Plugin, PluginCategory, PluginInfo, check_parameter,
};
use std::f32::consts::FRAC_PI_4;

const INFO: PluginInfo = PluginInfo {
    category: PluginCategory::Spatializer,
    effect_type: EffectType::SoundEffect,
    name: "Spatial Emitter",
    vendor: "audio_mixer",
    description: "Inverse-distance attenuation with equal-power azimuth panning",
};

const VOLUME: usize = 0;
const EMITTER_POSITION: usize = 1;
const LISTENER_POSITION: usize = 2;
const MIN_DISTANCE: usize = 3;
const MAX_DISTANCE: usize = 4;

const PARAMETERS: [ParameterInfo; 5] = [
    ParameterInfo::scalar("volume", "Volume level of audio", KnobType::Circle),
    ParameterInfo::vector3("emitter_position", "Emitter position (x right, y up, z forward)"),
    ParameterInfo::vector3("listener_position", "Listener position (x right, y up, z forward)"),
    ParameterInfo::scalar(
        "min_distance",
        "Distance below which no attenuation applies",
        KnobType::Line,
    ),
    ParameterInfo::scalar(
        "max_distance",
        "Distance beyond which the emitter is silent",
        KnobType::Line,
    ),
];

/// Emitter placed in 3D space relative to a listening position.
///
/// Gain falls off as `min_distance / distance` between the two distances and
/// is zero beyond `max_distance`. The lateral offset drives an equal-power pan
/// of the front pair; remaining channels get the attenuation only.
#[derive(Debug)]
pub struct SpatialEmitter {
    core: EmitterCore,
    volume: f32,
    emitter_position: [f32; 3],
    listener_position: [f32; 3],
    min_distance: f32,
    max_distance: f32,
}

impl Default for SpatialEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialEmitter {
    /// Emitter and listener at the origin, distances 1 to 100.
    pub fn new() -> Self {
        Self {
            core: EmitterCore::new(),
            volume: 1.0,
            emitter_position: [0.0; 3],
            listener_position: [0.0; 3],
            min_distance: 1.0,
            max_distance: 100.0,
        }
    }

    /// Distance between emitter and listener.
    pub fn distance(&self) -> f32 {
        self.offset().iter().map(|d| d * d).sum::<f32>().sqrt()
    }

    /// Distance attenuation in [0, 1].
    pub fn attenuation(&self) -> f32 {
        let distance = self.distance();
        if distance >= self.max_distance {
            0.0
        } else if distance <= self.min_distance {
            1.0
        } else {
            self.min_distance / distance
        }
    }

    /// Left and right gains from the lateral offset, equal power.
    pub fn pan_gains(&self) -> (f32, f32) {
        let distance = self.distance();
        let pan = if distance > 0.0 {
            (self.offset()[0] / distance).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let theta = (pan + 1.0) * FRAC_PI_4;
        (theta.cos(), theta.sin())
    }

    fn offset(&self) -> [f32; 3] {
        [
            self.emitter_position[0] - self.listener_position[0],
            self.emitter_position[1] - self.listener_position[1],
            self.emitter_position[2] - self.listener_position[2],
        ]
    }
}

impl Plugin for SpatialEmitter {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &PARAMETERS
    }

    fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()> {
        let info = check_parameter(&PARAMETERS, index, value.len())?;
        match index {
            VOLUME => self.volume = value[0],
            EMITTER_POSITION => self.emitter_position.copy_from_slice(value),
            LISTENER_POSITION => self.listener_position.copy_from_slice(value),
            MIN_DISTANCE => {
                if value[0] <= 0.0 || value[0] >= self.max_distance {
                    return Err(MixerError::invalid_parameter(
                        info.name,
                        format!("must be in (0, {})", self.max_distance),
                    ));
                }
                self.min_distance = value[0];
            }
            _ => {
                if value[0] <= self.min_distance {
                    return Err(MixerError::invalid_parameter(
                        info.name,
                        format!("must exceed min_distance ({})", self.min_distance),
                    ));
                }
                self.max_distance = value[0];
            }
        }
        Ok(())
    }

    fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, out.len())?;
        match index {
            VOLUME => out[0] = self.volume,
            EMITTER_POSITION => out.copy_from_slice(&self.emitter_position),
            LISTENER_POSITION => out.copy_from_slice(&self.listener_position),
            MIN_DISTANCE => out[0] = self.min_distance,
            _ => out[0] = self.max_distance,
        }
        Ok(())
    }
}

impl Emitter for SpatialEmitter {
    fn kind(&self) -> EmitterKind {
        EmitterKind::Spatial
    }

    fn core(&self) -> &EmitterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EmitterCore {
        &mut self.core
    }

    fn check_format(&self, format: &PcmFormat) -> MixerResult<()> {
        format.validate()?;
        if format.frames == 0 {
            return Err(MixerError::invalid_format(
                "spatial emitter needs a non-zero block size",
            ));
        }
        Ok(())
    }

    fn apply_voice(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) {
        let gain = self.volume * self.attenuation();
        let (left, right) = self.pan_gains();
        let channels = buffers.channels_mut();
        let stereo = channels.len() >= 2;

        for (index, channel) in channels.iter_mut().enumerate() {
            let factor = match index {
                0 if stereo => gain * left,
                1 => gain * right,
                _ => gain,
            };
            channel.iter_mut().take(frames).for_each(|s| *s *= factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_attenuation_follows_distance() {
        let mut emitter = SpatialEmitter::new();
        assert_eq!(emitter.attenuation(), 1.0);

        emitter.set_parameter(EMITTER_POSITION, &[0.0, 0.0, 4.0]).unwrap();
        assert_approx_eq!(f64::from(emitter.attenuation()), 0.25, 1e-6);

        emitter.set_parameter(LISTENER_POSITION, &[0.0, 0.0, -200.0]).unwrap();
        assert_eq!(emitter.attenuation(), 0.0);
    }

    #[test]
    fn test_lateral_offset_pans() {
        let mut emitter = SpatialEmitter::new();
        emitter.set_parameter(EMITTER_POSITION, &[0.0, 0.0, 2.0]).unwrap();
        let (left, right) = emitter.pan_gains();
        assert_approx_eq!(f64::from(left), f64::from(right), 1e-6);

        emitter.set_parameter(EMITTER_POSITION, &[2.0, 0.0, 0.0]).unwrap();
        let (left, right) = emitter.pan_gains();
        assert!(left.abs() < 1e-6);
        assert_approx_eq!(f64::from(right), 1.0, 1e-6);

        emitter.set_parameter(EMITTER_POSITION, &[-1.0, 0.0, 1.0]).unwrap();
        let (left, right) = emitter.pan_gains();
        assert!(left > right);
        assert_approx_eq!(f64::from(left * left + right * right), 1.0, 1e-5);
    }

    #[test]
    fn test_distance_parameters_are_validated() {
        let mut emitter = SpatialEmitter::new();
        assert!(emitter.set_parameter(MIN_DISTANCE, &[0.0]).is_err());
        assert!(emitter.set_parameter(MAX_DISTANCE, &[0.5]).is_err());
        assert!(emitter.set_parameter(EMITTER_POSITION, &[1.0]).is_err());
        emitter.set_parameter(MAX_DISTANCE, &[10.0]).unwrap();

        let mut out = [0.0f32; 3];
        emitter.set_parameter(LISTENER_POSITION, &[1.0, 2.0, 3.0]).unwrap();
        emitter.parameter(LISTENER_POSITION, &mut out).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_format_requires_block_size() {
        let mut emitter = SpatialEmitter::new();
        assert!(emitter.set_format(&PcmFormat::stereo_f32(48000, 0)).is_err());
        assert!(emitter.set_format(&PcmFormat::stereo_f32(0, 256)).is_err());
        assert!(emitter.set_format(&PcmFormat::stereo_f32(48000, 256)).is_ok());
    }

    #[test]
    fn test_mono_output_gets_attenuation_only() {
        let mut emitter = SpatialEmitter::new();
        emitter.set_parameter(EMITTER_POSITION, &[2.0, 0.0, 0.0]).unwrap();
        let mut buffers = PlanarBuffer::from_channels(vec![vec![1.0f32; 2]]);
        emitter.apply_voice(&mut buffers, 2);
        assert_approx_eq!(f64::from(buffers[0][0]), 0.5, 1e-6);
    }
}
