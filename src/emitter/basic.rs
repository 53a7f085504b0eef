//! Volume and stereo-angle emitter.

use super::{Emitter, EmitterCore, EmitterKind};
use crate::buffers::PlanarBuffer;
use crate::error::MixerResult;
use crate::plugin::{
    EffectType, KnobType, ParameterInfo, Plugin, PluginCategory, PluginInfo, check_parameter,
};

const INFO: PluginInfo = PluginInfo {
    category: PluginCategory::Spatializer,
    effect_type: EffectType::SoundEffect,
    name: "Advanced Pan Emitter",
    vendor: "audio_mixer",
    description: "Volume and stereo angle panning",
};

const PARAMETERS: [ParameterInfo; 2] = [
    ParameterInfo::scalar("volume", "Volume level of audio", KnobType::Circle),
    ParameterInfo::scalar("angle", "View angle", KnobType::Line),
];

/// Left and right gains for a pan angle in radians.
///
/// Angle 0 leaves both channels at unity; positive angles move the image right.
pub fn pan_gains(angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (cos - sin, cos + sin)
}

/// Emitter with a linear volume and a stereo pan angle.
#[derive(Debug)]
pub struct BasicEmitter {
    core: EmitterCore,
    volume: f32,
    angle: f32,
}

impl Default for BasicEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicEmitter {
    /// Unity volume, centered.
    pub fn new() -> Self {
        Self {
            core: EmitterCore::new(),
            volume: 1.0,
            angle: 0.0,
        }
    }

    /// Linear volume.
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    /// Pan angle in radians.
    pub const fn angle(&self) -> f32 {
        self.angle
    }
}

impl Plugin for BasicEmitter {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn parameters(&self) -> &[ParameterInfo] {
        &PARAMETERS
    }

    fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, value.len())?;
        match index {
            0 => self.volume = value[0],
            _ => self.angle = value[0],
        }
        Ok(())
    }

    fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()> {
        check_parameter(&PARAMETERS, index, out.len())?;
        out[0] = match index {
            0 => self.volume,
            _ => self.angle,
        };
        Ok(())
    }
}

impl Emitter for BasicEmitter {
    fn kind(&self) -> EmitterKind {
        EmitterKind::Basic
    }

    fn core(&self) -> &EmitterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EmitterCore {
        &mut self.core
    }

    fn apply_voice(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) {
        let channels = buffers.channels_mut();
        if channels.len() >= 2 {
            let (left, right) = pan_gains(self.angle);
            channels[0].iter_mut().take(frames).for_each(|s| *s *= left);
            channels[1].iter_mut().take(frames).for_each(|s| *s *= right);
        }
        for channel in channels.iter_mut() {
            channel.iter_mut().take(frames).for_each(|s| *s *= self.volume);
        }
    }
}
