//! Metadata and parameter plumbing shared by effects and emitters.

use crate::error::{MixerError, MixerResult};

/// Broad classification of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum PluginCategory {
    /// Unclassified
    #[default]
    Unknown,
    /// Generic audio effect
    Effect,
    /// Synthesizer
    Synth,
    /// Analysis only, does not alter audio
    Analysis,
    /// Mastering processor
    Mastering,
    /// Positions audio in space
    Spatializer,
    /// Room simulation
    RoomFx,
    /// Surround processor
    SurroundFx,
    /// Noise reduction and repair
    Restoration,
    /// Offline processor
    OfflineProcess,
    /// Container for other processors
    Shell,
    /// Tone or noise generator
    Generator,
}

/// Where in the signal path a processor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectType {
    /// Unspecified
    #[default]
    Unknown,
    /// Runs on a single emitter
    SoundEffect,
    /// Runs before mixing
    PreMix,
    /// Runs on the finished mix
    AfterMix,
    /// Works in the frequency domain
    Fft,
}

/// Suggested UI control for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum KnobType {
    /// No control
    #[default]
    None,
    /// Rotary knob
    Circle,
    /// Linear slider
    Line,
    /// Processor-specific control
    Custom,
}

/// Static description of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    /// Category
    pub category: PluginCategory,
    /// Position in the signal path
    pub effect_type: EffectType,
    /// Display name
    pub name: &'static str,
    /// Vendor string
    pub vendor: &'static str,
    /// One-line description
    pub description: &'static str,
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Suggested control
    pub knob: KnobType,
    /// Number of `f32` values the parameter holds
    pub size: usize,
}

impl ParameterInfo {
    /// A single-value parameter.
    pub const fn scalar(name: &'static str, description: &'static str, knob: KnobType) -> Self {
        Self {
            name,
            description,
            knob,
            size: 1,
        }
    }

    /// A three-component vector parameter.
    pub const fn vector3(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            knob: KnobType::Custom,
            size: 3,
        }
    }
}

/// Introspection and indexed float parameters.
pub trait Plugin {
    /// Static description.
    fn info(&self) -> &PluginInfo;

    /// Parameter table, indexed by parameter number.
    fn parameters(&self) -> &[ParameterInfo];

    /// Sets parameter `index` from `value`, whose length must match the parameter size.
    fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()>;

    /// Copies parameter `index` into `out`, whose length must match the parameter size.
    fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()>;

    /// Number of parameters.
    fn parameter_count(&self) -> usize {
        self.parameters().len()
    }
}

/// Looks up `index` in `table` and checks that `len` values fit it exactly.
pub fn check_parameter(
    table: &[ParameterInfo],
    index: usize,
    len: usize,
) -> MixerResult<&ParameterInfo> {
    let info = table.get(index).ok_or_else(|| {
        MixerError::invalid_parameter(
            format!("#{index}"),
            format!("only {} parameters available", table.len()),
        )
    })?;
    if info.size != len {
        return Err(MixerError::invalid_parameter(
            info.name,
            format!("expected {} value(s), got {len}", info.size),
        ));
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [ParameterInfo; 2] = [
        ParameterInfo::scalar("volume", "Volume level", KnobType::Line),
        ParameterInfo::vector3("position", "Position"),
    ];

    #[test]
    fn test_check_parameter_sizes() {
        assert!(check_parameter(&TABLE, 0, 1).is_ok());
        assert!(check_parameter(&TABLE, 1, 3).is_ok());
        assert!(matches!(
            check_parameter(&TABLE, 0, 2),
            Err(MixerError::InvalidParameter { .. })
        ));
        assert!(check_parameter(&TABLE, 1, 1).is_err());
        assert!(check_parameter(&TABLE, 2, 1).is_err());
    }
}
