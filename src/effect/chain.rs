//! Ordered effect chain.

use super::Effect;
use crate::arena::{Arena, Handle};
use crate::buffers::PlanarBuffer;
use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;
use tracing::warn;

/// Handle to an effect inside an [`EffectChain`].
pub type EffectHandle = Handle<Box<dyn Effect>>;

/// Effects applied in the order they were added.
///
/// Adding an effect stores an independent clone, so the caller's instance can
/// be reused or dropped without affecting the chain.
#[derive(Default)]
pub struct EffectChain {
    effects: Arena<Box<dyn Effect>>,
    format: Option<PcmFormat>,
}

impl std::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectChain")
            .field(
                "effects",
                &self.effects.iter().map(|(_, e)| e.info().name).collect::<Vec<_>>(),
            )
            .field("format", &self.format)
            .finish()
    }
}

impl EffectChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a clone of `effect` at the end of the chain.
    ///
    /// The clone receives the chain's current format before it is stored.
    pub fn add(&mut self, effect: &dyn Effect) -> EffectHandle {
        let mut effect = effect.clone_box();
        if let Some(format) = &self.format {
            effect.set_format(format);
        }
        self.effects.push_back(effect)
    }

    /// Removes and returns an effect.
    pub fn remove(&mut self, handle: EffectHandle) -> MixerResult<Box<dyn Effect>> {
        self.effects
            .remove(handle)
            .ok_or_else(|| MixerError::invalid_handle(format!("effect {handle:?}")))
    }

    /// Shared access to one effect.
    pub fn get(&self, handle: EffectHandle) -> Option<&dyn Effect> {
        self.effects.get(handle).map(|e| e.as_ref())
    }

    /// Mutable access to one effect, e.g. to change its parameters.
    pub fn get_mut(&mut self, handle: EffectHandle) -> Option<&mut (dyn Effect + 'static)> {
        self.effects.get_mut(handle).map(|e| e.as_mut())
    }

    /// Propagates `format` to every effect.
    pub fn set_format(&mut self, format: &PcmFormat) {
        self.format = Some(*format);
        self.effects.for_each_mut(|_, effect| effect.set_format(format));
    }

    /// Clears every effect's internal state.
    pub fn reset(&mut self) {
        self.effects.for_each_mut(|_, effect| effect.reset());
    }

    /// Runs every effect in order over the first `frames` frames.
    ///
    /// A failing effect is logged and skipped; the rest of the chain still runs.
    pub fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) {
        self.effects.for_each_mut(|handle, effect| {
            if let Err(error) = effect.process(buffers, frames) {
                warn!(effect = effect.info().name, ?handle, %error, "effect processing failed");
            }
        });
    }

    /// Total latency of the chain in frames.
    pub fn latency_frames(&self) -> usize {
        self.effects.iter().map(|(_, e)| e.latency_frames()).sum()
    }

    /// Handles in processing order.
    pub fn handles(&self) -> Vec<EffectHandle> {
        self.effects.handles().collect()
    }

    /// Number of effects.
    pub const fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the chain is empty.
    pub const fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{DelayEffect, GainEffect};
    use crate::plugin::Plugin;

    #[test]
    fn test_effects_run_in_insertion_order() {
        let mut chain = EffectChain::new();
        chain.add(&GainEffect::new(2.0));
        chain.add(&GainEffect::new(0.5));

        let mut buffers = PlanarBuffer::from_channels(vec![vec![1.0f32; 4], vec![1.0; 4]]);
        chain.process(&mut buffers, 4);
        for channel in buffers.channels() {
            assert_eq!(&channel[..], &[1.0, 1.0, 1.0, 1.0]);
        }
    }

    #[derive(Clone)]
    struct OffsetEffect(f32);

    impl Plugin for OffsetEffect {
        fn info(&self) -> &crate::plugin::PluginInfo {
            const INFO: crate::plugin::PluginInfo = crate::plugin::PluginInfo {
                category: crate::plugin::PluginCategory::Effect,
                effect_type: crate::plugin::EffectType::SoundEffect,
                name: "Offset",
                vendor: "tests",
                description: "Adds a constant",
            };
            &INFO
        }

        fn parameters(&self) -> &[crate::plugin::ParameterInfo] {
            &[]
        }

        fn set_parameter(&mut self, index: usize, value: &[f32]) -> MixerResult<()> {
            crate::plugin::check_parameter(&[], index, value.len()).map(|_| ())
        }

        fn parameter(&self, index: usize, out: &mut [f32]) -> MixerResult<()> {
            crate::plugin::check_parameter(&[], index, out.len()).map(|_| ())
        }
    }

    impl Effect for OffsetEffect {
        fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<()> {
            for channel in buffers.channels_mut() {
                channel.iter_mut().take(frames).for_each(|s| *s += self.0);
            }
            Ok(())
        }

        fn set_format(&mut self, _format: &PcmFormat) {}

        fn format(&self) -> PcmFormat {
            PcmFormat::default()
        }

        fn clone_box(&self) -> Box<dyn Effect> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_non_commuting_effects_apply_sequentially() {
        let mut chain = EffectChain::new();
        chain.add(&GainEffect::new(2.0));
        chain.add(&OffsetEffect(1.0));

        let mut buffers = PlanarBuffer::from_channels(vec![vec![1.0f32; 2]]);
        chain.process(&mut buffers, 2);
        assert_eq!(&buffers[0][..], &[3.0, 3.0]);
    }

    #[test]
    fn test_delay_then_mute() {
        let mut delay = DelayEffect::new(0.0, 0.0, 1.0);
        delay.set_format(&PcmFormat::float(1, 1000, 4));
        delay.set_parameter(0, &[1.0]).unwrap();

        let mut chain = EffectChain::new();
        chain.set_format(&PcmFormat::float(1, 1000, 4));
        chain.add(&delay);
        chain.add(&GainEffect::new(0.0));

        let mut buffers = PlanarBuffer::from_channels(vec![vec![1.0f32, 0.0, 0.0, 0.0]]);
        chain.process(&mut buffers, 4);
        assert_eq!(&buffers[0][..], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_add_clones_the_callers_effect() {
        let mut original = GainEffect::new(2.0);
        let mut chain = EffectChain::new();
        let handle = chain.add(&original);

        original.set_gain(10.0);
        let mut value = [0.0f32];
        chain.get(handle).unwrap().parameter(0, &mut value).unwrap();
        assert_eq!(value[0], 2.0);
    }

    #[test]
    fn test_set_format_reaches_every_effect() {
        let mut chain = EffectChain::new();
        let first = chain.add(&GainEffect::default());
        let format = PcmFormat::float(6, 96000, 128);
        chain.set_format(&format);
        let second = chain.add(&GainEffect::default());

        assert_eq!(chain.get(first).map(|e| e.format()), Some(format));
        assert_eq!(chain.get(second).map(|e| e.format()), Some(format));
    }

    #[test]
    fn test_remove_effect() {
        let mut chain = EffectChain::new();
        let doubler = chain.add(&GainEffect::new(2.0));
        chain.add(&GainEffect::new(3.0));

        assert!(chain.remove(doubler).is_ok());
        assert!(chain.remove(doubler).is_err());
        assert_eq!(chain.len(), 1);

        let mut buffers = PlanarBuffer::from_channels(vec![vec![1.0f32]]);
        chain.process(&mut buffers, 1);
        assert_eq!(buffers[0][0], 3.0);
    }
}
