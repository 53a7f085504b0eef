//! In-place processors applied to an emitter's planar output.
//!
//! An [`Effect`] sees one block of per-channel audio at a time and mutates it
//! in place. Effects are owned by an [`EffectChain`], which runs them in the
//! order they were added.

pub mod chain;
pub mod delay;
pub mod gain;
pub mod lowpass;

pub use chain::{EffectChain, EffectHandle};
pub use delay::DelayEffect;
pub use gain::GainEffect;
pub use lowpass::LowPassEffect;

use crate::buffers::PlanarBuffer;
use crate::error::MixerResult;
use crate::format::PcmFormat;
use crate::plugin::Plugin;

/// A processor in an emitter's effect chain.
pub trait Effect: Plugin + Send {
    /// Processes the first `frames` frames of every channel in place.
    fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<()>;

    /// Updates the stream format. Called before the next `process` after any change.
    fn set_format(&mut self, format: &PcmFormat);

    /// Current stream format.
    fn format(&self) -> PcmFormat;

    /// Clears internal state such as delay lines or filter history.
    fn reset(&mut self) {}

    /// Latency the effect adds, in frames.
    fn latency_frames(&self) -> usize {
        0
    }

    /// Independent copy of this effect.
    fn clone_box(&self) -> Box<dyn Effect>;
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
