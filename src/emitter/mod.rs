//! Emitters: playable voices bound to a listener.
//!
//! An emitter pulls frames from its listener at its own position, applies its
//! built-in voice processing (gain and panning) and then its effect chain.
//! The shared bookkeeping (listener binding, state, looping, position, effects)
//! lives in [`EmitterCore`]; concrete emitters only add their parameters and
//! voice processing.

pub mod basic;
pub mod spatial;

pub use basic::BasicEmitter;
pub use spatial::SpatialEmitter;

use crate::arena::Handle;
use crate::buffers::PlanarBuffer;
use crate::effect::{Effect, EffectChain, EffectHandle};
use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;
use crate::listener::SharedListener;
use crate::plugin::Plugin;
use tracing::{debug, warn};

/// Handle to an emitter attached to a listener.
pub type EmitterHandle = Handle<Box<dyn Emitter>>;

/// Playback state of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum EmitterState {
    /// Not producing audio; position is kept
    #[default]
    Stopped,
    /// Producing audio
    Playing,
    /// Temporarily not producing audio
    Paused,
}

/// What happens when the listener runs out of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaybackMode {
    /// Play once, then stop
    #[default]
    OneShot,
    /// Rewind and continue from the start
    Loop,
}

/// Closed set of emitter implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum EmitterKind {
    /// Volume and stereo angle
    Basic,
    /// Distance attenuation and azimuth panning
    Spatial,
}

/// Creates an emitter of the given kind with default parameters.
pub fn create_emitter(kind: EmitterKind) -> Box<dyn Emitter> {
    match kind {
        EmitterKind::Basic => Box::new(BasicEmitter::new()),
        EmitterKind::Spatial => Box::new(SpatialEmitter::new()),
    }
}

/// Listener binding, state and position shared by every emitter.
#[derive(Debug, Default)]
pub struct EmitterCore {
    listener: Option<SharedListener>,
    format: PcmFormat,
    state: EmitterState,
    mode: PlaybackMode,
    position: usize,
    effects: EffectChain,
}

impl EmitterCore {
    /// Creates an unbound, stopped core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulls `frames` frames from the listener into `out`, handling the end of
    /// the stream according to the playback mode.
    ///
    /// One-shot playback zero-fills whatever the listener could not supply,
    /// stops, and returns the short count. Looping playback rewinds and fills
    /// the remainder from the start of the stream.
    pub fn pull(&mut self, out: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<usize> {
        if self.state != EmitterState::Playing {
            return Err(MixerError::Inactive { state: self.state });
        }
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| MixerError::invalid_handle("emitter is not bound to a listener"))?;
        let mut listener = listener.lock();

        let full_frames = listener.full_frames();
        if self.position > full_frames {
            self.position = 0;
        }
        listener.set_position(self.position);
        let mut read = listener.process(out, 0, frames);

        if read < frames {
            match self.mode {
                PlaybackMode::OneShot => {
                    out.clear_range(read, frames - read);
                    self.state = EmitterState::Stopped;
                    self.position = 0;
                    debug!(read, frames, "one-shot emitter reached end of stream");
                    return Ok(read);
                }
                PlaybackMode::Loop => {
                    listener.set_position(0);
                    read += listener.process(out, read, frames - read);
                    if read != frames {
                        warn!("expected {frames} frames but value is {read}");
                        out.clear_range(read, frames - read);
                    }
                }
            }
        }

        self.position = listener.position();
        Ok(read)
    }
}

/// A playable voice bound to one listener.
pub trait Emitter: Plugin + Send {
    /// Which implementation this is.
    fn kind(&self) -> EmitterKind;

    /// Shared bookkeeping.
    fn core(&self) -> &EmitterCore;

    /// Shared bookkeeping, mutably.
    fn core_mut(&mut self) -> &mut EmitterCore;

    /// Built-in per-voice processing (gain, panning) over the first `frames` frames.
    fn apply_voice(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize);

    /// Fails if this emitter cannot run at `format`. Changes nothing.
    fn check_format(&self, format: &PcmFormat) -> MixerResult<()> {
        format.validate()
    }

    /// Sets the stream format and propagates it to every effect.
    fn set_format(&mut self, format: &PcmFormat) -> MixerResult<()> {
        self.check_format(format)?;
        let core = self.core_mut();
        core.format = *format;
        core.effects.set_format(format);
        Ok(())
    }

    /// Current stream format.
    fn format(&self) -> PcmFormat {
        self.core().format
    }

    /// Appends a clone of `effect` to the effect chain.
    fn add_effect(&mut self, effect: &dyn Effect) -> EffectHandle {
        self.core_mut().effects.add(effect)
    }

    /// Removes an effect from the chain.
    fn delete_effect(&mut self, handle: EffectHandle) -> MixerResult<Box<dyn Effect>> {
        self.core_mut().effects.remove(handle)
    }

    /// The effect chain.
    fn effects(&self) -> &EffectChain {
        &self.core().effects
    }

    /// The effect chain, mutably.
    fn effects_mut(&mut self) -> &mut EffectChain {
        &mut self.core_mut().effects
    }

    /// Binds (or with `None`, unbinds) the listener this emitter reads from.
    fn set_listener(&mut self, listener: Option<SharedListener>) {
        let core = self.core_mut();
        core.listener = listener;
        core.position = 0;
    }

    /// The bound listener.
    fn listener(&self) -> Option<&SharedListener> {
        self.core().listener.as_ref()
    }

    /// Sets the playback state.
    fn set_state(&mut self, state: EmitterState) {
        self.core_mut().state = state;
    }

    /// Current playback state.
    fn state(&self) -> EmitterState {
        self.core().state
    }

    /// Sets one-shot or looping playback.
    fn set_mode(&mut self, mode: PlaybackMode) {
        self.core_mut().mode = mode;
    }

    /// Current playback mode.
    fn mode(&self) -> PlaybackMode {
        self.core().mode
    }

    /// Moves the playback position (in output frames).
    fn set_position(&mut self, frame: usize) {
        self.core_mut().position = frame;
    }

    /// Current playback position in output frames.
    fn position(&self) -> usize {
        self.core().position
    }

    /// Renders `frames` frames into `buffers`: pull, voice processing, effects.
    ///
    /// Fails with [`MixerError::Inactive`] unless playing. Returns the number of
    /// frames the listener supplied.
    fn process(&mut self, buffers: &mut PlanarBuffer<f32>, frames: usize) -> MixerResult<usize> {
        let read = self.core_mut().pull(buffers, frames)?;
        self.apply_voice(buffers, frames);
        self.core_mut().effects.process(buffers, frames);
        Ok(read)
    }
}

impl std::fmt::Debug for dyn Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("kind", &self.kind())
            .field("state", &self.state())
            .field("mode", &self.mode())
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::GainEffect;
    use crate::listener::{Listener, MemoryResource};

    fn ramp_listener(frames: usize) -> SharedListener {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        let resource = MemoryResource::new(vec![samples], 48000);
        let mut listener = Listener::new(Box::new(resource), false);
        listener.set_format(&PcmFormat::float(1, 48000, 150)).unwrap();
        listener.into_shared()
    }

    fn playing_emitter(listener: &SharedListener, mode: PlaybackMode) -> BasicEmitter {
        let mut emitter = BasicEmitter::new();
        emitter.set_listener(Some(listener.clone()));
        emitter.set_format(&listener.lock().format()).unwrap();
        emitter.set_mode(mode);
        emitter.set_state(EmitterState::Playing);
        emitter
    }

    #[test]
    fn test_loop_wraps_around() {
        let listener = ramp_listener(100);
        let mut emitter = playing_emitter(&listener, PlaybackMode::Loop);

        let mut out = PlanarBuffer::new();
        assert_eq!(emitter.process(&mut out, 150).unwrap(), 150);

        let expected: Vec<f32> = (0..100).chain(0..50).map(|i| i as f32).collect();
        assert_eq!(&out[0][..150], expected.as_slice());
        assert_eq!(emitter.position(), 50);
        assert_eq!(emitter.state(), EmitterState::Playing);
    }

    #[test]
    fn test_one_shot_stops_with_short_count() {
        let listener = ramp_listener(100);
        let mut emitter = playing_emitter(&listener, PlaybackMode::OneShot);

        let mut out = PlanarBuffer::with_shape(1, 150).unwrap();
        out[0].fill(7.0);
        let read = emitter.process(&mut out, 150).unwrap();

        assert!(read <= 100);
        assert_eq!(read, 100);
        assert_eq!(emitter.state(), EmitterState::Stopped);
        assert!(out[0][100..150].iter().all(|&s| s == 0.0));
        assert!(matches!(
            emitter.process(&mut out, 10),
            Err(MixerError::Inactive { state: EmitterState::Stopped })
        ));
    }

    #[test]
    fn test_inactive_states_fail() {
        let listener = ramp_listener(10);
        let mut emitter = playing_emitter(&listener, PlaybackMode::Loop);
        let mut out = PlanarBuffer::new();

        emitter.set_state(EmitterState::Paused);
        assert!(matches!(
            emitter.process(&mut out, 4),
            Err(MixerError::Inactive { state: EmitterState::Paused })
        ));

        let mut unbound = BasicEmitter::new();
        unbound.set_state(EmitterState::Playing);
        assert!(unbound.process(&mut out, 4).is_err());
    }

    #[test]
    fn test_position_past_end_resets() {
        let listener = ramp_listener(10);
        let mut emitter = playing_emitter(&listener, PlaybackMode::Loop);
        emitter.set_position(500);

        let mut out = PlanarBuffer::new();
        emitter.process(&mut out, 3).unwrap();
        assert_eq!(&out[0][..3], &[0.0, 1.0, 2.0]);
        assert_eq!(emitter.position(), 3);
    }

    #[test]
    fn test_effects_follow_voice_processing() {
        let listener = ramp_listener(4);
        let mut emitter = playing_emitter(&listener, PlaybackMode::Loop);
        emitter.set_parameter(0, &[0.5]).unwrap();
        emitter.add_effect(&GainEffect::new(4.0));

        let mut out = PlanarBuffer::new();
        emitter.process(&mut out, 4).unwrap();
        assert_eq!(&out[0][..4], &[0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_factory_creates_requested_kind() {
        assert_eq!(create_emitter(EmitterKind::Basic).kind(), EmitterKind::Basic);
        assert_eq!(create_emitter(EmitterKind::Spatial).kind(), EmitterKind::Spatial);
        assert_eq!(create_emitter(EmitterKind::Basic).state(), EmitterState::Stopped);
    }
}
