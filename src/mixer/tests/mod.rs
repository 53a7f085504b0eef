//! Tests for the mixer graph, the render/update path and the render thread.

use super::{ListenerHandle, Mixer, MixerConfig};
use crate::emitter::{BasicEmitter, Emitter, EmitterState, PlaybackMode};
use crate::format::PcmFormat;
use crate::listener::MemoryResource;

mod render_tests;
mod render_thread_tests;

/// Two-slot configuration at 48 kHz with the given block size.
pub(crate) fn test_config(frames: usize, channels: usize) -> MixerConfig {
    MixerConfig {
        ring_buffers: 2,
        buffer_frames: frames,
        format: PcmFormat::float(channels, 48000, frames),
        linear_phase_resampling: false,
    }
}

/// Mono source counting up from zero.
pub(crate) fn ramp_resource(frames: usize) -> MemoryResource {
    MemoryResource::new(vec![(0..frames).map(|i| i as f32).collect()], 48000)
}

/// Source holding `value` on every channel.
pub(crate) fn constant_resource(value: f32, frames: usize, channels: usize) -> MemoryResource {
    MemoryResource::new(vec![vec![value; frames]; channels], 48000)
}

/// A centered, unity-volume emitter already playing.
pub(crate) fn playing_emitter(mode: PlaybackMode) -> Box<dyn Emitter> {
    let mut emitter = BasicEmitter::new();
    emitter.set_mode(mode);
    emitter.set_state(EmitterState::Playing);
    Box::new(emitter)
}

/// Mixer with one listener over `resource`.
pub(crate) fn mixer_with_source(
    config: MixerConfig,
    resource: MemoryResource,
) -> (Mixer, ListenerHandle) {
    let mut mixer = Mixer::new(config).unwrap();
    let listener = mixer
        .create_listener_from_resource(Box::new(resource), None)
        .unwrap();
    (mixer, listener)
}
