// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![warn(missing_docs)]

//! # audio_mixer
//!
//! A real-time audio mixing engine: media sources are pulled through
//! listeners, resampled to a common mix format, voiced and processed by
//! emitters, summed, and handed to a hardware callback through a small ring
//! buffer rendered ahead of real time.
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! audio_mixer = "0.1.0"
//! ```
//!
//! ## Features
//!
//! - `playback`: the CPAL output endpoint (`endpoint::CpalEndpoint`)
//! - `serialization`: serde support for formats, states and configuration
//!
//! ## Building a mix
//!
//! ```rust
//! use audio_mixer::{
//!     Emitter, EmitterKind, EmitterState, MemoryResource, Mixer, MixerConfig, PlaybackMode,
//! };
//!
//! # fn main() -> audio_mixer::MixerResult<()> {
//! let mut mixer = Mixer::new(MixerConfig::default())?;
//!
//! // One second of a quiet 440 Hz tone at 44.1 kHz; the listener resamples it.
//! let tone: Vec<f32> = (0..44100)
//!     .map(|i| 0.1 * (i as f32 * 440.0 * std::f32::consts::TAU / 44100.0).sin())
//!     .collect();
//! let source = MemoryResource::new(vec![tone], 44100);
//! let listener = mixer.create_listener_from_resource(Box::new(source), None)?;
//!
//! let mut emitter = mixer.create_emitter(EmitterKind::Basic);
//! emitter.set_mode(PlaybackMode::Loop);
//! emitter.set_state(EmitterState::Playing);
//! mixer.add_emitter_to_listener(listener, emitter)?;
//!
//! // What a hardware callback would do for each device period.
//! let mut out = vec![0.0f32; 480 * 2];
//! mixer.update(&mut out, 480, 2, 48000)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`buffers`]: linear, planar and ring buffers plus layout conversions
//! - [`resampler`]: sinc sample-rate conversion behind the [`Resampler`] trait
//! - [`listener`]: media resources adapted to the mix format
//! - [`emitter`]: playable voices with volume, panning and effect chains
//! - [`effect`]: the [`Effect`] trait, built-in effects and [`EffectChain`]
//! - [`mixer`]: the listener/emitter graph, rendering and the render thread
//! - [`endpoint`]: the callback contract with hardware endpoints

pub mod arena;
pub mod buffers;
pub mod effect;
pub mod emitter;
pub mod endpoint;
mod error;
pub mod event;
pub mod format;
pub mod listener;
pub mod mixer;
pub mod plugin;
pub mod resampler;

pub use crate::arena::{Arena, Handle};
pub use crate::buffers::{Buffer, PlanarBuffer, RingBuffer};
pub use crate::effect::{
    DelayEffect, Effect, EffectChain, EffectHandle, GainEffect, LowPassEffect,
};
pub use crate::emitter::{
    BasicEmitter, Emitter, EmitterHandle, EmitterKind, EmitterState, PlaybackMode, SpatialEmitter,
    create_emitter,
};
#[cfg(feature = "playback")]
pub use crate::endpoint::CpalEndpoint;
pub use crate::endpoint::{AudioCallback, AudioEndpoint, MixerCallback, OfflineEndpoint};
pub use crate::error::{MixerError, MixerResult};
pub use crate::event::{Event, WaitableEvent};
pub use crate::format::{EndpointInformation, EndpointType, PcmFormat, calculate_frames};
pub use crate::listener::{
    Listener, MediaResource, MemoryResource, ResourceRegistry, SharedListener,
};
pub use crate::mixer::{
    ListenerHandle, Mixer, MixerConfig, RenderThread, RenderThreadConfig, SharedMixer,
};
pub use crate::plugin::{EffectType, KnobType, ParameterInfo, Plugin, PluginCategory, PluginInfo};
pub use crate::resampler::{Resampler, ResamplerSettings, SincResampler};
