//! The mixer: listener/emitter graph, ring-buffered rendering and the pull API.
//!
//! [`Mixer::render`] walks every listener and every emitter under it, sums the
//! emitters' planar output into one mix, interleaves it and pushes it into the
//! ring buffer, once per ring slot. [`Mixer::update`] serves the hardware
//! callback from the ring, rendering on demand when the ring runs dry. A
//! [`RenderThread`] can take rendering off the callback thread entirely.
//!
//! Rendering ahead is only allowed once the consumer has drained every slot,
//! which bounds how far the mixer runs ahead of real time to the ring depth.
//!
//! Structural changes (adding or removing listeners and emitters) take
//! `&mut self`; share the mixer across threads as a [`SharedMixer`] so those
//! changes serialize against rendering.

pub mod config;
pub mod render_thread;

#[cfg(test)]
mod tests;

pub use config::{MixerConfig, RenderThreadConfig};
pub use render_thread::RenderThread;

use crate::arena::{Arena, Handle};
use crate::buffers::{Buffer, PlanarBuffer, RingBuffer, mix_add, planar_to_interleaved};
use crate::emitter::{Emitter, EmitterHandle, EmitterKind, create_emitter};
use crate::error::{MixerError, MixerResult};
use crate::format::PcmFormat;
use crate::listener::{Listener, MediaResource, ResourceRegistry, SharedListener};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A mixer shared between the control thread and the audio thread.
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Handle to a listener owned by a [`Mixer`].
pub type ListenerHandle = Handle<ListenerNode>;

/// One listener and the emitters reading from it.
pub struct ListenerNode {
    listener: SharedListener,
    emitters: Arena<Box<dyn Emitter>>,
}

impl std::fmt::Debug for ListenerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerNode")
            .field("listener", &self.listener)
            .field("emitters", &self.emitters.len())
            .finish()
    }
}

impl ListenerNode {
    /// The listener.
    pub const fn listener(&self) -> &SharedListener {
        &self.listener
    }

    /// Emitters in processing order.
    pub const fn emitters(&self) -> &Arena<Box<dyn Emitter>> {
        &self.emitters
    }
}

/// Real-time mixer.
#[derive(Debug)]
pub struct Mixer {
    config: MixerConfig,
    mix_format: PcmFormat,
    buffer_frames: usize,
    listeners: Arena<ListenerNode>,
    registry: ResourceRegistry,
    ring: RingBuffer<f32>,
    temp: PlanarBuffer<f32>,
    mix: PlanarBuffer<f32>,
    interleaved: Buffer<f32>,
}

impl Mixer {
    /// Creates a mixer with an empty resource registry.
    pub fn new(config: MixerConfig) -> MixerResult<Self> {
        config.validate()?;
        let ring = RingBuffer::new(
            config.ring_buffers,
            config.buffer_frames * config.format.channels,
        )?;
        Ok(Self {
            mix_format: config.format,
            buffer_frames: config.buffer_frames,
            config,
            listeners: Arena::new(),
            registry: ResourceRegistry::new(),
            ring,
            temp: PlanarBuffer::new(),
            mix: PlanarBuffer::new(),
            interleaved: Buffer::new(),
        })
    }

    /// Creates a mixer with the default configuration.
    pub fn with_default_config() -> MixerResult<Self> {
        Self::new(MixerConfig::default())
    }

    /// Wraps the mixer for sharing across threads.
    pub fn into_shared(self) -> SharedMixer {
        Arc::new(Mutex::new(self))
    }

    /// Active configuration.
    pub const fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// Resource handlers used by [`Mixer::create_listener`].
    pub const fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Resource handlers, mutably, to register extensions.
    pub const fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// Propagates `format` to every listener and its emitters and adopts its
    /// block size for rendering. Fails if there are no listeners.
    ///
    /// Every listener and emitter is checked before any of them changes, so a
    /// rejected format leaves the whole graph as it was.
    pub fn set_mix_format(&mut self, format: &PcmFormat) -> MixerResult<()> {
        format.validate()?;
        if self.listeners.is_empty() {
            return Err(MixerError::NoListeners);
        }

        for (_, node) in self.listeners.iter() {
            node.listener.lock().check_format(format)?;
            for (_, emitter) in node.emitters.iter() {
                emitter.check_format(format)?;
            }
        }

        let mut previous = Vec::with_capacity(self.listeners.len());
        for (_, node) in self.listeners.iter() {
            let mut listener = node.listener.lock();
            previous.push((Arc::clone(&node.listener), listener.format()));
            if let Err(error) = listener.set_format(format) {
                drop(listener);
                for (shared, old) in previous {
                    if let Err(restore) = shared.lock().set_format(&old) {
                        warn!(%restore, "listener format could not be restored");
                    }
                }
                return Err(error);
            }
        }
        self.listeners.for_each_mut(|_, node| {
            node.emitters.for_each_mut(|handle, emitter| {
                if let Err(error) = emitter.set_format(format) {
                    warn!(?handle, %error, "emitter kept its format");
                }
            });
        });

        self.mix_format = *format;
        if format.frames > 0 {
            self.buffer_frames = format.frames;
        }
        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            frames = self.buffer_frames,
            "mix format set"
        );
        Ok(())
    }

    /// Current mix format.
    pub const fn mix_format(&self) -> PcmFormat {
        self.mix_format
    }

    /// Frames rendered per ring slot.
    pub const fn buffer_frames(&self) -> usize {
        self.buffer_frames
    }

    /// Opens `locator` through the registry and appends a listener for it.
    ///
    /// The listener runs at `format`, or at the mix format when `None`.
    pub fn create_listener(
        &mut self,
        locator: &str,
        format: Option<&PcmFormat>,
    ) -> MixerResult<ListenerHandle> {
        let resource = self.registry.open(locator)?;
        self.create_listener_from_resource(resource, format)
    }

    /// Appends a listener for an already opened resource.
    pub fn create_listener_from_resource(
        &mut self,
        resource: Box<dyn MediaResource>,
        format: Option<&PcmFormat>,
    ) -> MixerResult<ListenerHandle> {
        let format = format.copied().unwrap_or(self.mix_format);
        format.validate()?;

        let mut listener = Listener::new(resource, self.config.linear_phase_resampling);
        listener.set_format(&format)?;
        let handle = self.listeners.push_back(ListenerNode {
            listener: listener.into_shared(),
            emitters: Arena::new(),
        });
        debug!(?handle, "listener created");
        Ok(handle)
    }

    /// Removes a listener together with its emitters.
    pub fn delete_listener(&mut self, handle: ListenerHandle) -> MixerResult<()> {
        let node = self
            .listeners
            .remove(handle)
            .ok_or_else(|| MixerError::invalid_handle(format!("listener {handle:?}")))?;
        debug!(?handle, emitters = node.emitters.len(), "listener deleted");
        Ok(())
    }

    /// The listener behind `handle`.
    pub fn listener(&self, handle: ListenerHandle) -> Option<SharedListener> {
        self.listeners.get(handle).map(|node| Arc::clone(&node.listener))
    }

    /// Listener handles in processing order.
    pub fn listener_handles(&self) -> Vec<ListenerHandle> {
        self.listeners.handles().collect()
    }

    /// Number of listeners.
    pub const fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Creates an unattached emitter of the given kind.
    pub fn create_emitter(&self, kind: EmitterKind) -> Box<dyn Emitter> {
        create_emitter(kind)
    }

    /// Attaches `emitter` to a listener, binding it and pushing the listener's
    /// format into it.
    pub fn add_emitter_to_listener(
        &mut self,
        listener: ListenerHandle,
        mut emitter: Box<dyn Emitter>,
    ) -> MixerResult<EmitterHandle> {
        let node = self
            .listeners
            .get_mut(listener)
            .ok_or_else(|| MixerError::invalid_handle(format!("listener {listener:?}")))?;

        let format = node.listener.lock().format();
        emitter.set_format(&format)?;
        emitter.set_listener(Some(Arc::clone(&node.listener)));
        Ok(node.emitters.push_back(emitter))
    }

    /// Detaches an emitter and hands it back unbound.
    pub fn delete_emitter_from_listener(
        &mut self,
        listener: ListenerHandle,
        emitter: EmitterHandle,
    ) -> MixerResult<Box<dyn Emitter>> {
        let node = self
            .listeners
            .get_mut(listener)
            .ok_or_else(|| MixerError::invalid_handle(format!("listener {listener:?}")))?;
        let mut emitter = node
            .emitters
            .remove(emitter)
            .ok_or_else(|| MixerError::invalid_handle(format!("emitter {emitter:?}")))?;
        emitter.set_listener(None);
        Ok(emitter)
    }

    /// Mutable access to an attached emitter.
    pub fn emitter_mut(
        &mut self,
        listener: ListenerHandle,
        emitter: EmitterHandle,
    ) -> Option<&mut (dyn Emitter + 'static)> {
        self.listeners
            .get_mut(listener)?
            .emitters
            .get_mut(emitter)
            .map(|e| e.as_mut())
    }

    /// Number of emitters attached to a listener.
    pub fn emitter_count(&self, listener: ListenerHandle) -> usize {
        self.listeners
            .get(listener)
            .map_or(0, |node| node.emitters.len())
    }

    /// Renders one ring's worth of slots of `frames` x `channels`.
    ///
    /// Fails without touching the ring when there are no listeners or when
    /// slots from the previous pass are still unread.
    pub fn render(&mut self, frames: usize, channels: usize, sample_rate: u32) -> MixerResult<()> {
        if self.listeners.is_empty() {
            return Err(MixerError::NoListeners);
        }
        let pending = self.ring.left_buffers();
        if pending > 0 {
            return Err(MixerError::Backpressure { pending });
        }
        if frames == 0 || channels == 0 {
            return Err(MixerError::invalid_parameter(
                "render",
                "frames and channels must be non-zero",
            ));
        }
        if sample_rate != self.mix_format.sample_rate {
            trace!(
                sample_rate,
                mix_rate = self.mix_format.sample_rate,
                "render rate differs from mix format"
            );
        }

        let slot = frames * channels;
        self.ring.set_buffers_count(self.config.ring_buffers)?;
        self.ring.resize(slot)?;
        self.temp.resize(channels, frames)?;
        self.mix.resize(channels, frames)?;
        self.interleaved.resize(slot)?;

        let Self {
            config,
            listeners,
            ring,
            temp,
            mix,
            interleaved,
            ..
        } = self;

        for _ in 0..config.ring_buffers {
            mix.clear();
            listeners.for_each_mut(|_, node| {
                node.emitters.for_each_mut(|handle, emitter| {
                    temp.clear();
                    match emitter.process(temp, frames) {
                        Ok(_) => {
                            let pairs = mix.channels_mut().iter_mut().zip(temp.channels());
                            for (target, source) in pairs.take(channels) {
                                mix_add(&mut target[..frames], &source[..frames]);
                            }
                        }
                        Err(MixerError::Inactive { .. }) => {}
                        Err(error) => debug!(?handle, %error, "emitter skipped"),
                    }
                });
            });
            planar_to_interleaved(mix, interleaved.as_mut_slice(), frames, channels);
            ring.push_buffer(&interleaved.as_slice()[..slot])?;
            ring.next_buffer();
        }
        Ok(())
    }

    /// Fills `out` with `frames` x `channels` interleaved samples.
    ///
    /// Renders when the ring is empty, and once more if the first read comes up
    /// short. A second short read is an underrun: the missing tail is zeroed and
    /// an error returned so the caller can count it.
    pub fn update(
        &mut self,
        out: &mut [f32],
        frames: usize,
        channels: usize,
        sample_rate: u32,
    ) -> MixerResult<()> {
        let wanted = frames * channels;
        if out.len() < wanted {
            return Err(MixerError::invalid_parameter(
                "out",
                format!("{} samples supplied, {wanted} required", out.len()),
            ));
        }
        let block = if self.buffer_frames > 0 { self.buffer_frames } else { frames };

        if self.ring.left_buffers() == 0 {
            self.render(block, channels, sample_rate)?;
        }
        let mut read = self.ring.read_data(&mut out[..wanted]);
        if read < wanted {
            self.render(block, channels, sample_rate)?;
            read += self.ring.read_data(&mut out[read..wanted]);
            if read < wanted {
                out[read..wanted].fill(0.0);
                debug!(read, wanted, "update underrun");
                return Err(MixerError::buffer_underrun(format!(
                    "rendered {read} of {wanted} samples after retry"
                )));
            }
        }
        Ok(())
    }

    /// Drains already rendered samples into `out` without rendering.
    pub fn read_rendered(&mut self, out: &mut [f32]) -> usize {
        self.ring.read_data(out)
    }

    /// Ring slots holding unread samples.
    pub const fn pending_buffers(&self) -> usize {
        self.ring.left_buffers()
    }

    /// Unread samples in the ring.
    pub const fn pending_samples(&self) -> usize {
        self.ring.left_samples()
    }

    /// Index of the ring slot the next render writes first.
    pub const fn ring_write_cursor(&self) -> usize {
        self.ring.write_cursor()
    }

    /// Discards rendered but unread audio.
    pub fn flush(&mut self) {
        self.ring.reset();
    }

    /// Capture is not supported by this mixer.
    pub fn record(
        &mut self,
        _input: &[f32],
        _frames: usize,
        _channels: usize,
        _sample_rate: u32,
    ) -> MixerResult<()> {
        Err(MixerError::Unsupported("record"))
    }
}
