//! Background producer that keeps the mixer's ring buffer filled.
//!
//! The audio callback only drains rendered samples through
//! [`RenderThread::update`]; the render thread sleeps on an [`Event`] and renders
//! a new pass whenever the consumer reports the ring drained (or the poll
//! interval elapses). Neither side busy-waits.

use super::{RenderThreadConfig, SharedMixer};
use crate::error::{MixerError, MixerResult};
use crate::event::{Event, WaitableEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace};

/// Owns the producer thread for a [`SharedMixer`].
#[derive(Debug)]
pub struct RenderThread {
    mixer: SharedMixer,
    config: RenderThreadConfig,
    wake: Arc<Event>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Starts rendering `mixer` in the background.
    pub fn spawn(mixer: SharedMixer, config: RenderThreadConfig) -> MixerResult<Self> {
        if config.frames == 0 || config.channels == 0 {
            return Err(MixerError::invalid_parameter(
                "render thread",
                "frames and channels must be non-zero",
            ));
        }

        let wake = Arc::new(Event::new());
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let mixer = Arc::clone(&mixer);
            let wake = Arc::clone(&wake);
            let running = Arc::clone(&running);
            let config = config.clone();
            thread::Builder::new()
                .name("audio-mixer-render".to_string())
                .spawn(move || render_loop(&mixer, &wake, &running, &config))
                .map_err(|e| MixerError::allocation("render thread", e.to_string()))?
        };

        info!(
            frames = config.frames,
            channels = config.channels,
            sample_rate = config.sample_rate,
            "render thread started"
        );
        Ok(Self {
            mixer,
            config,
            wake,
            running,
            handle: Some(handle),
        })
    }

    /// The mixer being rendered.
    pub const fn mixer(&self) -> &SharedMixer {
        &self.mixer
    }

    /// Whether the producer thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Fills `out` with rendered samples without rendering on this thread.
    ///
    /// Whatever cannot be served (mixer busy past the lock timeout, or not
    /// enough rendered audio) is zero-filled and reported as an underrun.
    pub fn update(&self, out: &mut [f32]) -> MixerResult<()> {
        let Some(mut mixer) = self.mixer.try_lock_for(self.config.lock_timeout) else {
            out.fill(0.0);
            return Err(MixerError::buffer_underrun("mixer lock timed out"));
        };
        let read = mixer.read_rendered(out);
        let drained = mixer.pending_buffers() == 0;
        drop(mixer);

        if drained {
            self.wake.raise();
        }
        if read < out.len() {
            out[read..].fill(0.0);
            return Err(MixerError::buffer_underrun(format!(
                "{read} of {} samples rendered",
                out.len()
            )));
        }
        Ok(())
    }

    /// Stops the producer thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.wake.raise();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("render thread panicked");
            } else {
                info!("render thread stopped");
            }
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render_loop(
    mixer: &SharedMixer,
    wake: &Event,
    running: &AtomicBool,
    config: &RenderThreadConfig,
) {
    while running.load(Ordering::Acquire) {
        {
            let mut mixer = mixer.lock();
            if mixer.pending_buffers() == 0 && mixer.listener_count() > 0 {
                match mixer.render(config.frames, config.channels, config.sample_rate) {
                    Ok(()) => trace!("render pass complete"),
                    Err(error) => debug!(%error, "render pass failed"),
                }
            }
        }
        wake.wait_timeout(config.poll_interval);
    }
}
