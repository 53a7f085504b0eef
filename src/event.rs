//! Binary auto-reset event used to wake the render thread.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A waitable binary signal.
pub trait WaitableEvent: Send + Sync {
    /// Sets the signal and wakes one waiter.
    fn raise(&self);
    /// Clears the signal.
    fn reset(&self);
    /// Blocks until the signal is set, then clears it.
    fn wait(&self);
    /// Waits up to `timeout`. Returns `true` (and clears the signal) if it was
    /// raised, `false` on timeout.
    fn wait_timeout(&self, timeout: Duration) -> bool;
    /// Whether the signal is currently set.
    fn is_raised(&self) -> bool;
}

/// [`WaitableEvent`] backed by a `parking_lot` mutex and condition variable.
#[derive(Debug, Default)]
pub struct Event {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl Event {
    /// Creates an unsignaled event.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WaitableEvent for Event {
    fn raise(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.condvar.notify_one();
    }

    fn reset(&self) {
        *self.signaled.lock() = false;
    }

    fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.condvar.wait(&mut signaled);
        }
        *signaled = false;
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.condvar.wait_until(&mut signaled, deadline).timed_out() {
                break;
            }
        }
        std::mem::replace(&mut *signaled, false)
    }

    fn is_raised(&self) -> bool {
        *self.signaled.lock()
    }
}
