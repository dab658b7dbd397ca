//! Background sweeper thread
//!
//! The sweeper wakes once per period and runs a caller-supplied tick. It keeps
//! ticker semantics: deadlines advance in fixed steps from the start instant
//! and ticks missed while a slow tick was running are skipped, never queued.
//!
//! Stopping is cooperative. [`Sweeper::stop`] raises a flag under a mutex and
//! wakes the thread through a condition variable, then joins it. The tick
//! itself may also end the loop by returning `false`, which the cache uses
//! when its storage has already been dropped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::error::{CacheError, CacheResult};

/// Stop flag shared between the owner and the sweeper thread.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn raise(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = true;
        drop(stopped);
        self.wake.notify_all();
    }

    fn is_raised(&self) -> bool {
        *self.stopped.lock()
    }

    /// Block until `deadline` passes or the signal is raised.
    ///
    /// Returns `true` if the signal was raised.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn wait(&self) {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            self.wake.wait(&mut stopped);
        }
    }
}

/// Handle to a running sweeper thread. Dropping it stops and joins the thread.
#[derive(Debug)]
pub(crate) struct Sweeper {
    name: String,
    period: Duration,
    signal: Arc<StopSignal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Start a thread that calls `tick` once every `period`.
    ///
    /// The loop ends when the sweeper is stopped or when `tick` returns
    /// `false`.
    pub(crate) fn spawn<F>(name: &str, period: Duration, tick: F) -> CacheResult<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(&thread_signal, period, tick))
            .map_err(CacheError::SweeperSpawn)?;

        info!(thread = name, period = ?period, "cache sweeper started");

        Ok(Self {
            name: name.to_string(),
            period,
            signal,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    /// Whether the thread is still looping.
    pub(crate) fn is_running(&self) -> bool {
        if self.signal.is_raised() {
            return false;
        }
        self.handle.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the thread to exit and wait for it. Idempotent.
    ///
    /// The handle lock is held across the join, so a concurrent caller blocks
    /// until the thread is gone. When called from the sweeper thread itself
    /// (the last cache handle was dropped inside a tick) the join is skipped
    /// and the loop exits on the raised signal.
    pub(crate) fn stop(&self) {
        self.signal.raise();

        let mut slot = self.handle.lock();
        let Some(handle) = slot.take() else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            debug!(thread = %self.name, "cache sweeper released from its own thread");
            return;
        }

        if handle.join().is_err() {
            warn!(thread = %self.name, "cache sweeper panicked before shutdown");
        } else {
            info!(thread = %self.name, "cache sweeper stopped");
        }
        drop(slot);
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F>(signal: &StopSignal, period: Duration, mut tick: F)
where
    F: FnMut() -> bool,
{
    // A period too large to represent as a deadline never ticks.
    let Some(mut next) = Instant::now().checked_add(period) else {
        signal.wait();
        return;
    };

    loop {
        if signal.wait_until(next) {
            return;
        }

        if !tick() {
            debug!("cache storage dropped, sweeper exiting");
            return;
        }

        let now = Instant::now();
        while next <= now {
            match next.checked_add(period) {
                Some(deadline) => next = deadline,
                None => {
                    signal.wait();
                    return;
                }
            }
        }
    }
}
