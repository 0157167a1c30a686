//! Periodic fetch loop driving one session's history.
//!
//! A poller owns a single background thread. Ticks run on that thread one after
//! another, so two ticks of the same poller can never overlap: a tick that overruns
//! its slot simply pushes the next tick to the following slot boundary, and the slots
//! it missed are skipped rather than replayed.
//!
//! ```text
//! Idle --start()--> Running --stop()--> Stopped
//! ```
//!
//! `stop()` on an idle poller is a no-op. `Stopped` is terminal; a new poller must be
//! built to poll again.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::clock::{CancelToken, Clock};
use super::error::PollerError;
use super::observer::TelemetryObserver;
use super::series::SharedHistory;
use super::types::SampleCounter;
use crate::control::TelemetryBackend;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerStatus {
    Idle,
    Running,
    Stopped,
}

enum PollerState {
    Idle,
    Running { cancel: CancelToken, handle: JoinHandle<()> },
    Stopped,
}

pub struct TelemetryPoller {
    name: String,
    backend: Arc<dyn TelemetryBackend>,
    clock: Arc<dyn Clock>,
    history: SharedHistory,
    counter: SampleCounter,
    state: PollerState,
}

impl TelemetryPoller {
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn TelemetryBackend>,
        clock: Arc<dyn Clock>,
        history: SharedHistory,
        counter: SampleCounter,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            clock,
            history,
            counter,
            state: PollerState::Idle,
        }
    }

    pub fn status(&self) -> PollerStatus {
        match self.state {
            PollerState::Idle => PollerStatus::Idle,
            PollerState::Running { .. } => PollerStatus::Running,
            PollerState::Stopped => PollerStatus::Stopped,
        }
    }

    /// Start ticking every `interval`, the first tick firing immediately.
    pub fn start(&mut self, interval: Duration, observer: Arc<dyn TelemetryObserver>) -> Result<(), PollerError> {
        match self.state {
            PollerState::Idle => {}
            PollerState::Running { .. } => {
                log::error!("Poller {} started twice", self.name);
                return Err(PollerError::AlreadyRunning);
            }
            PollerState::Stopped => {
                log::error!("Poller {} started after stop", self.name);
                return Err(PollerError::AlreadyStopped);
            }
        }
        if interval.is_zero() {
            return Err(PollerError::ZeroInterval);
        }

        let cancel = CancelToken::new();
        let worker = Worker {
            name: self.name.clone(),
            backend: self.backend.clone(),
            clock: self.clock.clone(),
            history: self.history.clone(),
            counter: self.counter.clone(),
            observer,
            cancel: cancel.clone(),
            interval,
        };

        let handle = thread::Builder::new()
            .name(format!("poller:{}", self.name))
            .spawn(move || worker.run())
            .map_err(|e| PollerError::Spawn(e.to_string()))?;

        log::info!("Poller {} started, interval {:?}", self.name, interval);
        self.state = PollerState::Running { cancel, handle };
        Ok(())
    }

    /// Stop ticking and wait for an in-flight tick to finish.
    ///
    /// Once this returns no observer callback from this poller will fire again. A
    /// fetch that completes after the stop request has its result discarded. Calling
    /// this on an idle or stopped poller does nothing.
    ///
    /// When called from inside an observer callback (on the poller's own thread) the
    /// poller is cancelled without joining; the current callback is the last one.
    pub fn stop(&mut self) {
        if !matches!(self.state, PollerState::Running { .. }) {
            return;
        }
        let state = std::mem::replace(&mut self.state, PollerState::Stopped);
        let PollerState::Running { cancel, handle } = state else {
            return;
        };

        cancel.cancel();
        if handle.thread().id() == thread::current().id() {
            log::debug!("Poller {} stopped from its own callback", self.name);
            return;
        }
        if handle.join().is_err() {
            log::error!("Poller {} thread panicked", self.name);
        }
        log::info!("Poller {} stopped", self.name);
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    name: String,
    backend: Arc<dyn TelemetryBackend>,
    clock: Arc<dyn Clock>,
    history: SharedHistory,
    counter: SampleCounter,
    observer: Arc<dyn TelemetryObserver>,
    cancel: CancelToken,
    interval: Duration,
}

impl Worker {
    fn run(self) {
        let mut due = self.clock.now();
        while self.clock.sleep_until(due, &self.cancel) {
            if !self.tick() {
                break;
            }
            let now = self.clock.now();
            let next = next_due(due, self.interval, now);
            if next > due + self.interval {
                log::debug!(
                    "Poller {} tick overran, skipping {} slot(s)",
                    self.name,
                    missed_slots(due, next, self.interval)
                );
            }
            due = next;
        }
    }

    /// Run one fetch and publish its outcome. Returns false once cancelled.
    fn tick(&self) -> bool {
        let result = self.backend.fetch_latest();
        if self.cancel.is_cancelled() {
            log::debug!("Poller {} discarding result fetched after stop", self.name);
            return false;
        }

        match result {
            Ok(sample) => {
                let index = {
                    let mut history = self.history.lock();
                    let index = self.counter.next();
                    history.push(index, &sample);
                    index
                };
                log::trace!("Poller {} sample #{}: {:?}", self.name, index, sample);
                self.observer.on_sample(&sample, index);
            }
            Err(e) => {
                log::warn!("Poller {} tick failed: {}", self.name, e);
                self.observer.on_error(e.kind(), &e.to_string());
            }
        }
        true
    }
}

/// First slot boundary after `previous` that is not already in the past at `now`.
fn next_due(previous: Duration, interval: Duration, now: Duration) -> Duration {
    let next = previous + interval;
    if next >= now {
        return next;
    }
    let step = interval.as_nanos();
    let slots = (now - previous).as_nanos().div_ceil(step);
    previous + Duration::from_nanos((step * slots) as u64)
}

fn missed_slots(previous: Duration, next: Duration, interval: Duration) -> u128 {
    (next - previous).as_nanos() / interval.as_nanos() - 1
}
