//! Scripted collaborators for exercising the core without a network.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use super::clock::Clock;
use super::error::{ErrorKind, NetworkError};
use super::observer::TelemetryObserver;
use super::types::PowerSample;
use crate::control::TelemetryBackend;

/// Sample the scripted backend returns for its `n`-th fetch (1-based).
pub fn nth_sample(n: usize) -> PowerSample {
    PowerSample::new(n as f64, 5.0, 5.0 * n as f64)
}

#[derive(Default)]
struct BackendState {
    fetch_script: VecDeque<Result<PowerSample, NetworkError>>,
    fetch_count: usize,
    fetch_times: Vec<Duration>,
    fetch_threads: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    fetches_held: bool,
    limit_error: Option<NetworkError>,
    limit_requests: Vec<i32>,
    held_limits: HashSet<i32>,
}

/// Backend whose responses and timing are controlled by the test.
#[derive(Default)]
pub struct ScriptedBackend {
    clock: Option<Arc<dyn Clock>>,
    state: Mutex<BackendState>,
    cv: Condvar,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record fetch start times against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// Queue a result for an upcoming fetch. Unscripted fetches return [`nth_sample`].
    pub fn script_fetch(&self, result: Result<PowerSample, NetworkError>) {
        self.lock().fetch_script.push_back(result);
    }

    /// Make every fetch block after it has been recorded, until released.
    pub fn hold_fetches(&self) {
        self.lock().fetches_held = true;
    }

    pub fn release_fetches(&self) {
        self.lock().fetches_held = false;
        self.cv.notify_all();
    }

    pub fn fail_limits(&self, error: NetworkError) {
        self.lock().limit_error = Some(error);
    }

    /// Make power-limit requests for `percent` block until released.
    pub fn hold_limit(&self, percent: i32) {
        self.lock().held_limits.insert(percent);
    }

    pub fn release_limit(&self, percent: i32) {
        self.lock().held_limits.remove(&percent);
        self.cv.notify_all();
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }

    pub fn fetch_times(&self) -> Vec<Duration> {
        self.lock().fetch_times.clone()
    }

    /// Names of the threads that issued each fetch, in order.
    pub fn fetch_threads(&self) -> Vec<String> {
        self.lock().fetch_threads.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    pub fn limit_requests(&self) -> Vec<i32> {
        self.lock().limit_requests.clone()
    }

    pub fn wait_for_fetches(&self, count: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, |s| s.fetch_count >= count)
    }

    pub fn wait_for_limit_requests(&self, count: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, |s| s.limit_requests.len() >= count)
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn(&BackendState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while !done(&state) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self.cv.wait_timeout(state, deadline - now).unwrap().0;
        }
        true
    }
}

impl TelemetryBackend for ScriptedBackend {
    fn fetch_latest(&self) -> Result<PowerSample, NetworkError> {
        let mut state = self.lock();
        state.fetch_count += 1;
        let n = state.fetch_count;
        if let Some(clock) = &self.clock {
            state.fetch_times.push(clock.now());
        }
        state
            .fetch_threads
            .push(thread::current().name().unwrap_or("unnamed").to_string());
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
        let result = state.fetch_script.pop_front().unwrap_or_else(|| Ok(nth_sample(n)));
        self.cv.notify_all();

        while state.fetches_held {
            state = self.cv.wait(state).unwrap();
        }
        state.in_flight -= 1;
        result
    }

    fn set_power_limit(&self, percent: i32) -> Result<String, NetworkError> {
        let mut state = self.lock();
        state.limit_requests.push(percent);
        self.cv.notify_all();

        while state.held_limits.contains(&percent) {
            state = self.cv.wait(state).unwrap();
        }
        match &state.limit_error {
            Some(error) => Err(error.clone()),
            None => Ok("ok".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Sample { index: u64, sample: PowerSample },
    Error(ErrorKind, String),
    LimitApplied(String),
    LimitFailed(String),
}

/// Observer that records everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
    cv: Condvar,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
        self.cv.notify_all();
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn sample_indices(&self) -> Vec<u64> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Sample { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` events were recorded.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock().unwrap();
        while events.len() < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            events = self.cv.wait_timeout(events, deadline - now).unwrap().0;
        }
        true
    }
}

impl TelemetryObserver for RecordingObserver {
    fn on_sample(&self, sample: &PowerSample, index: u64) {
        self.push(Event::Sample { index, sample: *sample });
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        self.push(Event::Error(kind, message.to_string()));
    }

    fn on_limit_applied(&self, text: &str) {
        self.push(Event::LimitApplied(text.to_string()));
    }

    fn on_limit_failed(&self, text: &str) {
        self.push(Event::LimitFailed(text.to_string()));
    }
}
