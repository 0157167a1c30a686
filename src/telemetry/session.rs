//! Poll sessions: one device, one latency mode, one poller.

use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;
use super::error::PollerError;
use super::observer::TelemetryObserver;
use super::poller::{PollerStatus, TelemetryPoller};
use super::series::SharedHistory;
use super::types::{LatencyMode, SampleCounter};
use crate::config::PollingConfig;
use crate::control::TelemetryBackend;

/// Read-only dependencies every session is built from.
///
/// The sample counter lives here so indices keep increasing across sessions.
#[derive(Clone)]
pub struct SessionContext {
    backend: Arc<dyn TelemetryBackend>,
    clock: Arc<dyn Clock>,
    counter: SampleCounter,
    polling: PollingConfig,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn TelemetryBackend>, clock: Arc<dyn Clock>, polling: PollingConfig) -> Self {
        Self {
            backend,
            clock,
            counter: SampleCounter::new(),
            polling,
        }
    }

    pub fn backend(&self) -> Arc<dyn TelemetryBackend> {
        self.backend.clone()
    }

    /// Create a session for `device` in `mode` and start polling it.
    pub fn open(&self, device: &str, mode: LatencyMode, observer: Arc<dyn TelemetryObserver>) -> Result<PollSession, PollerError> {
        let interval = self.polling.interval(mode);
        let history = SharedHistory::new(self.polling.series_capacity);
        let mut poller = TelemetryPoller::new(
            format!("{} {}", device, mode),
            self.backend.clone(),
            self.clock.clone(),
            history.clone(),
            self.counter.clone(),
        );
        poller.start(interval, observer)?;

        Ok(PollSession {
            device: device.to_string(),
            mode,
            interval,
            history,
            poller,
        })
    }
}

/// An active polling session. It owns its poller and history exclusively; dropping
/// or closing the session stops the poller.
pub struct PollSession {
    device: String,
    mode: LatencyMode,
    interval: Duration,
    history: SharedHistory,
    poller: TelemetryPoller,
}

impl PollSession {
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn mode(&self) -> LatencyMode {
        self.mode
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub fn status(&self) -> PollerStatus {
        self.poller.status()
    }

    /// Replace this session with one for another device or mode.
    ///
    /// The current poller is fully stopped, including any in-flight tick, before the
    /// new poller's first tick can run.
    pub fn switch(
        self,
        context: &SessionContext,
        device: &str,
        mode: LatencyMode,
        observer: Arc<dyn TelemetryObserver>,
    ) -> Result<PollSession, PollerError> {
        log::info!("Switching session {} {} -> {} {}", self.device, self.mode, device, mode);
        self.close();
        context.open(device, mode, observer)
    }

    /// Stop polling and release the session's history.
    pub fn close(mut self) {
        self.poller.stop();
    }
}
