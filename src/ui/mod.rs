// UI module for the CPEodesic power telemetry console
//
// This module organizes the UI into separate components:
// - `screens`: Welcome, device selection and latency selection screens
// - `readout`: Text readout of the latest sample
// - `chart`: Live chart of the session history
// - `app_state`: Application state management and main update loop

pub mod app_state;
pub mod chart;
pub mod readout;
pub mod screens;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::telemetry::{ErrorKind, PowerSample, TelemetryObserver};

pub use app_state::AppState;

pub const UI_REFRESH_QUEUE_SIZE: usize = 64;

pub type UIRefreshQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;
pub type UIRefreshQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;
pub type UIRefreshQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;

/// Updates handed from worker threads to the UI loop.
///
/// Sample and error updates carry the id of the session that produced them so the UI
/// can drop anything a replaced session emitted before it stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum UIRefreshState {
    SampleReceived { session: u64, index: u64, sample: PowerSample },
    FetchFailed { session: u64, kind: ErrorKind, message: String },
    LimitApplied(String),
    LimitFailed(String),
}

/// Observer that forwards core updates into the UI refresh queue.
pub struct QueueObserver {
    tx: UIRefreshQueueSender,
    session: u64,
}

impl QueueObserver {
    pub fn new(tx: UIRefreshQueueSender, session: u64) -> Self {
        Self { tx, session }
    }

    fn send(&self, msg: UIRefreshState) {
        // The UI drains the queue every frame; a full queue means it is not running.
        if self.tx.try_send(msg).is_err() {
            log::warn!("UI refresh queue full, dropping update");
        }
    }
}

impl TelemetryObserver for QueueObserver {
    fn on_sample(&self, sample: &PowerSample, index: u64) {
        self.send(UIRefreshState::SampleReceived {
            session: self.session,
            index,
            sample: *sample,
        });
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        self.send(UIRefreshState::FetchFailed {
            session: self.session,
            kind,
            message: message.to_string(),
        });
    }

    fn on_limit_applied(&self, text: &str) {
        self.send(UIRefreshState::LimitApplied(text.to_string()));
    }

    fn on_limit_failed(&self, text: &str) {
        self.send(UIRefreshState::LimitFailed(text.to_string()));
    }
}
