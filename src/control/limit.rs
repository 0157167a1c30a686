//! Operator power cap: preview on every slider move, apply on release.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use super::TelemetryBackend;
use crate::config::PowerLimitConfig;
use crate::telemetry::{LimitApplyError, TelemetryObserver};

/// Label shown when the last commit did not go through.
pub const LIMIT_FAILED_TEXT: &str = "Failed to apply limit";

/// Human-readable preview for a percentage of `rated_watts`.
pub fn preview_text(percent: i32, rated_watts: f64) -> String {
    let watts = (percent as f64 / 100.0) * rated_watts;
    format!("Power: {}% ({:.1} W)", percent, watts)
}

/// Pending power-limit request running on its own thread.
pub struct CommitHandle {
    handle: JoinHandle<Result<String, LimitApplyError>>,
}

impl CommitHandle {
    /// Block until the request completes and return the backend acknowledgement.
    pub fn wait(self) -> Result<String, LimitApplyError> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(LimitApplyError::Dispatch("power limit worker panicked".to_string())))
    }
}

/// Applies power limits without touching the poller.
///
/// Commits are neither queued nor coalesced: each one sends its own request. Only the
/// most recently issued commit reports back to the observer, so a slow, stale request
/// cannot overwrite the label of a newer one. Completion order on the wire is not
/// guaranteed.
pub struct PowerLimitController {
    backend: Arc<dyn TelemetryBackend>,
    observer: Arc<dyn TelemetryObserver>,
    config: PowerLimitConfig,
    generation: Arc<AtomicU64>,
}

impl PowerLimitController {
    pub fn new(backend: Arc<dyn TelemetryBackend>, observer: Arc<dyn TelemetryObserver>, config: PowerLimitConfig) -> Self {
        Self {
            backend,
            observer,
            config,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &PowerLimitConfig {
        &self.config
    }

    pub fn preview(&self, percent: i32) -> String {
        preview_text(percent, self.config.rated_watts)
    }

    /// Send `percent` to the backend on a background thread.
    ///
    /// Out-of-range values are rejected immediately and reported as failed.
    pub fn commit(&self, percent: i32) -> Result<CommitHandle, LimitApplyError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.config.contains(percent) {
            let err = LimitApplyError::OutOfBounds {
                percent,
                min: self.config.min_percent,
                max: self.config.max_percent,
            };
            log::warn!("Rejected power limit: {}", err);
            self.observer.on_limit_failed(LIMIT_FAILED_TEXT);
            return Err(err);
        }

        let backend = self.backend.clone();
        let observer = self.observer.clone();
        let latest = self.generation.clone();
        let preview = self.preview(percent);

        let handle = thread::Builder::new()
            .name("power-limit".to_string())
            .spawn(move || {
                let result = backend.set_power_limit(percent);
                let is_latest = latest.load(Ordering::SeqCst) == generation;

                match &result {
                    Ok(ack) => {
                        log::info!("Power limit set response: {}", ack);
                        if is_latest {
                            observer.on_limit_applied(&format!("{}  (applied)", preview));
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to set power limit: {}", e);
                        if is_latest {
                            observer.on_limit_failed(LIMIT_FAILED_TEXT);
                        }
                    }
                }
                if !is_latest {
                    log::debug!("Power limit result for {}% superseded by a newer commit", percent);
                }

                result.map_err(LimitApplyError::from)
            })
            .map_err(|e| {
                self.observer.on_limit_failed(LIMIT_FAILED_TEXT);
                LimitApplyError::Dispatch(e.to_string())
            })?;

        Ok(CommitHandle { handle })
    }
}
