//! Time source and cancellation primitive for the poller thread.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

// Upper bound on a single wait so a missed notify delays a wake-up by at most this much.
const MAX_WAIT_SLICE: Duration = Duration::from_millis(25);

/// Cancellation flag a sleeping poller can be woken by.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cv) = &*self.inner;
        *flag.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait up to `timeout` for cancellation. Returns true if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cv) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(|e| e.into_inner());
        if *guard {
            return true;
        }
        let (guard, _) = cv.wait_timeout(guard, timeout).unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

/// Monotonic time measured from an arbitrary origin.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block until `deadline` is reached or `cancel` fires.
    ///
    /// Returns `true` when the deadline was reached and `false` when cancelled.
    fn sleep_until(&self, deadline: Duration, cancel: &CancelToken) -> bool;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, deadline: Duration, cancel: &CancelToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = self.now();
            if now >= deadline {
                return true;
            }
            let wait = (deadline - now).min(MAX_WAIT_SLICE);
            if cancel.wait_timeout(wait) {
                return false;
            }
        }
    }
}

/// Clock that only moves when told to. Used to drive the poller in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
    cv: Condvar,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
        self.cv.notify_all();
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn sleep_until(&self, deadline: Duration, cancel: &CancelToken) -> bool {
        let mut now = self.now.lock().unwrap();
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            if *now >= deadline {
                return true;
            }
            // Short slices so cancellation is noticed without a shared condvar.
            now = self.cv.wait_timeout(now, Duration::from_millis(5)).unwrap().0;
        }
    }
}
