//! Clock abstraction for retry delays and eligibility waits.
//!
//! All waiting in the engine goes through [`Clock::sleep`], so tests can
//! substitute [`ManualClock`] and observe every requested delay without
//! sleeping, and a [`CancelHandle`] can cut a real wait short.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// How a sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Cancelled,
}

/// Source of the current instant and of blocking waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Blocks the calling thread for `duration` unless cancelled first.
    fn sleep(&self, duration: Duration) -> SleepOutcome;
}

/// Shared flag that interrupts sleeps on every clock holding a clone of it.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes all current sleepers and makes later sleeps return immediately.
    pub fn cancel(&self) {
        let (flag, condvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait(&self, duration: Duration) -> SleepOutcome {
        let (flag, condvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = condvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        if *guard { SleepOutcome::Cancelled } else { SleepOutcome::Elapsed }
    }
}

/// Wall clock with cancellable sleeps.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    cancel: CancelHandle,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_handle(cancel: CancelHandle) -> Self {
        Self { cancel }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> SleepOutcome {
        self.cancel.wait(duration)
    }
}

/// Simulated clock: sleeping advances `now` instantly and is recorded.
///
/// Once its [`CancelHandle`] is cancelled, sleeps are still recorded but
/// return [`SleepOutcome::Cancelled`] without advancing time.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
    cancel: CancelHandle,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
            cancel: CancelHandle::new(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Every duration passed to [`Clock::sleep`], in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) -> SleepOutcome {
        self.sleeps.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
        if self.cancel.is_cancelled() {
            return SleepOutcome::Cancelled;
        }
        self.advance(duration);
        SleepOutcome::Elapsed
    }
}
