//! Time source and cooperative cancellation for the frame loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Cloneable stop request shared between the owner and the frame thread.
///
/// Raising it wakes any [`StopSignal::wait_timeout`] in progress, so the pacing
/// sleep ends promptly instead of running to its deadline.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    raised: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
        // Taking the lock orders the store before any waiter's predicate check.
        let _guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.wake.notify_all();
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.inner.raised.store(false, Ordering::SeqCst);
    }

    /// Block for up to `timeout` or until raised. Returns whether it was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .inner
            .wake
            .wait_timeout_while(guard, timeout, |_| !self.is_raised())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_raised()
    }
}

/// Monotonic nanosecond clock with an interruptible sleep.
pub trait Clock: Send {
    /// Nanoseconds since an arbitrary fixed point.
    fn now(&self) -> i64;

    /// Sleep for about `nanos`, returning early once `stop` is raised.
    ///
    /// Waking before the deadline is allowed; callers re-sample [`Clock::now`].
    fn sleep(&self, nanos: i64, stop: &StopSignal);
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    fn sleep(&self, nanos: i64, stop: &StopSignal) {
        if nanos <= 0 {
            return;
        }
        stop.wait_timeout(Duration::from_nanos(nanos as u64));
    }
}
