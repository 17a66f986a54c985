//! Cancellable timers.
//!
//! Every delayed UI callback (chat reply, period settle, day/night tick) goes
//! through here so cancellation is explicit: a timer returns a handle wrapping
//! a `CancellationToken`, and a [`TimerScope`] owns all timers of one view and
//! cancels them on teardown.
//!
//! Cancellation only stops callbacks that have not started. Owners that must
//! never observe a late callback also check their own closed flag under the
//! same lock the callback takes.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a scheduled callback. Dropping the handle does NOT cancel it.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the callback ran, or the timer was cancelled and wound down.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Run `f` once after `delay` unless cancelled first.
///
/// Must be called from within a tokio runtime.
pub fn schedule_once<F>(delay: Duration, f: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let token = CancellationToken::new();
    let child = token.clone();
    let task = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = child.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                if !child.is_cancelled() {
                    f();
                }
            }
        }
    });
    TimerHandle { token, task }
}

/// Run `f` every `period` (first call after one full period) until cancelled.
pub fn schedule_repeating<F>(period: Duration, mut f: F) -> TimerHandle
where
    F: FnMut() + Send + 'static,
{
    let token = CancellationToken::new();
    let child = token.clone();
    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        loop {
            tokio::select! {
                biased;
                _ = child.cancelled() => break,
                _ = ticker.tick() => {
                    if child.is_cancelled() {
                        break;
                    }
                    f();
                }
            }
        }
    });
    TimerHandle { token, task }
}

/// Owns the timers of one view. `teardown` (or drop) cancels all of them.
#[derive(Debug, Default)]
pub struct TimerScope {
    timers: Mutex<Vec<TimerHandle>>,
    torn_down: std::sync::atomic::AtomicBool,
}

impl TimerScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.track(schedule_once(delay, f));
    }

    pub fn repeating<F>(&self, period: Duration, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.track(schedule_repeating(period, f));
    }

    /// Adopt an existing handle. After teardown, adopted handles are cancelled immediately.
    pub fn track(&self, handle: TimerHandle) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_torn_down() {
            handle.cancel();
            return;
        }
        timers.retain(|t| !t.is_finished());
        timers.push(handle);
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        let timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers
            .iter()
            .filter(|t| !t.is_finished() && !t.is_cancelled())
            .count()
    }

    pub fn teardown(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        self.torn_down
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let cancelled = timers.len();
        for t in timers.drain(..) {
            t.cancel();
        }
        if cancelled > 0 {
            tracing::debug!(cancelled, "Timer scope torn down");
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Drop for TimerScope {
    fn drop(&mut self) {
        self.teardown();
    }
}
