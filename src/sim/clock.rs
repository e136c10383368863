//! Pausable game clock and interval timers
//!
//! All timers sharing a `Clock` stop advancing while it is paused. Time is
//! measured in whole milliseconds of game time (wall time minus paused time).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug)]
enum Source {
    /// Monotonic wall clock
    System(Instant),
    /// Driven by hand (tests, headless stepping)
    Manual(AtomicU64),
}

#[derive(Debug, Default)]
struct PauseState {
    /// Raw time at which the clock was paused
    paused_at: Option<u64>,
    /// Total raw time spent paused
    paused_total: u64,
}

#[derive(Debug)]
struct ClockInner {
    source: Source,
    pause: Mutex<PauseState>,
}

/// Shared pausable clock. Cloning yields another handle to the same clock.
#[derive(Debug, Clone)]
pub struct Clock {
    inner: Arc<ClockInner>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Clock {
    fn with_source(source: Source) -> Self {
        Self {
            inner: Arc::new(ClockInner {
                source,
                pause: Mutex::new(PauseState::default()),
            }),
        }
    }

    /// Clock backed by the monotonic system time
    pub fn system() -> Self {
        Self::with_source(Source::System(Instant::now()))
    }

    /// Clock that only moves when `advance`/`set` is called, starting at 0
    pub fn manual() -> Self {
        Self::with_source(Source::Manual(AtomicU64::new(0)))
    }

    /// Move a manual clock forward. No effect on a system clock.
    pub fn advance(&self, ms: u64) {
        if let Source::Manual(now) = &self.inner.source {
            now.fetch_add(ms, Ordering::SeqCst);
        }
    }

    /// Set a manual clock's raw time. No effect on a system clock.
    pub fn set(&self, ms: u64) {
        if let Source::Manual(now) = &self.inner.source {
            now.store(ms, Ordering::SeqCst);
        }
    }

    fn raw_ms(&self) -> u64 {
        match &self.inner.source {
            Source::System(start) => start.elapsed().as_millis() as u64,
            Source::Manual(now) => now.load(Ordering::SeqCst),
        }
    }

    fn pause_state(&self) -> MutexGuard<'_, PauseState> {
        self.inner.pause.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current game time in ms (frozen while paused)
    pub fn now_ms(&self) -> u64 {
        let state = self.pause_state();
        let raw = state.paused_at.unwrap_or_else(|| self.raw_ms());
        raw.saturating_sub(state.paused_total)
    }

    pub fn pause(&self) {
        let mut state = self.pause_state();
        if state.paused_at.is_none() {
            state.paused_at = Some(self.raw_ms());
        }
    }

    pub fn unpause(&self) {
        let mut state = self.pause_state();
        if let Some(at) = state.paused_at.take() {
            state.paused_total += self.raw_ms().saturating_sub(at);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_state().paused_at.is_some()
    }
}

/// Interval timer measuring game time since its baseline
#[derive(Debug, Clone)]
pub struct Timer {
    clock: Clock,
    baseline: u64,
}

impl Timer {
    /// Start a timer with its baseline at the clock's current time
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            baseline: clock.now_ms(),
        }
    }

    /// Game time since the baseline
    pub fn elapsed(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.baseline)
    }

    /// Rebase to now
    pub fn reset(&mut self) {
        self.baseline = self.clock.now_ms();
    }

    /// If at least `interval_ms` has elapsed, rebase to now and return true.
    /// Otherwise leave the timer untouched. Always false while paused.
    pub fn reset_if_has_elapsed(&mut self, interval_ms: u64) -> bool {
        if self.clock.is_paused() {
            return false;
        }
        let now = self.clock.now_ms();
        if now.saturating_sub(self.baseline) >= interval_ms {
            self.baseline = now;
            true
        } else {
            false
        }
    }

    pub fn baseline(&self) -> u64 {
        self.baseline
    }
}
