//! Shared run state
//!
//! [`RunStatus`] and [`EngineOptions`] are common to every engine.
//! [`PhaseClock`] is the per-phase countdown used by both the workout timer
//! and the breathing engine: it consumes tick time, detects the exhaustion
//! edge, and owns the cancellable settle delay.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::schema::Settings;
use crate::cue::Cue;

use super::schedule::{DeferredHandle, DeferredQueue};

/// Settle delay used when none is configured.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Nothing loaded.
    #[default]
    Ready,
    /// Counting.
    Running,
    /// Started but not counting.
    Paused,
    /// Every phase played. Terminal until reset.
    Completed,
}

impl RunStatus {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` while a run is in progress (running or paused).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-instance engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Delay between a phase's completion cue and the next phase loading.
    pub settle_delay: Duration,
    /// Emit [`Cue::Countdown`] for the final N whole seconds of each phase.
    pub countdown_from: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            countdown_from: None,
        }
    }
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            settle_delay: settings.settle_delay(),
            countdown_from: (settings.countdown_cues && settings.countdown_from > 0)
                .then_some(settings.countdown_from),
        }
    }
}

/// Countdown of the current phase plus the pending settle advancement.
///
/// At most one settle action is live at a time; its handle is kept so that
/// [`cancel_settle`](Self::cancel_settle) can withdraw it synchronously.
#[derive(Debug)]
pub struct PhaseClock {
    options: EngineOptions,
    phase_duration: Duration,
    remaining: Duration,
    elapsed: Duration,
    settling: Option<DeferredHandle>,
    deferred: DeferredQueue<usize>,
}

impl PhaseClock {
    /// Creates an idle clock.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            phase_duration: Duration::ZERO,
            remaining: Duration::ZERO,
            elapsed: Duration::ZERO,
            settling: None,
            deferred: DeferredQueue::new(),
        }
    }

    /// Returns the options this clock was built with.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Starts counting down a new phase. Elapsed time is kept.
    pub const fn load(&mut self, duration: Duration) {
        self.phase_duration = duration;
        self.remaining = duration;
    }

    /// Consumes `dt` from the current phase.
    ///
    /// Elapsed time grows by the consumed amount only, so it never runs past
    /// the phase end. Countdown cues are appended to `cues`. Returns `true`
    /// exactly when the phase is exhausted and no settle is pending yet; the
    /// caller must then call [`begin_settle`](Self::begin_settle).
    pub fn count_down(&mut self, dt: Duration, cues: &mut Vec<Cue>) -> bool {
        if self.settling.is_some() {
            return false;
        }

        let before = self.remaining;
        let consumed = dt.min(before);
        self.remaining = before - consumed;
        self.elapsed += consumed;

        if let Some(from) = self.options.countdown_from {
            cues.extend(
                countdown_marks(before, self.remaining, from)
                    .map(|seconds| Cue::Countdown { seconds }),
            );
        }

        self.remaining.is_zero()
    }

    /// Schedules the settle advancement for the phase at `index`.
    ///
    /// Any previously pending advancement is cancelled first.
    pub fn begin_settle(&mut self, index: usize) -> DeferredHandle {
        self.cancel_settle();
        let handle = self.deferred.schedule(self.options.settle_delay, index);
        self.settling = Some(handle);
        handle
    }

    /// Lets the settle delay elapse by `dt`.
    ///
    /// Returns the index recorded by [`begin_settle`](Self::begin_settle) if
    /// the live settle action fired. Stale actions are discarded.
    pub fn poll_settled(&mut self, dt: Duration) -> Option<usize> {
        let mut settled = None;
        for (handle, index) in self.deferred.advance(dt) {
            if self.settling == Some(handle) {
                self.settling = None;
                settled = Some(index);
            } else {
                tracing::trace!(?handle, "discarding stale settle action");
            }
        }
        settled
    }

    /// Withdraws the pending settle advancement, if any.
    ///
    /// Returns `true` if something was cancelled.
    pub fn cancel_settle(&mut self) -> bool {
        self.settling
            .take()
            .is_some_and(|handle| self.deferred.cancel(handle))
    }

    /// Returns `true` while the settle delay is pending.
    #[must_use]
    pub const fn is_settling(&self) -> bool {
        self.settling.is_some()
    }

    /// Returns `true` if no deferred work of any kind is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.settling.is_none() && self.deferred.is_empty()
    }

    /// Zeroes the countdown and elapsed time and cancels deferred work.
    pub fn clear(&mut self) {
        self.cancel_settle();
        self.deferred.cancel_all();
        self.phase_duration = Duration::ZERO;
        self.remaining = Duration::ZERO;
        self.elapsed = Duration::ZERO;
    }

    /// Time left in the current phase.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Length of the current phase.
    #[must_use]
    pub const fn phase_duration(&self) -> Duration {
        self.phase_duration
    }

    /// Counted time since the run started.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Marks the rest of the current phase as consumed without counting it.
    pub const fn drain(&mut self) {
        self.remaining = Duration::ZERO;
    }
}

/// Whole-second marks crossed while going from `before` to `after`,
/// highest first, limited to `1..=from`.
///
/// A mark `n` is crossed when `before > n` and `after <= n` seconds, so the
/// crossed marks are `ceil(after)..=ceil(before) - 1`.
pub fn countdown_marks(before: Duration, after: Duration, from: u32) -> impl Iterator<Item = u32> {
    let low = ceil_secs(after).max(1);
    let high = ceil_secs(before).saturating_sub(1).min(u64::from(from));
    (low..=high).rev().filter_map(|n| u32::try_from(n).ok())
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
