//! Stopwatch with lap splits
//!
//! The stopwatch has no phase sequence: ticks only add to the elapsed time.
//! Stopping keeps the accumulated time so a later start continues from it.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::cue::Cue;
use crate::error::EngineError;
use crate::presentation::{Snapshot, serialize_secs};

use super::state::RunStatus;

/// One recorded lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LapRecord {
    /// 1-based lap number.
    pub lap_number: u32,
    /// Elapsed time when the lap was recorded.
    #[serde(serialize_with = "serialize_secs")]
    pub cumulative: Duration,
    /// Time since the previous lap (or since start for the first lap).
    #[serde(serialize_with = "serialize_secs")]
    pub lap_duration: Duration,
}

/// Count-up timer that records laps.
#[derive(Debug, Default)]
pub struct Stopwatch {
    running: bool,
    elapsed: Duration,
    last_lap_mark: Duration,
    laps: Vec<LapRecord>,
}

impl Stopwatch {
    /// Creates a stopped stopwatch at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts or continues counting. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        debug!(elapsed_secs = self.elapsed.as_secs_f64(), "stopwatch started");
        true
    }

    /// Stops counting, keeping the elapsed time. Returns `false` if stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        debug!(elapsed_secs = self.elapsed.as_secs_f64(), "stopwatch stopped");
        true
    }

    /// Adds `dt` to the elapsed time while running.
    pub fn tick(&mut self, dt: Duration) {
        if self.running {
            self.elapsed += dt;
        }
    }

    /// Records a lap at the current elapsed time.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] when stopped.
    pub fn record_lap(&mut self) -> Result<LapRecord, EngineError> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }
        let lap = LapRecord {
            lap_number: u32::try_from(self.laps.len() + 1).unwrap_or(u32::MAX),
            cumulative: self.elapsed,
            lap_duration: self.elapsed.saturating_sub(self.last_lap_mark),
        };
        self.last_lap_mark = self.elapsed;
        self.laps.push(lap);
        info!(
            lap = lap.lap_number,
            lap_secs = lap.lap_duration.as_secs_f64(),
            "lap recorded"
        );
        Ok(lap)
    }

    /// Records a lap and wraps it as a cue.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] when stopped.
    pub fn lap_cue(&mut self) -> Result<Cue, EngineError> {
        self.record_lap().map(Cue::LapRecorded)
    }

    /// Stops and clears elapsed time and laps.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` while counting.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Accumulated time.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Laps in recording order.
    #[must_use]
    pub fn laps(&self) -> &[LapRecord] {
        &self.laps
    }

    /// Time since the last lap mark.
    #[must_use]
    pub const fn current_lap(&self) -> Duration {
        self.elapsed.saturating_sub(self.last_lap_mark)
    }

    /// Shortest recorded lap.
    #[must_use]
    pub fn fastest_lap(&self) -> Option<&LapRecord> {
        self.laps.iter().min_by_key(|l| l.lap_duration)
    }

    /// Longest recorded lap.
    #[must_use]
    pub fn slowest_lap(&self) -> Option<&LapRecord> {
        self.laps.iter().max_by_key(|l| l.lap_duration)
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let status = match (self.running, self.elapsed.is_zero()) {
            (true, _) => RunStatus::Running,
            (false, true) => RunStatus::Ready,
            (false, false) => RunStatus::Paused,
        };
        Snapshot {
            status,
            elapsed: self.elapsed,
            laps: Some(self.laps.len()),
            current_lap: Some(self.current_lap()),
            ..Snapshot::default()
        }
    }
}
