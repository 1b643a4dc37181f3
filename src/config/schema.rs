//! Configuration schema
//!
//! Serde types for the YAML configuration file. All durations are whole
//! seconds; a duration of 0 disables the optional phase it controls.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Default workout, used when no preset is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout: Option<WorkoutConfig>,

    /// Breathing exercise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breathing: Option<BreathingConfig>,

    /// Engine and front-end settings.
    #[serde(default)]
    pub settings: Settings,

    /// Named workouts, in file order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub presets: IndexMap<String, WorkoutConfig>,
}

/// Workout configuration, one shape per mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WorkoutConfig {
    /// Fixed-interval rounds of work/rest sets.
    Interval(IntervalConfig),
    /// Participants take consecutive work turns.
    HeadToHead(HeadToHeadConfig),
    /// Free-running stopwatch with laps.
    Stopwatch,
}

impl WorkoutConfig {
    /// Returns the mode this configuration selects.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Interval(_) => Mode::Interval,
            Self::HeadToHead(_) => Mode::HeadToHead,
            Self::Stopwatch => Mode::Stopwatch,
        }
    }
}

/// Workout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Fixed-interval rounds.
    Interval,
    /// Head-to-head rotation.
    HeadToHead,
    /// Stopwatch with laps.
    Stopwatch,
}

impl Mode {
    /// Returns the stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::HeadToHead => "head_to_head",
            Self::Stopwatch => "stopwatch",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-interval workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalConfig {
    /// Get-ready seconds before everything else.
    #[serde(default)]
    pub setup: u32,
    /// Warm-up seconds after setup.
    #[serde(default)]
    pub warmup: u32,
    /// Seconds per work set.
    pub work: u32,
    /// Seconds of rest between sets of a round.
    #[serde(default)]
    pub rest: u32,
    /// Seconds of rest between rounds.
    #[serde(default)]
    pub long_rest: u32,
    /// Sets per round.
    pub sets: u32,
    /// Number of rounds.
    pub rounds: u32,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            setup: 10,
            warmup: 0,
            work: 30,
            rest: 10,
            long_rest: 60,
            sets: 3,
            rounds: 2,
        }
    }
}

/// Head-to-head rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadConfig {
    /// Get-ready seconds before the first turn.
    #[serde(default)]
    pub setup: u32,
    /// Seconds per turn.
    pub work: u32,
    /// Number of participants.
    pub people: u32,
    /// Number of rounds.
    pub rounds: u32,
}

impl Default for HeadToHeadConfig {
    fn default() -> Self {
        Self {
            setup: 5,
            work: 20,
            people: 2,
            rounds: 3,
        }
    }
}

/// Breathing exercise. Phases with 0 seconds are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingConfig {
    /// Inhale seconds.
    #[serde(default)]
    pub breath_in: u32,
    /// Seconds to hold with full lungs.
    #[serde(default)]
    pub inhaled_hold: u32,
    /// Exhale seconds.
    #[serde(default)]
    pub breath_out: u32,
    /// Seconds to hold with empty lungs.
    #[serde(default)]
    pub exhaled_hold: u32,
}

impl Default for BreathingConfig {
    /// Box breathing.
    fn default() -> Self {
        Self {
            breath_in: 4,
            inhaled_hold: 4,
            breath_out: 4,
            exhaled_hold: 4,
        }
    }
}

/// Engine and front-end settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tick driver resolution in milliseconds.
    pub tick_ms: u64,
    /// Pause between a phase ending and the next one loading, in milliseconds.
    pub settle_delay_ms: u64,
    /// Emit a countdown cue in the final seconds of each phase.
    pub countdown_cues: bool,
    /// First second of the final countdown.
    pub countdown_from: u32,
    /// Ring the terminal bell on phase changes.
    pub bell: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            settle_delay_ms: 500,
            countdown_cues: true,
            countdown_from: 3,
            bell: false,
        }
    }
}

impl Settings {
    /// Tick resolution as a [`Duration`].
    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Settle delay as a [`Duration`].
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
