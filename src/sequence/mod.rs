//! Phase sequences
//!
//! A [`Sequence`] is the ordered, immutable list of [`Phase`]s played by one
//! run. Sequences are produced by the [`builder`] functions and consumed by
//! the engines in [`crate::engine`].
//!
//! Each [`Phase`] variant carries only the fields meaningful for its shape,
//! so "not applicable" is `None` rather than a zero.

pub mod builder;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use builder::{build_breathing, build_head_to_head, build_interval, build_sequence};

/// Semantic kind of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Get-ready countdown before the first round.
    Setup,
    /// Warm-up before the first round.
    Warmup,
    /// Work interval (or a participant's turn in head-to-head mode).
    Work,
    /// Rest between sets.
    Rest,
    /// Long rest between rounds.
    LongRest,
    /// Inhale.
    BreathIn,
    /// Hold with full lungs.
    InhaledHold,
    /// Exhale.
    BreathOut,
    /// Hold with empty lungs.
    ExhaledHold,
}

impl PhaseKind {
    /// Returns the stable `snake_case` label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Warmup => "warmup",
            Self::Work => "work",
            Self::Rest => "rest",
            Self::LongRest => "long_rest",
            Self::BreathIn => "breath_in",
            Self::InhaledHold => "inhaled_hold",
            Self::BreathOut => "breath_out",
            Self::ExhaledHold => "exhaled_hold",
        }
    }

    /// Returns `true` for the four breathing kinds.
    #[must_use]
    pub const fn is_breathing(self) -> bool {
        matches!(
            self,
            Self::BreathIn | Self::InhaledHold | Self::BreathOut | Self::ExhaledHold
        )
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four steps of a breathing cycle, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreathStep {
    /// Inhale; the visual guide expands.
    In,
    /// Hold after inhaling.
    InhaledHold,
    /// Exhale; the visual guide contracts.
    Out,
    /// Hold after exhaling.
    ExhaledHold,
}

impl BreathStep {
    /// Maps the step to its [`PhaseKind`].
    #[must_use]
    pub const fn kind(self) -> PhaseKind {
        match self {
            Self::In => PhaseKind::BreathIn,
            Self::InhaledHold => PhaseKind::InhaledHold,
            Self::Out => PhaseKind::BreathOut,
            Self::ExhaledHold => PhaseKind::ExhaledHold,
        }
    }
}

/// One timed segment of a run.
///
/// Durations are always positive when produced by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Get-ready phase before any round.
    Setup {
        /// Phase length.
        duration: Duration,
    },
    /// Warm-up phase before any round.
    Warmup {
        /// Phase length.
        duration: Duration,
    },
    /// Interval-mode work set.
    Work {
        /// Phase length.
        duration: Duration,
        /// 1-based round.
        round: u32,
        /// 1-based set within the round.
        set: u32,
    },
    /// Interval-mode rest between two sets of the same round.
    Rest {
        /// Phase length.
        duration: Duration,
        /// 1-based round.
        round: u32,
        /// Set this rest follows.
        set: u32,
        /// Set this rest precedes.
        next_set: u32,
    },
    /// Interval-mode rest after a round.
    LongRest {
        /// Phase length.
        duration: Duration,
        /// Round this rest follows.
        round: u32,
    },
    /// Head-to-head work turn.
    Turn {
        /// Phase length.
        duration: Duration,
        /// 1-based round.
        round: u32,
        /// 1-based participant.
        person: u32,
    },
    /// One step of a breathing cycle.
    Breath {
        /// Phase length.
        duration: Duration,
        /// Which step of the cycle.
        step: BreathStep,
    },
}

impl Phase {
    /// Returns the semantic kind of this phase.
    #[must_use]
    pub const fn kind(&self) -> PhaseKind {
        match self {
            Self::Setup { .. } => PhaseKind::Setup,
            Self::Warmup { .. } => PhaseKind::Warmup,
            Self::Work { .. } | Self::Turn { .. } => PhaseKind::Work,
            Self::Rest { .. } => PhaseKind::Rest,
            Self::LongRest { .. } => PhaseKind::LongRest,
            Self::Breath { step, .. } => step.kind(),
        }
    }

    /// Returns the phase length.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Setup { duration }
            | Self::Warmup { duration }
            | Self::Work { duration, .. }
            | Self::Rest { duration, .. }
            | Self::LongRest { duration, .. }
            | Self::Turn { duration, .. }
            | Self::Breath { duration, .. } => *duration,
        }
    }

    /// Returns the 1-based round, or 0 for phases outside the round structure.
    #[must_use]
    pub const fn round(&self) -> u32 {
        match self {
            Self::Work { round, .. }
            | Self::Rest { round, .. }
            | Self::LongRest { round, .. }
            | Self::Turn { round, .. } => *round,
            Self::Setup { .. } | Self::Warmup { .. } | Self::Breath { .. } => 0,
        }
    }

    /// Returns the set a work phase belongs to or a rest phase follows.
    #[must_use]
    pub const fn set(&self) -> Option<u32> {
        match self {
            Self::Work { set, .. } | Self::Rest { set, .. } => Some(*set),
            _ => None,
        }
    }

    /// Returns the set a rest phase precedes.
    #[must_use]
    pub const fn next_set(&self) -> Option<u32> {
        match self {
            Self::Rest { next_set, .. } => Some(*next_set),
            _ => None,
        }
    }

    /// Returns the participant of a head-to-head turn.
    #[must_use]
    pub const fn person(&self) -> Option<u32> {
        match self {
            Self::Turn { person, .. } => Some(*person),
            _ => None,
        }
    }

    /// Returns the round this phase opens, if it is the first work set of an
    /// interval round.
    #[must_use]
    pub const fn starts_round(&self) -> Option<u32> {
        match self {
            Self::Work { round, set: 1, .. } => Some(*round),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup { .. } => f.write_str("Get ready"),
            Self::Warmup { .. } => f.write_str("Warm up"),
            Self::Work { round, set, .. } => write!(f, "Work (round {round}, set {set})"),
            Self::Rest {
                round, next_set, ..
            } => write!(f, "Rest before set {next_set} (round {round})"),
            Self::LongRest { round, .. } => write!(f, "Long rest after round {round}"),
            Self::Turn { round, person, .. } => write!(f, "Person {person} (round {round})"),
            Self::Breath { step, .. } => f.write_str(match step {
                BreathStep::In => "Breathe in",
                BreathStep::InhaledHold => "Hold",
                BreathStep::Out => "Breathe out",
                BreathStep::ExhaledHold => "Hold empty",
            }),
        }
    }
}

/// Ordered list of phases plus their summed duration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    phases: Vec<Phase>,
    total: Duration,
}

impl Sequence {
    /// Creates a sequence, deriving the total duration.
    #[must_use]
    pub fn new(phases: Vec<Phase>) -> Self {
        let total = phases.iter().map(Phase::duration).sum();
        Self { phases, total }
    }

    /// Returns all phases in play order.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Returns the phase at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// Returns the number of phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Returns `true` if there is nothing to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Returns the sum of all phase durations.
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Counts phases of the given kind.
    #[must_use]
    pub fn count(&self, kind: PhaseKind) -> usize {
        self.phases.iter().filter(|p| p.kind() == kind).count()
    }

    /// Iterates over the phases in play order.
    pub fn iter(&self) -> std::slice::Iter<'_, Phase> {
        self.phases.iter()
    }
}

impl FromIterator<Phase> for Sequence {
    fn from_iter<I: IntoIterator<Item = Phase>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Phase;
    type IntoIter = std::slice::Iter<'a, Phase>;

    fn into_iter(self) -> Self::IntoIter {
        self.phases.iter()
    }
}
