//! Read-only views for front ends
//!
//! Engines expose their state as a [`Snapshot`]; the CLI renders it as a
//! status line and the event stream serializes [`PhaseView`]s. Durations are
//! serialized as fractional seconds.

use std::fmt::Write as _;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::engine::RunStatus;
use crate::sequence::{Phase, PhaseKind, Sequence};

/// Serializes a [`Duration`] as fractional seconds.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Serializes an optional [`Duration`] as fractional seconds or `null`.
///
/// # Errors
///
/// Propagates the serializer's error.
#[allow(clippy::ref_option)]
pub fn serialize_opt_secs<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}

/// One phase as shown to a user or written to the event stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseView {
    /// Position in the sequence.
    pub index: usize,
    /// Semantic kind.
    pub kind: PhaseKind,
    /// Human label, e.g. "Rest before set 2 (round 1)".
    pub label: String,
    /// Phase length.
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// 1-based round, absent outside the round structure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    /// Set of a work phase, or the set a rest follows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<u32>,
    /// Set a rest precedes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_set: Option<u32>,
    /// Head-to-head participant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<u32>,
}

impl PhaseView {
    /// Builds the view of `phase` at `index`.
    #[must_use]
    pub fn new(index: usize, phase: &Phase) -> Self {
        let round = phase.round();
        Self {
            index,
            kind: phase.kind(),
            label: phase.to_string(),
            duration: phase.duration(),
            round: (round > 0).then_some(round),
            set: phase.set(),
            next_set: phase.next_set(),
            person: phase.person(),
        }
    }
}

/// Point-in-time state of any engine.
///
/// Fields that only apply to one engine are `None` for the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Lifecycle state.
    pub status: RunStatus,
    /// Current phase, if a sequence is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseView>,
    /// Number of phases in the sequence.
    pub phases: usize,
    /// Time left in the current phase.
    #[serde(serialize_with = "serialize_secs")]
    pub remaining: Duration,
    /// Counted time since start.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Fraction of the run played.
    pub progress: f64,
    /// Between a phase completion and the next load.
    pub transitioning: bool,
    /// Stopwatch: number of laps recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laps: Option<usize>,
    /// Stopwatch: time since the last lap.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_secs"
    )]
    pub current_lap: Option<Duration>,
    /// Breathing: full cycles completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles: Option<u64>,
    /// Breathing: size of the visual guide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle: Option<f64>,
}

impl Snapshot {
    /// Renders a one-line terminal status.
    #[must_use]
    pub fn status_line(&self) -> String {
        let mut line = format!("[{}]", self.status);

        if let Some(phase) = &self.phase {
            let _ = write!(
                line,
                " {}/{} {}  {}",
                phase.index + 1,
                self.phases,
                phase.label,
                format_clock(self.remaining)
            );
        } else {
            let _ = write!(line, " {}", format_clock(self.elapsed));
        }

        if self.transitioning {
            line.push_str("  ...");
        }
        if let (Some(laps), Some(current)) = (self.laps, self.current_lap) {
            let _ = write!(line, "  lap {} {}", laps + 1, format_clock(current));
        }
        if let Some(circle) = self.circle {
            let _ = write!(line, "  {}", breath_bar(circle, 20));
        } else if self.phase.is_some() {
            let _ = write!(line, "  {:>3.0}%", self.progress * 100.0);
        }
        line
    }
}

/// Formats a duration as `MM:SS.cc`, or `H:MM:SS.cc` from one hour up.
#[must_use]
pub fn format_clock(d: Duration) -> String {
    let centis = d.as_millis() / 10;
    let (secs, cs) = (centis / 100, centis % 100);
    let (mins, s) = (secs / 60, secs % 60);
    if mins >= 60 {
        format!("{}:{:02}:{s:02}.{cs:02}", mins / 60, mins % 60)
    } else {
        format!("{mins:02}:{s:02}.{cs:02}")
    }
}

fn breath_bar(fraction: f64, width: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled))
}

/// Renders a sequence as an aligned, human-readable plan.
#[must_use]
pub fn render_plan(sequence: &Sequence) -> String {
    let mut out = String::new();
    let mut at = Duration::ZERO;
    for (index, phase) in sequence.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {}  {:>6}s  {}",
            index + 1,
            format_clock(at),
            phase.duration().as_secs(),
            phase
        );
        at += phase.duration();
    }
    let _ = writeln!(
        out,
        "{} phases, total {}",
        sequence.len(),
        format_clock(sequence.total())
    );
    out
}
