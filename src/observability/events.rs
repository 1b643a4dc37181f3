//! Structured event stream.
//!
//! Engine cues and run lifecycle events serialized as newline-delimited
//! JSON. Every line carries a monotonically increasing sequence number and a
//! UTC timestamp next to the event fields.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cue::{Cue, CueSink};
use crate::engine::LapRecord;
use crate::presentation::{PhaseView, serialize_secs};
use crate::sequence::PhaseKind;

use std::time::Duration;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event in the life of a run.
///
/// Serialized with a `"type"` tag so consumers can dispatch on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A run started.
    RunStarted {
        /// `interval`, `head_to_head`, `stopwatch` or `breathing`.
        mode: &'static str,
        /// Number of phases in the sequence.
        phases: usize,
        /// Summed phase durations.
        #[serde(serialize_with = "serialize_secs")]
        total: Duration,
    },

    /// A phase became current.
    PhaseLoaded {
        /// The phase.
        phase: PhaseView,
    },

    /// A phase ran out.
    PhaseCompleted {
        /// Index of the finished phase.
        index: usize,
        /// Its kind.
        kind: PhaseKind,
    },

    /// An interval round began.
    RoundStarted {
        /// 1-based round.
        round: u32,
    },

    /// Final-seconds countdown.
    Countdown {
        /// Whole seconds left in the phase.
        seconds: u32,
    },

    /// A stopwatch lap was recorded.
    LapRecorded {
        /// The lap.
        lap: LapRecord,
    },

    /// A breathing cycle wrapped around.
    CycleCompleted {
        /// Full cycles so far.
        cycle: u64,
    },

    /// Every phase was played.
    RunCompleted {
        /// Counted time.
        #[serde(serialize_with = "serialize_secs")]
        elapsed: Duration,
    },

    /// The run ended before completing.
    RunStopped {
        /// Why it stopped.
        reason: StopReason,
        /// Counted time at the stop.
        #[serde(serialize_with = "serialize_secs")]
        elapsed: Duration,
    },
}

impl Event {
    /// Maps an engine cue to its event.
    #[must_use]
    pub fn from_cue(cue: &Cue, mode: &'static str) -> Self {
        match cue {
            Cue::Started { phases, total } => Self::RunStarted {
                mode,
                phases: *phases,
                total: *total,
            },
            Cue::PhaseLoaded { index, phase } => Self::PhaseLoaded {
                phase: PhaseView::new(*index, phase),
            },
            Cue::PhaseComplete { index, kind } => Self::PhaseCompleted {
                index: *index,
                kind: *kind,
            },
            Cue::RoundStarted { round } => Self::RoundStarted { round: *round },
            Cue::Countdown { seconds } => Self::Countdown { seconds: *seconds },
            Cue::LapRecorded(lap) => Self::LapRecorded { lap: *lap },
            Cue::CycleCompleted { cycle } => Self::CycleCompleted { cycle: *cycle },
            Cue::Completed { elapsed } => Self::RunCompleted { elapsed: *elapsed },
        }
    }
}

/// Why a run ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The user quit from the keyboard.
    UserStop,
    /// SIGINT or SIGTERM.
    Signal,
    /// A `--duration` or `--cycles` limit was reached.
    LimitReached,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with its sequence number and timestamp.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// When the event was written.
    timestamp: DateTime<Utc>,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are silently dropped: a broken event pipe
/// must not stop a workout.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
    mode: &'static str,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
            mode: "workout",
        }
    }

    /// Sets the mode label reported in [`Event::RunStarted`].
    #[must_use]
    pub const fn for_mode(mut self, mode: &'static str) -> Self {
        self.mode = mode;
        self
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Opens an emitter for a CLI target: `-` is stdout, anything else a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn for_target(target: &Path) -> std::io::Result<Self> {
        if target.as_os_str() == "-" {
            Ok(Self::stdout())
        } else {
            Self::from_file(target)
        }
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let envelope = EventEnvelope {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl CueSink for EventEmitter {
    fn on_cue(&mut self, cue: &Cue) {
        self.emit(Event::from_cue(cue, self.mode));
    }
}

impl CueSink for Arc<EventEmitter> {
    fn on_cue(&mut self, cue: &Cue) {
        self.emit(Event::from_cue(cue, self.mode));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
