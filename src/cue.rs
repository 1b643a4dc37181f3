//! Cues emitted by the engines
//!
//! Engines return [`Cue`]s from `start`, `tick` and control calls instead of
//! calling collaborators directly. Whoever drives the engine forwards them
//! to one or more [`CueSink`]s (sound, logging, event stream, metrics).

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info};

use crate::engine::stopwatch::LapRecord;
use crate::sequence::{Phase, PhaseKind};

/// A discrete notification from an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// A run started.
    Started {
        /// Number of phases in the sequence (0 for the stopwatch).
        phases: usize,
        /// Summed phase durations.
        total: Duration,
    },
    /// The current phase ran out; the next one loads after the settle delay.
    PhaseComplete {
        /// Index of the phase that ended.
        index: usize,
        /// Its kind.
        kind: PhaseKind,
    },
    /// A phase became current.
    PhaseLoaded {
        /// Index of the new phase.
        index: usize,
        /// The phase itself.
        phase: Phase,
    },
    /// The first work set of an interval round started.
    RoundStarted {
        /// 1-based round.
        round: u32,
    },
    /// Final-seconds countdown of the current phase.
    Countdown {
        /// Whole seconds left.
        seconds: u32,
    },
    /// The run finished. Emitted once per run.
    Completed {
        /// Total counted time.
        elapsed: Duration,
    },
    /// A stopwatch lap was recorded.
    LapRecorded(LapRecord),
    /// A breathing cycle wrapped around.
    CycleCompleted {
        /// Number of full cycles so far.
        cycle: u64,
    },
}

impl Cue {
    /// Returns a stable name for the cue.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::PhaseComplete { .. } => "phase_complete",
            Self::PhaseLoaded { .. } => "phase_loaded",
            Self::RoundStarted { .. } => "round_started",
            Self::Countdown { .. } => "countdown",
            Self::Completed { .. } => "completed",
            Self::LapRecorded(_) => "lap_recorded",
            Self::CycleCompleted { .. } => "cycle_completed",
        }
    }
}

/// Receiver of engine cues.
pub trait CueSink {
    /// Handles one cue.
    fn on_cue(&mut self, cue: &Cue);

    /// Handles a batch of cues in order.
    fn on_cues(&mut self, cues: &[Cue]) {
        for cue in cues {
            self.on_cue(cue);
        }
    }
}

/// Collects cues; mostly useful in tests.
impl CueSink for Vec<Cue> {
    fn on_cue(&mut self, cue: &Cue) {
        self.push(cue.clone());
    }
}

/// Logs cues through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl CueSink for LogSink {
    fn on_cue(&mut self, cue: &Cue) {
        match cue {
            Cue::Started { phases, total } => {
                info!(phases, total_secs = total.as_secs_f64(), "run started");
            }
            Cue::PhaseLoaded { index, phase } => {
                info!(index, kind = %phase.kind(), secs = phase.duration().as_secs(), "{phase}");
            }
            Cue::RoundStarted { round } => info!(round, "round started"),
            Cue::PhaseComplete { index, kind } => debug!(index, %kind, "phase complete"),
            Cue::Countdown { seconds } => debug!(seconds, "countdown"),
            Cue::Completed { elapsed } => {
                info!(elapsed_secs = elapsed.as_secs_f64(), "run completed");
            }
            Cue::LapRecorded(lap) => info!(
                lap = lap.lap_number,
                cumulative_secs = lap.cumulative.as_secs_f64(),
                lap_secs = lap.lap_duration.as_secs_f64(),
                "lap"
            ),
            Cue::CycleCompleted { cycle } => debug!(cycle, "breathing cycle complete"),
        }
    }
}

/// Rings the terminal bell on audible cues.
///
/// Phase ends ring once, countdown seconds ring once, the end of the run
/// rings three times.
pub struct BellSink {
    writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for BellSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BellSink").finish_non_exhaustive()
    }
}

impl BellSink {
    /// Creates a bell that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    /// Creates a bell on stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    const fn rings(cue: &Cue) -> usize {
        match cue {
            Cue::PhaseComplete { .. } | Cue::Countdown { .. } | Cue::LapRecorded(_) => 1,
            Cue::Completed { .. } => 3,
            _ => 0,
        }
    }
}

impl CueSink for BellSink {
    fn on_cue(&mut self, cue: &Cue) {
        let n = Self::rings(cue);
        if n > 0 {
            let _ = self.writer.write_all(&b"\x07\x07\x07"[..n]);
            let _ = self.writer.flush();
        }
    }
}

/// Forwards every cue to several sinks in order.
#[derive(Default)]
pub struct CueFanout {
    sinks: Vec<Box<dyn CueSink + Send>>,
}

impl std::fmt::Debug for CueFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueFanout")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl CueFanout {
    /// Creates an empty fanout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: impl CueSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Adds a sink in place.
    pub fn push(&mut self, sink: impl CueSink + Send + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Number of attached sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if no sink is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl CueSink for CueFanout {
    fn on_cue(&mut self, cue: &Cue) {
        for sink in &mut self.sinks {
            sink.on_cue(cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink = Vec::new();
        sink.on_cues(&[Cue::RoundStarted { round: 1 }, Cue::Countdown { seconds: 3 }]);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].name(), "countdown");
    }

    #[test]
    fn test_bell_rings() {
        let buf = SharedBuf::default();
        let mut bell = BellSink::new(Box::new(buf.clone()));
        bell.on_cue(&Cue::RoundStarted { round: 1 });
        assert!(buf.0.lock().unwrap().is_empty());

        bell.on_cue(&Cue::PhaseComplete {
            index: 0,
            kind: PhaseKind::Work,
        });
        bell.on_cue(&Cue::Completed {
            elapsed: Duration::from_secs(1),
        });
        assert_eq!(buf.0.lock().unwrap().as_slice(), b"\x07\x07\x07\x07");
    }

    #[test]
    fn test_fanout_forwards_to_all() {
        let a = SharedBuf::default();
        let b = SharedBuf::default();
        let mut fanout = CueFanout::new()
            .with(BellSink::new(Box::new(a.clone())))
            .with(BellSink::new(Box::new(b.clone())));
        assert_eq!(fanout.len(), 2);

        fanout.on_cue(&Cue::Countdown { seconds: 1 });
        assert_eq!(a.0.lock().unwrap().len(), 1);
        assert_eq!(b.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_log_sink_does_not_panic() {
        let mut sink = LogSink;
        sink.on_cue(&Cue::Started {
            phases: 3,
            total: Duration::from_secs(90),
        });
        sink.on_cue(&Cue::CycleCompleted { cycle: 2 });
    }
}
