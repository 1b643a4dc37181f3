//! Shared plumbing for the running commands.
//!
//! A [`Session`] wires the cue sinks selected on the command line, spawns
//! the keyboard reader, renders the live status line and reports how the run
//! ended on the event stream.

use std::io::{IsTerminal, Write};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::OutputArgs;
use crate::cli::commands::controls::{self, KeyMap};
use crate::config::schema::Settings;
use crate::cue::{BellSink, Cue, CueFanout, CueSink, LogSink};
use crate::driver::{DriverOutcome, Tickable, TickDriver};
use crate::engine::RunStatus;
use crate::error::CadenceError;
use crate::observability::events::{Event, EventEmitter, StopReason};
use crate::observability::metrics::{MetricsSink, init_metrics};
use crate::presentation::Snapshot;

/// Minimum gap between two status line redraws.
const STATUS_INTERVAL: Duration = Duration::from_millis(100);

/// How a run ended, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// Every phase was played.
    Completed,
    /// Ended early.
    Stopped(StopReason),
}

impl std::fmt::Display for RunEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Stopped(StopReason::UserStop) => "stopped",
            Self::Stopped(StopReason::Signal) => "interrupted",
            Self::Stopped(StopReason::LimitReached) => "limit reached",
        })
    }
}

/// Sinks and front-end state for one run.
pub struct Session {
    mode: &'static str,
    sinks: CueFanout,
    events: Option<Arc<EventEmitter>>,
    tick: Duration,
    keymap: KeyMap,
    status: StatusLine,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("sinks", &self.sinks)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens the outputs requested by `output` and `settings`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the event file cannot be created or the
    /// metrics endpoint cannot be bound.
    pub fn open(
        mode: &'static str,
        output: &OutputArgs,
        settings: &Settings,
        keymap: KeyMap,
        quiet: bool,
    ) -> Result<Self, CadenceError> {
        let mut sinks = CueFanout::new().with(LogSink);

        if settings.bell {
            sinks.push(BellSink::stderr());
        }

        let events = match &output.events {
            Some(target) => {
                let emitter = Arc::new(EventEmitter::for_target(target)?.for_mode(mode));
                sinks.push(Arc::clone(&emitter));
                Some(emitter)
            }
            None => None,
        };

        if let Some(port) = output.metrics_port {
            init_metrics(Some(port))?;
            sinks.push(MetricsSink::new(mode));
        }

        // the status line would interleave with JSONL on a shared terminal
        let stdout_events = output.events.as_deref().is_some_and(|p| p.as_os_str() == "-");
        let live = !quiet && !stdout_events && std::io::stderr().is_terminal();

        Ok(Self {
            mode,
            sinks,
            events,
            tick: settings.tick(),
            keymap,
            status: StatusLine::new(live),
        })
    }

    /// Drives `engine` until it finishes, the user stops it, `limit_reached`
    /// returns `true`, or `cancel` fires.
    ///
    /// `started` are the cues returned by the engine's `start` call.
    pub async fn drive<E, L>(
        mut self,
        engine: &mut E,
        started: &[Cue],
        cancel: CancellationToken,
        mut limit_reached: L,
    ) -> RunEnd
    where
        E: Tickable,
        L: FnMut(&E) -> bool,
    {
        self.sinks.on_cues(started);
        if self.status.live {
            eprintln!("{}", self.keymap.help());
        }

        let (driver, handle) = TickDriver::new(self.tick, cancel);
        let input = controls::spawn(handle, self.keymap);

        let mut limited = false;
        let status = &mut self.status;
        let outcome = driver
            .run(engine, &mut self.sinks, |engine| {
                status.render(&engine.snapshot());
                if limit_reached(engine) {
                    limited = true;
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        input.abort();
        self.status.finish(&engine.snapshot());

        let snapshot = engine.snapshot();
        let end = match outcome {
            DriverOutcome::Finished if snapshot.status == RunStatus::Completed => RunEnd::Completed,
            DriverOutcome::Finished => RunEnd::Stopped(StopReason::UserStop),
            DriverOutcome::Stopped if limited => RunEnd::Stopped(StopReason::LimitReached),
            DriverOutcome::Stopped => RunEnd::Stopped(StopReason::UserStop),
            DriverOutcome::Cancelled => RunEnd::Stopped(StopReason::Signal),
        };

        match end {
            RunEnd::Completed => info!(mode = self.mode, "run completed"),
            RunEnd::Stopped(reason) => {
                if reason == StopReason::Signal {
                    warn!(mode = self.mode, "run interrupted");
                } else {
                    info!(mode = self.mode, ?reason, "run stopped");
                }
                if let Some(events) = &self.events {
                    events.emit(Event::RunStopped {
                        reason,
                        elapsed: snapshot.elapsed,
                    });
                }
            }
        }
        end
    }
}

/// Single-line live display on stderr.
#[derive(Debug)]
struct StatusLine {
    live: bool,
    last: Option<Instant>,
}

impl StatusLine {
    const fn new(live: bool) -> Self {
        Self { live, last: None }
    }

    fn render(&mut self, snapshot: &Snapshot) {
        if !self.live {
            return;
        }
        let now = Instant::now();
        if self.last.is_some_and(|last| now - last < STATUS_INTERVAL) {
            return;
        }
        self.last = Some(now);
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}\x1b[K", snapshot.status_line());
        let _ = err.flush();
    }

    fn finish(&mut self, snapshot: &Snapshot) {
        if self.live {
            eprintln!("\r{}\x1b[K", snapshot.status_line());
        }
    }
}
