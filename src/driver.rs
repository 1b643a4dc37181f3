//! Tick driver
//!
//! Owns an engine inside one async task and feeds it the wall-clock time
//! measured between interval ticks. Control requests from other tasks
//! (keyboard, signals) are posted through an unbounded channel so every
//! engine call happens on the driver's task, one at a time.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::cue::{Cue, CueSink};
use crate::engine::{BreathingEngine, RunStatus, Stopwatch, WorkoutTimer};
use crate::error::EngineError;
use crate::presentation::Snapshot;

/// External request routed into the driver task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Pause when running, resume when paused.
    TogglePause,
    /// Pause.
    Pause,
    /// Resume.
    Resume,
    /// Record a stopwatch lap.
    Lap,
    /// Reset and start over.
    Restart,
    /// Back to ready.
    Reset,
    /// End the drive loop.
    Stop,
}

/// An engine the driver can run.
pub trait Tickable {
    /// Advances by `dt`.
    fn tick(&mut self, dt: Duration) -> Vec<Cue>;

    /// Applies a control request. [`Control::Stop`] never reaches here.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the request is invalid in the current
    /// state; the driver logs and ignores it.
    fn control(&mut self, control: Control) -> Result<Vec<Cue>, EngineError>;

    /// Current state for presentation.
    fn snapshot(&self) -> Snapshot;

    /// Returns `true` once there is nothing left to drive.
    fn is_finished(&self) -> bool;
}

impl Tickable for WorkoutTimer {
    fn tick(&mut self, dt: Duration) -> Vec<Cue> {
        Self::tick(self, dt)
    }

    fn control(&mut self, control: Control) -> Result<Vec<Cue>, EngineError> {
        match control {
            Control::TogglePause => {
                self.toggle_pause();
            }
            Control::Pause => {
                self.pause();
            }
            Control::Resume => {
                self.resume();
            }
            Control::Restart => return self.restart(),
            Control::Reset => self.reset(),
            Control::Lap | Control::Stop => {}
        }
        Ok(Vec::new())
    }

    fn snapshot(&self) -> Snapshot {
        Self::snapshot(self)
    }

    fn is_finished(&self) -> bool {
        matches!(self.status(), RunStatus::Completed | RunStatus::Ready)
    }
}

impl Tickable for BreathingEngine {
    fn tick(&mut self, dt: Duration) -> Vec<Cue> {
        Self::tick(self, dt)
    }

    fn control(&mut self, control: Control) -> Result<Vec<Cue>, EngineError> {
        match control {
            Control::TogglePause => {
                self.toggle_pause();
            }
            Control::Pause => {
                self.pause();
            }
            Control::Resume => {
                self.resume();
            }
            Control::Restart => return self.restart(),
            Control::Reset => self.reset(),
            Control::Lap | Control::Stop => {}
        }
        Ok(Vec::new())
    }

    fn snapshot(&self) -> Snapshot {
        Self::snapshot(self)
    }

    fn is_finished(&self) -> bool {
        self.status() == RunStatus::Ready
    }
}

impl Tickable for Stopwatch {
    fn tick(&mut self, dt: Duration) -> Vec<Cue> {
        Self::tick(self, dt);
        Vec::new()
    }

    fn control(&mut self, control: Control) -> Result<Vec<Cue>, EngineError> {
        match control {
            Control::TogglePause => {
                if !self.stop() {
                    self.start();
                }
            }
            Control::Pause => {
                self.stop();
            }
            Control::Resume => {
                self.start();
            }
            Control::Lap => return self.lap_cue().map(|cue| vec![cue]),
            Control::Restart => {
                self.reset();
                self.start();
            }
            Control::Reset => self.reset(),
            Control::Stop => {}
        }
        Ok(Vec::new())
    }

    fn snapshot(&self) -> Snapshot {
        Self::snapshot(self)
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// How a drive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// The engine reported it was finished.
    Finished,
    /// A [`Control::Stop`] arrived or the frame callback broke out.
    Stopped,
    /// The cancellation token fired.
    Cancelled,
}

/// Sender side of the driver's control channel.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<Control>,
}

impl DriverHandle {
    /// Posts a control request. Returns `false` once the driver is gone.
    pub fn send(&self, control: Control) -> bool {
        self.tx.send(control).is_ok()
    }
}

/// Periodic tick source for one engine.
#[derive(Debug)]
pub struct TickDriver {
    resolution: Duration,
    cancel: CancellationToken,
    rx: mpsc::UnboundedReceiver<Control>,
}

impl TickDriver {
    /// Creates a driver ticking every `resolution` until `cancel` fires.
    #[must_use]
    pub fn new(resolution: Duration, cancel: CancellationToken) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let resolution = resolution.max(Duration::from_millis(1));
        (
            Self {
                resolution,
                cancel,
                rx,
            },
            DriverHandle { tx },
        )
    }

    /// Drives `engine` until it finishes, is stopped, or is cancelled.
    ///
    /// Cues are forwarded to `sink` in emission order. `on_frame` runs after
    /// every tick or control request and may break out of the loop.
    pub async fn run<E, S, F>(mut self, engine: &mut E, sink: &mut S, mut on_frame: F) -> DriverOutcome
    where
        E: Tickable,
        S: CueSink + ?Sized,
        F: FnMut(&E) -> ControlFlow<()>,
    {
        let mut interval = tokio::time::interval(self.resolution);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!("tick driver cancelled");
                    return DriverOutcome::Cancelled;
                }
                Some(control) = self.rx.recv() => {
                    if control == Control::Stop {
                        debug!("tick driver stopped");
                        return DriverOutcome::Stopped;
                    }
                    match engine.control(control) {
                        Ok(cues) => sink.on_cues(&cues),
                        Err(e) => debug!(?control, error = %e, "control request ignored"),
                    }
                }
                _ = interval.tick() => {
                    let now = Instant::now();
                    let dt = now - last;
                    last = now;
                    trace!(dt_ms = dt.as_millis(), "tick");
                    let cues = engine.tick(dt);
                    sink.on_cues(&cues);
                }
            }

            if on_frame(engine).is_break() {
                return DriverOutcome::Stopped;
            }
            if engine.is_finished() {
                return DriverOutcome::Finished;
            }
        }
    }
}
