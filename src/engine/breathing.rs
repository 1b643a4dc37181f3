//! Looping breathing engine
//!
//! Same tick, pause and settle contract as the workout timer, but the index
//! wraps around at the end of the sequence and the run never completes.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cue::Cue;
use crate::error::EngineError;
use crate::presentation::{PhaseView, Snapshot};
use crate::sequence::{BreathStep, Phase, Sequence};

use super::state::{EngineOptions, PhaseClock, RunStatus};

/// Infinite breathing cycle.
#[derive(Debug)]
pub struct BreathingEngine {
    status: RunStatus,
    sequence: Option<Sequence>,
    index: usize,
    completed_phases: u64,
    clock: PhaseClock,
}

impl Default for BreathingEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl BreathingEngine {
    /// Creates an engine in the `ready` state.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            status: RunStatus::Ready,
            sequence: None,
            index: 0,
            completed_phases: 0,
            clock: PhaseClock::new(options),
        }
    }

    /// Starts cycling through `sequence`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotReady`] unless the engine is `ready`.
    /// - [`EngineError::EmptySequence`] for an empty sequence.
    /// - [`EngineError::NoBreathPhase`] if neither breath-in nor breath-out
    ///   is present.
    pub fn start(&mut self, sequence: Sequence) -> Result<Vec<Cue>, EngineError> {
        if self.status != RunStatus::Ready {
            return Err(EngineError::NotReady {
                status: self.status,
            });
        }
        let Some(&first) = sequence.get(0) else {
            return Err(EngineError::EmptySequence);
        };
        let breathes = sequence.iter().any(|p| {
            matches!(
                p,
                Phase::Breath {
                    step: BreathStep::In | BreathStep::Out,
                    ..
                }
            )
        });
        if !breathes {
            return Err(EngineError::NoBreathPhase);
        }

        info!(
            phases = sequence.len(),
            cycle_secs = sequence.total().as_secs(),
            "starting breathing"
        );

        let mut cues = vec![Cue::Started {
            phases: sequence.len(),
            total: sequence.total(),
        }];
        self.clock.clear();
        self.index = 0;
        self.completed_phases = 0;
        self.sequence = Some(sequence);
        self.status = RunStatus::Running;
        self.load(0, first, &mut cues);
        Ok(cues)
    }

    /// Advances by `dt`. See [`WorkoutTimer::tick`](super::WorkoutTimer::tick).
    pub fn tick(&mut self, dt: Duration) -> Vec<Cue> {
        let mut cues = Vec::new();
        if !self.status.is_active() {
            return cues;
        }

        if self.clock.is_settling() {
            if let Some(index) = self.clock.poll_settled(dt) {
                self.advance(index, &mut cues);
            }
            return cues;
        }

        if self.status == RunStatus::Paused {
            return cues;
        }

        if self.clock.count_down(dt, &mut cues) {
            match self.current_phase().map(Phase::kind) {
                Some(kind) => {
                    cues.push(Cue::PhaseComplete {
                        index: self.index,
                        kind,
                    });
                    self.clock.begin_settle(self.index);
                }
                None => {
                    warn!(index = self.index, "breathing phase missing, stopping");
                    self.reset();
                    cues.clear();
                }
            }
        }
        cues
    }

    fn advance(&mut self, settled: usize, cues: &mut Vec<Cue>) {
        let len = self.sequence.as_ref().map_or(0, Sequence::len);
        if settled != self.index || len == 0 {
            warn!(settled, current = self.index, "breathing index out of step, stopping");
            self.reset();
            return;
        }

        self.completed_phases += 1;
        let next = (self.index + 1) % len;
        if next == 0 {
            let cycle = self.cycles();
            debug!(cycle, "breathing cycle complete");
            cues.push(Cue::CycleCompleted { cycle });
        }

        match self.sequence.as_ref().and_then(|s| s.get(next)).copied() {
            Some(phase) => self.load(next, phase, cues),
            None => self.reset(),
        }
    }

    fn load(&mut self, index: usize, phase: Phase, cues: &mut Vec<Cue>) {
        self.index = index;
        self.clock.load(phase.duration());
        debug!(index, kind = %phase.kind(), "{phase}");
        cues.push(Cue::PhaseLoaded { index, phase });
    }

    /// Pauses a running engine.
    pub fn pause(&mut self) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }
        self.status = RunStatus::Paused;
        true
    }

    /// Resumes a paused engine.
    pub fn resume(&mut self) -> bool {
        if self.status != RunStatus::Paused {
            return false;
        }
        self.status = RunStatus::Running;
        true
    }

    /// Pauses when running, resumes when paused.
    pub fn toggle_pause(&mut self) -> bool {
        if self.status == RunStatus::Running {
            self.pause()
        } else {
            self.resume()
        }
    }

    /// Stops and returns to `ready`, cancelling any pending advancement.
    pub fn reset(&mut self) {
        self.clock.clear();
        self.sequence = None;
        self.index = 0;
        self.completed_phases = 0;
        self.status = RunStatus::Ready;
    }

    /// Resets and starts again over the same sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] if no sequence is loaded.
    pub fn restart(&mut self) -> Result<Vec<Cue>, EngineError> {
        let sequence = self.sequence.take().ok_or(EngineError::NotRunning)?;
        self.reset();
        self.start(sequence)
    }

    /// Current lifecycle state. Never `completed`.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns `true` while running or paused.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.status.is_active()
    }

    /// Returns `true` between a phase's completion and the next load.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.clock.is_settling()
    }

    /// Index of the current phase within the cycle.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    /// The phase being played.
    #[must_use]
    pub fn current_phase(&self) -> Option<&Phase> {
        self.sequence.as_ref()?.get(self.index)
    }

    /// Number of phase boundaries crossed since start.
    #[must_use]
    pub const fn completed_phases(&self) -> u64 {
        self.completed_phases
    }

    /// Number of full cycles since start.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        match self.sequence.as_ref().map(Sequence::len) {
            Some(len) if len > 0 => self.completed_phases / len as u64,
            _ => 0,
        }
    }

    /// Time left in the current phase.
    #[must_use]
    pub const fn time_remaining(&self) -> Duration {
        self.clock.remaining()
    }

    /// Counted time since start.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Size of the visual guide in `[0, 1]`.
    ///
    /// Grows during breath-in, stays full during the inhaled hold, shrinks
    /// during breath-out and stays empty during the exhaled hold.
    #[must_use]
    pub fn circle_progress(&self) -> f64 {
        let Some(Phase::Breath { step, .. }) = self.current_phase() else {
            return 0.0;
        };
        let duration = self.clock.phase_duration().as_secs_f64();
        let left = if duration > 0.0 {
            (self.clock.remaining().as_secs_f64() / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match step {
            BreathStep::In => 1.0 - left,
            BreathStep::InhaledHold => 1.0,
            BreathStep::Out => left,
            BreathStep::ExhaledHold => 0.0,
        }
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            phase: self
                .current_phase()
                .map(|phase| PhaseView::new(self.index, phase)),
            phases: self.sequence.as_ref().map_or(0, Sequence::len),
            remaining: self.time_remaining(),
            elapsed: self.elapsed(),
            transitioning: self.is_transitioning(),
            cycles: Some(self.cycles()),
            circle: Some(self.circle_progress()),
            ..Snapshot::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BreathingConfig;
    use crate::sequence::build_breathing;

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn engine() -> BreathingEngine {
        BreathingEngine::new(EngineOptions {
            settle_delay: ms(500),
            countdown_from: None,
        })
    }

    fn in_out() -> Sequence {
        build_breathing(&BreathingConfig {
            breath_in: 4,
            inhaled_hold: 0,
            breath_out: 4,
            exhaled_hold: 0,
        })
    }

    #[test]
    fn test_index_is_boundaries_mod_len() {
        let mut e = engine();
        e.start(in_out()).unwrap();

        for n in 1..=25u64 {
            e.tick(Duration::from_secs(4));
            e.tick(ms(500));
            assert_eq!(e.completed_phases(), n);
            assert_eq!(e.current_index() as u64, n % 2);
            assert_eq!(e.status(), RunStatus::Running);
        }
        assert_eq!(e.cycles(), 12);
    }

    #[test]
    fn test_cycle_cue_on_wrap() {
        let mut e = engine();
        e.start(in_out()).unwrap();
        let mut cues = Vec::new();
        for _ in 0..4 {
            cues.extend(e.tick(Duration::from_secs(4)));
            cues.extend(e.tick(ms(500)));
        }
        let cycles: Vec<_> = cues
            .iter()
            .filter_map(|c| match c {
                Cue::CycleCompleted { cycle } => Some(*cycle),
                _ => None,
            })
            .collect();
        assert_eq!(cycles, [1, 2]);
        assert!(!cues.iter().any(|c| c.name() == "completed"));
    }

    #[test]
    fn test_rejects_holds_only() {
        let mut e = engine();
        let seq = Sequence::new(vec![Phase::Breath {
            duration: Duration::from_secs(4),
            step: BreathStep::InhaledHold,
        }]);
        assert_eq!(e.start(seq), Err(EngineError::NoBreathPhase));
        assert_eq!(e.start(Sequence::default()), Err(EngineError::EmptySequence));
        assert_eq!(e.status(), RunStatus::Ready);
    }

    #[test]
    fn test_circle_progress() {
        let mut e = engine();
        e.start(build_breathing(&BreathingConfig::default())).unwrap();
        assert!(e.circle_progress().abs() < 1e-9);

        e.tick(ms(1000));
        assert!((e.circle_progress() - 0.25).abs() < 1e-9);

        e.tick(ms(3000));
        e.tick(ms(500));
        assert!((e.circle_progress() - 1.0).abs() < 1e-9);

        e.tick(ms(4000));
        e.tick(ms(500));
        e.tick(ms(1000));
        assert!((e.circle_progress() - 0.75).abs() < 1e-9);

        e.tick(ms(3000));
        e.tick(ms(500));
        assert!(e.circle_progress().abs() < 1e-9);
    }

    #[test]
    fn test_missing_phase_resets_silently() {
        let mut e = BreathingEngine::new(EngineOptions {
            settle_delay: ms(500),
            countdown_from: Some(3),
        });
        e.start(in_out()).unwrap();
        e.index = 7;

        assert!(e.tick(Duration::from_secs(4)).is_empty());
        assert_eq!(e.status(), RunStatus::Ready);
        assert!(e.current_phase().is_none());
    }

    #[test]
    fn test_reset_mid_settle() {
        let mut e = engine();
        e.start(in_out()).unwrap();
        e.tick(Duration::from_secs(4));
        assert!(e.is_transitioning());
        e.reset();
        assert!(e.tick(Duration::from_secs(10)).is_empty());
        assert_eq!(e.completed_phases(), 0);
        assert_eq!(e.status(), RunStatus::Ready);
    }

    #[test]
    fn test_pause_holds_phase() {
        let mut e = engine();
        e.start(in_out()).unwrap();
        e.tick(ms(1000));
        assert!(e.toggle_pause());
        e.tick(ms(2000));
        assert_eq!(e.time_remaining(), ms(3000));
        assert!(e.toggle_pause());
        e.tick(ms(1000));
        assert_eq!(e.time_remaining(), ms(2000));
    }
}
