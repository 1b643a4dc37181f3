//! Workout timer state machine
//!
//! [`WorkoutTimer`] plays a [`Sequence`] once, counting each phase down on
//! ticks fed by the caller. When a phase runs out the timer emits
//! [`Cue::PhaseComplete`], blocks further counting, and schedules the
//! advancement after the settle delay. The advancement is a cancellable
//! deferred action: [`WorkoutTimer::reset`] withdraws it synchronously.
//!
//! The settle delay keeps elapsing while the run is paused. If it finishes
//! during a pause, the next phase loads and waits paused.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cue::Cue;
use crate::error::EngineError;
use crate::presentation::{PhaseView, Snapshot};
use crate::sequence::{Phase, Sequence};

use super::state::{EngineOptions, PhaseClock, RunStatus};

/// Countdown engine for interval and head-to-head workouts.
#[derive(Debug)]
pub struct WorkoutTimer {
    status: RunStatus,
    sequence: Option<Sequence>,
    index: usize,
    clock: PhaseClock,
    completing: bool,
}

impl Default for WorkoutTimer {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl WorkoutTimer {
    /// Creates a timer in the `ready` state.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self {
            status: RunStatus::Ready,
            sequence: None,
            index: 0,
            clock: PhaseClock::new(options),
            completing: false,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Starts a run over `sequence`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotReady`] unless the timer is `ready`, and
    /// [`EngineError::EmptySequence`] if there is nothing to play. No state
    /// is touched on error.
    pub fn start(&mut self, sequence: Sequence) -> Result<Vec<Cue>, EngineError> {
        if self.status != RunStatus::Ready {
            return Err(EngineError::NotReady {
                status: self.status,
            });
        }
        let Some(&first) = sequence.get(0) else {
            return Err(EngineError::EmptySequence);
        };

        info!(
            phases = sequence.len(),
            total_secs = sequence.total().as_secs(),
            "starting workout"
        );

        let mut cues = vec![Cue::Started {
            phases: sequence.len(),
            total: sequence.total(),
        }];

        self.clock.clear();
        self.index = 0;
        self.completing = false;
        self.sequence = Some(sequence);
        self.status = RunStatus::Running;
        self.load(0, first, &mut cues);

        Ok(cues)
    }

    /// Advances the run by `dt`.
    ///
    /// The pending settle delay is served first and elapses even while
    /// paused. Counting happens only while running and not transitioning,
    /// and never takes the phase below zero.
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
            self.phase_exhausted(&mut cues);
        }
        cues
    }

    /// Pauses a running timer. Returns `false` if there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }
        self.status = RunStatus::Paused;
        debug!(index = self.index, "paused");
        true
    }

    /// Resumes a paused timer. Returns `false` if it was not paused.
    pub fn resume(&mut self) -> bool {
        if self.status != RunStatus::Paused {
            return false;
        }
        self.status = RunStatus::Running;
        debug!(index = self.index, "resumed");
        true
    }

    /// Pauses when running, resumes when paused.
    pub fn toggle_pause(&mut self) -> bool {
        match self.status {
            RunStatus::Running => self.pause(),
            RunStatus::Paused => self.resume(),
            RunStatus::Ready | RunStatus::Completed => false,
        }
    }

    /// Returns to `ready` from any state.
    ///
    /// A pending phase advancement is cancelled and the sequence is dropped;
    /// no further cue of the previous run can be produced.
    pub fn reset(&mut self) {
        if self.clock.cancel_settle() {
            debug!(index = self.index, "cancelled pending phase advance");
        }
        self.clock.clear();
        self.sequence = None;
        self.index = 0;
        self.completing = false;
        if self.status != RunStatus::Ready {
            info!(from = %self.status, "timer reset");
        }
        self.status = RunStatus::Ready;
    }

    /// Resets and starts again over the same sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] if no sequence was ever loaded.
    pub fn restart(&mut self) -> Result<Vec<Cue>, EngineError> {
        let sequence = self.sequence.take().ok_or(EngineError::NotRunning)?;
        self.reset();
        self.start(sequence)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn phase_exhausted(&mut self, cues: &mut Vec<Cue>) {
        let Some(phase) = self.current_phase().copied() else {
            self.force_complete("current phase missing at exhaustion", cues);
            return;
        };

        debug!(index = self.index, kind = %phase.kind(), "phase complete");
        cues.push(Cue::PhaseComplete {
            index: self.index,
            kind: phase.kind(),
        });
        self.clock.begin_settle(self.index);
    }

    fn advance(&mut self, settled: usize, cues: &mut Vec<Cue>) {
        if settled != self.index {
            warn!(
                settled,
                current = self.index,
                "settle action does not match current phase"
            );
            self.force_complete("phase index mismatch", cues);
            return;
        }

        let next = self.index + 1;
        let len = self.sequence.as_ref().map_or(0, Sequence::len);
        if next >= len {
            self.complete(cues);
            return;
        }

        match self.sequence.as_ref().and_then(|s| s.get(next)).copied() {
            Some(phase) => self.load(next, phase, cues),
            None => self.force_complete("next phase missing", cues),
        }
    }

    fn load(&mut self, index: usize, phase: Phase, cues: &mut Vec<Cue>) {
        self.index = index;
        self.clock.load(phase.duration());
        debug!(index, kind = %phase.kind(), "{phase}");
        cues.push(Cue::PhaseLoaded { index, phase });
        if let Some(round) = phase.starts_round() {
            cues.push(Cue::RoundStarted { round });
        }
    }

    fn complete(&mut self, cues: &mut Vec<Cue>) {
        if self.completing {
            return;
        }
        self.completing = true;
        self.clock.cancel_settle();
        self.status = RunStatus::Completed;
        info!(
            elapsed_secs = self.clock.elapsed().as_secs_f64(),
            "workout complete"
        );
        cues.push(Cue::Completed {
            elapsed: self.clock.elapsed(),
        });
    }

    /// Ends the run immediately after an internal inconsistency.
    fn force_complete(&mut self, reason: &str, cues: &mut Vec<Cue>) {
        warn!(reason, index = self.index, "forcing run to complete");
        self.clock.drain();
        self.complete(cues);
    }

    // ========================================================================
    // Read-only view
    // ========================================================================

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns `true` while running or paused.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.status.is_active()
    }

    /// Returns `true` while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.status == RunStatus::Paused
    }

    /// Returns `true` between a phase's completion and the next load.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.clock.is_settling()
    }

    /// Returns `true` once completion has been announced.
    #[must_use]
    pub const fn is_completing(&self) -> bool {
        self.completing
    }

    /// Index of the current phase.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    /// The phase being played, if a run is loaded.
    #[must_use]
    pub fn current_phase(&self) -> Option<&Phase> {
        self.sequence.as_ref()?.get(self.index)
    }

    /// Time left in the current phase.
    #[must_use]
    pub const fn time_remaining(&self) -> Duration {
        self.clock.remaining()
    }

    /// Counted time since the run started.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Summed duration of the loaded sequence.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.sequence.as_ref().map_or(Duration::ZERO, Sequence::total)
    }

    /// Fraction of the run played, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let total = self.total();
        if total.is_zero() {
            return 0.0;
        }
        (self.elapsed().as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// 1-based round of the current phase, 0 outside the round structure.
    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.current_phase().map_or(0, Phase::round)
    }

    /// Set of the current work phase, or the set a rest follows.
    #[must_use]
    pub fn current_set(&self) -> Option<u32> {
        self.current_phase().and_then(Phase::set)
    }

    /// Set the current rest precedes.
    #[must_use]
    pub fn next_set(&self) -> Option<u32> {
        self.current_phase().and_then(Phase::next_set)
    }

    /// Participant of the current head-to-head turn.
    #[must_use]
    pub fn current_person(&self) -> Option<u32> {
        self.current_phase().and_then(Phase::person)
    }

    /// The loaded sequence.
    #[must_use]
    pub const fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    /// Presentation snapshot of the current state.
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
            progress: self.progress(),
            transitioning: self.is_transitioning(),
            ..Snapshot::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HeadToHeadConfig, IntervalConfig};
    use crate::sequence::{PhaseKind, build_head_to_head, build_interval};

    const fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    const fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn two_phase() -> Sequence {
        Sequence::new(vec![
            Phase::Setup { duration: secs(1) },
            Phase::Work {
                duration: secs(2),
                round: 1,
                set: 1,
            },
        ])
    }

    fn timer() -> WorkoutTimer {
        WorkoutTimer::new(EngineOptions {
            settle_delay: ms(500),
            countdown_from: None,
        })
    }

    fn count(cues: &[Cue], name: &str) -> usize {
        cues.iter().filter(|c| c.name() == name).count()
    }

    #[test]
    fn test_start_loads_first_phase() {
        let mut t = timer();
        let cues = t.start(two_phase()).unwrap();

        assert_eq!(t.status(), RunStatus::Running);
        assert_eq!(t.current_index(), 0);
        assert_eq!(t.time_remaining(), secs(1));
        assert_eq!(t.elapsed(), Duration::ZERO);
        assert_eq!(cues[0].name(), "started");
        assert_eq!(cues[1].name(), "phase_loaded");
    }

    #[test]
    fn test_start_empty_fails_without_state() {
        let mut t = timer();
        assert_eq!(
            t.start(Sequence::default()),
            Err(EngineError::EmptySequence)
        );
        assert_eq!(t.status(), RunStatus::Ready);
        assert!(t.sequence().is_none());
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        assert_eq!(
            t.start(two_phase()),
            Err(EngineError::NotReady {
                status: RunStatus::Running
            })
        );
    }

    #[test]
    fn test_tick_is_exact_and_floors_at_zero() {
        let mut t = timer();
        t.start(two_phase()).unwrap();

        t.tick(ms(250));
        assert_eq!(t.time_remaining(), ms(750));
        assert_eq!(t.elapsed(), ms(250));

        t.tick(ms(900));
        assert_eq!(t.time_remaining(), Duration::ZERO);
        assert_eq!(t.elapsed(), secs(1));
    }

    #[test]
    fn test_exactly_one_phase_complete_per_boundary() {
        let mut t = timer();
        t.start(two_phase()).unwrap();

        let mut cues = Vec::new();
        // 1s phase, 110 ticks of 10ms
        for _ in 0..110 {
            cues.extend(t.tick(ms(10)));
        }
        assert_eq!(count(&cues, "phase_complete"), 1);
        assert!(t.is_transitioning());

        for _ in 0..30 {
            cues.extend(t.tick(ms(100)));
        }
        assert_eq!(count(&cues, "phase_complete"), 2);
        assert_eq!(count(&cues, "phase_loaded"), 1);
    }

    #[test]
    fn test_settle_delay_separates_cues() {
        let mut t = timer();
        t.start(two_phase()).unwrap();

        let cues = t.tick(secs(1));
        assert_eq!(
            cues,
            vec![Cue::PhaseComplete {
                index: 0,
                kind: PhaseKind::Setup
            }]
        );
        assert_eq!(t.current_index(), 0);

        assert!(t.tick(ms(499)).is_empty());
        assert_eq!(t.current_index(), 0);

        let cues = t.tick(ms(1));
        assert_eq!(cues[0].name(), "phase_loaded");
        assert_eq!(cues[1], Cue::RoundStarted { round: 1 });
        assert_eq!(t.current_index(), 1);
        assert_eq!(t.time_remaining(), secs(2));
        assert!(!t.is_transitioning());
    }

    #[test]
    fn test_reset_during_settle_cancels_advance() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        t.tick(secs(1));
        assert!(t.is_transitioning());

        t.reset();
        assert_eq!(t.status(), RunStatus::Ready);
        assert!(!t.is_transitioning());
        assert!(t.sequence().is_none());

        for _ in 0..10 {
            assert!(t.tick(secs(1)).is_empty());
        }
        assert_eq!(t.current_index(), 0);
    }

    #[test]
    fn test_reset_then_new_run_ignores_old_settle() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        t.tick(secs(1));
        t.reset();

        t.start(two_phase()).unwrap();
        let cues = t.tick(ms(600));
        assert!(cues.is_empty());
        assert_eq!(t.current_index(), 0);
        assert_eq!(t.time_remaining(), ms(400));
    }

    #[test]
    fn test_pause_ignores_ticks() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        t.tick(ms(300));

        assert!(t.pause());
        assert!(!t.pause());
        assert!(t.tick(secs(5)).is_empty());
        assert_eq!(t.time_remaining(), ms(700));
        assert_eq!(t.elapsed(), ms(300));

        assert!(t.resume());
        t.tick(ms(100));
        assert_eq!(t.time_remaining(), ms(600));
    }

    #[test]
    fn test_settle_elapses_while_paused() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        t.tick(secs(1));
        t.pause();

        let cues = t.tick(ms(500));
        assert_eq!(cues[0].name(), "phase_loaded");
        assert_eq!(t.status(), RunStatus::Paused);
        assert_eq!(t.current_index(), 1);

        t.tick(secs(1));
        assert_eq!(t.time_remaining(), secs(2));
    }

    #[test]
    fn test_completion_is_terminal_and_announced_once() {
        let mut t = timer();
        t.start(two_phase()).unwrap();

        let mut cues = Vec::new();
        for _ in 0..100 {
            cues.extend(t.tick(ms(100)));
        }
        assert_eq!(t.status(), RunStatus::Completed);
        assert!(t.is_completing());
        assert_eq!(count(&cues, "completed"), 1);
        assert_eq!(cues.last(), Some(&Cue::Completed { elapsed: secs(3) }));

        assert!(t.tick(secs(1)).is_empty());
        assert!(!t.pause());
        assert!((t.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_restart_after_completion() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        for _ in 0..10 {
            t.tick(secs(1));
        }
        assert_eq!(t.status(), RunStatus::Completed);

        let cues = t.restart().unwrap();
        assert_eq!(cues[0].name(), "started");
        assert_eq!(t.status(), RunStatus::Running);
        assert_eq!(t.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_restart_without_sequence() {
        assert_eq!(timer().restart(), Err(EngineError::NotRunning));
    }

    #[test]
    fn test_progress_and_accessors() {
        let mut t = timer();
        t.start(build_interval(&IntervalConfig {
            setup: 0,
            warmup: 0,
            work: 10,
            rest: 5,
            long_rest: 0,
            sets: 2,
            rounds: 1,
        }))
        .unwrap();
        assert_eq!(t.current_set(), Some(1));
        assert_eq!(t.current_round(), 1);

        t.tick(secs(10));
        t.tick(ms(500));
        assert_eq!(t.current_set(), Some(1));
        assert_eq!(t.next_set(), Some(2));
        assert!((t.progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_head_to_head_reports_person_without_round_cue() {
        let mut t = timer();
        let cues = t
            .start(build_head_to_head(&HeadToHeadConfig {
                setup: 0,
                work: 5,
                people: 2,
                rounds: 1,
            }))
            .unwrap();
        assert_eq!(t.current_person(), Some(1));
        assert_eq!(count(&cues, "round_started"), 0);

        t.tick(secs(5));
        t.tick(ms(500));
        assert_eq!(t.current_person(), Some(2));
    }

    #[test]
    fn test_round_started_per_round() {
        let mut t = timer();
        let mut cues = t
            .start(build_interval(&IntervalConfig {
                setup: 1,
                warmup: 0,
                work: 1,
                rest: 0,
                long_rest: 1,
                sets: 2,
                rounds: 3,
            }))
            .unwrap();
        for _ in 0..100 {
            cues.extend(t.tick(ms(250)));
        }
        let rounds: Vec<_> = cues
            .iter()
            .filter_map(|c| match c {
                Cue::RoundStarted { round } => Some(*round),
                _ => None,
            })
            .collect();
        assert_eq!(rounds, [1, 2, 3]);
        assert_eq!(t.status(), RunStatus::Completed);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut t = timer();
        t.start(two_phase()).unwrap();
        t.tick(ms(400));
        let snap = t.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.phases, 2);
        assert_eq!(snap.remaining, ms(600));
        assert_eq!(snap.phase.map(|p| p.index), Some(0));
    }
}
