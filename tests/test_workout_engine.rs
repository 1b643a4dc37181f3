//! Workout timer behavior through the public API.

use std::time::Duration;

use cadence::config::schema::{HeadToHeadConfig, IntervalConfig};
use cadence::cue::Cue;
use cadence::engine::{EngineOptions, RunStatus, WorkoutTimer};
use cadence::error::EngineError;
use cadence::sequence::{Phase, PhaseKind, Sequence, build_head_to_head, build_interval};

const TICK: Duration = Duration::from_millis(10);

fn timer(settle_ms: u64, countdown_from: Option<u32>) -> WorkoutTimer {
    WorkoutTimer::new(EngineOptions {
        settle_delay: Duration::from_millis(settle_ms),
        countdown_from,
    })
}

/// Ticks until completion, returning every cue including the start cues.
fn run_to_end(timer: &mut WorkoutTimer, sequence: Sequence) -> Vec<Cue> {
    let mut cues = timer.start(sequence).unwrap();
    for _ in 0..1_000_000 {
        cues.extend(timer.tick(TICK));
        if timer.status() == RunStatus::Completed {
            return cues;
        }
    }
    panic!("timer never completed");
}

fn count(cues: &[Cue], name: &str) -> usize {
    cues.iter().filter(|c| c.name() == name).count()
}

#[test]
fn interval_run_counts_exact_time() {
    let config = IntervalConfig {
        setup: 10,
        warmup: 0,
        work: 30,
        rest: 10,
        long_rest: 60,
        sets: 3,
        rounds: 2,
    };
    let mut t = timer(500, None);
    let cues = run_to_end(&mut t, build_interval(&config));

    assert_eq!(t.elapsed(), Duration::from_secs(290));
    assert_eq!(count(&cues, "phase_complete"), 12);
    assert_eq!(count(&cues, "phase_loaded"), 12);
    assert_eq!(count(&cues, "completed"), 1);
    assert_eq!(cues.last().map(Cue::name), Some("completed"));
    assert!((t.progress() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn rounds_are_announced_in_order() {
    let config = IntervalConfig {
        setup: 0,
        warmup: 0,
        work: 1,
        rest: 1,
        long_rest: 2,
        sets: 2,
        rounds: 3,
    };
    let mut t = timer(0, None);
    let cues = run_to_end(&mut t, build_interval(&config));

    let rounds: Vec<u32> = cues
        .iter()
        .filter_map(|c| match c {
            Cue::RoundStarted { round } => Some(*round),
            _ => None,
        })
        .collect();
    assert_eq!(rounds, [1, 2, 3]);
}

#[test]
fn head_to_head_rotates_people() {
    let config = HeadToHeadConfig {
        setup: 5,
        work: 20,
        people: 3,
        rounds: 2,
    };
    let mut t = timer(100, None);
    let cues = run_to_end(&mut t, build_head_to_head(&config));

    let people: Vec<Option<u32>> = cues
        .iter()
        .filter_map(|c| match c {
            Cue::PhaseLoaded { phase, .. } => Some(phase.person()),
            _ => None,
        })
        .collect();
    assert_eq!(
        people,
        [None, Some(1), Some(2), Some(3), Some(1), Some(2), Some(3)]
    );
    assert_eq!(t.elapsed(), Duration::from_secs(125));
}

#[test]
fn phase_complete_precedes_load_by_settle_delay() {
    let seq = Sequence::new(vec![
        Phase::Setup {
            duration: Duration::from_secs(1),
        },
        Phase::Work {
            duration: Duration::from_secs(1),
            round: 1,
            set: 1,
        },
    ]);
    let mut t = timer(500, None);
    t.start(seq).unwrap();

    for _ in 0..99 {
        assert!(t.tick(TICK).is_empty());
    }
    let cues = t.tick(TICK);
    assert_eq!(
        cues,
        [Cue::PhaseComplete {
            index: 0,
            kind: PhaseKind::Setup
        }]
    );
    assert!(t.is_transitioning());
    assert_eq!(t.time_remaining(), Duration::ZERO);

    for _ in 0..49 {
        assert!(t.tick(TICK).is_empty());
    }
    let cues = t.tick(TICK);
    assert_eq!(cues.first().map(Cue::name), Some("phase_loaded"));
    assert_eq!(t.current_index(), 1);
    assert_eq!(t.elapsed(), Duration::from_secs(1));
}

#[test]
fn reset_during_settle_cancels_advance() {
    let seq = Sequence::new(vec![
        Phase::Warmup {
            duration: Duration::from_millis(100),
        },
        Phase::Work {
            duration: Duration::from_secs(1),
            round: 1,
            set: 1,
        },
    ]);
    let mut t = timer(500, None);
    t.start(seq).unwrap();
    for _ in 0..10 {
        t.tick(TICK);
    }
    assert!(t.is_transitioning());

    t.reset();
    assert_eq!(t.status(), RunStatus::Ready);
    for _ in 0..100 {
        assert!(t.tick(TICK).is_empty());
    }
    assert_eq!(t.current_index(), 0);
    assert!(t.current_phase().is_none());
}

#[test]
fn pause_freezes_the_countdown() {
    let mut t = timer(500, None);
    t.start(build_interval(&IntervalConfig::default())).unwrap();
    t.tick(Duration::from_secs(2));
    assert!(t.pause());
    let remaining = t.time_remaining();

    for _ in 0..100 {
        t.tick(TICK);
    }
    assert_eq!(t.time_remaining(), remaining);
    assert_eq!(t.elapsed(), Duration::from_secs(2));

    assert!(t.toggle_pause());
    t.tick(Duration::from_secs(1));
    assert_eq!(t.elapsed(), Duration::from_secs(3));
}

#[test]
fn settle_finishing_while_paused_loads_paused() {
    let seq = Sequence::new(vec![
        Phase::Setup {
            duration: Duration::from_millis(50),
        },
        Phase::Work {
            duration: Duration::from_secs(2),
            round: 1,
            set: 1,
        },
    ]);
    let mut t = timer(200, None);
    t.start(seq).unwrap();
    t.tick(Duration::from_millis(50));
    assert!(t.is_transitioning());

    t.pause();
    let cues = t.tick(Duration::from_millis(200));
    assert_eq!(cues.first().map(Cue::name), Some("phase_loaded"));
    assert_eq!(t.status(), RunStatus::Paused);
    assert_eq!(t.time_remaining(), Duration::from_secs(2));
}

#[test]
fn countdown_cues_fire_once_per_second() {
    let seq = Sequence::new(vec![Phase::Work {
        duration: Duration::from_secs(5),
        round: 1,
        set: 1,
    }]);
    let mut t = timer(0, Some(3));
    let cues = run_to_end(&mut t, seq);

    let marks: Vec<u32> = cues
        .iter()
        .filter_map(|c| match c {
            Cue::Countdown { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();
    assert_eq!(marks, [3, 2, 1]);
}

#[test]
fn large_tick_never_goes_negative() {
    let seq = Sequence::new(vec![
        Phase::Work {
            duration: Duration::from_secs(1),
            round: 1,
            set: 1,
        },
        Phase::Rest {
            duration: Duration::from_secs(1),
            round: 1,
            set: 1,
            next_set: 2,
        },
    ]);
    let mut t = timer(0, None);
    t.start(seq).unwrap();
    let cues = t.tick(Duration::from_secs(60));
    assert_eq!(count(&cues, "phase_complete"), 1);
    assert_eq!(t.time_remaining(), Duration::ZERO);
    assert_eq!(t.elapsed(), Duration::from_secs(1));
}

#[test]
fn start_errors_leave_state_untouched() {
    let mut t = timer(500, None);
    assert_eq!(t.start(Sequence::default()), Err(EngineError::EmptySequence));
    assert_eq!(t.status(), RunStatus::Ready);

    t.start(build_interval(&IntervalConfig::default())).unwrap();
    let err = t.start(build_interval(&IntervalConfig::default())).unwrap_err();
    assert_eq!(
        err,
        EngineError::NotReady {
            status: RunStatus::Running
        }
    );
    assert_eq!(t.status(), RunStatus::Running);
}

#[test]
fn restart_after_completion_replays() {
    let seq = Sequence::new(vec![Phase::Work {
        duration: Duration::from_millis(100),
        round: 1,
        set: 1,
    }]);
    let mut t = timer(0, None);
    run_to_end(&mut t, seq);
    assert_eq!(t.status(), RunStatus::Completed);

    let cues = t.restart().unwrap();
    assert_eq!(cues.first().map(Cue::name), Some("started"));
    assert_eq!(t.status(), RunStatus::Running);
    assert_eq!(t.elapsed(), Duration::ZERO);
}
