//! Sequence construction
//!
//! Pure functions turning a validated configuration into a [`Sequence`].
//! Optional phases whose configured duration is 0 are left out entirely;
//! the builder never emits a zero-length phase.

use std::time::Duration;

use crate::config::schema::{BreathingConfig, HeadToHeadConfig, IntervalConfig, WorkoutConfig};

use super::{BreathStep, Phase, Sequence};

/// Builds the sequence for any workout mode.
///
/// The stopwatch mode has no phases and yields an empty sequence.
#[must_use]
pub fn build_sequence(config: &WorkoutConfig) -> Sequence {
    match config {
        WorkoutConfig::Interval(c) => build_interval(c),
        WorkoutConfig::HeadToHead(c) => build_head_to_head(c),
        WorkoutConfig::Stopwatch => Sequence::default(),
    }
}

/// Builds a fixed-interval sequence.
///
/// `[setup] [warmup] (work [rest])* [long rest]` per round, where the rest
/// only sits between sets and the long rest only between rounds.
#[must_use]
pub fn build_interval(config: &IntervalConfig) -> Sequence {
    let mut phases = Vec::with_capacity(interval_capacity(config));

    if let Some(duration) = enabled(config.setup) {
        phases.push(Phase::Setup { duration });
    }
    if let Some(duration) = enabled(config.warmup) {
        phases.push(Phase::Warmup { duration });
    }

    let work = seconds(config.work);
    for round in 1..=config.rounds {
        for set in 1..=config.sets {
            phases.push(Phase::Work {
                duration: work,
                round,
                set,
            });
            if set < config.sets {
                if let Some(duration) = enabled(config.rest) {
                    phases.push(Phase::Rest {
                        duration,
                        round,
                        set,
                        next_set: set + 1,
                    });
                }
            }
        }
        if round < config.rounds {
            if let Some(duration) = enabled(config.long_rest) {
                phases.push(Phase::LongRest { duration, round });
            }
        }
    }

    Sequence::new(phases)
}

/// Builds a head-to-head rotation: every person works once per round, with
/// no rest between turns or rounds.
#[must_use]
pub fn build_head_to_head(config: &HeadToHeadConfig) -> Sequence {
    let turns = config.rounds as usize * config.people as usize;
    let mut phases = Vec::with_capacity(turns + 1);

    if let Some(duration) = enabled(config.setup) {
        phases.push(Phase::Setup { duration });
    }

    let work = seconds(config.work);
    for round in 1..=config.rounds {
        for person in 1..=config.people {
            phases.push(Phase::Turn {
                duration: work,
                round,
                person,
            });
        }
    }

    Sequence::new(phases)
}

/// Builds one breathing cycle: in, inhaled hold, out, exhaled hold.
///
/// Callers must reject configurations where both breath-in and breath-out
/// are 0 before building.
#[must_use]
pub fn build_breathing(config: &BreathingConfig) -> Sequence {
    [
        (config.breath_in, BreathStep::In),
        (config.inhaled_hold, BreathStep::InhaledHold),
        (config.breath_out, BreathStep::Out),
        (config.exhaled_hold, BreathStep::ExhaledHold),
    ]
    .into_iter()
    .filter_map(|(secs, step)| enabled(secs).map(|duration| Phase::Breath { duration, step }))
    .collect()
}

/// Number of phases an interval config produces, without building it.
#[must_use]
pub fn interval_phase_count(config: &IntervalConfig) -> u64 {
    let rounds = u64::from(config.rounds);
    let sets = u64::from(config.sets);
    let lead = u64::from(config.setup > 0) + u64::from(config.warmup > 0);
    let work = rounds.saturating_mul(sets);
    let rests = if config.rest > 0 {
        rounds.saturating_mul(sets.saturating_sub(1))
    } else {
        0
    };
    let long_rests = if config.long_rest > 0 {
        rounds.saturating_sub(1)
    } else {
        0
    };
    lead.saturating_add(work)
        .saturating_add(rests)
        .saturating_add(long_rests)
}

/// Number of phases a head-to-head config produces, without building it.
#[must_use]
pub fn head_to_head_phase_count(config: &HeadToHeadConfig) -> u64 {
    u64::from(config.setup > 0)
        .saturating_add(u64::from(config.rounds).saturating_mul(u64::from(config.people)))
}

fn interval_capacity(config: &IntervalConfig) -> usize {
    usize::try_from(interval_phase_count(config)).unwrap_or(0)
}

const fn seconds(secs: u32) -> Duration {
    Duration::from_secs(secs as u64)
}

const fn enabled(secs: u32) -> Option<Duration> {
    if secs > 0 { Some(seconds(secs)) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::PhaseKind;
    use proptest::prelude::*;

    fn interval(
        setup: u32,
        warmup: u32,
        work: u32,
        rest: u32,
        long_rest: u32,
        sets: u32,
        rounds: u32,
    ) -> IntervalConfig {
        IntervalConfig {
            setup,
            warmup,
            work,
            rest,
            long_rest,
            sets,
            rounds,
        }
    }

    #[test]
    fn test_interval_total_example() {
        let seq = build_interval(&interval(10, 0, 30, 10, 60, 3, 2));
        assert_eq!(seq.total(), Duration::from_secs(290));
        assert_eq!(seq.len(), 1 + 5 + 1 + 5);
        assert_eq!(seq.count(PhaseKind::Warmup), 0);
    }

    #[test]
    fn test_interval_ordering() {
        let seq = build_interval(&interval(10, 5, 30, 10, 60, 2, 2));
        let kinds: Vec<_> = seq.iter().map(Phase::kind).collect();
        assert_eq!(
            kinds,
            [
                PhaseKind::Setup,
                PhaseKind::Warmup,
                PhaseKind::Work,
                PhaseKind::Rest,
                PhaseKind::Work,
                PhaseKind::LongRest,
                PhaseKind::Work,
                PhaseKind::Rest,
                PhaseKind::Work,
            ]
        );
    }

    #[test]
    fn test_rest_announces_next_set() {
        let seq = build_interval(&interval(0, 0, 30, 10, 0, 3, 1));
        let rests: Vec<_> = seq
            .iter()
            .filter_map(|p| match *p {
                Phase::Rest { set, next_set, .. } => Some((set, next_set)),
                _ => None,
            })
            .collect();
        assert_eq!(rests, [(1, 2), (2, 3)]);
    }

    #[test]
    fn test_zero_rest_omitted() {
        let seq = build_interval(&interval(0, 0, 20, 0, 0, 4, 3));
        assert_eq!(seq.len(), 12);
        assert!(seq.iter().all(|p| p.kind() == PhaseKind::Work));
        assert!(seq.iter().all(|p| p.duration() > Duration::ZERO));
    }

    #[test]
    fn test_single_round_has_no_long_rest() {
        let seq = build_interval(&interval(0, 0, 20, 10, 60, 2, 1));
        assert_eq!(seq.count(PhaseKind::LongRest), 0);
    }

    #[test]
    fn test_head_to_head_example() {
        let seq = build_head_to_head(&HeadToHeadConfig {
            setup: 5,
            work: 20,
            people: 3,
            rounds: 2,
        });
        assert_eq!(seq.len(), 7);
        assert_eq!(seq.total(), Duration::from_secs(125));
        let turns: Vec<_> = seq
            .iter()
            .skip(1)
            .map(|p| (p.round(), p.person().unwrap()))
            .collect();
        assert_eq!(turns, [(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]);
        assert_eq!(seq.count(PhaseKind::Rest), 0);
    }

    #[test]
    fn test_breathing_skips_zero_holds() {
        let seq = build_breathing(&BreathingConfig {
            breath_in: 4,
            inhaled_hold: 0,
            breath_out: 4,
            exhaled_hold: 0,
        });
        let kinds: Vec<_> = seq.iter().map(Phase::kind).collect();
        assert_eq!(kinds, [PhaseKind::BreathIn, PhaseKind::BreathOut]);
        assert_eq!(seq.total(), Duration::from_secs(8));
    }

    #[test]
    fn test_breathing_full_cycle_order() {
        let seq = build_breathing(&BreathingConfig::default());
        let kinds: Vec<_> = seq.iter().map(Phase::kind).collect();
        assert_eq!(
            kinds,
            [
                PhaseKind::BreathIn,
                PhaseKind::InhaledHold,
                PhaseKind::BreathOut,
                PhaseKind::ExhaledHold,
            ]
        );
    }

    #[test]
    fn test_stopwatch_is_empty() {
        assert!(build_sequence(&WorkoutConfig::Stopwatch).is_empty());
    }

    proptest! {
        #[test]
        fn prop_interval_counts(
            setup in 0u32..30,
            warmup in 0u32..30,
            work in 1u32..120,
            rest in 0u32..30,
            long_rest in 0u32..120,
            sets in 1u32..12,
            rounds in 1u32..8,
        ) {
            let cfg = interval(setup, warmup, work, rest, long_rest, sets, rounds);
            let seq = build_interval(&cfg);
            let (r, s) = (rounds as usize, sets as usize);

            prop_assert_eq!(seq.count(PhaseKind::Work), r * s);
            let expected_rest = if rest > 0 { r * (s - 1) } else { 0 };
            prop_assert_eq!(seq.count(PhaseKind::Rest), expected_rest);
            let expected_long = if long_rest > 0 { r - 1 } else { 0 };
            prop_assert_eq!(seq.count(PhaseKind::LongRest), expected_long);
            prop_assert!(seq.count(PhaseKind::Setup) <= 1);
            prop_assert!(seq.count(PhaseKind::Warmup) <= 1);
            prop_assert_eq!(seq.len() as u64, interval_phase_count(&cfg));

            let sum: Duration = seq.iter().map(Phase::duration).sum();
            prop_assert_eq!(seq.total(), sum);
            prop_assert!(seq.iter().all(|p| p.duration() > Duration::ZERO));
        }

        #[test]
        fn prop_head_to_head_rotation(
            setup in 0u32..30,
            work in 1u32..120,
            people in 1u32..10,
            rounds in 1u32..10,
        ) {
            let cfg = HeadToHeadConfig { setup, work, people, rounds };
            let seq = build_head_to_head(&cfg);
            prop_assert_eq!(seq.len() as u64, head_to_head_phase_count(&cfg));

            let turns: Vec<_> = seq.iter().filter_map(Phase::person).collect();
            prop_assert_eq!(turns.len(), (people * rounds) as usize);
            for (i, person) in turns.iter().enumerate() {
                prop_assert_eq!(*person, (i as u32 % people) + 1);
            }
            prop_assert_eq!(
                seq.total(),
                Duration::from_secs(u64::from(setup) + u64::from(work) * u64::from(people * rounds))
            );
        }
    }
}
