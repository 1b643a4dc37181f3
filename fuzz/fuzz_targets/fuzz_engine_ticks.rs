#![no_main]

use std::time::Duration;

use cadence::config::schema::IntervalConfig;
use cadence::engine::{EngineOptions, RunStatus, WorkoutTimer};
use cadence::sequence::build_interval;
use libfuzzer_sys::fuzz_target;

// Byte 0..4 shape the workout, the rest is a script of ticks and controls.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let config = IntervalConfig {
        setup: u32::from(data[0] % 4),
        warmup: 0,
        work: u32::from(data[1] % 5) + 1,
        rest: u32::from(data[2] % 3),
        long_rest: u32::from(data[3] % 4),
        sets: u32::from(data[1] % 3) + 1,
        rounds: u32::from(data[2] % 3) + 1,
    };
    let sequence = build_interval(&config);
    let total = sequence.total();

    let mut timer = WorkoutTimer::new(EngineOptions {
        settle_delay: Duration::from_millis(u64::from(data[3]) * 4),
        countdown_from: Some(3),
    });
    if timer.start(sequence).is_err() {
        return;
    }

    for &op in &data[4..] {
        match op % 8 {
            0 => {
                timer.toggle_pause();
            }
            1 => {
                let _ = timer.restart();
            }
            2 => timer.reset(),
            _ => {
                let _ = timer.tick(Duration::from_millis(u64::from(op) * 20));
            }
        }
        assert!(timer.elapsed() <= total);
        assert!(timer.time_remaining() <= timer.total());
        if timer.status() == RunStatus::Completed {
            assert_eq!(timer.elapsed(), total);
        }
    }
});
