//! Tick-driven engines
//!
//! - [`WorkoutTimer`] plays an interval or head-to-head sequence once.
//! - [`BreathingEngine`] loops a breathing sequence forever.
//! - [`Stopwatch`] counts up and records laps.
//!
//! None of them owns a clock: the caller feeds elapsed time through `tick`
//! (see [`crate::driver::TickDriver`]), which keeps every engine
//! deterministic under test.

pub mod breathing;
pub mod schedule;
pub mod state;
pub mod stopwatch;
pub mod timer;

pub use breathing::BreathingEngine;
pub use schedule::{DeferredHandle, DeferredQueue};
pub use state::{EngineOptions, RunStatus};
pub use stopwatch::{LapRecord, Stopwatch};
pub use timer::WorkoutTimer;
