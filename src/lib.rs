//! `cadence` - phase-sequence interval timer engine
//!
//! Builds ordered phase sequences for interval, head-to-head and breathing
//! workouts and plays them through tick-driven state machines. The engines
//! are synchronous and clock-free; [`driver::TickDriver`] feeds them real
//! time on a Tokio task.

pub mod cli;
pub mod config;
pub mod cue;
pub mod driver;
pub mod engine;
pub mod error;
pub mod observability;
pub mod presentation;
pub mod presets;
pub mod sequence;
