//! `run` command handler.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::args::RunArgs;
use crate::cli::commands::controls::KeyMap;
use crate::cli::commands::session::Session;
use crate::cli::commands::{source, stopwatch};
use crate::config::schema::WorkoutConfig;
use crate::engine::{EngineOptions, WorkoutTimer};
use crate::error::CadenceError;
use crate::presentation::format_clock;
use crate::sequence::build_sequence;

/// Run a workout.
///
/// # Errors
///
/// Returns a config or usage error before the run starts, or an I/O error
/// if an output cannot be opened.
pub async fn run(args: &RunArgs, quiet: bool, cancel: CancellationToken) -> Result<(), CadenceError> {
    let (config, limits) = source::load_config(args.source.config.as_deref())?;
    let workout = source::resolve_workout(&args.source, &config, &limits)?;
    let settings = source::resolve_settings(&config.settings, &args.output)?;

    if workout == WorkoutConfig::Stopwatch {
        return stopwatch::drive(&settings, &args.output, None, quiet, cancel).await;
    }

    let mode = workout.mode().as_str();
    let sequence = build_sequence(&workout);
    info!(
        mode,
        phases = sequence.len(),
        total = %format_clock(sequence.total()),
        "starting workout"
    );

    let session = Session::open(mode, &args.output, &settings, KeyMap::Timer, quiet)?;
    let mut timer = WorkoutTimer::new(EngineOptions::from(&settings));
    let started = timer.start(sequence)?;

    let end = session.drive(&mut timer, &started, cancel, |_| false).await;
    if !quiet {
        eprintln!("{end} after {}", format_clock(timer.elapsed()));
    }
    Ok(())
}
