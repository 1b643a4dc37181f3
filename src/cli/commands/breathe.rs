//! `breathe` command handler.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::args::BreatheArgs;
use crate::cli::commands::controls::KeyMap;
use crate::cli::commands::session::Session;
use crate::cli::commands::source;
use crate::engine::{BreathingEngine, EngineOptions};
use crate::error::CadenceError;
use crate::presentation::format_clock;
use crate::sequence::build_breathing;

/// Run a breathing exercise until quit, `--cycles`, or a signal.
///
/// # Errors
///
/// Returns a config error before the run starts, or an I/O error if an
/// output cannot be opened.
pub async fn run(
    args: &BreatheArgs,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<(), CadenceError> {
    let (config, _) = source::load_config(args.source.config.as_deref())?;
    let breathing = source::resolve_breathing(&args.source, &config)?;
    let settings = source::resolve_settings(&config.settings, &args.output)?;

    let sequence = build_breathing(&breathing);
    info!(
        phases = sequence.len(),
        cycle = %format_clock(sequence.total()),
        cycles = ?args.cycles,
        "starting breathing exercise"
    );

    let session = Session::open("breathing", &args.output, &settings, KeyMap::Timer, quiet)?;
    let mut engine = BreathingEngine::new(EngineOptions::from(&settings));
    let started = engine.start(sequence)?;

    let limit = args.cycles;
    let end = session
        .drive(&mut engine, &started, cancel, |e| {
            limit.is_some_and(|n| e.cycles() >= n)
        })
        .await;

    if !quiet {
        eprintln!(
            "{end} after {} cycles ({})",
            engine.cycles(),
            format_clock(engine.elapsed())
        );
    }
    Ok(())
}
