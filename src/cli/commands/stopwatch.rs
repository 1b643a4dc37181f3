//! `stopwatch` command handler.

use std::fmt::Write as _;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{OutputArgs, StopwatchArgs};
use crate::cli::commands::controls::KeyMap;
use crate::cli::commands::session::Session;
use crate::cli::commands::source;
use crate::config::schema::{Mode, Settings};
use crate::cue::Cue;
use crate::engine::Stopwatch;
use crate::error::CadenceError;
use crate::presentation::format_clock;

/// Run the stopwatch.
///
/// # Errors
///
/// Returns a config error for invalid settings or an I/O error if an
/// output cannot be opened.
pub async fn run(
    args: &StopwatchArgs,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<(), CadenceError> {
    let settings = source::resolve_settings(&Settings::default(), &args.output)?;
    drive(&settings, &args.output, args.duration, quiet, cancel).await
}

/// Drives a stopwatch until quit, `limit`, or cancellation, then prints the
/// lap table to stdout.
///
/// # Errors
///
/// Returns an I/O error if an output cannot be opened.
pub async fn drive(
    settings: &Settings,
    output: &OutputArgs,
    limit: Option<Duration>,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<(), CadenceError> {
    let session = Session::open(
        Mode::Stopwatch.as_str(),
        output,
        settings,
        KeyMap::Stopwatch,
        quiet,
    )?;
    let mut watch = Stopwatch::new();
    watch.start();
    let started = [Cue::Started {
        phases: 0,
        total: Duration::ZERO,
    }];

    let end = session
        .drive(&mut watch, &started, cancel, |w| {
            limit.is_some_and(|limit| w.elapsed() >= limit)
        })
        .await;

    if !quiet {
        eprintln!("{end} at {}", format_clock(watch.elapsed()));
    }
    if !watch.laps().is_empty() {
        print!("{}", render_laps(&watch));
    }
    Ok(())
}

/// Renders recorded laps with the fastest and slowest marked.
#[must_use]
pub fn render_laps(watch: &Stopwatch) -> String {
    let fastest = watch.fastest_lap().map(|l| l.lap_number);
    let slowest = watch.slowest_lap().map(|l| l.lap_number);
    let mut out = String::new();
    for lap in watch.laps() {
        let mark = if watch.laps().len() < 2 {
            ""
        } else if Some(lap.lap_number) == fastest {
            "  fastest"
        } else if Some(lap.lap_number) == slowest {
            "  slowest"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "lap {:>3}  {}  {}{mark}",
            lap.lap_number,
            format_clock(lap.lap_duration),
            format_clock(lap.cumulative)
        );
    }
    out
}
