//! `cadence` - interval, stopwatch and breathing timer

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use clap::Parser;
use tokio_util::sync::CancellationToken;

use cadence::cli::args::Cli;
use cadence::cli::commands;
use cadence::error::ExitCode;
use cadence::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let cancel = CancellationToken::new();
    let signal_code = Arc::new(AtomicI32::new(ExitCode::SUCCESS));

    // First signal stops the run gracefully, the second exits immediately.
    {
        let cancel = cancel.clone();
        let signal_code = Arc::clone(&signal_code);
        tokio::spawn(async move {
            let code = wait_for_signal().await;
            signal_code.store(code, Ordering::SeqCst);
            cancel.cancel();

            eprintln!("\nStopping... (press Ctrl+C again to force)");
            std::process::exit(wait_for_signal().await);
        });
    }

    let result = commands::dispatch(cli, cancel).await;

    match result {
        Ok(()) => std::process::exit(signal_code.load(Ordering::SeqCst)),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Waits for SIGINT or SIGTERM and returns the matching exit code.
#[cfg(unix)]
async fn wait_for_signal() -> i32 {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return ExitCode::INTERRUPTED;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => ExitCode::INTERRUPTED,
        _ = sigterm.recv() => ExitCode::TERMINATED,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> i32 {
    let _ = tokio::signal::ctrl_c().await;
    ExitCode::INTERRUPTED
}
