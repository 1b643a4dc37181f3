//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod breathe;
pub mod completions;
pub mod controls;
pub mod plan;
pub mod presets;
pub mod run;
pub mod session;
pub mod source;
pub mod stopwatch;
pub mod validate;
pub mod version;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::error::CadenceError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// `cancel` fires on the first SIGINT or SIGTERM; running commands stop
/// their driver and return normally.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), CadenceError> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Run(args) => run::run(&args, quiet, cancel).await,
        Commands::Breathe(args) => breathe::run(&args, quiet, cancel).await,
        Commands::Stopwatch(args) => stopwatch::run(&args, quiet, cancel).await,
        Commands::Plan(args) => plan::run(&args),
        Commands::Validate(args) => validate::run(&args),
        Commands::Presets(args) => presets::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
