//! CLI argument definitions
//!
//! All Clap derive structs for `cadence` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::schema::Mode;
use crate::observability::LogFormat;
use crate::presets::PresetKind;

// ============================================================================
// Root CLI
// ============================================================================

/// Interval, stopwatch and breathing timer for the terminal.
#[derive(Parser, Debug)]
#[command(name = "cadence", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output, including the live status line.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CADENCE_COLOR")]
    pub color: ColorChoice,

    /// Diagnostic log format on stderr.
    #[arg(long, default_value = "human", global = true, env = "CADENCE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a workout (interval, head-to-head or stopwatch).
    Run(RunArgs),

    /// Run a breathing exercise.
    Breathe(BreatheArgs),

    /// Run a free stopwatch; press Enter to record a lap.
    Stopwatch(StopwatchArgs),

    /// Print the phase plan of a workout without running it.
    Plan(PlanArgs),

    /// Validate configuration files.
    Validate(ValidateArgs),

    /// List built-in and configured presets.
    Presets(PresetsArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Workout Sources
// ============================================================================

/// Where a workout comes from: a file, a preset, or flags.
///
/// Flags override whatever the file or preset provides.
#[derive(Args, Debug, Default, Clone)]
pub struct WorkoutSource {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Preset name (from the configuration file or built-in).
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Workout mode.
    #[arg(long)]
    pub mode: Option<ModeArg>,

    /// Get-ready time before the first phase.
    #[arg(long, value_parser = parse_seconds)]
    pub setup: Option<u32>,

    /// Warm-up time (interval mode).
    #[arg(long, value_parser = parse_seconds)]
    pub warmup: Option<u32>,

    /// Work time per set or turn.
    #[arg(long, value_parser = parse_seconds)]
    pub work: Option<u32>,

    /// Rest between sets (interval mode).
    #[arg(long, value_parser = parse_seconds)]
    pub rest: Option<u32>,

    /// Rest between rounds (interval mode).
    #[arg(long, value_parser = parse_seconds)]
    pub long_rest: Option<u32>,

    /// Sets per round (interval mode).
    #[arg(long)]
    pub sets: Option<u32>,

    /// Number of rounds.
    #[arg(long)]
    pub rounds: Option<u32>,

    /// Number of participants (head-to-head mode).
    #[arg(long)]
    pub people: Option<u32>,
}

impl WorkoutSource {
    /// Returns `true` if any workout-shaping flag was given.
    #[must_use]
    pub const fn has_overrides(&self) -> bool {
        self.mode.is_some()
            || self.setup.is_some()
            || self.warmup.is_some()
            || self.work.is_some()
            || self.rest.is_some()
            || self.long_rest.is_some()
            || self.sets.is_some()
            || self.rounds.is_some()
            || self.people.is_some()
    }
}

/// Where a breathing exercise comes from.
#[derive(Args, Debug, Default, Clone)]
pub struct BreathingSource {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Breathing preset name.
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Inhale time.
    #[arg(long = "in", value_parser = parse_seconds)]
    pub breath_in: Option<u32>,

    /// Hold time with full lungs.
    #[arg(long = "hold-in", value_parser = parse_seconds)]
    pub inhaled_hold: Option<u32>,

    /// Exhale time.
    #[arg(long = "out", value_parser = parse_seconds)]
    pub breath_out: Option<u32>,

    /// Hold time with empty lungs.
    #[arg(long = "hold-out", value_parser = parse_seconds)]
    pub exhaled_hold: Option<u32>,
}

impl BreathingSource {
    /// Returns `true` if any breathing duration flag was given.
    #[must_use]
    pub const fn has_overrides(&self) -> bool {
        self.breath_in.is_some()
            || self.inhaled_hold.is_some()
            || self.breath_out.is_some()
            || self.exhaled_hold.is_some()
    }
}

/// Cue outputs and engine tuning shared by the running commands.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Write the JSONL event stream to a file (`-` for stdout).
    #[arg(long, env = "CADENCE_EVENTS")]
    pub events: Option<PathBuf>,

    /// Serve Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, env = "CADENCE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Ring the terminal bell on phase changes.
    #[arg(long)]
    pub bell: bool,

    /// Disable the final-seconds countdown cues.
    #[arg(long)]
    pub no_countdown: bool,

    /// Pause between a phase ending and the next one starting, in ms.
    #[arg(long)]
    pub settle_delay_ms: Option<u64>,

    /// Tick resolution in ms.
    #[arg(long)]
    pub tick_ms: Option<u64>,
}

// ============================================================================
// Command Arguments
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workout selection.
    #[command(flatten)]
    pub source: WorkoutSource,

    /// Outputs and tuning.
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `breathe`.
#[derive(Args, Debug)]
pub struct BreatheArgs {
    /// Breathing selection.
    #[command(flatten)]
    pub source: BreathingSource,

    /// Stop after this many full cycles.
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Outputs and tuning.
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `stopwatch`.
#[derive(Args, Debug)]
pub struct StopwatchArgs {
    /// Stop automatically after this long (e.g. `90`, `5m`, `1h 30m`).
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Outputs and tuning.
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Workout selection.
    #[command(flatten)]
    pub source: WorkoutSource,

    /// Plan the breathing cycle instead of a workout.
    #[arg(long, conflicts_with_all = ["mode", "work", "sets", "people"])]
    pub breathing: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `presets`.
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Only list presets of this kind.
    #[arg(long)]
    pub kind: Option<PresetKind>,

    /// Also list presets defined in this configuration file.
    #[arg(short, long, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Workout mode selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Rounds of work/rest sets.
    Interval,
    /// Participants take turns.
    HeadToHead,
    /// Free stopwatch with laps.
    Stopwatch,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Interval => Self::Interval,
            ModeArg::HeadToHead => Self::HeadToHead,
            ModeArg::Stopwatch => Self::Stopwatch,
        }
    }
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Value Parsers
// ============================================================================

/// Parses a whole number of seconds from `45` or a humantime string such as
/// `1m 30s`.
///
/// # Errors
///
/// Returns a message when the input is neither, has a sub-second part, or
/// does not fit in `u32` seconds.
pub fn parse_seconds(input: &str) -> Result<u32, String> {
    let duration = parse_duration(input)?;
    if duration.subsec_nanos() != 0 {
        return Err(format!("'{input}' is not a whole number of seconds"));
    }
    u32::try_from(duration.as_secs()).map_err(|_| format!("'{input}' is too long"))
}

/// Parses a duration from plain seconds or a humantime string.
///
/// # Errors
///
/// Returns a message when the input cannot be parsed.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(trimmed).map_err(|e| format!("invalid duration '{input}': {e}"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_preset() {
        let cli = Cli::try_parse_from(["cadence", "run", "--preset", "tabata"]);
        assert!(cli.is_ok(), "Failed to parse: {cli:?}");
    }

    #[test]
    fn test_run_flags_accept_humantime() {
        let cli = Cli::try_parse_from([
            "cadence",
            "run",
            "--mode",
            "interval",
            "--work",
            "1m 30s",
            "--rest",
            "15",
            "--sets",
            "4",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("Expected RunArgs");
        };
        assert_eq!(args.source.mode, Some(ModeArg::Interval));
        assert_eq!(args.source.work, Some(90));
        assert_eq!(args.source.rest, Some(15));
        assert_eq!(args.source.sets, Some(4));
        assert!(args.source.has_overrides());
    }

    #[test]
    fn test_head_to_head_mode_parses() {
        let cli =
            Cli::try_parse_from(["cadence", "run", "--mode", "head-to-head", "--people", "3"])
                .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected RunArgs");
        };
        assert_eq!(Mode::from(args.source.mode.unwrap()), Mode::HeadToHead);
    }

    #[test]
    fn test_bad_duration_rejected() {
        let result = Cli::try_parse_from(["cadence", "run", "--work", "soon"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["cadence", "run", "--work", "1500ms"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_breathe_flags() {
        let cli = Cli::try_parse_from([
            "cadence", "breathe", "--in", "4", "--hold-in", "7", "--out", "8", "--cycles", "3",
        ])
        .unwrap();
        let Commands::Breathe(args) = cli.command else {
            panic!("Expected BreatheArgs");
        };
        assert_eq!(args.source.breath_in, Some(4));
        assert_eq!(args.source.inhaled_hold, Some(7));
        assert_eq!(args.source.exhaled_hold, None);
        assert_eq!(args.cycles, Some(3));
    }

    #[test]
    fn test_stopwatch_duration() {
        let cli = Cli::try_parse_from(["cadence", "stopwatch", "--duration", "2m"]).unwrap();
        let Commands::Stopwatch(args) = cli.command else {
            panic!("Expected StopwatchArgs");
        };
        assert_eq!(args.duration, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_output_args() {
        let cli = Cli::try_parse_from([
            "cadence",
            "run",
            "--events",
            "-",
            "--no-countdown",
            "--settle-delay-ms",
            "0",
            "--tick-ms",
            "50",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected RunArgs");
        };
        assert_eq!(args.output.events, Some(PathBuf::from("-")));
        assert!(args.output.no_countdown);
        assert_eq!(args.output.settle_delay_ms, Some(0));
        assert_eq!(args.output.tick_ms, Some(50));
    }

    #[test]
    fn test_validate_requires_files() {
        let result = Cli::try_parse_from(["cadence", "validate"]);
        assert!(result.is_err(), "Expected error for missing files");
    }

    #[test]
    fn test_plan_breathing_conflicts_with_work() {
        let result = Cli::try_parse_from(["cadence", "plan", "--breathing", "--work", "30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["cadence", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["cadence", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            let cli = Cli::try_parse_from(["cadence", "--color", variant, "version"]);
            assert!(cli.is_ok(), "Failed to parse color={variant}");
        }
    }

    #[test]
    fn test_completions_shells_parse() {
        for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
            let cli = Cli::try_parse_from(["cadence", "completions", shell]);
            assert!(cli.is_ok(), "Failed to parse shell={shell}");
        }
    }

    #[test]
    fn test_verbose_count_and_quiet() {
        let cli = Cli::try_parse_from(["cadence", "-vvv", "--quiet", "version"]).unwrap();
        assert_eq!(cli.verbose, 3);
        assert!(cli.quiet);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("45"), Ok(45));
        assert_eq!(parse_seconds("2m"), Ok(120));
        assert_eq!(parse_seconds(" 1m 5s "), Ok(65));
        assert!(parse_seconds("-3").is_err());
        assert!(parse_seconds("0.5s").is_err());
    }
}
