//! Resolution of command-line sources into validated configuration.
//!
//! A run starts from the configuration file (if any), picks a preset or the
//! file's default section, then applies flag overrides on top. The result is
//! validated exactly like a file would be.

use std::path::Path;

use tracing::{info, warn};

use crate::cli::args::{BreathingSource, OutputArgs, WorkoutSource};
use crate::config::loader::{ConfigLimits, ConfigLoader, LoadWarning};
use crate::config::schema::{
    BreathingConfig, CadenceConfig, HeadToHeadConfig, IntervalConfig, Mode, Settings,
    WorkoutConfig,
};
use crate::config::validation::{ValidationResult, Validator};
use crate::error::{CadenceError, ConfigError};

/// Path reported in validation errors for flag-built configuration.
const FLAGS_PATH: &str = "flags";

/// Loads the configuration file, or returns defaults when there is none.
///
/// # Errors
///
/// Returns the loader's error.
pub fn load_config(path: Option<&Path>) -> Result<(CadenceConfig, ConfigLimits), CadenceError> {
    let loader = ConfigLoader::with_defaults();
    let limits = loader.limits().clone();
    let Some(path) = path else {
        return Ok((CadenceConfig::default(), limits));
    };

    info!(config = %path.display(), "loading configuration");
    let loaded = loader.load(path)?;
    log_warnings(&loaded.warnings);
    Ok((loaded.config, limits))
}

/// Logs loader warnings at `warn` level.
pub fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}

/// Picks the workout and applies flag overrides.
///
/// Without a preset, a file `workout` section or any flag, the default
/// interval workout is used.
///
/// # Errors
///
/// Returns a config error for an unknown preset or invalid values, and a
/// usage error for flags that do not apply to the selected mode.
pub fn resolve_workout(
    source: &WorkoutSource,
    config: &CadenceConfig,
    limits: &ConfigLimits,
) -> Result<WorkoutConfig, CadenceError> {
    let base = match (&source.preset, &config.workout) {
        (Some(name), _) => config.workout_for(Some(name))?,
        (None, Some(workout)) => workout.clone(),
        (None, None) => {
            if !source.has_overrides() {
                info!("no workout selected, using the default interval workout");
            }
            WorkoutConfig::Interval(IntervalConfig::default())
        }
    };

    let workout = apply_workout_flags(base, source)?;
    check(Validator::new().check_workout(&workout, FLAGS_PATH, limits))?;
    Ok(workout)
}

/// Overlays workout flags on `base`.
///
/// Switching `--mode` starts from that mode's defaults.
///
/// # Errors
///
/// Returns [`CadenceError::Usage`] for a flag the mode does not use.
pub fn apply_workout_flags(
    base: WorkoutConfig,
    source: &WorkoutSource,
) -> Result<WorkoutConfig, CadenceError> {
    let base = match source.mode.map(Mode::from) {
        Some(mode) if mode != base.mode() => default_for(mode),
        _ => base,
    };

    match base {
        WorkoutConfig::Interval(mut c) => {
            reject(source.people.is_some(), "--people", Mode::Interval)?;
            override_with(&mut c.setup, source.setup);
            override_with(&mut c.warmup, source.warmup);
            override_with(&mut c.work, source.work);
            override_with(&mut c.rest, source.rest);
            override_with(&mut c.long_rest, source.long_rest);
            override_with(&mut c.sets, source.sets);
            override_with(&mut c.rounds, source.rounds);
            Ok(WorkoutConfig::Interval(c))
        }
        WorkoutConfig::HeadToHead(mut c) => {
            reject(source.warmup.is_some(), "--warmup", Mode::HeadToHead)?;
            reject(source.rest.is_some(), "--rest", Mode::HeadToHead)?;
            reject(source.long_rest.is_some(), "--long-rest", Mode::HeadToHead)?;
            reject(source.sets.is_some(), "--sets", Mode::HeadToHead)?;
            override_with(&mut c.setup, source.setup);
            override_with(&mut c.work, source.work);
            override_with(&mut c.people, source.people);
            override_with(&mut c.rounds, source.rounds);
            Ok(WorkoutConfig::HeadToHead(c))
        }
        WorkoutConfig::Stopwatch => {
            let extra = source.setup.is_some()
                || source.warmup.is_some()
                || source.work.is_some()
                || source.rest.is_some()
                || source.long_rest.is_some()
                || source.sets.is_some()
                || source.rounds.is_some()
                || source.people.is_some();
            reject(extra, "duration and count flags", Mode::Stopwatch)?;
            Ok(WorkoutConfig::Stopwatch)
        }
    }
}

/// Picks the breathing exercise and applies flag overrides.
///
/// Falls back to box breathing when nothing is selected.
///
/// # Errors
///
/// Returns a config error for an unknown preset or invalid durations.
pub fn resolve_breathing(
    source: &BreathingSource,
    config: &CadenceConfig,
) -> Result<BreathingConfig, CadenceError> {
    let mut breathing = match (&source.preset, &config.breathing) {
        (Some(name), _) => config.breathing_for(Some(name))?,
        (None, Some(breathing)) => breathing.clone(),
        (None, None) => BreathingConfig::default(),
    };

    override_with(&mut breathing.breath_in, source.breath_in);
    override_with(&mut breathing.inhaled_hold, source.inhaled_hold);
    override_with(&mut breathing.breath_out, source.breath_out);
    override_with(&mut breathing.exhaled_hold, source.exhaled_hold);

    check(Validator::new().check_breathing(&breathing, FLAGS_PATH))?;
    Ok(breathing)
}

/// Applies output flags to the file settings.
///
/// # Errors
///
/// Returns a config error when the resulting settings are invalid.
pub fn resolve_settings(settings: &Settings, output: &OutputArgs) -> Result<Settings, CadenceError> {
    let mut settings = settings.clone();
    override_with(&mut settings.tick_ms, output.tick_ms);
    override_with(&mut settings.settle_delay_ms, output.settle_delay_ms);
    if output.no_countdown {
        settings.countdown_cues = false;
    }
    if output.bell {
        settings.bell = true;
    }
    check(Validator::new().check_settings(&settings))?;
    Ok(settings)
}

fn default_for(mode: Mode) -> WorkoutConfig {
    match mode {
        Mode::Interval => WorkoutConfig::Interval(IntervalConfig::default()),
        Mode::HeadToHead => WorkoutConfig::HeadToHead(HeadToHeadConfig::default()),
        Mode::Stopwatch => WorkoutConfig::Stopwatch,
    }
}

fn override_with<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn reject(present: bool, flag: &str, mode: Mode) -> Result<(), CadenceError> {
    if present {
        Err(CadenceError::Usage(format!("{flag} does not apply to {mode} mode")))
    } else {
        Ok(())
    }
}

fn check(result: ValidationResult) -> Result<(), CadenceError> {
    for issue in &result.warnings {
        warn!(location = %issue.path, "{}", issue.message);
    }
    if result.has_errors() {
        return Err(ConfigError::ValidationError {
            path: FLAGS_PATH.to_string(),
            errors: result.errors,
        }
        .into());
    }
    Ok(())
}
