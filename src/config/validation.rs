//! Configuration validation
//!
//! Runs on the deserialized [`CadenceConfig`] (or on a single workout built
//! from command-line flags) before any sequence is built. All issues are
//! collected rather than stopping at the first one.

use crate::config::loader::ConfigLimits;
use crate::config::schema::{
    BreathingConfig, CadenceConfig, HeadToHeadConfig, IntervalConfig, Settings, WorkoutConfig,
};
use crate::error::{Severity, ValidationIssue};
use crate::sequence::builder::{head_to_head_phase_count, interval_phase_count};

/// Largest accepted tick resolution in milliseconds.
const MAX_TICK_MS: u64 = 1000;
const MAX_COUNTDOWN_FROM: u32 = 60;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a whole configuration document.
    pub fn validate(&mut self, config: &CadenceConfig, limits: &ConfigLimits) -> ValidationResult {
        self.reset();

        if config.workout.is_none() && config.breathing.is_none() && config.presets.is_empty() {
            self.add_warning(
                "",
                "Configuration defines no workout, breathing exercise or preset",
            );
        }

        if let Some(workout) = &config.workout {
            self.validate_workout(workout, "workout", limits);
        }
        if let Some(breathing) = &config.breathing {
            self.validate_breathing(breathing, "breathing");
        }
        for (name, preset) in &config.presets {
            if name.trim().is_empty() {
                self.add_error("presets", "Preset names cannot be empty");
            }
            self.validate_workout(preset, &format!("presets.{name}"), limits);
        }
        self.validate_settings(&config.settings);

        self.finish()
    }

    /// Validates a single workout, e.g. one assembled from CLI flags.
    pub fn check_workout(
        &mut self,
        workout: &WorkoutConfig,
        path: &str,
        limits: &ConfigLimits,
    ) -> ValidationResult {
        self.reset();
        self.validate_workout(workout, path, limits);
        self.finish()
    }

    /// Validates a single breathing configuration.
    pub fn check_breathing(&mut self, breathing: &BreathingConfig, path: &str) -> ValidationResult {
        self.reset();
        self.validate_breathing(breathing, path);
        self.finish()
    }

    /// Validates engine settings after command-line overrides were applied.
    pub fn check_settings(&mut self, settings: &Settings) -> ValidationResult {
        self.reset();
        self.validate_settings(settings);
        self.finish()
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    fn validate_workout(&mut self, workout: &WorkoutConfig, path: &str, limits: &ConfigLimits) {
        match workout {
            WorkoutConfig::Interval(c) => self.validate_interval(c, path, limits),
            WorkoutConfig::HeadToHead(c) => self.validate_head_to_head(c, path, limits),
            WorkoutConfig::Stopwatch => {}
        }
    }

    fn validate_interval(&mut self, c: &IntervalConfig, path: &str, limits: &ConfigLimits) {
        self.require_positive(c.work, path, "work", "Work duration must be positive");
        self.require_positive(c.sets, path, "sets", "Sets per round must be at least 1");
        self.require_positive(c.rounds, path, "rounds", "Number of rounds must be at least 1");

        if c.sets == 1 && c.rest > 0 {
            self.add_warning(
                &format!("{path}.rest"),
                "Rest is never used with a single set per round",
            );
        }
        if c.rounds == 1 && c.long_rest > 0 {
            self.add_warning(
                &format!("{path}.long_rest"),
                "Long rest is never used with a single round",
            );
        }

        self.check_phase_limit(interval_phase_count(c), path, limits);
    }

    fn validate_head_to_head(&mut self, c: &HeadToHeadConfig, path: &str, limits: &ConfigLimits) {
        self.require_positive(c.work, path, "work", "Work duration must be positive");
        self.require_positive(c.people, path, "people", "Number of people must be at least 1");
        self.require_positive(c.rounds, path, "rounds", "Number of rounds must be at least 1");

        if c.people == 1 {
            self.add_warning(
                &format!("{path}.people"),
                "Head-to-head with one person is a plain work sequence",
            );
        }

        self.check_phase_limit(head_to_head_phase_count(c), path, limits);
    }

    fn check_phase_limit(&mut self, count: u64, path: &str, limits: &ConfigLimits) {
        if count > limits.max_phases as u64 {
            self.add_error(
                path,
                &format!(
                    "Too many phases: {count} (maximum: {}). \
                     Set CADENCE_MAX_PHASES to increase the limit.",
                    limits.max_phases
                ),
            );
        }
    }

    // ========================================================================
    // Breathing and settings
    // ========================================================================

    fn validate_breathing(&mut self, c: &BreathingConfig, path: &str) {
        if c.breath_in == 0 && c.breath_out == 0 {
            self.add_error(
                path,
                "At least one of breath_in or breath_out must be positive",
            );
        }
    }

    fn validate_settings(&mut self, settings: &Settings) {
        if settings.tick_ms == 0 || settings.tick_ms > MAX_TICK_MS {
            self.add_error(
                "settings.tick_ms",
                &format!("Tick resolution must be between 1 and {MAX_TICK_MS} ms"),
            );
        } else if settings.tick_ms > 100 {
            self.add_warning(
                "settings.tick_ms",
                "Tick resolution above 100 ms makes the display visibly jumpy",
            );
        }
        if settings.countdown_from > MAX_COUNTDOWN_FROM {
            self.add_error(
                "settings.countdown_from",
                &format!("Countdown must start at most {MAX_COUNTDOWN_FROM} seconds out"),
            );
        }
        if settings.settle_delay_ms > 10_000 {
            self.add_warning(
                "settings.settle_delay_ms",
                "Settle delay above 10 s adds a long gap between phases",
            );
        }
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    fn require_positive(&mut self, value: u32, path: &str, field: &str, message: &str) {
        if value == 0 {
            self.add_error(&format!("{path}.{field}"), message);
        }
    }

    fn reset(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }

    fn finish(&mut self) -> ValidationResult {
        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
