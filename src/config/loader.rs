//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size limit and UTF-8 BOM handling
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing and empty-document check
//! 4. Deserialization to [`CadenceConfig`]
//! 5. Validation

use crate::config::schema::{BreathingConfig, CadenceConfig, WorkoutConfig};
use crate::config::validation::Validator;
use crate::error::ConfigError;
use crate::presets::{self, PresetKind};

use serde_yaml::Value;
use std::path::{Path, PathBuf};

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for configuration size.
    pub config_limits: ConfigLimits,
}

/// Limits that keep a configuration from exhausting resources.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum number of phases a single workout may build.
    pub max_phases: usize,

    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_phases: env_or("CADENCE_MAX_PHASES", 10_000),
            max_config_size: env_or("CADENCE_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: CadenceConfig,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Returns the limits this loader enforces.
    #[must_use]
    pub const fn limits(&self) -> &ConfigLimits {
        &self.options.config_limits
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing or deserialization fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let max = self.options.config_limits.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > max {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {max} bytes"),
            });
        }

        let raw_content = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_source(&raw_content, path)
    }

    /// Loads and validates configuration text that did not come from a file.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus file access.
    pub fn load_from_str(&self, yaml: &str) -> Result<LoadResult, ConfigError> {
        let max = self.options.config_limits.max_config_size;
        if yaml.len() > max {
            return Err(ConfigError::InvalidValue {
                field: "config_size".to_string(),
                value: format!("{} bytes", yaml.len()),
                expected: format!("at most {max} bytes"),
            });
        }
        self.load_source(yaml, Path::new("<inline>"))
    }

    fn load_source(&self, raw_content: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();

        // Handle UTF-8 BOM
        let raw_content = raw_content.strip_prefix('\u{feff}').unwrap_or(raw_content);

        // Environment variable substitution (before YAML parsing)
        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw_content, path)?;
        warnings.extend(env_sub.warnings);

        let root: Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            });
        }

        let config: CadenceConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("Failed to deserialize configuration: {e}"),
            })?;

        let result = Validator::new().validate(&config, &self.options.config_limits);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        Ok(LoadResult { config, warnings })
    }
}

// ============================================================================
// Selection
// ============================================================================

impl CadenceConfig {
    /// Picks the workout to run.
    ///
    /// With a preset name, presets defined in the file win over built-in
    /// ones. Without one, the top-level `workout` section is used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] (with the closest known name)
    /// or [`ConfigError::MissingSection`].
    pub fn workout_for(&self, preset: Option<&str>) -> Result<WorkoutConfig, ConfigError> {
        let Some(name) = preset else {
            return self
                .workout
                .clone()
                .ok_or(ConfigError::MissingSection { section: "workout" });
        };

        if let Some(workout) = self.presets.get(name) {
            return Ok(workout.clone());
        }
        match presets::find_preset(name) {
            Some(builtin) if builtin.kind == PresetKind::Workout => builtin
                .config()?
                .workout
                .ok_or(ConfigError::MissingSection { section: "workout" }),
            _ => Err(self.unknown_preset(name, PresetKind::Workout)),
        }
    }

    /// Picks the breathing exercise to run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] or
    /// [`ConfigError::MissingSection`].
    pub fn breathing_for(&self, preset: Option<&str>) -> Result<BreathingConfig, ConfigError> {
        let Some(name) = preset else {
            return self
                .breathing
                .clone()
                .ok_or(ConfigError::MissingSection {
                    section: "breathing",
                });
        };

        match presets::find_preset(name) {
            Some(builtin) if builtin.kind == PresetKind::Breathing => builtin
                .config()?
                .breathing
                .ok_or(ConfigError::MissingSection {
                    section: "breathing",
                }),
            _ => Err(self.unknown_preset(name, PresetKind::Breathing)),
        }
    }

    fn unknown_preset(&self, name: &str, kind: PresetKind) -> ConfigError {
        let file_names: Vec<&str> = match kind {
            PresetKind::Workout => self.presets.keys().map(String::as_str).collect(),
            PresetKind::Breathing => Vec::new(),
        };
        let builtin_names = presets::list_presets(Some(kind)).into_iter().map(|p| p.name);
        ConfigError::UnknownPreset {
            name: name.to_string(),
            suggestion: presets::closest(name, file_names.into_iter().chain(builtin_names)),
        }
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text before parsing so substituted numbers keep their
/// type.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = parse_var_spec(&mut chars, source_path)?;
                    match std::env::var(&spec.name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => match spec.fallback {
                            Fallback::Default(default) => result.push_str(&default),
                            Fallback::Required(message) => {
                                return Err(ConfigError::EnvVarNotSet {
                                    var: spec.name,
                                    message,
                                });
                            }
                            Fallback::Empty => self.warnings.push(LoadWarning {
                                message: format!(
                                    "Environment variable '{}' is not set, using empty string",
                                    spec.name
                                ),
                                location: Some(source_path.display().to_string()),
                            }),
                        },
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

struct VarSpec {
    name: String,
    fallback: Fallback,
}

/// Parses the inside of `${...}` up to and including the closing brace.
fn parse_var_spec(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    source_path: &Path,
) -> Result<VarSpec, ConfigError> {
    let mut name = String::new();

    while let Some(c) = chars.next() {
        match c {
            '}' => {
                return Ok(VarSpec {
                    name,
                    fallback: Fallback::Empty,
                });
            }
            ':' if chars.peek() == Some(&'-') => {
                chars.next();
                let default = read_until_close(chars, source_path)?;
                return Ok(VarSpec {
                    name,
                    fallback: Fallback::Default(default),
                });
            }
            ':' if chars.peek() == Some(&'?') => {
                chars.next();
                let message = read_until_close(chars, source_path)?;
                return Ok(VarSpec {
                    name,
                    fallback: Fallback::Required(message),
                });
            }
            _ => name.push(c),
        }
    }

    Err(unclosed(source_path, &name))
}

/// Reads content until the matching `}`, keeping nested braces.
fn read_until_close(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    source_path: &Path,
) -> Result<String, ConfigError> {
    let mut value = String::new();
    let mut depth = 1;

    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(value);
                }
            }
            _ => {}
        }
        value.push(c);
    }

    Err(unclosed(source_path, &value))
}

fn unclosed(source_path: &Path, fragment: &str) -> ConfigError {
    ConfigError::ParseError {
        path: PathBuf::from(source_path),
        line: None,
        message: format!("Unclosed environment variable reference: ${{{fragment}"),
    }
}

/// Parses an environment variable, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::IntervalConfig;

    #[test]
    fn test_env_substitution_simple() {
        // PATH is always set
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("path: ${PATH}", Path::new("test.yaml"))
            .unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "path: ".len());
    }

    #[test]
    fn test_env_substitution_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "work: ${CADENCE_TEST_NONEXISTENT_VAR_XYZ123:-45}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "work: 45");
    }

    #[test]
    fn test_env_substitution_required_missing() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute(
            "work: ${CADENCE_TEST_REQUIRED_XYZ123:?work seconds}",
            Path::new("test.yaml"),
        );
        match result {
            Err(ConfigError::EnvVarNotSet { var, message }) => {
                assert_eq!(var, "CADENCE_TEST_REQUIRED_XYZ123");
                assert_eq!(message, "work seconds");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn test_env_substitution_escaped_dollar() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("note: $$5", Path::new("test.yaml")).unwrap();
        assert_eq!(result, "note: $5");
    }

    #[test]
    fn test_env_substitution_missing_warning() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("note: ${CADENCE_TEST_WARN_XYZ123}", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "note: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(sub.warnings[0].message.contains("CADENCE_TEST_WARN_XYZ123"));
    }

    #[test]
    fn test_env_substitution_unclosed() {
        let mut sub = EnvSubstitution::new();
        assert!(matches!(
            sub.substitute("work: ${OOPS", Path::new("test.yaml")),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_from_str_valid() {
        let yaml = "\u{feff}workout:\n  mode: interval\n  work: 30\n  sets: 3\n  rounds: 2\n";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        let Some(WorkoutConfig::Interval(interval)) = result.config.workout else {
            panic!("expected interval workout");
        };
        assert_eq!(interval.work, 30);
        assert_eq!(interval.rest, 0);
    }

    #[test]
    fn test_load_from_str_empty() {
        let err = ConfigLoader::with_defaults().load_from_str("   \n").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_load_from_str_validation_error() {
        let yaml = "workout:\n  mode: interval\n  work: 0\n  sets: 3\n  rounds: 2\n";
        let err = ConfigLoader::with_defaults().load_from_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_load_size_limit() {
        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_phases: 100,
                max_config_size: 8,
            },
        });
        let err = loader.load_from_str("workout:\n  mode: stopwatch\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_workout_for_prefers_file_preset() {
        let mut cfg = CadenceConfig::default();
        let custom = WorkoutConfig::Interval(IntervalConfig {
            work: 99,
            ..IntervalConfig::default()
        });
        cfg.presets.insert("tabata".to_string(), custom.clone());
        assert_eq!(cfg.workout_for(Some("tabata")).unwrap(), custom);
    }

    #[test]
    fn test_workout_for_builtin_and_suggestion() {
        let cfg = CadenceConfig::default();
        assert!(matches!(
            cfg.workout_for(Some("tabata")),
            Ok(WorkoutConfig::Interval(_))
        ));

        match cfg.workout_for(Some("tabbata")) {
            Err(ConfigError::UnknownPreset { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("tabata"));
            }
            other => panic!("expected UnknownPreset, got {other:?}"),
        }
    }

    #[test]
    fn test_workout_for_missing_section() {
        let cfg = CadenceConfig::default();
        assert!(matches!(
            cfg.workout_for(None),
            Err(ConfigError::MissingSection { section: "workout" })
        ));
    }

    #[test]
    fn test_breathing_for_builtin() {
        let cfg = CadenceConfig::default();
        let breathing = cfg.breathing_for(Some("box")).unwrap();
        assert_eq!(breathing, BreathingConfig::default());
        assert!(cfg.breathing_for(Some("tabata")).is_err());
    }

    #[test]
    fn test_config_limits_default() {
        let limits = ConfigLimits::default();
        assert!(limits.max_phases > 0);
        assert!(limits.max_config_size > 0);
    }
}
