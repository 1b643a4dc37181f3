//! Built-in presets
//!
//! Common workouts and breathing patterns embedded in the binary, so
//! `cadence run --preset tabata` works without a configuration file.
//! Presets defined in a configuration file take precedence over these.

use std::fmt;

use crate::config::loader::ConfigLoader;
use crate::config::schema::CadenceConfig;
use crate::error::ConfigError;

// ============================================================================
// Types
// ============================================================================

/// A preset embedded in the binary.
#[derive(Debug)]
pub struct BuiltinPreset {
    /// Unique identifier (kebab-case).
    pub name: &'static str,

    /// Short human-readable description.
    pub description: &'static str,

    /// Which command the preset feeds.
    pub kind: PresetKind,

    /// Raw YAML document (embedded at compile time).
    pub yaml: &'static str,
}

impl BuiltinPreset {
    /// Loads and validates the embedded document.
    ///
    /// # Errors
    ///
    /// Returns the loader's error; only possible if the embedded YAML is
    /// broken.
    pub fn config(&self) -> Result<CadenceConfig, ConfigError> {
        ConfigLoader::with_defaults()
            .load_from_str(self.yaml)
            .map(|loaded| loaded.config)
    }
}

/// Whether a preset is a workout or a breathing exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetKind {
    /// Interval, head-to-head or stopwatch workout.
    Workout,
    /// Breathing cycle.
    Breathing,
}

impl PresetKind {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workout => "workout",
            Self::Breathing => "breathing",
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Registry
// ============================================================================

static BUILTIN_PRESETS: &[BuiltinPreset] = &[
    BuiltinPreset {
        name: "tabata",
        description: "8 x 20 s work / 10 s rest",
        kind: PresetKind::Workout,
        yaml: include_str!("../presets/tabata.yaml"),
    },
    BuiltinPreset {
        name: "hiit",
        description: "3 rounds of 4 x 40/20 with warm-up and long rest",
        kind: PresetKind::Workout,
        yaml: include_str!("../presets/hiit.yaml"),
    },
    BuiltinPreset {
        name: "emom",
        description: "Every minute on the minute for 10 minutes",
        kind: PresetKind::Workout,
        yaml: include_str!("../presets/emom.yaml"),
    },
    BuiltinPreset {
        name: "relay",
        description: "Two people alternating 30 s turns, 5 rounds",
        kind: PresetKind::Workout,
        yaml: include_str!("../presets/relay.yaml"),
    },
    BuiltinPreset {
        name: "box",
        description: "Box breathing, 4-4-4-4",
        kind: PresetKind::Breathing,
        yaml: include_str!("../presets/box.yaml"),
    },
    BuiltinPreset {
        name: "relax",
        description: "4-7-8 relaxing breath",
        kind: PresetKind::Breathing,
        yaml: include_str!("../presets/relax.yaml"),
    },
    BuiltinPreset {
        name: "coherent",
        description: "5 s in, 5 s out",
        kind: PresetKind::Breathing,
        yaml: include_str!("../presets/coherent.yaml"),
    },
];

// ============================================================================
// Public API
// ============================================================================

/// Look up a preset by exact name.
#[must_use]
pub fn find_preset(name: &str) -> Option<&'static BuiltinPreset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

/// List presets in registry order, optionally filtered by kind.
#[must_use]
pub fn list_presets(kind: Option<PresetKind>) -> Vec<&'static BuiltinPreset> {
    BUILTIN_PRESETS
        .iter()
        .filter(|p| kind.is_none_or(|k| p.kind == k))
        .collect()
}

/// Returns the candidate closest to `input`, if within a
/// Damerau-Levenshtein distance of 3.
#[must_use]
pub fn closest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|name| (name, strsim::damerau_levenshtein(input, name)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.to_string())
}

// ============================================================================
// Tests
// ============================================================================
