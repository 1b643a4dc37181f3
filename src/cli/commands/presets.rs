//! `presets` command handler.

use serde::Serialize;

use crate::cli::args::{OutputFormat, PresetsArgs};
use crate::cli::commands::source;
use crate::config::schema::WorkoutConfig;
use crate::error::CadenceError;
use crate::presentation::format_clock;
use crate::presets::{PresetKind, list_presets};
use crate::sequence::build_sequence;

/// One listed preset.
#[derive(Debug, Serialize)]
struct PresetEntry {
    name: String,
    kind: &'static str,
    source: &'static str,
    description: String,
}

/// List presets.
///
/// File presets come first and shadow built-in workouts of the same name.
///
/// # Errors
///
/// Returns a config error if `--config` cannot be loaded.
pub fn run(args: &PresetsArgs) -> Result<(), CadenceError> {
    let mut entries = Vec::new();

    if args.kind != Some(PresetKind::Breathing) {
        let (config, _) = source::load_config(args.config.as_deref())?;
        for (name, workout) in &config.presets {
            entries.push(PresetEntry {
                name: name.clone(),
                kind: PresetKind::Workout.as_str(),
                source: "file",
                description: describe(workout),
            });
        }
    }

    for preset in list_presets(args.kind) {
        let shadowed = preset.kind == PresetKind::Workout
            && entries.iter().any(|e| e.name == preset.name);
        if shadowed {
            continue;
        }
        entries.push(PresetEntry {
            name: preset.name.to_string(),
            kind: preset.kind.as_str(),
            source: "builtin",
            description: preset.description.to_string(),
        });
    }

    match args.format {
        OutputFormat::Human => {
            let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
            for e in &entries {
                println!(
                    "{:<width$}  {:<9}  {:<7}  {}",
                    e.name, e.kind, e.source, e.description
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

fn describe(workout: &WorkoutConfig) -> String {
    if *workout == WorkoutConfig::Stopwatch {
        return "stopwatch".to_string();
    }
    let seq = build_sequence(workout);
    format!(
        "{}, {} phases, {}",
        workout.mode(),
        seq.len(),
        format_clock(seq.total())
    )
}
