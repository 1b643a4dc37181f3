//! `plan` command handler.
//!
//! Builds the sequence a run would play and prints it without starting any
//! engine.

use crate::cli::args::{BreathingSource, OutputFormat, PlanArgs};
use crate::cli::commands::source;
use crate::config::schema::WorkoutConfig;
use crate::error::CadenceError;
use crate::presentation::{PhaseView, format_clock, render_plan};
use crate::sequence::{Sequence, build_breathing, build_sequence};

/// Print the phase plan.
///
/// # Errors
///
/// Returns a config or usage error if the workout cannot be resolved.
pub fn run(args: &PlanArgs) -> Result<(), CadenceError> {
    let (config, limits) = source::load_config(args.source.config.as_deref())?;

    let sequence = if args.breathing {
        let breathing_source = BreathingSource {
            config: args.source.config.clone(),
            preset: args.source.preset.clone(),
            ..BreathingSource::default()
        };
        build_breathing(&source::resolve_breathing(&breathing_source, &config)?)
    } else {
        let workout = source::resolve_workout(&args.source, &config, &limits)?;
        if workout == WorkoutConfig::Stopwatch {
            return Err(CadenceError::Usage(
                "a stopwatch has no phase plan".to_string(),
            ));
        }
        build_sequence(&workout)
    };

    print!("{}", render(&sequence, args.format)?);
    Ok(())
}

/// Renders a plan in the requested format.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn render(sequence: &Sequence, format: OutputFormat) -> Result<String, CadenceError> {
    match format {
        OutputFormat::Human => Ok(render_plan(sequence)),
        OutputFormat::Json => {
            let phases: Vec<PhaseView> = sequence
                .iter()
                .enumerate()
                .map(|(index, phase)| PhaseView::new(index, phase))
                .collect();
            let doc = serde_json::json!({
                "phases": phases,
                "count": sequence.len(),
                "total": sequence.total().as_secs_f64(),
                "total_display": format_clock(sequence.total()),
            });
            Ok(format!("{}\n", serde_json::to_string_pretty(&doc)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::HeadToHeadConfig;

    #[test]
    fn test_json_plan_for_head_to_head() {
        let seq = build_sequence(&WorkoutConfig::HeadToHead(HeadToHeadConfig {
            setup: 5,
            work: 20,
            people: 3,
            rounds: 2,
        }));
        let out = render(&seq, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["count"], 7);
        assert_eq!(json["total"], 125.0);
        assert_eq!(json["phases"][0]["kind"], "setup");
        assert_eq!(json["phases"][4]["person"], 1);
        assert_eq!(json["phases"][4]["round"], 2);
    }
}
