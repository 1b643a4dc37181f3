//! Prometheus metrics for runs.
//!
//! Label values are drawn from closed sets (phase kinds and run modes), so
//! cardinality stays bounded no matter what a configuration file contains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::cue::{Cue, CueSink};
use crate::error::CadenceError;
use crate::sequence::PhaseKind;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// Must be called from within a Tokio runtime when `port` is set.
///
/// # Errors
///
/// Returns `CadenceError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), CadenceError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| CadenceError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    if let Some(p) = port {
        tracing::info!(port = p, "metrics endpoint listening");
    }
    Ok(())
}

fn describe_metrics() {
    describe_counter!("cadence_runs_total", "Runs started, by mode");
    describe_counter!("cadence_runs_completed_total", "Runs that played every phase");
    describe_counter!(
        "cadence_phases_completed_total",
        "Phases that ran out, by phase kind"
    );
    describe_counter!("cadence_rounds_total", "Interval rounds started");
    describe_counter!("cadence_laps_total", "Stopwatch laps recorded");
    describe_histogram!("cadence_lap_seconds", "Stopwatch lap durations in seconds");
    describe_counter!("cadence_breath_cycles_total", "Breathing cycles completed");
    describe_gauge!("cadence_phase_index", "Index of the current phase");
    describe_gauge!("cadence_run_elapsed_seconds", "Counted time of the last run");
}

/// Records a started run.
pub fn record_run_started(mode: &'static str) {
    counter!("cadence_runs_total", "mode" => mode).increment(1);
}

/// Records a run that played every phase.
pub fn record_run_completed(mode: &'static str, elapsed: Duration) {
    counter!("cadence_runs_completed_total", "mode" => mode).increment(1);
    gauge!("cadence_run_elapsed_seconds", "mode" => mode).set(elapsed.as_secs_f64());
}

/// Records a phase running out.
pub fn record_phase_completed(kind: PhaseKind) {
    counter!("cadence_phases_completed_total", "kind" => kind.as_str()).increment(1);
}

/// Sets the current phase index.
#[allow(clippy::cast_precision_loss)]
pub fn set_phase_index(index: usize) {
    gauge!("cadence_phase_index").set(index as f64);
}

/// Records an interval round starting.
pub fn record_round_started() {
    counter!("cadence_rounds_total").increment(1);
}

/// Records a stopwatch lap.
pub fn record_lap(lap_duration: Duration) {
    counter!("cadence_laps_total").increment(1);
    histogram!("cadence_lap_seconds").record(lap_duration.as_secs_f64());
}

/// Records a completed breathing cycle.
pub fn record_breath_cycle() {
    counter!("cadence_breath_cycles_total").increment(1);
}

/// Forwards cues to the metric recorders.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSink {
    mode: &'static str,
}

impl MetricsSink {
    /// Creates a sink labelling runs with `mode`.
    #[must_use]
    pub const fn new(mode: &'static str) -> Self {
        Self { mode }
    }
}

impl CueSink for MetricsSink {
    fn on_cue(&mut self, cue: &Cue) {
        match cue {
            Cue::Started { .. } => record_run_started(self.mode),
            Cue::PhaseLoaded { index, .. } => set_phase_index(*index),
            Cue::PhaseComplete { kind, .. } => record_phase_completed(*kind),
            Cue::RoundStarted { .. } => record_round_started(),
            Cue::LapRecorded(lap) => record_lap(lap.lap_duration),
            Cue::CycleCompleted { .. } => record_breath_cycle(),
            Cue::Completed { elapsed } => record_run_completed(self.mode, *elapsed),
            Cue::Countdown { .. } => {}
        }
    }
}
