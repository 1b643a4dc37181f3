//! Shared helpers for running the `cadence` binary in integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

/// Path to the compiled binary under test.
pub fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_cadence")
}

/// Path to a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs `cadence` with `args` to completion.
///
/// Stdin is closed so interactive controls see EOF immediately, and the
/// `CADENCE_*` environment is cleared so the host shell cannot leak in.
#[allow(clippy::missing_panics_doc)]
pub fn run_command(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("CADENCE_CONFIG")
        .env_remove("CADENCE_EVENTS")
        .env_remove("CADENCE_METRICS_PORT")
        .env_remove("CADENCE_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to run cadence")
}

/// Parses JSON object lines from stdout, skipping anything else.
pub fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).expect("event line should be valid JSON"))
        .collect()
}

/// Parses all of stdout as one JSON document.
pub fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}
