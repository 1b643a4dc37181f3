//! `validate` command handler.

use serde::Serialize;
use tracing::info;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::loader::ConfigLoader;
use crate::error::{CadenceError, ConfigError, Severity, ValidationIssue};

/// Outcome for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Validate configuration files.
///
/// Every file is checked and reported; the first failure is returned.
///
/// # Errors
///
/// Returns the first file's config error, or a validation error for
/// warnings under `--strict`.
pub fn run(args: &ValidateArgs) -> Result<(), CadenceError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error: Option<ConfigError> = None;

    for path in &args.files {
        info!(file = %path.display(), "validating configuration");
        let file = path.display().to_string();

        let report = match loader.load(path) {
            Ok(loaded) if args.strict && !loaded.warnings.is_empty() => {
                let issues: Vec<ValidationIssue> = loaded
                    .warnings
                    .iter()
                    .map(|w| ValidationIssue {
                        path: w.location.clone().unwrap_or_default(),
                        message: w.message.clone(),
                        severity: Severity::Warning,
                    })
                    .collect();
                let err = ConfigError::ValidationError {
                    path: file.clone(),
                    errors: issues,
                };
                let report = FileReport {
                    file,
                    valid: false,
                    warnings: Vec::new(),
                    error: Some(err.to_string()),
                };
                first_error.get_or_insert(err);
                report
            }
            Ok(loaded) => FileReport {
                file,
                valid: true,
                warnings: loaded.warnings.iter().map(|w| w.message.clone()).collect(),
                error: None,
            },
            Err(err) => {
                let report = FileReport {
                    file,
                    valid: false,
                    warnings: Vec::new(),
                    error: Some(err.to_string()),
                };
                first_error.get_or_insert(err);
                report
            }
        };
        reports.push(report);
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                match &report.error {
                    None => println!("ok    {} ({} warnings)", report.file, report.warnings.len()),
                    Some(err) => println!("FAIL  {}: {err}", report.file),
                }
                for warning in &report.warnings {
                    println!("      warning: {warning}");
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    first_error.map_or(Ok(()), |err| Err(err.into()))
}
