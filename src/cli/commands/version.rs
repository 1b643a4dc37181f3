//! Version information display.

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::presets::list_presets;

/// Print version information.
pub fn run(args: &VersionArgs) {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let presets = list_presets(None).len();

    match args.format {
        OutputFormat::Human => {
            println!("{name} {version} ({presets} built-in presets)");
        }
        OutputFormat::Json => {
            println!(r#"{{"name":"{name}","version":"{version}","builtin_presets":{presets}}}"#);
        }
    }
}
