//! Configuration module
//!
//! Loading and validation of `cadence` configuration files: the default
//! workout, the breathing exercise, engine settings and named presets.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
