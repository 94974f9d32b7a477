//! Config validation. All problems are collected into one error.

use crate::schema::ShimConfig;
use webview_dll_common::ConfigError;

const MAX_DIMENSION: u32 = 16384;

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ShimConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(&mut errors, "window.width", config.window.width, 1, MAX_DIMENSION);
    validate_range(&mut errors, "window.height", config.window.height, 1, MAX_DIMENSION);

    if config.logging.level.trim().is_empty() {
        errors.push("logging.level must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
