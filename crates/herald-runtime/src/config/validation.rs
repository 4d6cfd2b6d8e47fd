//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{HeraldConfig, LogFormat, LogOutput, LoggingConfig, MessageConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_message_config(&config.message)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if let Some(path) = &logging.file_path
        && path.file_name().is_none()
    {
        return Err(ConfigError::validation(format!(
            "Log file path has no file name: {}",
            path.display()
        )));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "JSON log format requires the json-log feature",
        ));
    }

    for module in logging.filters.keys() {
        if module.trim().is_empty() {
            return Err(ConfigError::validation("Log filter module cannot be empty"));
        }
        if module.contains(char::is_whitespace) || module.contains('=') {
            return Err(ConfigError::validation(format!(
                "Invalid log filter module: {module:?}"
            )));
        }
    }

    Ok(())
}

/// Validates broadcaster settings.
fn validate_message_config(message: &MessageConfig) -> ConfigResult<()> {
    if message.props.keys().any(|key| key.is_empty()) {
        return Err(ConfigError::validation("Message property names cannot be empty"));
    }
    Ok(())
}
