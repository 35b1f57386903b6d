//! Configuration validation utilities

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Validator for client configuration values
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete client configuration
    pub fn validate(config: &ClientConfig) -> Result<()> {
        Self::validate_endpoint(&config.endpoint)?;

        if config.form_field.trim().is_empty() {
            return Err(ClientError::invalid_config("Form field name must not be empty"));
        }

        if config.max_file_size == 0 {
            return Err(ClientError::config_value_error(
                "Max file size",
                config.max_file_size,
                "> 0",
            ));
        }

        if config.progress_interval_ms == 0 {
            return Err(ClientError::config_value_error(
                "Progress interval (ms)",
                config.progress_interval_ms,
                "> 0",
            ));
        }

        if !config.progress_max_increment.is_finite() || config.progress_max_increment <= 0.0 {
            return Err(ClientError::config_value_error(
                "Progress increment",
                config.progress_max_increment,
                "> 0",
            ));
        }

        if !(config.progress_cap > 0.0 && config.progress_cap < 100.0) {
            return Err(ClientError::config_value_error(
                "Progress cap",
                config.progress_cap,
                "0-100 (exclusive)",
            ));
        }

        Ok(())
    }

    /// Validate that an endpoint is an absolute http(s) URL
    pub fn validate_endpoint(endpoint: &str) -> Result<()> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| ClientError::invalid_config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ClientError::invalid_config(format!(
                "Unsupported endpoint scheme '{}': only http and https are supported",
                other
            ))),
        }
    }
}
