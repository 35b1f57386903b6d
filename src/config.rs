//! Configuration types for the upload/process/download client

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default endpoint of the background removal service
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/remove-background";

/// Default upload size limit (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for the background removal client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the background removal endpoint
    pub endpoint: String,

    /// Name of the multipart field carrying the image bytes
    pub form_field: String,

    /// Largest accepted upload in bytes
    pub max_file_size: u64,

    /// Interval between progress estimate ticks (milliseconds)
    pub progress_interval_ms: u64,

    /// Upper bound of a single pseudo-random progress increment
    pub progress_max_increment: f64,

    /// Progress estimate ceiling while waiting for the response
    pub progress_cap: f64,

    /// Request timeout in seconds (0 = no timeout)
    pub request_timeout_secs: u64,

    /// Directory processed results are saved to (None = caller decides)
    pub download_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            form_field: "image".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            progress_interval_ms: 200,
            progress_max_increment: 15.0,
            progress_cap: 90.0,
            request_timeout_secs: 120,
            download_dir: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bg_remover_client::ClientConfig;
    ///
    /// let config = ClientConfig::builder()
    ///     .endpoint("https://example.com/api/remove-background")
    ///     .max_file_size(5 * 1024 * 1024)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.max_file_size, 5 * 1024 * 1024);
    /// ```
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    /// - The file cannot be read
    /// - The file is not valid JSON for this structure
    /// - The resulting configuration fails validation
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClientError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            ClientError::invalid_config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - Endpoint: `http://` or `https://` URL
    /// - Form field: non-empty
    /// - Max file size: greater than zero
    /// - Progress interval: greater than zero
    /// - Progress increment: greater than zero and finite
    /// - Progress cap: strictly between 0 and 100
    ///
    /// # Errors
    /// Returns `ClientError::InvalidConfig` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        crate::utils::ConfigValidator::validate(self)
    }

    /// Interval between progress ticks
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Request timeout, if any
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Builder for `ClientConfig`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from file)
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set service endpoint URL
    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set multipart field name
    #[must_use]
    pub fn form_field<S: Into<String>>(mut self, field: S) -> Self {
        self.config.form_field = field.into();
        self
    }

    /// Set upload size limit in bytes
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    /// Set progress tick interval
    #[must_use]
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set progress increment upper bound
    #[must_use]
    pub fn progress_max_increment(mut self, increment: f64) -> Self {
        self.config.progress_max_increment = increment;
        self
    }

    /// Set progress ceiling (clamped to 0-100)
    #[must_use]
    pub fn progress_cap(mut self, cap: f64) -> Self {
        self.config.progress_cap = cap.clamp(0.0, 100.0);
        self
    }

    /// Set request timeout in seconds (0 = none)
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set download directory
    #[must_use]
    pub fn download_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.download_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Any rule checked by [`ClientConfig::validate`] is violated
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.form_field, "image");
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.progress_interval(), Duration::from_millis(200));
        assert!((config.progress_cap - 90.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps_cap() {
        let config = ClientConfig::builder().progress_cap(250.0).build();
        // 100 is clamped into range but a cap of 100 is still rejected
        assert!(config.is_err());

        let config = ClientConfig::builder().progress_cap(75.0).build().unwrap();
        assert!((config.progress_cap - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_request_timeout() {
        let config = ClientConfig::builder().request_timeout_secs(0).build().unwrap();
        assert_eq!(config.request_timeout(), None);

        let config = ClientConfig::builder().request_timeout_secs(30).build().unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_json_file_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(
            &path,
            r#"{ "endpoint": "https://bg.example.com/api/remove-background", "max_file_size": 1024 }"#,
        )
        .unwrap();

        let config = ClientConfig::from_json_file(&path).unwrap();
        assert_eq!(config.endpoint, "https://bg.example.com/api/remove-background");
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.form_field, "image");
    }

    #[test]
    fn test_from_json_file_invalid() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{ "endpoint": "ftp://nope" }"#).unwrap();
        assert!(matches!(
            ClientConfig::from_json_file(&path),
            Err(ClientError::InvalidConfig(_))
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ClientConfig::from_json_file(&missing),
            Err(ClientError::Io(_))
        ));
    }
}
