//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{ClientConfig, ClientConfigBuilder};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Convert CLI arguments to a [`ClientConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the client configuration from CLI arguments
    ///
    /// A `--config` file provides the base values; explicit flags override it.
    pub(crate) fn from_cli(cli: &Cli) -> Result<ClientConfig> {
        let base = match &cli.config {
            Some(path) => ClientConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => ClientConfig::default(),
        };

        let mut builder = ClientConfigBuilder::from_config(base);

        if let Some(endpoint) = &cli.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if let Some(mb) = cli.max_size_mb {
            builder = builder.max_file_size(mb.saturating_mul(1024 * 1024));
        }
        if let Some(secs) = cli.timeout {
            builder = builder.request_timeout_secs(secs);
        }
        if let Some(dir) = Self::resolve_output_dir(cli) {
            builder = builder.download_dir(dir);
        }

        builder.build().context("Invalid client configuration")
    }

    /// `--output-dir`, else the configured directory, else the user's download folder
    fn resolve_output_dir(cli: &Cli) -> Option<PathBuf> {
        if let Some(dir) = &cli.output_dir {
            return Some(dir.clone());
        }
        if cli.config.is_some() {
            // Let the file's download_dir stand, if it has one
            return None;
        }
        dirs::download_dir()
    }
}
