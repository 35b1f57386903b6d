//! HTTP implementation of the removal service

use super::{RemovalResponse, RemovalService};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result, GENERIC_FAILURE_MESSAGE};
use crate::types::{ProcessedResult, SelectedFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

/// Removal service reached with a multipart POST
#[derive(Debug, Clone)]
pub struct HttpRemovalService {
    client: Client,
    endpoint: Url,
    form_field: String,
}

impl HttpRemovalService {
    /// Create a service for the configured endpoint
    ///
    /// # Errors
    /// - The endpoint is not a valid URL
    /// - Failed to create HTTP client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            ClientError::invalid_config(format!("Invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint,
            form_field: config.form_field.clone(),
        })
    }

    /// Endpoint requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_form(&self, file: &SelectedFile) -> Result<Form> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())?;
        Ok(Form::new().part(self.form_field.clone(), part))
    }
}

#[async_trait]
impl RemovalService for HttpRemovalService {
    #[instrument(skip_all, fields(file = %file.name(), size = file.size()))]
    async fn remove_background(&self, file: &SelectedFile) -> Result<ProcessedResult> {
        let form = self.build_form(file)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Service responded");

        if !status.is_success() {
            let message = serde_json::from_slice::<RemovalResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            warn!(status = status.as_u16(), error = %message, "Service reported failure");
            return Err(ClientError::service(Some(status.as_u16()), message));
        }

        let parsed: RemovalResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::malformed(format!("invalid JSON body: {}", e)))?;
        parsed.into_result()
    }

    fn describe(&self) -> String {
        format!("POST {}", self.endpoint)
    }
}
