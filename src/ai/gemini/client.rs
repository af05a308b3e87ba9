use super::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::ai::credentials::ApiKey;
use crate::ai::UpstreamService;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini REST client for `generateContent`.
///
/// Holds no credential of its own: the relay passes the key chosen for each
/// attempt.
#[derive(Clone)]
pub struct GeminiHttpClient {
    client: Client,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` may be given with or without the `models/` prefix.
    pub fn new(model: String, timeout: Duration) -> Self {
        Self::new_with_client(model, timeout, Client::new())
    }

    pub fn new_with_client(model: String, timeout: Duration, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Best-effort human message for a non-success upstream reply.
fn upstream_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope
            .error
            .and_then(|error| error.message)
            .unwrap_or_else(|| "Unknown error".to_string()),
        Err(_) => format!("API Error: {}", status.as_u16()),
    }
}

#[async_trait]
impl UpstreamService for GeminiHttpClient {
    async fn generate_content(
        &self,
        api_key: &ApiKey,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        tracing::debug!("Sending generateContent request (model: {})", self.model);

        let response = self
            .client
            .post(self.generate_content_url())
            .timeout(self.timeout)
            .header("x-goog-api-key", api_key.expose())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message: upstream_error_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            Error::AiProvider(format!("Failed to parse Gemini response: {}", e))
        })
    }
}
