//! Relay orchestration shared by the generate and edit endpoints.

use crate::ai::gemini::{build_edit_body, build_generate_body};
use crate::ai::{CredentialPool, CredentialProvider, GeminiHttpClient, UpstreamService};
use crate::config::Config;
use crate::models::{EditImageRequest, GenerateImageRequest, GenerationRequest, RelayResult};
use crate::relay::{Relay, RetryPolicy};
use crate::Result;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Validates inbound requests and runs them through the retrying relay.
pub struct App {
    relay: Relay,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub upstream: Arc<dyn UpstreamService>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub policy: RetryPolicy,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            relay: Relay::new(services.upstream, services.credentials, services.policy),
        }
    }

    /// Construct the production app. Fails if the credential pool is empty.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = CredentialPool::new(config.api_keys.clone())?;
        info!("Loaded {} Gemini API keys", credentials.key_count());

        let http_client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;
        let upstream = GeminiHttpClient::new_with_client(
            config.model.clone(),
            config.upstream_timeout,
            http_client,
        )
        .with_base_url(config.base_url.clone());
        info!(
            "Upstream model: {} (timeout {}s)",
            upstream.model(),
            config.upstream_timeout.as_secs()
        );

        Ok(Self::with_services(AppServices {
            upstream: Arc::new(upstream),
            credentials: Arc::new(credentials),
            policy: RetryPolicy::default(),
        }))
    }

    pub fn max_attempts(&self) -> u32 {
        self.relay.policy().max_attempts()
    }

    /// Text-to-image. Rejects a missing prompt before any upstream call.
    pub async fn generate_image(&self, request: GenerateImageRequest) -> Result<RelayResult> {
        let request = GenerationRequest::generate(request)?;
        Ok(self.relay_request(request).await)
    }

    /// Image edit. Rejects a missing prompt or image before any upstream call.
    pub async fn edit_image(&self, request: EditImageRequest) -> Result<RelayResult> {
        let request = GenerationRequest::edit(request)?;
        Ok(self.relay_request(request).await)
    }

    async fn relay_request(&self, request: GenerationRequest) -> RelayResult {
        let (kind, payload) = match &request.source_image {
            Some(image) => ("edit", build_edit_body(&request.prompt, image)),
            None => ("generate", build_generate_body(&request.prompt)),
        };
        let span = info_span!("relay", request_id = %Uuid::new_v4(), kind);

        async {
            info!("Prompt: {}", request.prompt);
            if let Some(image) = &request.source_image {
                info!("With image: {} chars", image.len());
            }
            self.relay.invoke(&payload).await
        }
        .instrument(span)
        .await
    }
}
