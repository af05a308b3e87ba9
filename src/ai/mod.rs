//! Upstream generative-AI integration
//!
//! Credential selection, the Gemini `generateContent` client with its payload
//! builder and response extractor, and a scripted mock for tests.

pub mod credentials;
pub mod gemini;
pub mod mime;
pub mod mock;

pub use credentials::{ApiKey, CredentialPool, CredentialProvider, FixedCredential};
pub use gemini::GeminiHttpClient;
pub use mock::{CountingCredential, MockReply, MockUpstreamClient};

use crate::Result;
use async_trait::async_trait;
use gemini::{GenerateContentRequest, GenerateContentResponse};

/// One call to the upstream model with an explicitly chosen credential.
#[async_trait]
pub trait UpstreamService: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &ApiKey,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}
